//! Admissions inbox routes.
//!
//! GET   /inbox                                — unified paginated listing
//! GET   /inbox/:source_table/:source_id       — detail; resolves the lead
//! PATCH /inbox/:source_table/:source_id       — status/assignment mirroring
//! POST  /inbox/:source_table/:source_id/note  — append a note event
//! POST  /inbox/:source_table/:source_id/reply — send email, log it, mutate
//!
//! Every path-addressed endpoint parses the source table against the
//! allow-list before any storage access and funnels through the lead
//! resolver, so the canonical lead and its seed audit event exist by the
//! time anything else happens.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::auth::CurrentStaff;
use crate::database::inbox_repository::{InboxFilter, InboxScope};
use crate::database::lead_repository::NewLeadEvent;
use crate::database::lead_service::LeadUpdate;
use crate::database::{InboxRepository, LeadService, SourceRepository};
use crate::error::ApiError;
use crate::mailer::OutgoingEmail;
use crate::models::{event_kind, InboxRow, Lead, LeadEvent, Page};
use crate::sources::{LeadKind, SourceTable};

use super::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct InboxListQuery {
    pub scope: Option<String>,
    pub page: Option<i64>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<i64>,
    pub q: Option<String>,
    pub kind: Option<String>,
    pub source_table: Option<String>,
    pub assigned_to: Option<Uuid>,
}

/// Inbox row plus the kind tag derived from its source table.
#[derive(Debug, Serialize)]
pub struct InboxItem {
    pub kind: &'static str,
    #[serde(flatten)]
    pub row: InboxRow,
}

#[derive(Debug, Serialize)]
pub struct InboxDetailResponse {
    pub inbox: Option<InboxItem>,
    pub source: serde_json::Value,
    pub lead: Lead,
    pub events: Vec<LeadEvent>,
}

#[derive(Debug, Deserialize)]
pub struct PatchInboxBody {
    pub source_status: Option<String>,
    pub lead_status: Option<String>,
    /// Absent = leave alone, null = unassign, value = assign.
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<Uuid>>,
}

#[derive(Debug, Deserialize)]
pub struct NoteBody {
    pub title: Option<String>,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct ReplyBody {
    pub to: String,
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
    pub set_source_status: Option<String>,
    pub set_lead_status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyResponse {
    pub message_id: String,
    pub lead: Lead,
    pub event: LeadEvent,
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn list_inbox(
    State(state): State<AppState>,
    Query(query): Query<InboxListQuery>,
) -> Result<Json<Page<InboxItem>>, ApiError> {
    let scope = match query.scope.as_deref() {
        Some(s) => InboxScope::parse(s)?,
        None => InboxScope::Open,
    };
    let kind = query
        .kind
        .as_deref()
        .map(|k| LeadKind::parse(k).ok_or_else(|| ApiError::BadRequest(format!("unknown kind '{k}'"))))
        .transpose()?;
    let source_table = query
        .source_table
        .as_deref()
        .map(SourceTable::require)
        .transpose()?;

    let filter = InboxFilter {
        scope,
        q: query.q,
        kind,
        source_table,
        assigned_to: query.assigned_to,
        page: query.page.unwrap_or(1),
        page_size: query.page_size.unwrap_or(0),
    };

    let page = InboxRepository::new(state.pool.clone()).list(&filter).await?;
    Ok(Json(Page {
        rows: page.rows.into_iter().map(into_item).collect(),
        total: page.total,
        page: page.page,
        page_size: page.page_size,
    }))
}

pub async fn inbox_detail(
    State(state): State<AppState>,
    Path((source_table, source_id)): Path<(String, String)>,
) -> Result<Json<InboxDetailResponse>, ApiError> {
    let (table, source_id) = parse_target(&source_table, &source_id)?;
    let sources = SourceRepository::new(state.pool.clone());

    let source = sources
        .fetch_raw(table, source_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("source row not found".into()))?;

    let service = LeadService::new(state.pool.clone(), state.registry.clone());
    let lead = service
        .get_or_create(
            table,
            source_id,
            json_uuid(&source, "assigned_to"),
            json_str(&source, "source_page"),
        )
        .await?;
    let events = service.events().list_events(lead.id).await?;

    let inbox = InboxRepository::new(state.pool.clone())
        .find_row(table, source_id)
        .await?
        .map(into_item);

    Ok(Json(InboxDetailResponse {
        inbox,
        source,
        lead,
        events,
    }))
}

pub async fn patch_inbox(
    State(state): State<AppState>,
    Extension(staff): Extension<CurrentStaff>,
    Path((source_table, source_id)): Path<(String, String)>,
    Json(body): Json<PatchInboxBody>,
) -> Result<Json<InboxDetailResponse>, ApiError> {
    let (table, source_id) = parse_target(&source_table, &source_id)?;
    if body.source_status.is_none() && body.lead_status.is_none() && body.assigned_to.is_none() {
        return Err(ApiError::BadRequest(
            "at least one of source_status, lead_status, assigned_to is required".into(),
        ));
    }

    let service = LeadService::new(state.pool.clone(), state.registry.clone());
    // Both codes are checked before either is applied; otherwise a bad
    // lead_status would 400 with the source status already written.
    if let Some(status) = body.source_status.as_deref() {
        service.ensure_valid_status(status).await?;
    }
    if let Some(status) = body.lead_status.as_deref() {
        service.ensure_valid_status(status).await?;
    }

    let sources = SourceRepository::new(state.pool.clone());
    if !sources.exists(table, source_id).await? {
        return Err(ApiError::NotFound("source row not found".into()));
    }

    let lead = service.get_or_create(table, source_id, None, None).await?;
    let actor = Some(staff.user_id());

    if let Some(status) = body.source_status.as_deref() {
        service.mirror_source_status(&lead, table, status, actor).await?;
    }

    let lead = service
        .update_lead(
            &lead,
            LeadUpdate {
                to_status: body.lead_status,
                assigned: body.assigned_to,
            },
            actor,
        )
        .await?;

    let events = service.events().list_events(lead.id).await?;
    let source = sources
        .fetch_raw(table, source_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("source row not found".into()))?;
    let inbox = InboxRepository::new(state.pool.clone())
        .find_row(table, source_id)
        .await?
        .map(into_item);

    Ok(Json(InboxDetailResponse {
        inbox,
        source,
        lead,
        events,
    }))
}

pub async fn add_note(
    State(state): State<AppState>,
    Extension(staff): Extension<CurrentStaff>,
    Path((source_table, source_id)): Path<(String, String)>,
    Json(body): Json<NoteBody>,
) -> Result<Json<LeadEvent>, ApiError> {
    let (table, source_id) = parse_target(&source_table, &source_id)?;
    if body.body.trim().is_empty() {
        return Err(ApiError::BadRequest("note body must not be empty".into()));
    }

    let sources = SourceRepository::new(state.pool.clone());
    if !sources.exists(table, source_id).await? {
        return Err(ApiError::NotFound("source row not found".into()));
    }

    let service = LeadService::new(state.pool.clone(), state.registry.clone());
    let lead = service.get_or_create(table, source_id, None, None).await?;

    let event = service
        .add_event(NewLeadEvent {
            lead_id: lead.id,
            event_kind: event_kind::NOTE,
            title: body.title.as_deref().unwrap_or("Note"),
            body: body.body.trim(),
            from_status: None,
            to_status: None,
            created_by: Some(staff.user_id()),
        })
        .await?;
    Ok(Json(event))
}

pub async fn reply(
    State(state): State<AppState>,
    Extension(staff): Extension<CurrentStaff>,
    Path((source_table, source_id)): Path<(String, String)>,
    Json(body): Json<ReplyBody>,
) -> Result<Json<ReplyResponse>, ApiError> {
    let (table, source_id) = parse_target(&source_table, &source_id)?;
    if body.to.trim().is_empty() || body.subject.trim().is_empty() {
        return Err(ApiError::BadRequest("'to' and 'subject' are required".into()));
    }
    if body.text.is_none() && body.html.is_none() {
        return Err(ApiError::BadRequest("one of 'text' or 'html' is required".into()));
    }
    let mailer = state
        .mailer
        .as_ref()
        .ok_or_else(|| ApiError::Email("mail delivery is not configured".into()))?;

    let service = LeadService::new(state.pool.clone(), state.registry.clone());
    // Status codes are validated before the send; a 400 must not trail an
    // email that already went out.
    if let Some(status) = body.set_source_status.as_deref() {
        service.ensure_valid_status(status).await?;
    }
    if let Some(status) = body.set_lead_status.as_deref() {
        service.ensure_valid_status(status).await?;
    }

    let sources = SourceRepository::new(state.pool.clone());
    if !sources.exists(table, source_id).await? {
        return Err(ApiError::NotFound("source row not found".into()));
    }

    let lead = service.get_or_create(table, source_id, None, None).await?;
    let actor = Some(staff.user_id());

    let receipt = mailer
        .send(&OutgoingEmail {
            to: body.to.trim().to_string(),
            subject: body.subject.clone(),
            text: body.text.clone(),
            html: body.html.clone(),
        })
        .await
        .map_err(|e| ApiError::Email(e.to_string()))?;

    // Snapshot of what went out, tied to the provider's message id.
    let snapshot = body.text.as_deref().or(body.html.as_deref()).unwrap_or("");
    let event_body = format!(
        "To: {}\nSubject: {}\nProvider-Message-Id: {}\n\n{}",
        body.to.trim(),
        body.subject,
        receipt.message_id,
        snapshot
    );
    let event = service
        .add_event(NewLeadEvent {
            lead_id: lead.id,
            event_kind: event_kind::EMAIL,
            title: "Email sent",
            body: &event_body,
            from_status: None,
            to_status: None,
            created_by: actor,
        })
        .await?;

    if let Some(status) = body.set_source_status.as_deref() {
        service.mirror_source_status(&lead, table, status, actor).await?;
    }
    let lead = service
        .update_lead(
            &lead,
            LeadUpdate {
                to_status: body.set_lead_status,
                assigned: None,
            },
            actor,
        )
        .await?;

    Ok(Json(ReplyResponse {
        message_id: receipt.message_id,
        lead,
        event,
    }))
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_target(source_table: &str, source_id: &str) -> Result<(SourceTable, Uuid), ApiError> {
    let table = SourceTable::require(source_table)?;
    let id = source_id
        .parse::<Uuid>()
        .map_err(|_| ApiError::BadRequest("source_id must be a UUID".into()))?;
    Ok((table, id))
}

fn into_item(row: InboxRow) -> InboxItem {
    let kind = SourceTable::parse(&row.source_table)
        .map(|t| t.kind().as_str())
        .unwrap_or("unknown");
    InboxItem { kind, row }
}

fn json_str<'a>(value: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(|v| v.as_str())
}

fn json_uuid(value: &serde_json::Value, key: &str) -> Option<Uuid> {
    json_str(value, key).and_then(|s| s.parse().ok())
}
