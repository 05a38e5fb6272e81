//! Lead resolution and mutation rules.
//!
//! Resolution: at most one lead exists per (source_table, source_row_id),
//! enforced by the unique index plus an upsert, so concurrent first accesses
//! converge on a single row. The first resolution also seeds the audit trail
//! with a synthetic "Lead created" event. The seed uses a check-then-insert
//! that is not atomic with the upsert: under true concurrent first access a
//! duplicate seed event can appear. Known and tolerated — the duplicate is
//! cosmetic, the lead row itself cannot duplicate.
//!
//! Mutation: only fields that actually differ are written, and every
//! accepted change appends exactly one audit event after the row update has
//! committed. An event-write failure after a successful update is logged and
//! not rolled back; the audit trail may have gaps.

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{event_kind, Lead, LeadEvent};
use crate::registry::StatusRegistry;
use crate::sources::SourceTable;

use super::lead_repository::{LeadRepository, NewLeadEvent};
use super::source_repository::SourceRepository;

pub struct LeadService {
    leads: LeadRepository,
    sources: SourceRepository,
    registry: Arc<StatusRegistry>,
}

/// Requested changes for one mutation call. `assigned` uses the outer
/// `Option` for "field present in the request" and the inner one for the
/// actual value, so an explicit unassign is representable.
#[derive(Debug, Clone, Default)]
pub struct LeadUpdate {
    pub to_status: Option<String>,
    pub assigned: Option<Option<Uuid>>,
}

/// The subset of a [`LeadUpdate`] that actually differs from the current
/// row. Empty plans mean a no-op call: zero writes, zero events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePlan {
    pub new_status: Option<String>,
    pub set_assigned: Option<Option<Uuid>>,
}

impl UpdatePlan {
    pub fn is_empty(&self) -> bool {
        self.new_status.is_none() && self.set_assigned.is_none()
    }
}

/// Drop the parts of `update` that match the lead's current state.
pub fn plan_update(lead: &Lead, update: &LeadUpdate) -> UpdatePlan {
    let new_status = update
        .to_status
        .as_ref()
        .filter(|s| **s != lead.status)
        .cloned();
    let set_assigned = update.assigned.filter(|a| *a != lead.assigned_to);
    UpdatePlan {
        new_status,
        set_assigned,
    }
}

impl LeadService {
    pub fn new(pool: PgPool, registry: Arc<StatusRegistry>) -> Self {
        Self {
            leads: LeadRepository::new(pool.clone()),
            sources: SourceRepository::new(pool),
            registry,
        }
    }

    pub fn events(&self) -> &LeadRepository {
        &self.leads
    }

    /// Reject an unknown status code. Callers with irreversible side effects
    /// (outbound email, partial multi-field patches) run this before the
    /// first one happens, so a 400 never trails an action already taken.
    pub async fn ensure_valid_status(&self, code: &str) -> Result<(), ApiError> {
        if !self.registry.is_valid_status(code).await? {
            return Err(ApiError::InvalidStatus(code.to_string()));
        }
        Ok(())
    }

    /// Find or create the canonical lead for a source row. Idempotent: the
    /// found path ignores `assigned_to` / `source_page`, they only apply at
    /// creation time.
    pub async fn get_or_create(
        &self,
        table: SourceTable,
        source_row_id: Uuid,
        assigned_to: Option<Uuid>,
        source_page: Option<&str>,
    ) -> Result<Lead, ApiError> {
        if let Some(lead) = self.leads.find_by_source(table, source_row_id).await? {
            return Ok(lead);
        }

        let initial = self.registry.initial_status().await?;
        let lead = self
            .leads
            .upsert(table, source_row_id, &initial, assigned_to, source_page)
            .await?;

        if !self.leads.has_events(lead.id).await? {
            self.leads
                .insert_event(NewLeadEvent {
                    lead_id: lead.id,
                    event_kind: event_kind::OTHER,
                    title: "Lead created",
                    body: &format!("Lead created from {}", table.as_str()),
                    from_status: None,
                    to_status: None,
                    created_by: None,
                })
                .await?;
            tracing::debug!(lead_id = %lead.id, table = table.as_str(), "seeded lead audit trail");
        }

        Ok(lead)
    }

    /// Apply status/assignment changes to the lead, mirror them into the
    /// source row, and append one audit event per accepted change.
    pub async fn update_lead(
        &self,
        lead: &Lead,
        update: LeadUpdate,
        actor: Option<Uuid>,
    ) -> Result<Lead, ApiError> {
        if let Some(status) = update.to_status.as_deref() {
            self.ensure_valid_status(status).await?;
        }

        let plan = plan_update(lead, &update);
        if plan.is_empty() {
            return Ok(lead.clone());
        }

        let updated = self
            .leads
            .update_status_assignment(lead.id, plan.new_status.as_deref(), plan.set_assigned)
            .await?;

        // Mirror the assignment into the originating row. The source-row
        // status column is driven separately via `mirror_source_status`.
        if let Some(assigned) = plan.set_assigned {
            let table = SourceTable::parse(&lead.source_table).ok_or_else(|| {
                ApiError::BadRequest(format!("unsupported source table '{}'", lead.source_table))
            })?;
            self.sources
                .update_assigned(table, lead.source_row_id, assigned)
                .await?;
        }

        if let Some(to_status) = plan.new_status.as_deref() {
            self.append_event_best_effort(NewLeadEvent {
                lead_id: lead.id,
                event_kind: event_kind::STATUS_CHANGE,
                title: "Status changed",
                body: &format!("{} -> {}", lead.status, to_status),
                from_status: Some(&lead.status),
                to_status: Some(to_status),
                created_by: actor,
            })
            .await;
        }

        if let Some(assigned) = plan.set_assigned {
            let body = match assigned {
                Some(user_id) => format!("Assigned to {user_id}"),
                None => "Unassigned".to_string(),
            };
            self.append_event_best_effort(NewLeadEvent {
                lead_id: lead.id,
                event_kind: event_kind::OTHER,
                title: "Assignment changed",
                body: &body,
                from_status: None,
                to_status: None,
                created_by: actor,
            })
            .await;
        }

        Ok(updated)
    }

    /// Write `status` into the source row and record it on the lead's trail.
    /// The target code is validated against the registry first.
    pub async fn mirror_source_status(
        &self,
        lead: &Lead,
        table: SourceTable,
        status: &str,
        actor: Option<Uuid>,
    ) -> Result<(), ApiError> {
        self.ensure_valid_status(status).await?;

        let previous = self
            .sources
            .current_status(table, lead.source_row_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("source row not found".into()))?;

        if previous.as_deref() == Some(status) {
            return Ok(());
        }

        self.sources
            .update_status(table, lead.source_row_id, status)
            .await?;

        self.append_event_best_effort(NewLeadEvent {
            lead_id: lead.id,
            event_kind: event_kind::OTHER,
            title: "Source status changed",
            body: &format!("{} -> {}", previous.as_deref().unwrap_or("new"), status),
            from_status: None,
            to_status: None,
            created_by: actor,
        })
        .await;

        Ok(())
    }

    /// Append a user-authored event (note, email record).
    pub async fn add_event(&self, event: NewLeadEvent<'_>) -> Result<LeadEvent, ApiError> {
        Ok(self.leads.insert_event(event).await?)
    }

    /// Audit write after an already-committed mutation: the change stands
    /// even when the event insert fails, so the failure is only logged.
    async fn append_event_best_effort(&self, event: NewLeadEvent<'_>) {
        let lead_id = event.lead_id;
        let kind = event.event_kind;
        if let Err(e) = self.leads.insert_event(event).await {
            tracing::warn!(lead_id = %lead_id, event_kind = kind, error = %e,
                "audit event write failed after committed update");
        }
    }
}
