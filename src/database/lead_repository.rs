//! SQL access to `campus.leads` and `campus.lead_events`.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Lead, LeadEvent};
use crate::sources::SourceTable;

const LEAD_COLUMNS: &str =
    "id, kind, source_table, source_row_id, source_page, status, assigned_to, created_at";

#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

/// Insert arguments for a new audit event.
#[derive(Debug, Clone)]
pub struct NewLeadEvent<'a> {
    pub lead_id: Uuid,
    pub event_kind: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub from_status: Option<&'a str>,
    pub to_status: Option<&'a str>,
    pub created_by: Option<Uuid>,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_source(
        &self,
        table: SourceTable,
        source_row_id: Uuid,
    ) -> Result<Option<Lead>, sqlx::Error> {
        sqlx::query_as::<_, Lead>(&format!(
            r#"SELECT {LEAD_COLUMNS}
               FROM campus.leads
               WHERE source_table = $1 AND source_row_id = $2"#,
        ))
        .bind(table.as_str())
        .bind(source_row_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Insert a lead, or return the existing row if another request created
    /// it first. The no-op `DO UPDATE` makes the conflicting row visible to
    /// `RETURNING`, so concurrent first accesses race to a single row
    /// instead of failing on the unique key.
    pub async fn upsert(
        &self,
        table: SourceTable,
        source_row_id: Uuid,
        status: &str,
        assigned_to: Option<Uuid>,
        source_page: Option<&str>,
    ) -> Result<Lead, sqlx::Error> {
        sqlx::query_as::<_, Lead>(&format!(
            r#"INSERT INTO campus.leads
                   (kind, source_table, source_row_id, source_page, status, assigned_to)
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT (source_table, source_row_id)
                   DO UPDATE SET source_table = EXCLUDED.source_table
               RETURNING {LEAD_COLUMNS}"#,
        ))
        .bind(table.kind().as_str())
        .bind(table.as_str())
        .bind(source_row_id)
        .bind(source_page)
        .bind(status)
        .bind(assigned_to)
        .fetch_one(&self.pool)
        .await
    }

    /// Apply a status and/or assignment change. `set_assigned` distinguishes
    /// "leave the assignee alone" from "set it, possibly to NULL".
    pub async fn update_status_assignment(
        &self,
        lead_id: Uuid,
        status: Option<&str>,
        set_assigned: Option<Option<Uuid>>,
    ) -> Result<Lead, sqlx::Error> {
        sqlx::query_as::<_, Lead>(&format!(
            r#"UPDATE campus.leads
               SET status = COALESCE($2, status),
                   assigned_to = CASE WHEN $3 THEN $4 ELSE assigned_to END
               WHERE id = $1
               RETURNING {LEAD_COLUMNS}"#,
        ))
        .bind(lead_id)
        .bind(status)
        .bind(set_assigned.is_some())
        .bind(set_assigned.flatten())
        .fetch_one(&self.pool)
        .await
    }

    pub async fn has_events(&self, lead_id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (SELECT 1 FROM campus.lead_events WHERE lead_id = $1)"#,
        )
        .bind(lead_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn insert_event(&self, event: NewLeadEvent<'_>) -> Result<LeadEvent, sqlx::Error> {
        sqlx::query_as::<_, LeadEvent>(
            r#"INSERT INTO campus.lead_events
                   (lead_id, event_kind, title, body, from_status, to_status, created_by)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id, lead_id, event_kind, title, body, from_status, to_status,
                         created_by, created_at"#,
        )
        .bind(event.lead_id)
        .bind(event.event_kind)
        .bind(event.title)
        .bind(event.body)
        .bind(event.from_status)
        .bind(event.to_status)
        .bind(event.created_by)
        .fetch_one(&self.pool)
        .await
    }

    /// Events for a lead, oldest first — the audit trail reads top-down.
    pub async fn list_events(&self, lead_id: Uuid) -> Result<Vec<LeadEvent>, sqlx::Error> {
        sqlx::query_as::<_, LeadEvent>(
            r#"SELECT id, lead_id, event_kind, title, body, from_status, to_status,
                      created_by, created_at
               FROM campus.lead_events
               WHERE lead_id = $1
               ORDER BY created_at, id"#,
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await
    }
}
