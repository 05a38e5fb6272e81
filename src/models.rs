//! Row and wire types shared across repositories and routes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical representation of a prospective contact, one per source row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lead {
    pub id: Uuid,
    pub kind: String,
    pub source_table: String,
    pub source_row_id: Uuid,
    pub source_page: Option<String>,
    pub status: String,
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Append-only audit entry tied to a lead.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeadEvent {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub event_kind: String,
    pub title: String,
    pub body: String,
    pub from_status: Option<String>,
    pub to_status: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

pub mod event_kind {
    pub const NOTE: &str = "note";
    pub const STATUS_CHANGE: &str = "status_change";
    pub const EMAIL: &str = "email";
    pub const OTHER: &str = "other";
}

/// One entry of the status registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatusDef {
    pub code: String,
    pub label: String,
    pub sort_order: i32,
    pub is_terminal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Staff {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub auth_subject: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

pub mod staff_role {
    pub const ADMIN: &str = "admin";
    pub const STAFF: &str = "staff";
    pub const VIEWER: &str = "viewer";

    pub fn is_valid(role: &str) -> bool {
        matches!(role, ADMIN | STAFF | VIEWER)
    }
}

/// One row of the unified inbox view.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InboxRow {
    pub source_table: String,
    pub source_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub organization: Option<String>,
    pub city: Option<String>,
    pub interest: Option<String>,
    pub status: String,
    pub assigned_to: Option<Uuid>,
    pub source_page: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Student {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub program: String,
    pub status: String,
    pub enrolled_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StudentRequirement {
    pub id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    pub kind: String,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
}

/// Generic page envelope: `{rows, total, page, pageSize}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}
