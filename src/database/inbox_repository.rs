//! Inbox query facade: paginated, filtered reads over the unified views.
//!
//! The `inbox_items` view unions all six source tables into one row shape;
//! `inbox_items_open` keeps only rows whose status is not terminal. Listing
//! is read-only and deliberately bypasses lead resolution.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{InboxRow, Page};
use crate::sources::{LeadKind, SourceTable};

pub const DEFAULT_PAGE_SIZE: i64 = 25;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InboxScope {
    #[default]
    Open,
    All,
}

impl InboxScope {
    pub fn parse(s: &str) -> Result<InboxScope, ApiError> {
        match s {
            "open" => Ok(InboxScope::Open),
            "all" => Ok(InboxScope::All),
            other => Err(ApiError::BadRequest(format!(
                "scope must be 'open' or 'all', got '{other}'"
            ))),
        }
    }

    fn view(self) -> &'static str {
        match self {
            InboxScope::Open => "campus.inbox_items_open",
            InboxScope::All => "campus.inbox_items",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InboxFilter {
    pub scope: InboxScope,
    pub q: Option<String>,
    pub kind: Option<LeadKind>,
    pub source_table: Option<SourceTable>,
    pub assigned_to: Option<Uuid>,
    pub page: i64,
    pub page_size: i64,
}

/// Clamp pagination input to a 1-indexed page and a capped page size, and
/// return `(page, page_size, offset)`.
pub fn page_window(page: i64, page_size: i64) -> (i64, i64, i64) {
    let page = page.max(1);
    let page_size = if page_size <= 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size.min(MAX_PAGE_SIZE)
    };
    (page, page_size, (page - 1) * page_size)
}

#[derive(Clone)]
pub struct InboxRepository {
    pool: PgPool,
}

impl InboxRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One page of the unified inbox, newest first, plus the total count of
    /// the filtered set.
    pub async fn list(&self, filter: &InboxFilter) -> Result<Page<InboxRow>, ApiError> {
        let (page, page_size, offset) = page_window(filter.page, filter.page_size);

        // `kind` and `source_table` both narrow to a single table; if both
        // are present and disagree the result is empty by definition.
        let table_filter = match (filter.kind, filter.source_table) {
            (Some(kind), Some(table)) if kind.source_table() != table => {
                return Ok(Page {
                    rows: vec![],
                    total: 0,
                    page,
                    page_size,
                });
            }
            (Some(kind), _) => Some(kind.source_table()),
            (None, table) => table,
        };

        let table_name = table_filter.map(|t| t.as_str());
        let pattern = filter
            .q
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .map(|q| format!("%{}%", q.trim()));
        let view = filter.scope.view();

        let where_clause = r#"
            WHERE ($1::text IS NULL OR source_table = $1)
              AND ($2::uuid IS NULL OR assigned_to = $2)
              AND ($3::text IS NULL
                   OR name ILIKE $3
                   OR email ILIKE $3
                   OR organization ILIKE $3
                   OR city ILIKE $3
                   OR interest ILIKE $3)"#;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM {view} {where_clause}"
        ))
        .bind(table_name)
        .bind(filter.assigned_to)
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, InboxRow>(&format!(
            r#"SELECT source_table, source_id, name, email, phone, organization, city,
                      interest, status, assigned_to, source_page, created_at
               FROM {view}
               {where_clause}
               ORDER BY created_at DESC
               LIMIT $4 OFFSET $5"#
        ))
        .bind(table_name)
        .bind(filter.assigned_to)
        .bind(pattern.as_deref())
        .bind(page_size)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            rows,
            total,
            page,
            page_size,
        })
    }

    /// The unified-row projection of one source row, scope-independent.
    pub async fn find_row(
        &self,
        table: SourceTable,
        source_id: Uuid,
    ) -> Result<Option<InboxRow>, sqlx::Error> {
        sqlx::query_as::<_, InboxRow>(
            r#"SELECT source_table, source_id, name, email, phone, organization, city,
                      interest, status, assigned_to, source_page, created_at
               FROM campus.inbox_items
               WHERE source_table = $1 AND source_id = $2"#,
        )
        .bind(table.as_str())
        .bind(source_id)
        .fetch_optional(&self.pool)
        .await
    }
}
