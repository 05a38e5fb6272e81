//! Diploma portal: student listing with client-chosen sort.
//!
//! Stored columns sort in SQL with SQL-side pagination. The two derived
//! metrics (open requirement count, completion rate) cannot be ordered by
//! in the listing query we want to keep index-friendly, so a derived sort
//! fetches the whole filtered set with its counts, computes the metrics,
//! sorts in memory, and paginates in memory.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::inbox_repository::page_window;
use crate::error::ApiError;
use crate::models::{Page, Student, StudentRequirement};

/// Whitelisted sort keys; anything else is a client error.
const STORED_SORTS: [(&str, &str); 6] = [
    ("full_name", "full_name"),
    ("email", "email"),
    ("program", "program"),
    ("status", "status"),
    ("enrolled_at", "enrolled_at"),
    ("updated_at", "updated_at"),
];

const DERIVED_SORTS: [&str; 2] = ["open_requirements", "completion_rate"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

impl SortDir {
    pub fn parse(s: &str) -> Result<SortDir, ApiError> {
        match s {
            "asc" => Ok(SortDir::Asc),
            "desc" => Ok(SortDir::Desc),
            other => Err(ApiError::BadRequest(format!(
                "dir must be 'asc' or 'desc', got '{other}'"
            ))),
        }
    }

    fn sql(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub q: Option<String>,
    pub program: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub dir: SortDir,
    pub page: i64,
    pub page_size: i64,
}

/// Student row with its derived metrics, as returned by the listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentWithMetrics {
    #[serde(flatten)]
    pub student: Student,
    pub open_requirements: i64,
    pub total_requirements: i64,
    pub completion_rate: f64,
}

#[derive(sqlx::FromRow)]
struct StudentCountRow {
    id: Uuid,
    full_name: String,
    email: String,
    program: String,
    status: String,
    enrolled_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    open_requirements: i64,
    total_requirements: i64,
}

impl StudentCountRow {
    fn into_metrics(self) -> StudentWithMetrics {
        let completion_rate = if self.total_requirements == 0 {
            1.0
        } else {
            (self.total_requirements - self.open_requirements) as f64
                / self.total_requirements as f64
        };
        StudentWithMetrics {
            student: Student {
                id: self.id,
                full_name: self.full_name,
                email: self.email,
                program: self.program,
                status: self.status,
                enrolled_at: self.enrolled_at,
                updated_at: self.updated_at,
            },
            open_requirements: self.open_requirements,
            total_requirements: self.total_requirements,
            completion_rate,
        }
    }
}

/// In-memory ordering for the derived-metric path.
pub fn sort_by_derived(rows: &mut [StudentWithMetrics], key: &str, dir: SortDir) {
    rows.sort_by(|a, b| {
        let ord = match key {
            "open_requirements" => a.open_requirements.cmp(&b.open_requirements),
            _ => a
                .completion_rate
                .partial_cmp(&b.completion_rate)
                .unwrap_or(Ordering::Equal),
        };
        match dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    });
}

#[derive(Clone)]
pub struct StudentRepository {
    pool: PgPool,
}

impl StudentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filter: &StudentFilter) -> Result<Page<StudentWithMetrics>, ApiError> {
        let (page, page_size, offset) = page_window(filter.page, filter.page_size);
        let sort = filter.sort.as_deref().unwrap_or("enrolled_at");

        let base = r#"
            SELECT s.id, s.full_name, s.email, s.program, s.status,
                   s.enrolled_at, s.updated_at,
                   COUNT(r.id) FILTER (WHERE NOT r.completed)  AS open_requirements,
                   COUNT(r.id)                                  AS total_requirements
            FROM campus.students s
            LEFT JOIN campus.student_requirements r ON r.student_id = s.id
            WHERE ($1::text IS NULL OR s.full_name ILIKE $1 OR s.email ILIKE $1)
              AND ($2::text IS NULL OR s.program = $2)
              AND ($3::text IS NULL OR s.status = $3)
            GROUP BY s.id"#;

        let pattern = filter
            .q
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .map(|q| format!("%{}%", q.trim()));

        if DERIVED_SORTS.contains(&sort) {
            // Full filtered set into memory, then sort and paginate there.
            let rows = sqlx::query_as::<_, StudentCountRow>(base)
                .bind(pattern.as_deref())
                .bind(filter.program.as_deref())
                .bind(filter.status.as_deref())
                .fetch_all(&self.pool)
                .await?;

            let mut all: Vec<StudentWithMetrics> =
                rows.into_iter().map(StudentCountRow::into_metrics).collect();
            let total = all.len() as i64;
            sort_by_derived(&mut all, sort, filter.dir);
            let rows = all
                .into_iter()
                .skip(offset as usize)
                .take(page_size as usize)
                .collect();
            return Ok(Page {
                rows,
                total,
                page,
                page_size,
            });
        }

        let column = STORED_SORTS
            .iter()
            .find(|(key, _)| *key == sort)
            .map(|(_, col)| *col)
            .ok_or_else(|| ApiError::BadRequest(format!("unsupported sort key '{sort}'")))?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*)
               FROM campus.students s
               WHERE ($1::text IS NULL OR s.full_name ILIKE $1 OR s.email ILIKE $1)
                 AND ($2::text IS NULL OR s.program = $2)
                 AND ($3::text IS NULL OR s.status = $3)"#,
        )
        .bind(pattern.as_deref())
        .bind(filter.program.as_deref())
        .bind(filter.status.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, StudentCountRow>(&format!(
            "{base} ORDER BY s.{column} {dir} LIMIT $4 OFFSET $5",
            dir = filter.dir.sql()
        ))
        .bind(pattern.as_deref())
        .bind(filter.program.as_deref())
        .bind(filter.status.as_deref())
        .bind(page_size)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            rows: rows.into_iter().map(StudentCountRow::into_metrics).collect(),
            total,
            page,
            page_size,
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Student>, sqlx::Error> {
        sqlx::query_as::<_, Student>(
            r#"SELECT id, full_name, email, program, status, enrolled_at, updated_at
               FROM campus.students WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn requirements(&self, id: Uuid) -> Result<Vec<StudentRequirement>, sqlx::Error> {
        sqlx::query_as::<_, StudentRequirement>(
            r#"SELECT id, student_id, title, kind, completed, due_date
               FROM campus.student_requirements
               WHERE student_id = $1
               ORDER BY due_date NULLS LAST, title"#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn update(
        &self,
        id: Uuid,
        status: Option<&str>,
        program: Option<&str>,
    ) -> Result<Option<Student>, sqlx::Error> {
        sqlx::query_as::<_, Student>(
            r#"UPDATE campus.students
               SET status = COALESCE($2, status),
                   program = COALESCE($3, program),
                   updated_at = now()
               WHERE id = $1
               RETURNING id, full_name, email, program, status, enrolled_at, updated_at"#,
        )
        .bind(id)
        .bind(status)
        .bind(program)
        .fetch_optional(&self.pool)
        .await
    }
}
