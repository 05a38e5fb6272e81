//! SQL access to `campus.staff`.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Staff;

const STAFF_COLUMNS: &str =
    "user_id, email, display_name, role, auth_subject, active, created_at";

#[derive(Clone)]
pub struct StaffRepository {
    pool: PgPool,
}

impl StaffRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_subject(&self, subject: &str) -> Result<Option<Staff>, sqlx::Error> {
        sqlx::query_as::<_, Staff>(&format!(
            r#"SELECT {STAFF_COLUMNS} FROM campus.staff WHERE auth_subject = $1"#,
        ))
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
    }

    /// Lookup by normalized (lowercased, trimmed) email.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Staff>, sqlx::Error> {
        sqlx::query_as::<_, Staff>(&format!(
            r#"SELECT {STAFF_COLUMNS} FROM campus.staff WHERE lower(email) = $1"#,
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await
    }

    /// Write the token subject onto a previously unlinked staff row. The
    /// guard keeps a second identity from stealing an already-linked row.
    pub async fn link_subject(&self, user_id: Uuid, subject: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE campus.staff SET auth_subject = $2
               WHERE user_id = $1 AND auth_subject IS NULL"#,
        )
        .bind(user_id)
        .bind(subject)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list(&self) -> Result<Vec<Staff>, sqlx::Error> {
        sqlx::query_as::<_, Staff>(&format!(
            r#"SELECT {STAFF_COLUMNS} FROM campus.staff ORDER BY created_at"#,
        ))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn create(
        &self,
        email: &str,
        display_name: &str,
        role: &str,
    ) -> Result<Staff, sqlx::Error> {
        sqlx::query_as::<_, Staff>(&format!(
            r#"INSERT INTO campus.staff (email, display_name, role)
               VALUES ($1, $2, $3)
               RETURNING {STAFF_COLUMNS}"#,
        ))
        .bind(email.trim().to_lowercase())
        .bind(display_name)
        .bind(role)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        role: Option<&str>,
        active: Option<bool>,
        display_name: Option<&str>,
    ) -> Result<Option<Staff>, sqlx::Error> {
        sqlx::query_as::<_, Staff>(&format!(
            r#"UPDATE campus.staff
               SET role = COALESCE($2, role),
                   active = COALESCE($3, active),
                   display_name = COALESCE($4, display_name)
               WHERE user_id = $1
               RETURNING {STAFF_COLUMNS}"#,
        ))
        .bind(user_id)
        .bind(role)
        .bind(active)
        .bind(display_name)
        .fetch_optional(&self.pool)
        .await
    }
}

/// True when the error is a unique-constraint violation (Postgres 23505).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}
