//! Reads and status mirroring over the six source tables.
//!
//! Source rows are owned by the public portal workflows; this repository
//! never inserts one. The table name is always interpolated from the closed
//! [`SourceTable`] enum, never from request input.

use sqlx::PgPool;
use uuid::Uuid;

use crate::sources::SourceTable;

#[derive(Clone)]
pub struct SourceRepository {
    pool: PgPool,
}

impl SourceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The raw source row as JSON. The six tables have different shapes, so
    /// the detail endpoint passes the row through untyped.
    pub async fn fetch_raw(
        &self,
        table: SourceTable,
        id: Uuid,
    ) -> Result<Option<serde_json::Value>, sqlx::Error> {
        sqlx::query_scalar::<_, serde_json::Value>(&format!(
            r#"SELECT row_to_json(t) FROM campus.{} t WHERE t.id = $1"#,
            table.as_str()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn exists(&self, table: SourceTable, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(&format!(
            r#"SELECT EXISTS (SELECT 1 FROM campus.{} WHERE id = $1)"#,
            table.as_str()
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
    }

    /// Current status of the source row; NULL means never triaged.
    pub async fn current_status(
        &self,
        table: SourceTable,
        id: Uuid,
    ) -> Result<Option<Option<String>>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<String>>(&format!(
            r#"SELECT status FROM campus.{} WHERE id = $1"#,
            table.as_str()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Write `status` back into the source row. Returns the number of rows
    /// touched (0 when the row has disappeared).
    pub async fn update_status(
        &self,
        table: SourceTable,
        id: Uuid,
        status: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(&format!(
            r#"UPDATE campus.{} SET status = $2 WHERE id = $1"#,
            table.as_str()
        ))
        .bind(id)
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn update_assigned(
        &self,
        table: SourceTable,
        id: Uuid,
        assigned_to: Option<Uuid>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(&format!(
            r#"UPDATE campus.{} SET assigned_to = $2 WHERE id = $1"#,
            table.as_str()
        ))
        .bind(id)
        .bind(assigned_to)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
