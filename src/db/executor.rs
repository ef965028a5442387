//! Query execution: read path without transactions, write path with commit/rollback.

use crate::db::Database;
use crate::error::AppError;
use crate::schema::ColumnType;
use crate::sql::{bind_all, bind_typed, placeholder};
use futures::TryStreamExt;
use serde_json::Value;
use sqlx::any::AnyRow;
use sqlx::Connection;

impl Database {
    /// Run a read. Returns every row, or only the first `limit` rows when given.
    pub async fn select(
        &self,
        sql: &str,
        args: &[Value],
        limit: Option<usize>,
    ) -> Result<Vec<AnyRow>, AppError> {
        tracing::debug!(sql = %sql, args = ?args, "SQL");
        let native = placeholder::rewrite(sql, self.dialect());
        let mut conn = self.acquire().await?;
        let mut rows = Vec::new();
        {
            let mut stream = bind_all(sqlx::query(native.as_ref()), args).fetch(&mut *conn);
            while limit.map_or(true, |n| rows.len() < n) {
                match stream.try_next().await? {
                    Some(row) => rows.push(row),
                    None => break,
                }
            }
        }
        tracing::debug!(rows = rows.len(), "rows returned");
        Ok(rows)
    }

    /// Run a write and return the affected row count.
    /// Without autocommit the statement runs in its own transaction: committed on success,
    /// rolled back on failure (or when the future is dropped) and the original error returned.
    pub async fn execute(&self, sql: &str, args: &[Value]) -> Result<u64, AppError> {
        self.execute_typed(sql, args, &[]).await
    }

    /// [`Database::execute`] with the column type of each argument slot, so NULLs bind typed.
    pub async fn execute_typed(
        &self,
        sql: &str,
        args: &[Value],
        columns: &[ColumnType],
    ) -> Result<u64, AppError> {
        tracing::debug!(sql = %sql, args = ?args, "SQL");
        let native = placeholder::rewrite(sql, self.dialect());
        let mut conn = self.acquire().await?;

        if self.autocommit() {
            let done = bind_typed(sqlx::query(native.as_ref()), args, columns).execute(&mut *conn).await?;
            return Ok(done.rows_affected());
        }

        let mut tx = conn.begin().await?;
        match bind_typed(sqlx::query(native.as_ref()), args, columns).execute(&mut *tx).await {
            Ok(done) => {
                tx.commit().await?;
                Ok(done.rows_affected())
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(error = %rollback, "rollback failed");
                }
                Err(e.into())
            }
        }
    }
}
