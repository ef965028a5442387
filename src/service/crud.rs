//! Generic CRUD execution for registered entities.

use crate::db::{Database, RowCountPolicy};
use crate::error::AppError;
use crate::schema::{ColumnType, EntityDefinition};
use crate::service::Record;
use crate::sql::{count_sql, FindAll, COUNT_ALIAS};
use serde_json::Value;
use sqlx::Row;
use std::sync::Arc;

pub struct CrudService;

impl CrudService {
    /// Fetch one row by primary key. A missing row is `None`, not an error.
    pub async fn find_by_key(
        db: &Database,
        entity: &Arc<EntityDefinition>,
        key: impl Into<Value>,
    ) -> Result<Option<Record>, AppError> {
        let rows = db
            .select(&entity.templates().select_by_key, &[key.into()], Some(1))
            .await?;
        Ok(rows.first().map(|row| Record::from_row(entity.clone(), row)))
    }

    /// Rows matching an optional filter, ordering and limit.
    pub async fn find_all(
        db: &Database,
        entity: &Arc<EntityDefinition>,
        query: &FindAll,
    ) -> Result<Vec<Record>, AppError> {
        let (sql, args) = query.to_sql(&entity.templates().select);
        let rows = db.select(&sql, &args, None).await?;
        Ok(rows
            .iter()
            .map(|row| Record::from_row(entity.clone(), row))
            .collect())
    }

    /// `select <expression> _num_ from table [where ...]`. None when no row comes back.
    pub async fn count(
        db: &Database,
        entity: &Arc<EntityDefinition>,
        expression: &str,
        where_clause: Option<&str>,
        args: &[Value],
    ) -> Result<Option<i64>, AppError> {
        let sql = count_sql(db.dialect(), entity.table(), expression, where_clause);
        let rows = db.select(&sql, args, Some(1)).await?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        if let Ok(n) = row.try_get::<Option<i64>, _>(COUNT_ALIAS) {
            return Ok(n);
        }
        let n = row.try_get::<Option<f64>, _>(COUNT_ALIAS)?;
        Ok(n.map(|f| f as i64))
    }

    /// Insert: every non-key field is resolved (defaults applied and cached), primary key last.
    pub async fn save(db: &Database, record: &mut Record) -> Result<u64, AppError> {
        let def = record.definition().clone();
        let mut args = Vec::with_capacity(def.fields().len());
        for &i in def.non_key_indices() {
            args.push(record.resolve_at(i));
        }
        args.push(record.resolve_at(def.primary_key_index()));
        let affected = db
            .execute_typed(&def.templates().insert, &args, &write_columns(&def))
            .await?;
        Self::check_affected(db, "insert", &def, affected)?;
        Ok(affected)
    }

    /// Update by primary key with the current values; defaults are not consulted.
    pub async fn update(db: &Database, record: &Record) -> Result<u64, AppError> {
        let def = record.definition();
        let mut args: Vec<Value> = def
            .non_key_indices()
            .iter()
            .map(|&i| current(record, i))
            .collect();
        args.push(current(record, def.primary_key_index()));
        let affected = db
            .execute_typed(&def.templates().update, &args, &write_columns(def))
            .await?;
        Self::check_affected(db, "update", def, affected)?;
        Ok(affected)
    }

    pub async fn remove(db: &Database, record: &Record) -> Result<u64, AppError> {
        let def = record.definition();
        let args = [current(record, def.primary_key_index())];
        let affected = db.execute(&def.templates().delete, &args).await?;
        Self::check_affected(db, "delete", def, affected)?;
        Ok(affected)
    }

    fn check_affected(
        db: &Database,
        operation: &'static str,
        def: &EntityDefinition,
        affected: u64,
    ) -> Result<(), AppError> {
        if affected == 1 {
            return Ok(());
        }
        match db.row_count_policy() {
            RowCountPolicy::Warn => {
                tracing::warn!(
                    operation,
                    table = %def.table(),
                    affected,
                    "failed to {} record: affected rows: {}",
                    operation,
                    affected
                );
                Ok(())
            }
            RowCountPolicy::Strict => Err(AppError::RowCount {
                operation,
                table: def.table().to_string(),
                actual: affected,
            }),
        }
    }
}

/// Column types in template order: non-key fields, then the primary key.
fn write_columns(def: &EntityDefinition) -> Vec<ColumnType> {
    let pk = def.primary_key_index();
    def.non_key_indices()
        .iter()
        .chain(std::iter::once(&pk))
        .map(|&i| def.fields()[i].column_type.clone())
        .collect()
}

fn current(record: &Record, i: usize) -> Value {
    record.value_at(i).cloned().unwrap_or(Value::Null)
}
