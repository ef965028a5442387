//! Decode result rows into JSON values.

use crate::schema::ColumnType;
use serde_json::Value;
use sqlx::any::AnyRow;
use sqlx::{Any, Column, Decode, Row, Type};

/// Some(v) when the cell decodes as `T` (v is None for SQL NULL), None on type mismatch.
fn try_cell<'r, T>(row: &'r AnyRow, index: usize) -> Option<Option<T>>
where
    T: Decode<'r, Any> + Type<Any>,
{
    row.try_get::<Option<T>, _>(index).ok()
}

fn from_f64(n: f64) -> Value {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Decode one cell, trying the declared column type first.
/// SQLite and MySQL report booleans as integers, so booleans fall back to `!= 0`.
pub fn cell_to_value(row: &AnyRow, index: usize, hint: Option<&ColumnType>) -> Value {
    match hint {
        Some(ColumnType::Boolean) => {
            if let Some(v) = try_cell::<bool>(row, index) {
                return v.map(Value::Bool).unwrap_or(Value::Null);
            }
            if let Some(v) = try_cell::<i64>(row, index) {
                return v.map(|n| Value::Bool(n != 0)).unwrap_or(Value::Null);
            }
        }
        Some(ColumnType::Float) => {
            if let Some(v) = try_cell::<f64>(row, index) {
                return v.map(from_f64).unwrap_or(Value::Null);
            }
            if let Some(v) = try_cell::<f32>(row, index) {
                return v.map(|n| from_f64(n as f64)).unwrap_or(Value::Null);
            }
        }
        Some(ColumnType::String(_)) | Some(ColumnType::Text) => {
            if let Some(v) = try_cell::<String>(row, index) {
                return v.map(Value::String).unwrap_or(Value::Null);
            }
        }
        Some(ColumnType::Integer) | None => {}
    }
    if let Some(v) = try_cell::<i64>(row, index) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Some(v) = try_cell::<i32>(row, index) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Some(v) = try_cell::<f64>(row, index) {
        return v.map(from_f64).unwrap_or(Value::Null);
    }
    if let Some(v) = try_cell::<bool>(row, index) {
        return v.map(Value::Bool).unwrap_or(Value::Null);
    }
    if let Some(v) = try_cell::<String>(row, index) {
        return v.map(Value::String).unwrap_or(Value::Null);
    }
    Value::Null
}

/// Index of the column named `name` in `row`.
pub fn column_index(row: &AnyRow, name: &str) -> Option<usize> {
    row.columns().iter().position(|c| c.name() == name)
}
