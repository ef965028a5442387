//! Convert serde_json::Value to types that sqlx can bind through the Any driver.

use crate::schema::ColumnType;
use serde_json::Value;
use sqlx::any::AnyArguments;
use sqlx::query::Query;
use sqlx::Any;

pub type AnyQuery<'q> = Query<'q, Any, AnyArguments<'q>>;

/// A value that can be bound to a query on any backend. Converts from serde_json::Value.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    /// SQL NULL, typed after the target column when known. Postgres rejects a text NULL
    /// in a boolean or numeric column.
    Null(Option<ColumnType>),
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
}

impl BindValue {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => BindValue::Null(None),
            Value::Bool(b) => BindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    BindValue::I64(i)
                } else if let Some(f) = n.as_f64() {
                    BindValue::F64(f)
                } else {
                    // u64 above i64::MAX
                    BindValue::String(n.to_string())
                }
            }
            Value::String(s) => BindValue::String(s.clone()),
            Value::Array(_) | Value::Object(_) => BindValue::String(v.to_string()),
        }
    }

    /// As [`BindValue::from_json`], with NULL typed after `column`.
    pub fn for_column(v: &Value, column: Option<&ColumnType>) -> Self {
        match v {
            Value::Null => BindValue::Null(column.cloned()),
            other => Self::from_json(other),
        }
    }

    pub fn bind_to<'q>(self, query: AnyQuery<'q>) -> AnyQuery<'q> {
        match self {
            BindValue::Null(Some(ColumnType::Boolean)) => query.bind(None::<bool>),
            BindValue::Null(Some(ColumnType::Integer)) => query.bind(None::<i64>),
            BindValue::Null(Some(ColumnType::Float)) => query.bind(None::<f64>),
            BindValue::Null(_) => query.bind(None::<String>),
            BindValue::Bool(b) => query.bind(b),
            BindValue::I64(n) => query.bind(n),
            BindValue::F64(n) => query.bind(n),
            BindValue::String(s) => query.bind(s),
        }
    }
}

/// Bind `args` positionally, in order.
pub fn bind_all<'q>(query: AnyQuery<'q>, args: &[Value]) -> AnyQuery<'q> {
    bind_typed(query, args, &[])
}

/// Bind `args` positionally; `columns[i]`, when present, types a NULL in slot `i`.
pub fn bind_typed<'q>(mut query: AnyQuery<'q>, args: &[Value], columns: &[ColumnType]) -> AnyQuery<'q> {
    for (i, arg) in args.iter().enumerate() {
        query = BindValue::for_column(arg, columns.get(i)).bind_to(query);
    }
    query
}
