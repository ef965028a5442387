//! Builds the cached per-entity SQL templates and the ad-hoc find/count statements.
//! Every value slot is the generic `?` placeholder; identifiers come from entity definitions only.

use crate::error::AppError;
use crate::sql::Dialect;
use serde_json::Value;

/// Column alias used by count queries.
pub const COUNT_ALIAS: &str = "_num_";

/// The four statements derived once per entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Templates {
    /// `select pk, f1, f2 from table` without a filter; base of every read.
    pub select: String,
    pub select_by_key: String,
    /// Non-key columns first, primary key last.
    pub insert: String,
    /// Non-key columns in SET, primary key in WHERE (bound last).
    pub update: String,
    pub delete: String,
}

/// Generic placeholder list: `?, ?, ?`.
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

pub fn build_templates(dialect: Dialect, table: &str, pk: &str, columns: &[&str]) -> Templates {
    let q_table = dialect.quote(table);
    let q_pk = dialect.quote(pk);
    let escaped: Vec<String> = columns.iter().map(|c| dialect.quote(c)).collect();

    let mut select_cols = vec![q_pk.clone()];
    select_cols.extend(escaped.iter().cloned());
    let select = format!("select {} from {}", select_cols.join(", "), q_table);
    let select_by_key = format!("{} where {}=?", select, q_pk);

    let mut insert_cols = escaped.clone();
    insert_cols.push(q_pk.clone());
    let insert = format!(
        "insert into {} ({}) values ({})",
        q_table,
        insert_cols.join(", "),
        placeholders(insert_cols.len())
    );

    let sets: Vec<String> = escaped.iter().map(|c| format!("{}=?", c)).collect();
    let update = format!("update {} set {} where {}=?", q_table, sets.join(", "), q_pk);
    let delete = format!("delete from {} where {}=?", q_table, q_pk);

    Templates {
        select,
        select_by_key,
        insert,
        update,
        delete,
    }
}

/// Row limit for list queries: a bare count or an `(offset, count)` window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Limit {
    Count(u64),
    Range { offset: u64, count: u64 },
}

impl Limit {
    /// SQL fragment and the args it binds, in order.
    fn clause(&self) -> (&'static str, Vec<Value>) {
        match *self {
            Limit::Count(n) => ("limit ?", vec![Value::from(n)]),
            Limit::Range { offset, count } => {
                ("limit ? offset ?", vec![Value::from(count), Value::from(offset)])
            }
        }
    }
}

impl From<u64> for Limit {
    fn from(n: u64) -> Self {
        Limit::Count(n)
    }
}

impl From<(u64, u64)> for Limit {
    fn from((offset, count): (u64, u64)) -> Self {
        Limit::Range { offset, count }
    }
}

/// Accepts an integer or a two-element integer array; anything else is rejected.
impl TryFrom<&Value> for Limit {
    type Error = AppError;

    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        let invalid = || AppError::InvalidLimit(v.to_string());
        match v {
            Value::Number(n) => n.as_u64().map(Limit::Count).ok_or_else(invalid),
            Value::Array(items) if items.len() == 2 => {
                let offset = items[0].as_u64().ok_or_else(invalid)?;
                let count = items[1].as_u64().ok_or_else(invalid)?;
                Ok(Limit::Range { offset, count })
            }
            _ => Err(invalid()),
        }
    }
}

/// Filter, ordering and limit for a list query. Clauses are raw SQL fragments using `?`.
#[derive(Clone, Debug, Default)]
pub struct FindAll {
    pub where_clause: Option<String>,
    pub args: Vec<Value>,
    pub order_by: Option<String>,
    pub limit: Option<Limit>,
}

impl FindAll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, clause: impl Into<String>, args: Vec<Value>) -> Self {
        self.where_clause = Some(clause.into());
        self.args = args;
        self
    }

    pub fn order_by(mut self, order: impl Into<String>) -> Self {
        self.order_by = Some(order.into());
        self
    }

    pub fn limit(mut self, limit: impl Into<Limit>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    /// Append this query's clauses to `base`; returns the statement and its args.
    pub fn to_sql(&self, base: &str) -> (String, Vec<Value>) {
        let mut sql = vec![base.to_string()];
        let mut args = self.args.clone();
        if let Some(w) = self.where_clause.as_deref().filter(|w| !w.is_empty()) {
            sql.push("where".into());
            sql.push(w.to_string());
        }
        if let Some(o) = self.order_by.as_deref().filter(|o| !o.is_empty()) {
            sql.push("order by".into());
            sql.push(o.to_string());
        }
        if let Some(limit) = &self.limit {
            let (clause, limit_args) = limit.clause();
            sql.push(clause.into());
            args.extend(limit_args);
        }
        (sql.join(" "), args)
    }
}

/// `select <expr> _num_ from table [where ...]`.
pub fn count_sql(dialect: Dialect, table: &str, expression: &str, where_clause: Option<&str>) -> String {
    let mut sql = format!(
        "select {} {} from {}",
        expression,
        COUNT_ALIAS,
        dialect.quote(table)
    );
    if let Some(w) = where_clause.filter(|w| !w.is_empty()) {
        sql.push_str(" where ");
        sql.push_str(w);
    }
    sql
}
