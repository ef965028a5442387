//! Field descriptors: one per mapped column, declared in code.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Semantic column type. Decides how result cells are decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// Variable-width string with its declared maximum length.
    String(u32),
    Integer,
    Boolean,
    Float,
    Text,
}

impl ColumnType {
    pub fn ddl(&self) -> String {
        match self {
            ColumnType::String(n) => format!("varchar({})", n),
            ColumnType::Integer => "bigint".into(),
            ColumnType::Boolean => "boolean".into(),
            ColumnType::Float => "real".into(),
            ColumnType::Text => "text".into(),
        }
    }
}

/// Zero-argument value generator, e.g. an id or timestamp source.
pub type Generator = Arc<dyn Fn() -> Value + Send + Sync>;

/// Value used when a field is unset at save time.
#[derive(Clone, Default)]
pub enum FieldDefault {
    #[default]
    None,
    Value(Value),
    /// Invoked lazily, once per instance, when the field is first resolved.
    Generator(Generator),
}

impl FieldDefault {
    pub fn resolve(&self) -> Option<Value> {
        match self {
            FieldDefault::None => None,
            FieldDefault::Value(v) => Some(v.clone()),
            FieldDefault::Generator(f) => Some(f()),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::None => f.write_str("None"),
            FieldDefault::Value(v) => write!(f, "Value({})", v),
            FieldDefault::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Field {
    /// In-code attribute name; instances are keyed by it.
    pub attr: String,
    /// Column name when it differs from `attr`.
    pub column: Option<String>,
    pub column_type: ColumnType,
    pub primary_key: bool,
    pub default: FieldDefault,
}

impl Field {
    fn new(attr: impl Into<String>, column_type: ColumnType, default: FieldDefault) -> Self {
        Field {
            attr: attr.into(),
            column: None,
            column_type,
            primary_key: false,
            default,
        }
    }

    /// `varchar(100)`, no default.
    pub fn string(attr: impl Into<String>) -> Self {
        Self::new(attr, ColumnType::String(100), FieldDefault::None)
    }

    /// `bigint`, default 0.
    pub fn integer(attr: impl Into<String>) -> Self {
        Self::new(attr, ColumnType::Integer, FieldDefault::Value(Value::from(0)))
    }

    /// `boolean`, default false.
    pub fn boolean(attr: impl Into<String>) -> Self {
        Self::new(attr, ColumnType::Boolean, FieldDefault::Value(Value::Bool(false)))
    }

    /// `real`, default 0.0.
    pub fn float(attr: impl Into<String>) -> Self {
        Self::new(attr, ColumnType::Float, FieldDefault::Value(Value::from(0.0)))
    }

    /// `text`, no default.
    pub fn text(attr: impl Into<String>) -> Self {
        Self::new(attr, ColumnType::Text, FieldDefault::None)
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.column = Some(name.into());
        self
    }

    /// Override the varchar width of a string field; no-op for other types.
    pub fn width(mut self, n: u32) -> Self {
        if let ColumnType::String(_) = self.column_type {
            self.column_type = ColumnType::String(n);
        }
        self
    }

    pub fn default_value(mut self, v: impl Into<Value>) -> Self {
        self.default = FieldDefault::Value(v.into());
        self
    }

    pub fn default_with<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = FieldDefault::Generator(Arc::new(f));
        self
    }

    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.attr)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}:{}>", self.column_type.ddl(), self.column_name())
    }
}

/// Entity declaration: ordered fields plus table name. Table defaults to the entity name.
#[derive(Clone, Debug)]
pub struct EntityDef {
    pub name: String,
    pub table: Option<String>,
    pub fields: Vec<Field>,
}

impl EntityDef {
    pub fn new(name: impl Into<String>) -> Self {
        EntityDef {
            name: name.into(),
            table: None,
            fields: Vec::new(),
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn table_name(&self) -> &str {
        self.table.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_constructors_carry_tutorial_defaults() {
        assert_eq!(Field::integer("n").default.resolve(), Some(Value::from(0)));
        assert_eq!(Field::boolean("b").default.resolve(), Some(Value::Bool(false)));
        assert_eq!(Field::string("s").default.resolve(), None);
        assert_eq!(Field::string("s").width(50).column_type.ddl(), "varchar(50)");
    }

    #[test]
    fn column_name_falls_back_to_attr() {
        assert_eq!(Field::text("content").column_name(), "content");
        assert_eq!(Field::text("content").column("body").column_name(), "body");
        assert_eq!(Field::float("created_at").to_string(), "<real:created_at>");
    }
}
