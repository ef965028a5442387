//! Entity instance: one row as an ordered field -> value mapping.

use crate::db::row::{cell_to_value, column_index};
use crate::error::ApiError;
use crate::schema::EntityDefinition;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use sqlx::any::AnyRow;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct Record {
    def: Arc<EntityDefinition>,
    /// Parallel to `def.fields()`; None means unset.
    values: Vec<Option<Value>>,
}

impl Record {
    /// Fresh instance with every field unset.
    pub fn new(def: Arc<EntityDefinition>) -> Self {
        let values = vec![None; def.fields().len()];
        Record { def, values }
    }

    /// Hydrate from a result row; columns are matched by column name.
    pub fn from_row(def: Arc<EntityDefinition>, row: &AnyRow) -> Self {
        let values = def
            .fields()
            .iter()
            .map(|f| column_index(row, f.column_name()).map(|i| cell_to_value(row, i, Some(&f.column_type))))
            .collect();
        Record { def, values }
    }

    pub fn definition(&self) -> &Arc<EntityDefinition> {
        &self.def
    }

    fn index(&self, attr: &str) -> Result<usize, ApiError> {
        self.def.index_of(attr).ok_or_else(|| {
            ApiError::not_found(attr, format!("{} has no field '{}'", self.def.name(), attr))
        })
    }

    pub fn set(&mut self, attr: &str, value: impl Into<Value>) -> Result<(), ApiError> {
        let i = self.index(attr)?;
        self.values[i] = Some(value.into());
        Ok(())
    }

    /// Builder form of [`Record::set`].
    pub fn with(mut self, attr: &str, value: impl Into<Value>) -> Result<Self, ApiError> {
        self.set(attr, value)?;
        Ok(self)
    }

    /// Current value; None when unset or NULL.
    pub fn get(&self, attr: &str) -> Option<&Value> {
        let i = self.def.index_of(attr)?;
        self.value_at(i)
    }

    pub fn get_str(&self, attr: &str) -> Option<&str> {
        self.get(attr).and_then(Value::as_str)
    }

    pub(crate) fn value_at(&self, i: usize) -> Option<&Value> {
        self.values[i].as_ref().filter(|v| !v.is_null())
    }

    /// Current value, resolving and caching the field default when unset.
    /// A generator runs at most once per instance and field.
    pub fn get_or_default(&mut self, attr: &str) -> Result<Value, ApiError> {
        let i = self.index(attr)?;
        Ok(self.resolve_at(i))
    }

    pub(crate) fn resolve_at(&mut self, i: usize) -> Value {
        if let Some(v) = self.value_at(i) {
            return v.clone();
        }
        let field = &self.def.fields()[i];
        match field.default.resolve() {
            Some(v) => {
                tracing::debug!(field = %field.attr, value = %v, "using default value");
                self.values[i] = Some(v.clone());
                v
            }
            None => Value::Null,
        }
    }

    pub fn key(&self) -> Option<&Value> {
        self.value_at(self.def.primary_key_index())
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in self.def.fields().iter().zip(&self.values) {
            map.serialize_entry(&field.attr, value.as_ref().unwrap_or(&Value::Null))?;
        }
        map.end()
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("entity", &self.def.name())
            .field("values", &self.to_json())
            .finish()
    }
}
