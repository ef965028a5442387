//! Registry of resolved entity definitions, built once at startup.

use crate::error::SchemaError;
use crate::schema::{validate, EntityDef, EntityDefinition};
use crate::sql::{build_templates, Dialect};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

pub struct SchemaRegistry {
    dialect: Dialect,
    entities: RwLock<HashMap<String, Arc<EntityDefinition>>>,
}

impl SchemaRegistry {
    pub fn new(dialect: Dialect) -> Self {
        SchemaRegistry {
            dialect,
            entities: RwLock::new(HashMap::new()),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Validate and resolve `def`. Registering the same entity name again returns the cached definition.
    pub fn register(&self, def: EntityDef) -> Result<Arc<EntityDefinition>, SchemaError> {
        if let Some(existing) = self.get(&def.name) {
            tracing::debug!(entity = %def.name, "entity already registered");
            return Ok(existing);
        }
        let resolved = Arc::new(resolve(self.dialect, def)?);
        let mut entities = self.entities.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entities
            .entry(resolved.name.clone())
            .or_insert_with(|| resolved.clone());
        Ok(entry.clone())
    }

    pub fn get(&self, name: &str) -> Option<Arc<EntityDefinition>> {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entities.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build the resolved definition (validates first).
pub fn resolve(dialect: Dialect, def: EntityDef) -> Result<EntityDefinition, SchemaError> {
    let primary_key = validate(&def)?;
    let table = def.table_name().to_string();
    tracing::info!(entity = %def.name, table = %table, "found model");
    for f in &def.fields {
        tracing::debug!(attr = %f.attr, field = %f, "found mapping");
    }

    let non_key: Vec<usize> = (0..def.fields.len()).filter(|&i| i != primary_key).collect();
    let columns: Vec<&str> = non_key.iter().map(|&i| def.fields[i].column_name()).collect();
    let templates = build_templates(dialect, &table, def.fields[primary_key].column_name(), &columns);

    Ok(EntityDefinition {
        name: def.name,
        table,
        fields: def.fields,
        primary_key,
        non_key,
        templates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;

    fn blog() -> EntityDef {
        EntityDef::new("Blog")
            .table("blogs")
            .field(Field::string("id").primary_key().width(50))
            .field(Field::string("name").width(50))
            .field(Field::text("content").column("body"))
    }

    #[test]
    fn register_precomputes_templates_with_column_names() {
        let registry = SchemaRegistry::new(Dialect::Sqlite);
        let def = registry.register(blog()).unwrap();
        assert_eq!(def.primary_key().attr, "id");
        assert_eq!(
            def.templates().insert,
            "insert into \"blogs\" (\"name\", \"body\", \"id\") values (?, ?, ?)"
        );
        assert_eq!(
            def.templates().update,
            "update \"blogs\" set \"name\"=?, \"body\"=? where \"id\"=?"
        );
        assert_eq!(def.non_key_fields().map(|f| f.attr.as_str()).collect::<Vec<_>>(), ["name", "content"]);
    }

    #[test]
    fn register_is_idempotent_per_entity() {
        let registry = SchemaRegistry::new(Dialect::MySql);
        let a = registry.register(blog()).unwrap();
        let b = registry.register(blog()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn invalid_declaration_is_not_cached() {
        let registry = SchemaRegistry::new(Dialect::MySql);
        let bad = EntityDef::new("Tag").field(Field::string("label"));
        assert!(registry.register(bad).is_err());
        assert!(registry.get("Tag").is_none());
    }
}
