//! Entity declaration validation: exactly one primary key, no reserved or repeated names.

use crate::error::SchemaError;
use crate::schema::EntityDef;
use crate::sql::COUNT_ALIAS;
use std::collections::HashSet;

/// Names no field may use as attribute or column.
pub const RESERVED_NAMES: &[&str] = &[COUNT_ALIAS];

/// Validate a declaration; returns the index of the primary-key field.
pub fn validate(def: &EntityDef) -> Result<usize, SchemaError> {
    if def.name.trim().is_empty() || def.table_name().trim().is_empty() {
        return Err(SchemaError::EmptyName(def.name.clone()));
    }

    let mut seen_attrs = HashSet::new();
    let mut seen_columns = HashSet::new();
    let mut pk: Option<usize> = None;

    for (i, f) in def.fields.iter().enumerate() {
        if RESERVED_NAMES.contains(&f.attr.as_str()) || RESERVED_NAMES.contains(&f.column_name()) {
            return Err(SchemaError::ReservedName {
                entity: def.name.clone(),
                field: f.attr.clone(),
            });
        }
        if !seen_attrs.insert(f.attr.as_str()) || !seen_columns.insert(f.column_name()) {
            return Err(SchemaError::DuplicateField {
                entity: def.name.clone(),
                field: f.attr.clone(),
            });
        }
        if f.primary_key {
            if let Some(first) = pk {
                return Err(SchemaError::DuplicatePrimaryKey {
                    entity: def.name.clone(),
                    first: def.fields[first].attr.clone(),
                    second: f.attr.clone(),
                });
            }
            pk = Some(i);
        }
    }

    pk.ok_or_else(|| SchemaError::MissingPrimaryKey {
        entity: def.name.clone(),
    })
}
