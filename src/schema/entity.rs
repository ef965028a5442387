//! Resolved entity definition: declaration validated and flattened for runtime use.

use crate::schema::Field;
use crate::sql::Templates;

/// Immutable, shared table mapping with its precomputed SQL.
#[derive(Debug)]
pub struct EntityDefinition {
    pub(crate) name: String,
    pub(crate) table: String,
    pub(crate) fields: Vec<Field>,
    pub(crate) primary_key: usize,
    /// Indices into `fields` of non-key fields, in declaration order.
    pub(crate) non_key: Vec<usize>,
    pub(crate) templates: Templates,
}

impl EntityDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn primary_key(&self) -> &Field {
        &self.fields[self.primary_key]
    }

    pub fn primary_key_index(&self) -> usize {
        self.primary_key
    }

    pub fn non_key_indices(&self) -> &[usize] {
        &self.non_key
    }

    pub fn non_key_fields(&self) -> impl Iterator<Item = &Field> + '_ {
        self.non_key.iter().map(move |&i| &self.fields[i])
    }

    pub fn index_of(&self, attr: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.attr == attr)
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }
}
