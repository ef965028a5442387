//! Blog entities: users, blogs, comments.

use crate::error::SchemaError;
use crate::schema::{EntityDef, EntityDefinition, Field, SchemaRegistry};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// 50-char id: zero-padded millisecond timestamp, uuid4 hex, `000`.
pub fn next_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis().max(0);
    format!("{:015}{}000", millis, Uuid::new_v4().simple())
}

/// Current time in epoch seconds.
pub fn now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

fn id_field() -> Field {
    Field::string("id")
        .width(50)
        .primary_key()
        .default_with(|| Value::from(next_id()))
}

fn created_at() -> Field {
    Field::float("created_at").default_with(|| Value::from(now()))
}

pub fn user_def() -> EntityDef {
    EntityDef::new("User")
        .table("users")
        .field(id_field())
        .field(Field::string("email").width(50))
        .field(Field::string("passwd").width(50))
        .field(Field::boolean("admin"))
        .field(Field::string("name").width(50))
        .field(Field::string("image").width(500))
        .field(created_at())
}

pub fn blog_def() -> EntityDef {
    EntityDef::new("Blog")
        .table("blogs")
        .field(id_field())
        .field(Field::string("user_id").width(50))
        .field(Field::string("user_name").width(50))
        .field(Field::string("user_image").width(500))
        .field(Field::string("name").width(50))
        .field(Field::string("summary").width(200))
        .field(Field::text("content"))
        .field(created_at())
}

pub fn comment_def() -> EntityDef {
    EntityDef::new("Comment")
        .table("comments")
        .field(id_field())
        .field(Field::string("blog_id").width(50))
        .field(Field::string("user_id").width(50))
        .field(Field::string("user_name").width(50))
        .field(Field::string("user_image").width(500))
        .field(Field::text("content"))
        .field(created_at())
}

/// Resolved definitions used by the handlers.
#[derive(Clone, Debug)]
pub struct Models {
    pub users: Arc<EntityDefinition>,
    pub blogs: Arc<EntityDefinition>,
    pub comments: Arc<EntityDefinition>,
}

impl Models {
    pub fn register(registry: &SchemaRegistry) -> Result<Self, SchemaError> {
        Ok(Models {
            users: registry.register(user_def())?,
            blogs: registry.register(blog_def())?,
            comments: registry.register(comment_def())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::Dialect;

    #[test]
    fn ids_are_fifty_chars_and_sortable() {
        let a = next_id();
        assert_eq!(a.len(), 50);
        assert!(a.ends_with("000"));
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(next_id() > a);
    }

    #[test]
    fn registers_all_three() {
        let registry = SchemaRegistry::new(Dialect::MySql);
        let models = Models::register(&registry).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(models.users.primary_key().attr, "id");
        assert_eq!(
            models.blogs.templates().select_by_key,
            "select `id`, `user_id`, `user_name`, `user_image`, `name`, `summary`, `content`, `created_at` from `blogs` where `id`=?"
        );
        let again = Models::register(&registry).unwrap();
        assert!(Arc::ptr_eq(&models.users, &again.users));
    }
}
