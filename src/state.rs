//! Shared application state handed to every handler.

use crate::db::Database;
use crate::models::Models;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub models: Arc<Models>,
    /// Signs session cookies.
    pub session_secret: Arc<str>,
}

impl AppState {
    pub fn new(db: Database, models: Models, session_secret: &str) -> Self {
        AppState {
            db,
            models: Arc::new(models),
            session_secret: Arc::from(session_secret),
        }
    }
}
