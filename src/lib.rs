//! Blog core: schema-mapped persistence over a pooled SQL connection and a
//! declarative handler dispatcher that coerces handler replies into responses.

pub mod auth;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod models;
pub mod page;
pub mod routes;
pub mod schema;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;

pub use db::{Database, PoolCell, PoolConfig, RowCountPolicy};
pub use dispatch::{Args, ParamSpec, Renderer, Reply, Route, RouteTable};
pub use error::{ApiError, ApiErrorKind, AppError, RouteError, SchemaError};
pub use models::Models;
pub use page::Page;
pub use routes::{app, common_routes, into_router};
pub use schema::{EntityDef, EntityDefinition, Field, SchemaRegistry};
pub use service::{CrudService, Record};
pub use settings::Settings;
pub use sql::{Dialect, FindAll, Limit};
pub use state::AppState;
