//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Declaration-time errors raised while registering an entity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("primary key not found for entity '{entity}'")]
    MissingPrimaryKey { entity: String },
    #[error("duplicate primary key for entity '{entity}': '{first}' and '{second}'")]
    DuplicatePrimaryKey {
        entity: String,
        first: String,
        second: String,
    },
    #[error("field '{field}' of entity '{entity}' uses a reserved name")]
    ReservedName { entity: String, field: String },
    #[error("duplicate field '{field}' in entity '{entity}'")]
    DuplicateField { entity: String, field: String },
    #[error("entity '{0}' has an empty name or table name")]
    EmptyName(String),
}

/// Declaration-time errors raised while building a route table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("route {path} has no valid HTTP method")]
    MissingMethod { path: String },
    #[error("route has no path")]
    MissingPath,
    #[error("invalid path pattern: {0}")]
    InvalidPattern(String),
    #[error("request parameter must be the last named parameter in {method} {path}")]
    MisplacedRequest { method: String, path: String },
    #[error("duplicate parameter '{name}' in {method} {path}")]
    DuplicateParam {
        method: String,
        path: String,
        name: String,
    },
    #[error("parameter name '{name}' is reserved ({method} {path})")]
    ReservedParam {
        method: String,
        path: String,
        name: String,
    },
    #[error("duplicate route {method} {path}")]
    DuplicateRoute { method: String, path: String },
    #[error("method {method} cannot be mounted ({path})")]
    UnsupportedMethod { method: String, path: String },
}

/// Domain error category, carried to the client as a machine-readable tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiErrorKind {
    Validation,
    NotFound,
    Permission,
    Conflict,
}

impl ApiErrorKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ApiErrorKind::Validation => "value:invalid",
            ApiErrorKind::NotFound => "value:notfound",
            ApiErrorKind::Permission => "permission:forbidden",
            ApiErrorKind::Conflict => "value:conflict",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorKind::Validation => StatusCode::BAD_REQUEST,
            ApiErrorKind::NotFound => StatusCode::NOT_FOUND,
            ApiErrorKind::Permission => StatusCode::FORBIDDEN,
            ApiErrorKind::Conflict => StatusCode::CONFLICT,
        }
    }
}

/// Error raised by handler code; the dispatcher turns it into a structured payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{tag}: {message}", tag = .kind.tag())]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// Name of the offending input or resource, if any.
    pub data: Option<String>,
    pub message: String,
}

impl ApiError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError {
            kind: ApiErrorKind::Validation,
            data: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn not_found(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError {
            kind: ApiErrorKind::NotFound,
            data: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn permission(message: impl Into<String>) -> Self {
        ApiError {
            kind: ApiErrorKind::Permission,
            data: Some("permission".into()),
            message: message.into(),
        }
    }

    pub fn conflict(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError {
            kind: ApiErrorKind::Conflict,
            data: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn payload(&self) -> ApiErrorBody<'_> {
        ApiErrorBody {
            error: self.kind.tag(),
            data: self.data.as_deref().unwrap_or(""),
            message: &self.message,
        }
    }
}

#[derive(Serialize)]
pub struct ApiErrorBody<'a> {
    pub error: &'static str,
    pub data: &'a str,
    pub message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.kind.status(), Json(self.payload())).into_response()
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("{operation} on {table} affected {actual} rows, expected 1")]
    RowCount {
        operation: &'static str,
        table: String,
        actual: u64,
    },
    #[error("invalid limit value: {0}")]
    InvalidLimit(String),
    #[error("template: {0}")]
    Render(String),
    #[error("config: {0}")]
    Config(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = match &self {
            AppError::Api(e) => return e.clone().into_response(),
            AppError::Db(_) => "database_error",
            AppError::RowCount { .. } => "row_count_mismatch",
            AppError::InvalidLimit(_) => "invalid_limit",
            AppError::Render(_) => "template_error",
            AppError::Config(_) | AppError::Schema(_) => "config_error",
        };
        tracing::error!(error = %self, "request failed");
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
