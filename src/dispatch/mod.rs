//! Request dispatch: resolve handler arguments, invoke, coerce the reply.
//!
//! Per request, in order: gather a mapping from the body (POST) or query string (GET),
//! filter it to the declared names unless the handler takes a catch-all, overlay path
//! parameters, inject the raw request if asked for, fill defaults, check required names,
//! call the handler and turn its reply into a response.

mod params;
mod reply;
mod request;
mod route;

pub use params::{Param, ParamSpec, REQUEST_PARAM};
pub use reply::{coerce, Renderer, Reply, Response, REDIRECT_PREFIX, TEMPLATE_KEY};
pub use request::{Args, Body, Request};
pub use route::{Handler, Route, RouteTable};

use crate::error::AppError;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::Arc;
use thiserror::Error;

/// Malformed requests, answered with a plain-text client error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Missing Content-Type.")]
    MissingContentType,
    #[error("Unsupported Content-Type: {0}")]
    UnsupportedContentType(String),
    #[error("JSON body must be object.")]
    BodyNotObject,
    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),
    #[error("Invalid form body.")]
    InvalidForm,
    #[error("Missing argument: {0}")]
    MissingArgument(String),
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), self.to_string()).into_response()
    }
}

fn body_mapping(request: &Request) -> Result<Map<String, Value>, DispatchError> {
    let content_type = request
        .content_type()
        .ok_or(DispatchError::MissingContentType)?;
    match content_type.as_str() {
        "application/json" => {
            let bytes = request.body().as_bytes();
            let value: Value = serde_json::from_slice(bytes)
                .map_err(|e| DispatchError::InvalidJson(e.to_string()))?;
            match value {
                Value::Object(map) => Ok(map),
                _ => Err(DispatchError::BodyNotObject),
            }
        }
        "application/x-www-form-urlencoded" => {
            Ok(first_wins(url::form_urlencoded::parse(request.body().as_bytes())))
        }
        "multipart/form-data" => match request.body() {
            Body::Form(fields) => Ok(first_wins(
                fields
                    .iter()
                    .map(|(k, v)| (Cow::Borrowed(k.as_str()), Cow::Borrowed(v.as_str()))),
            )),
            Body::Empty => Ok(Map::new()),
            Body::Bytes(_) => Err(DispatchError::InvalidForm),
        },
        _ => Err(DispatchError::UnsupportedContentType(content_type)),
    }
}

fn first_wins<'a, I>(pairs: I) -> Map<String, Value>
where
    I: Iterator<Item = (Cow<'a, str>, Cow<'a, str>)>,
{
    let mut map = Map::new();
    for (k, v) in pairs {
        if !map.contains_key(k.as_ref()) {
            map.insert(k.into_owned(), Value::String(v.into_owned()));
        }
    }
    map
}

fn query_mapping(request: &Request) -> Option<Map<String, Value>> {
    let query = request.query().filter(|q| !q.is_empty())?;
    Some(first_wins(url::form_urlencoded::parse(query.as_bytes())))
}

/// Build the argument set for `params` from `request`.
pub fn resolve_args(params: &ParamSpec, request: Request) -> Result<Args, DispatchError> {
    let mut mapping = None;
    if params.has_named() || params.has_extra() {
        if *request.method() == Method::POST {
            mapping = Some(body_mapping(&request)?);
        } else if *request.method() == Method::GET {
            mapping = query_mapping(&request);
        }
    }

    let path_params = request.path_params();
    let mut values = match mapping {
        None => path_params
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<Map<_, _>>(),
        Some(mut map) => {
            if !params.has_extra() {
                map.retain(|k, _| params.is_declared(k));
            }
            for (k, v) in path_params {
                if map.contains_key(k) {
                    tracing::warn!(arg = %k, "duplicate arg name in named arg and path params");
                }
                map.insert(k.clone(), Value::String(v.clone()));
            }
            map
        }
    };

    for p in params.params() {
        if let Param::Optional(name, default) = p {
            if !values.contains_key(name) {
                values.insert(name.clone(), default.clone());
            }
        }
    }

    for p in params.params() {
        if let Param::Required(name) = p {
            if !values.contains_key(name) {
                return Err(DispatchError::MissingArgument(name.clone()));
            }
        }
    }

    let request = params.has_request().then(|| Arc::new(request));
    Ok(Args::new(values, request))
}

fn failure(err: AppError) -> axum::response::Response {
    match err {
        AppError::Api(e) => {
            tracing::info!(error = %e, "handler rejected request");
            e.into_response()
        }
        other => other.into_response(),
    }
}

/// Run one request through `route`. Total: every outcome becomes a response.
pub async fn dispatch<S>(
    route: &Route<S>,
    state: S,
    request: Request,
    renderer: Option<&dyn Renderer>,
) -> axum::response::Response
where
    S: Send + 'static,
{
    tracing::debug!(method = %request.method(), path = %request.path(), "call handler");
    let args = match resolve_args(route.params(), request) {
        Ok(args) => args,
        Err(e) => return e.into_response(),
    };
    let reply = match route.handler().call(state, args).await {
        Ok(reply) => reply,
        Err(e) => return failure(e),
    };
    match coerce(reply, renderer) {
        Ok(response) => response.into_response(),
        Err(e) => failure(e),
    }
}
