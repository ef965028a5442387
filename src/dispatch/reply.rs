//! Handler return values and their coercion into wire responses.

use crate::error::AppError;
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use serde_json::Value;
use std::borrow::Cow;

/// Key of a JSON object that selects a template instead of a JSON body.
pub const TEMPLATE_KEY: &str = "__template__";
/// String prefix that turns a reply into a redirect.
pub const REDIRECT_PREFIX: &str = "redirect:";

const HTML: &str = "text/html;charset=utf-8";
const JSON: &str = "application/json;charset=utf-8";
const PLAIN: &str = "text/plain;charset=utf-8";
const OCTETS: &str = "application/octet-stream";

/// Renders a named template with a JSON context into HTML.
pub trait Renderer: Send + Sync {
    fn render(&self, template: &str, context: &Value) -> Result<String, AppError>;
}

/// What a handler may return.
#[derive(Debug)]
pub enum Reply {
    Bytes(Bytes),
    /// HTML, or a redirect when prefixed with `redirect:`.
    Text(String),
    Json(Value),
    Status(u16),
    StatusMessage(u16, String),
    /// Forced `text/plain`.
    Plain(String),
    Response(Response),
}

impl From<&str> for Reply {
    fn from(s: &str) -> Self {
        Reply::Text(s.to_string())
    }
}

impl From<String> for Reply {
    fn from(s: String) -> Self {
        Reply::Text(s)
    }
}

impl From<Vec<u8>> for Reply {
    fn from(b: Vec<u8>) -> Self {
        Reply::Bytes(Bytes::from(b))
    }
}

impl From<Bytes> for Reply {
    fn from(b: Bytes) -> Self {
        Reply::Bytes(b)
    }
}

impl From<Value> for Reply {
    fn from(v: Value) -> Self {
        Reply::Json(v)
    }
}

impl From<u16> for Reply {
    fn from(status: u16) -> Self {
        Reply::Status(status)
    }
}

impl<M: Into<String>> From<(u16, M)> for Reply {
    fn from((status, message): (u16, M)) -> Self {
        Reply::StatusMessage(status, message.into())
    }
}

impl From<Response> for Reply {
    fn from(r: Response) -> Self {
        Reply::Response(r)
    }
}

/// Fully built response, independent of the transport.
#[derive(Clone, Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Response {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_body(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Self {
        Response::new(status)
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static(content_type))
            .body(body)
    }

    pub fn json(value: &Value) -> Self {
        Response::with_body(StatusCode::OK, JSON, value.to_string())
    }

    pub fn html(body: impl Into<Bytes>) -> Self {
        Response::with_body(StatusCode::OK, HTML, body)
    }

    /// 302 to `location`; a location that is not a valid header value is a 500.
    pub fn redirect(location: &str) -> Self {
        match HeaderValue::from_str(location) {
            Ok(v) => Response::new(StatusCode::FOUND).with_header(header::LOCATION, v),
            Err(_) => {
                tracing::warn!(location = %location.escape_debug(), "invalid redirect location");
                Response::with_body(StatusCode::INTERNAL_SERVER_ERROR, PLAIN, "Invalid redirect location.")
            }
        }
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// `Set-Cookie: name=value; Max-Age=..; Path=/; HttpOnly`.
    pub fn with_cookie(self, name: &str, value: &str, max_age_secs: u64) -> Self {
        let cookie = format!("{}={}; Max-Age={}; Path=/; HttpOnly", name, value, max_age_secs);
        match HeaderValue::from_str(&cookie) {
            Ok(v) => self.with_header(header::SET_COOKIE, v),
            Err(_) => {
                tracing::warn!(cookie = %name, "cookie value is not a valid header");
                self
            }
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let mut res = axum::response::Response::new(Body::from(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

fn status_in_range(n: i64) -> Option<StatusCode> {
    if (100..=599).contains(&n) {
        StatusCode::from_u16(n as u16).ok()
    } else {
        None
    }
}

fn text_reply(s: String) -> Response {
    match s.strip_prefix(REDIRECT_PREFIX) {
        Some(location) => Response::redirect(location),
        None => Response::html(s),
    }
}

fn plain(status: StatusCode, s: String) -> Response {
    Response::with_body(status, PLAIN, s)
}

/// Turn any handler reply into a response. Only template rendering can fail.
pub fn coerce(reply: Reply, renderer: Option<&dyn Renderer>) -> Result<Response, AppError> {
    let response = match reply {
        Reply::Response(r) => r,
        Reply::Bytes(b) => Response::with_body(StatusCode::OK, OCTETS, b),
        Reply::Text(s) => text_reply(s),
        Reply::Plain(s) => plain(StatusCode::OK, s),
        Reply::Status(n) => match status_in_range(n as i64) {
            Some(status) => Response::new(status),
            None => plain(StatusCode::OK, n.to_string()),
        },
        Reply::StatusMessage(n, message) => match status_in_range(n as i64) {
            Some(status) => plain(status, message),
            None => plain(StatusCode::OK, format!("[{}, {:?}]", n, message)),
        },
        Reply::Json(value) => return coerce_value(value, renderer),
    };
    Ok(response)
}

fn coerce_value(value: Value, renderer: Option<&dyn Renderer>) -> Result<Response, AppError> {
    match value {
        Value::String(s) => Ok(text_reply(s)),
        Value::Object(ref map) => match map.get(TEMPLATE_KEY) {
            Some(Value::String(template)) => {
                let renderer = renderer.ok_or_else(|| {
                    AppError::Render(format!("no renderer configured for '{}'", template))
                })?;
                Ok(Response::html(renderer.render(template, &value)?))
            }
            _ => Ok(Response::json(&value)),
        },
        Value::Number(ref n) => match n.as_i64().and_then(status_in_range) {
            Some(status) => Ok(Response::new(status)),
            None => Ok(plain(StatusCode::OK, value.to_string())),
        },
        Value::Array(ref items) => {
            if let [Value::Number(n), message] = items.as_slice() {
                if let Some(status) = n.as_i64().and_then(status_in_range) {
                    let message = match message {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    return Ok(plain(status, message));
                }
            }
            Ok(plain(StatusCode::OK, value.to_string()))
        }
        Value::Null | Value::Bool(_) => Ok(plain(StatusCode::OK, value.to_string())),
    }
}
