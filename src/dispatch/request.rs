//! Transport-neutral request and the resolved handler arguments.

use crate::error::ApiError;
use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Request body as handed over by the transport.
#[derive(Clone, Debug, Default)]
pub enum Body {
    #[default]
    Empty,
    Bytes(Bytes),
    /// Decoded multipart text fields, in arrival order.
    Form(Vec<(String, String)>),
}

impl Body {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::Bytes(b) => &b[..],
            Body::Empty | Body::Form(_) => &[],
        }
    }
}

#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    path_params: HashMap<String, String>,
    body: Body,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Request {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            path_params: HashMap::new(),
            body: Body::Empty,
        }
    }

    /// Split `path?query` as found in a request target.
    pub fn from_target(method: Method, target: &str) -> Self {
        match target.split_once('?') {
            Some((path, query)) => Request::new(method, path).with_query(query),
            None => Request::new(method, target),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Insert a header; invalid values are skipped.
    pub fn with_header(mut self, name: header::HeaderName, value: &str) -> Self {
        if let Ok(v) = HeaderValue::from_str(value) {
            self.headers.insert(name, v);
        }
        self
    }

    pub fn with_path_params(mut self, params: HashMap<String, String>) -> Self {
        self.path_params = params;
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Lowercased media type without parameters; None when absent or blank.
    pub fn content_type(&self) -> Option<String> {
        let raw = self.header(header::CONTENT_TYPE.as_str())?;
        let essence = raw.split(';').next().unwrap_or("").trim();
        if essence.is_empty() {
            None
        } else {
            Some(essence.to_ascii_lowercase())
        }
    }

    /// Value of the named cookie from the `Cookie` header(s).
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|line| line.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.trim_matches('"'))
    }
}

/// Arguments resolved for one handler call.
#[derive(Clone, Debug, Default)]
pub struct Args {
    values: Map<String, Value>,
    request: Option<Arc<Request>>,
}

impl Args {
    pub fn new(values: Map<String, Value>, request: Option<Arc<Request>>) -> Self {
        Args { values, request }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// String value; None for absent or non-string values.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Deserialize one argument. Strings holding JSON scalars (query and form values)
    /// are accepted for numeric and boolean targets.
    pub fn parse<T: DeserializeOwned>(&self, name: &str) -> Result<T, ApiError> {
        let value = self
            .get(name)
            .ok_or_else(|| ApiError::invalid(name, format!("{} is required", name)))?;
        if let Ok(v) = serde_json::from_value::<T>(value.clone()) {
            return Ok(v);
        }
        value
            .as_str()
            .and_then(|s| serde_json::from_str::<T>(s.trim()).ok())
            .ok_or_else(|| ApiError::invalid(name, format!("invalid value for {}", name)))
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn into_values(self) -> Map<String, Value> {
        self.values
    }

    /// The raw request, present when the handler declared it.
    pub fn request(&self) -> Option<&Request> {
        self.request.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_type_drops_parameters() {
        let req = Request::new(Method::POST, "/")
            .with_header(header::CONTENT_TYPE, "Application/JSON; charset=utf-8");
        assert_eq!(req.content_type().as_deref(), Some("application/json"));
        assert_eq!(Request::new(Method::POST, "/").content_type(), None);
    }

    #[test]
    fn cookie_lookup() {
        let req = Request::new(Method::GET, "/")
            .with_header(header::COOKIE, "theme=dark; awesession=abc-123-ff");
        assert_eq!(req.cookie("awesession"), Some("abc-123-ff"));
        assert_eq!(req.cookie("missing"), None);
    }

    #[test]
    fn target_splits_query() {
        let req = Request::from_target(Method::GET, "/api/blogs?page=2");
        assert_eq!(req.path(), "/api/blogs");
        assert_eq!(req.query(), Some("page=2"));
    }

    #[test]
    fn parse_accepts_stringly_numbers() {
        let mut m = Map::new();
        m.insert("page".into(), json!("3"));
        m.insert("name".into(), json!("Ann"));
        let args = Args::new(m, None);
        assert_eq!(args.parse::<u64>("page").unwrap(), 3);
        assert_eq!(args.parse::<String>("name").unwrap(), "Ann");
        let err = args.parse::<u64>("name").unwrap_err();
        assert_eq!(err.data.as_deref(), Some("name"));
        assert!(args.parse::<u64>("absent").is_err());
    }
}
