//! Route descriptors: method, path pattern, declared parameters and the handler.

use crate::dispatch::{Args, ParamSpec, Reply};
use crate::error::{AppError, RouteError};
use async_trait::async_trait;
use axum::http::Method;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// An async request handler over application state `S`.
#[async_trait]
pub trait Handler<S>: Send + Sync + 'static {
    async fn call(&self, state: S, args: Args) -> Result<Reply, AppError>;
}

#[async_trait]
impl<S, F, Fut> Handler<S> for F
where
    S: Send + 'static,
    F: Fn(S, Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Reply, AppError>> + Send + 'static,
{
    async fn call(&self, state: S, args: Args) -> Result<Reply, AppError> {
        (self)(state, args).await
    }
}

pub struct Route<S> {
    method: Method,
    path: String,
    params: ParamSpec,
    handler: Arc<dyn Handler<S>>,
}

impl<S: Send + 'static> Route<S> {
    pub fn new(
        method: &str,
        path: &str,
        params: ParamSpec,
        handler: impl Handler<S>,
    ) -> Result<Self, RouteError> {
        if path.is_empty() {
            return Err(RouteError::MissingPath);
        }
        let method = parse_method(method, path)?;
        check_pattern(path)?;
        params.validate(method.as_str(), path)?;
        Ok(Route {
            method,
            path: path.to_string(),
            params,
            handler: Arc::new(handler),
        })
    }

    pub fn get(path: &str, params: ParamSpec, handler: impl Handler<S>) -> Result<Self, RouteError> {
        Route::new("GET", path, params, handler)
    }

    pub fn post(path: &str, params: ParamSpec, handler: impl Handler<S>) -> Result<Self, RouteError> {
        Route::new("POST", path, params, handler)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Pattern as registered, with `{name}` segments.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &ParamSpec {
        &self.params
    }

    pub fn handler(&self) -> &Arc<dyn Handler<S>> {
        &self.handler
    }

    /// Pattern in axum syntax (`:name` segments).
    pub fn axum_path(&self) -> String {
        self.path
            .split('/')
            .map(|seg| match param_name(seg) {
                Some(name) => format!(":{}", name),
                None => seg.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl<S> fmt::Debug for Route<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .finish()
    }
}

fn parse_method(method: &str, path: &str) -> Result<Method, RouteError> {
    let trimmed = method.trim();
    if trimmed.is_empty() {
        return Err(RouteError::MissingMethod { path: path.to_string() });
    }
    Method::from_bytes(trimmed.to_ascii_uppercase().as_bytes())
        .map_err(|_| RouteError::MissingMethod { path: path.to_string() })
}

fn param_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

fn check_pattern(path: &str) -> Result<(), RouteError> {
    if !path.starts_with('/') {
        return Err(RouteError::InvalidPattern(path.to_string()));
    }
    for seg in path.split('/') {
        match param_name(seg) {
            Some(name) => {
                let valid = !name.is_empty()
                    && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
                if !valid {
                    return Err(RouteError::InvalidPattern(path.to_string()));
                }
            }
            None if seg.contains('{') || seg.contains('}') || seg.starts_with(':') => {
                return Err(RouteError::InvalidPattern(path.to_string()));
            }
            None => {}
        }
    }
    Ok(())
}

/// Ordered set of routes; one handler per (method, path).
pub struct RouteTable<S> {
    routes: Vec<Route<S>>,
}

impl<S> Default for RouteTable<S> {
    fn default() -> Self {
        RouteTable { routes: Vec::new() }
    }
}

impl<S: Send + 'static> RouteTable<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, route: Route<S>) -> Result<(), RouteError> {
        if self.find(&route.method, &route.path).is_some() {
            return Err(RouteError::DuplicateRoute {
                method: route.method.to_string(),
                path: route.path.clone(),
            });
        }
        tracing::info!(method = %route.method, path = %route.path, "add route");
        self.routes.push(route);
        Ok(())
    }

    /// Builder form of [`RouteTable::add`].
    pub fn route(mut self, route: Route<S>) -> Result<Self, RouteError> {
        self.add(route)?;
        Ok(self)
    }

    pub fn find(&self, method: &Method, path: &str) -> Option<&Route<S>> {
        self.routes
            .iter()
            .find(|r| r.method == *method && r.path == path)
    }

    pub fn routes(&self) -> &[Route<S>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn into_routes(self) -> Vec<Route<S>> {
        self.routes
    }
}
