//! Mount a dispatch route table on an axum router.

mod common;

pub use common::common_routes;

use crate::dispatch::{dispatch, Body, Renderer, Request, Route, RouteTable};
use crate::error::RouteError;
use crate::handlers::{api_routes, view_routes};
use crate::state::AppState;
use axum::extract::{FromRequest, Multipart, Path};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{on, MethodFilter, MethodRouter};
use axum::Router;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

/// Largest request body accepted, in bytes.
pub const BODY_LIMIT: usize = 2 * 1024 * 1024;

async fn read_body(req: axum::extract::Request) -> Result<Request, Response> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let headers = req.headers().clone();

    let is_multipart = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("multipart/form-data"));

    let body = if is_multipart {
        let mut multipart = Multipart::from_request(req, &())
            .await
            .map_err(IntoResponse::into_response)?;
        let mut fields = Vec::new();
        while let Some(field) = multipart.next_field().await.map_err(IntoResponse::into_response)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if field.file_name().is_some() {
                tracing::debug!(field = %name, "skip file upload field");
                continue;
            }
            let text = field.text().await.map_err(IntoResponse::into_response)?;
            fields.push((name, text));
        }
        Body::Form(fields)
    } else {
        let bytes = axum::body::to_bytes(req.into_body(), BODY_LIMIT)
            .await
            .map_err(|_| (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large.").into_response())?;
        if bytes.is_empty() {
            Body::Empty
        } else {
            Body::Bytes(bytes)
        }
    };

    let mut request = Request::new(method, path).with_headers(headers).with_body(body);
    if let Some(q) = query {
        request = request.with_query(q);
    }
    Ok(request)
}

fn method_router<S>(
    route: Arc<Route<S>>,
    state: S,
    renderer: Option<Arc<dyn Renderer>>,
) -> Result<MethodRouter, RouteError>
where
    S: Clone + Send + Sync + 'static,
{
    let filter = MethodFilter::try_from(route.method().clone()).map_err(|_| {
        RouteError::UnsupportedMethod {
            method: route.method().to_string(),
            path: route.path().to_string(),
        }
    })?;
    let handler = move |path: Option<Path<HashMap<String, String>>>, req: axum::extract::Request| {
        let route = route.clone();
        let state = state.clone();
        let renderer = renderer.clone();
        async move {
            let request = match read_body(req).await {
                Ok(r) => r,
                Err(rejection) => return rejection,
            };
            let params = path.map(|Path(p)| p).unwrap_or_default();
            dispatch(&route, state, request.with_path_params(params), renderer.as_deref()).await
        }
    };
    Ok(on(filter, handler))
}

/// One axum route per path pattern, one method filter per registered method.
pub fn into_router<S>(
    table: RouteTable<S>,
    state: S,
    renderer: Option<Arc<dyn Renderer>>,
) -> Result<Router, RouteError>
where
    S: Clone + Send + Sync + 'static,
{
    let mut by_path: BTreeMap<String, MethodRouter> = BTreeMap::new();
    for route in table.into_routes() {
        let path = route.axum_path();
        tracing::info!(method = %route.method(), path = %route.path(), "mount route");
        let mr = method_router(Arc::new(route), state.clone(), renderer.clone())?;
        let merged = match by_path.remove(&path) {
            Some(existing) => existing.merge(mr),
            None => mr,
        };
        by_path.insert(path, merged);
    }
    let router = by_path
        .into_iter()
        .fold(Router::new(), |router, (path, mr)| router.route(&path, mr));
    Ok(router.layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(BODY_LIMIT))))
}

/// The full application: blog API, health, readiness and version.
/// HTML views are mounted only when a renderer is supplied.
pub fn app(state: AppState, renderer: Option<Arc<dyn Renderer>>) -> Result<Router, RouteError> {
    let mut table = api_routes()?;
    if renderer.is_some() {
        for route in view_routes()?.into_routes() {
            table.add(route)?;
        }
    } else {
        tracing::info!("no renderer configured, HTML views not mounted");
    }
    let blog = into_router(table, state.clone(), renderer)?;
    Ok(blog.merge(common_routes(state)))
}
