//! Blog handlers and the route table that mounts them.

pub mod blog;
pub mod user;

use crate::auth::{cookie_to_user, COOKIE_NAME, PASSWORD_MASK};
use crate::dispatch::{Args, ParamSpec, Route, RouteTable};
use crate::error::{ApiError, AppError, RouteError};
use crate::service::Record;
use crate::state::AppState;
use serde_json::Value;

/// `page` argument, 1 when absent or unparsable.
pub(crate) fn page_index(args: &Args) -> u64 {
    args.parse::<u64>("page").unwrap_or(1).max(1)
}

pub(crate) fn masked(mut user: Record) -> Result<Value, AppError> {
    user.set("passwd", PASSWORD_MASK)?;
    Ok(user.to_json())
}

/// Signed-in user from the session cookie of the raw request, if any.
pub(crate) async fn current_user(state: &AppState, args: &Args) -> Result<Option<Record>, AppError> {
    let Some(cookie) = args.request().and_then(|r| r.cookie(COOKIE_NAME)) else {
        return Ok(None);
    };
    let user = cookie_to_user(&state.db, &state.models.users, cookie, &state.session_secret).await?;
    if let Some(u) = &user {
        tracing::debug!(user = u.get_str("email").unwrap_or_default(), "set current user");
    }
    Ok(user)
}

fn paged() -> ParamSpec {
    ParamSpec::new().optional("page", "1")
}

fn by_id() -> ParamSpec {
    ParamSpec::new().required("id")
}

pub(crate) async fn require_admin(state: &AppState, args: &Args) -> Result<Record, AppError> {
    match current_user(state, args).await? {
        Some(user) if user.get("admin") == Some(&Value::Bool(true)) => Ok(user),
        _ => Err(ApiError::permission("Please signin as admin.").into()),
    }
}

/// HTML views. Their replies name templates, so they need a renderer.
pub fn view_routes() -> Result<RouteTable<AppState>, RouteError> {
    RouteTable::new()
        .route(Route::get("/", paged(), blog::index)?)?
        .route(Route::get("/blog/{id}", by_id(), blog::get_blog)?)?
        .route(Route::get("/manage/blogs", paged().request(), blog::manage_blogs)?)
}

/// JSON API routes with their declared parameters.
pub fn api_routes() -> Result<RouteTable<AppState>, RouteError> {
    RouteTable::new()
        .route(Route::get("/api/users", paged(), user::api_get_users)?)?
        .route(Route::post(
            "/api/users",
            ParamSpec::new().required("email").required("name").required("passwd"),
            user::api_register_user,
        )?)?
        .route(Route::post(
            "/api/authenticate",
            ParamSpec::new().required("email").required("passwd"),
            user::api_authenticate,
        )?)?
        .route(Route::get("/api/blogs", paged(), blog::api_blogs)?)?
        .route(Route::post(
            "/api/blogs",
            ParamSpec::new()
                .required("name")
                .required("summary")
                .required("content")
                .request(),
            blog::api_create_blog,
        )?)?
        .route(Route::get("/api/blogs/{id}", by_id(), blog::api_get_blog)?)?
        .route(Route::get("/api/blogs/{id}/comments", by_id(), blog::api_blog_comments)?)
}
