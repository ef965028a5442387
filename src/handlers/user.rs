//! User handlers: list, register, authenticate.

use crate::auth::{hash_password, user_to_cookie, COOKIE_NAME, PASSWORD_MASK, SESSION_MAX_AGE};
use crate::dispatch::{Args, Reply, Response};
use crate::error::{ApiError, AppError};
use crate::handlers::{masked, page_index};
use crate::models::next_id;
use crate::page::Page;
use crate::service::{CrudService, Record};
use crate::sql::FindAll;
use crate::state::AppState;
use regex::Regex;
use serde_json::{json, Value};

const EMAIL_PATTERN: &str = r"^[a-z0-9\.\-\_]+\@[a-z0-9\-\_]+(\.[a-z0-9\-\_]+){1,4}$";
const SHA1_PATTERN: &str = r"^[0-9a-f]{40}$";

fn is_match(pattern: &str, s: &str) -> Result<bool, AppError> {
    let re = Regex::new(pattern).map_err(|e| AppError::Config(format!("invalid pattern: {}", e)))?;
    Ok(re.is_match(s))
}

async fn find_by_email(state: &AppState, email: &str) -> Result<Option<Record>, AppError> {
    let query = FindAll::new()
        .filter("email=?", vec![Value::from(email)])
        .limit(1);
    let mut users = CrudService::find_all(&state.db, &state.models.users, &query).await?;
    Ok(users.pop())
}

/// Masked user JSON with a fresh session cookie.
fn signed_in(state: &AppState, mut user: Record) -> Result<Reply, AppError> {
    let cookie = user_to_cookie(&user, SESSION_MAX_AGE, &state.session_secret);
    user.set("passwd", PASSWORD_MASK)?;
    Ok(Response::json(&user.to_json())
        .with_cookie(COOKIE_NAME, &cookie, SESSION_MAX_AGE)
        .into())
}

/// GET /api/users?page=
pub async fn api_get_users(state: AppState, args: Args) -> Result<Reply, AppError> {
    let users = &state.models.users;
    let total = CrudService::count(&state.db, users, "count(id)", None, &[])
        .await?
        .unwrap_or(0);
    let page = Page::with_default_size(total.max(0) as u64, page_index(&args));
    if page.limit == 0 {
        return Ok(json!({ "page": page, "users": [] }).into());
    }
    let query = FindAll::new()
        .order_by("created_at desc")
        .limit((page.offset, page.limit));
    let list: Vec<Value> = CrudService::find_all(&state.db, users, &query)
        .await?
        .into_iter()
        .map(masked)
        .collect::<Result<_, _>>()?;
    Ok(json!({ "page": page, "users": list }).into())
}

/// POST /api/users {email, name, passwd}; `passwd` is the client-side sha1 hex.
pub async fn api_register_user(state: AppState, args: Args) -> Result<Reply, AppError> {
    let email = args.str("email").unwrap_or_default().trim().to_lowercase();
    let name = args.str("name").unwrap_or_default().trim().to_string();
    let passwd = args.str("passwd").unwrap_or_default();
    if name.is_empty() {
        return Err(ApiError::invalid("name", "Invalid name.").into());
    }
    if !is_match(EMAIL_PATTERN, &email)? {
        return Err(ApiError::invalid("email", "Invalid email.").into());
    }
    if !is_match(SHA1_PATTERN, passwd)? {
        return Err(ApiError::invalid("passwd", "Invalid password.").into());
    }
    if find_by_email(&state, &email).await?.is_some() {
        return Err(ApiError::conflict("email", "Email is already in use.").into());
    }

    let id = next_id();
    let mut user = Record::new(state.models.users.clone())
        .with("id", id.as_str())?
        .with("email", email.as_str())?
        .with("name", name.as_str())?
        .with("passwd", hash_password(&id, passwd))?
        .with("image", "about:blank")?;
    CrudService::save(&state.db, &mut user).await?;
    tracing::info!(user = %id, "user registered");
    signed_in(&state, user)
}

/// POST /api/authenticate {email, passwd}
pub async fn api_authenticate(state: AppState, args: Args) -> Result<Reply, AppError> {
    let email = args.str("email").unwrap_or_default().trim().to_lowercase();
    let passwd = args.str("passwd").unwrap_or_default();
    if email.is_empty() {
        return Err(ApiError::invalid("email", "Invalid email.").into());
    }
    if passwd.is_empty() {
        return Err(ApiError::invalid("passwd", "Invalid password.").into());
    }
    let Some(user) = find_by_email(&state, &email).await? else {
        return Err(ApiError::invalid("email", "Email not exist.").into());
    };
    let id = user.get_str("id").unwrap_or_default();
    if user.get_str("passwd") != Some(hash_password(id, passwd).as_str()) {
        return Err(ApiError::invalid("passwd", "Invalid password.").into());
    }
    signed_in(&state, user)
}
