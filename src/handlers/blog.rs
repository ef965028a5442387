//! Blog and comment handlers, plus the HTML views.

use crate::dispatch::{Args, Reply, TEMPLATE_KEY};
use crate::error::{ApiError, AppError};
use crate::handlers::{current_user, page_index, require_admin};
use crate::models::Models;
use crate::page::Page;
use crate::service::{CrudService, Record};
use crate::sql::FindAll;
use crate::state::AppState;
use serde_json::{json, Value};

async fn blog_page(state: &AppState, index: u64) -> Result<(Page, Vec<Record>), AppError> {
    let blogs = &state.models.blogs;
    let total = CrudService::count(&state.db, blogs, "count(id)", None, &[])
        .await?
        .unwrap_or(0);
    let page = Page::with_default_size(total.max(0) as u64, index);
    if page.limit == 0 {
        return Ok((page, Vec::new()));
    }
    let query = FindAll::new()
        .order_by("created_at desc")
        .limit((page.offset, page.limit));
    Ok((page, CrudService::find_all(&state.db, blogs, &query).await?))
}

async fn comments_of(state: &AppState, blog_id: &str) -> Result<Vec<Record>, AppError> {
    let query = FindAll::new()
        .filter("blog_id=?", vec![Value::from(blog_id)])
        .order_by("created_at desc");
    CrudService::find_all(&state.db, &state.models.comments, &query).await
}

fn required_text(args: &Args, name: &str, what: &str) -> Result<String, ApiError> {
    match args.str(name).map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(ApiError::invalid(name, format!("{} cannot be empty.", what))),
    }
}

/// GET /
pub async fn index(state: AppState, args: Args) -> Result<Reply, AppError> {
    let (page, blogs) = blog_page(&state, page_index(&args)).await?;
    Ok(json!({ TEMPLATE_KEY: "blogs.html", "page": page, "blogs": blogs }).into())
}

/// GET /blog/{id}: HTML view with comments.
pub async fn get_blog(state: AppState, args: Args) -> Result<Reply, AppError> {
    let id = args.str("id").unwrap_or_default();
    let Some(blog) = CrudService::find_by_key(&state.db, &state.models.blogs, id).await? else {
        return Ok((404, "blog not found").into());
    };
    let comments = comments_of(&state, id).await?;
    Ok(json!({ TEMPLATE_KEY: "blog.html", "blog": blog, "comments": comments }).into())
}

/// GET /manage/blogs: admins only; others are sent to sign in.
pub async fn manage_blogs(state: AppState, args: Args) -> Result<Reply, AppError> {
    match current_user(&state, &args).await? {
        Some(user) if user.get("admin") == Some(&Value::Bool(true)) => Ok(json!({
            TEMPLATE_KEY: "manage_blogs.html",
            "page_index": page_index(&args),
            "__user__": user,
        })
        .into()),
        _ => Ok("redirect:/signin".into()),
    }
}

/// GET /api/blogs?page=
pub async fn api_blogs(state: AppState, args: Args) -> Result<Reply, AppError> {
    let (page, blogs) = blog_page(&state, page_index(&args)).await?;
    Ok(json!({ "page": page, "blogs": blogs }).into())
}

/// GET /api/blogs/{id}
pub async fn api_get_blog(state: AppState, args: Args) -> Result<Reply, AppError> {
    let id = args.str("id").unwrap_or_default();
    match CrudService::find_by_key(&state.db, &state.models.blogs, id).await? {
        Some(blog) => Ok(blog.to_json().into()),
        None => Err(ApiError::not_found("blog", "blog not found").into()),
    }
}

/// POST /api/blogs {name, summary, content}; requires an admin session.
pub async fn api_create_blog(state: AppState, args: Args) -> Result<Reply, AppError> {
    let user = require_admin(&state, &args).await?;
    let name = required_text(&args, "name", "name")?;
    let summary = required_text(&args, "summary", "summary")?;
    let content = required_text(&args, "content", "content")?;

    let mut blog = new_blog(&state.models, &user)?
        .with("name", name)?
        .with("summary", summary)?
        .with("content", content)?;
    CrudService::save(&state.db, &mut blog).await?;
    Ok(blog.to_json().into())
}

fn new_blog(models: &Models, author: &Record) -> Result<Record, ApiError> {
    let field = |name: &str| author.get(name).cloned().unwrap_or(Value::Null);
    Record::new(models.blogs.clone())
        .with("user_id", field("id"))?
        .with("user_name", field("name"))?
        .with("user_image", field("image"))
}

/// GET /api/blogs/{id}/comments
pub async fn api_blog_comments(state: AppState, args: Args) -> Result<Reply, AppError> {
    let id = args.str("id").unwrap_or_default();
    if CrudService::find_by_key(&state.db, &state.models.blogs, id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found("blog", "blog not found").into());
    }
    let comments = comments_of(&state, id).await?;
    Ok(json!({ "comments": comments }).into())
}
