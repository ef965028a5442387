mod common;

use axum::http::StatusCode;
use blog_core::auth::{sha1_hex, COOKIE_NAME};
use blog_core::dispatch::Renderer;
use blog_core::{app, AppError, AppState, CrudService};
use serde_json::{json, Value};
use std::sync::Arc;

struct Names;

impl Renderer for Names {
    fn render(&self, template: &str, context: &Value) -> Result<String, AppError> {
        let count = context["blogs"].as_array().map(Vec::len).unwrap_or(0);
        Ok(format!("{} with {} blogs", template, count))
    }
}

async fn setup() -> (AppState, axum::Router) {
    let state = common::state().await;
    let router = app(state.clone(), Some(Arc::new(Names))).unwrap();
    (state, router)
}

fn session_cookie(res: &common::Reply) -> String {
    let set_cookie = res.header("set-cookie").expect("session cookie set");
    let pair = set_cookie.split(';').next().unwrap();
    assert!(pair.starts_with(COOKIE_NAME));
    pair.to_string()
}

async fn register(router: &axum::Router, email: &str) -> common::Reply {
    common::post_json(
        router,
        "/api/users",
        json!({"email": email, "name": "Ann", "passwd": sha1_hex(&format!("{}:pw", email))}),
        None,
    )
    .await
}

async fn make_admin(state: &AppState, email: &str) {
    let users = &state.models.users;
    let query = blog_core::FindAll::new().filter("email=?", vec![json!(email)]);
    let mut found = CrudService::find_all(&state.db, users, &query).await.unwrap();
    let mut user = found.pop().unwrap();
    user.set("admin", true).unwrap();
    CrudService::update(&state.db, &user).await.unwrap();
}

#[tokio::test]
async fn register_masks_password_and_sets_cookie() {
    let (_, router) = setup().await;
    let res = register(&router, "ann@example.com").await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["email"], "ann@example.com");
    assert_eq!(body["passwd"], "******");
    assert_eq!(body["admin"], false);
    session_cookie(&res);

    let again = register(&router, "ann@example.com").await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.json()["data"], "email");

    let bad = common::post_json(
        &router,
        "/api/users",
        json!({"email": "not-an-email", "name": "x", "passwd": "0".repeat(40)}),
        None,
    )
    .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad.json()["error"], "value:invalid");
}

#[tokio::test]
async fn authenticate_checks_the_stored_hash() {
    let (_, router) = setup().await;
    register(&router, "bob@example.com").await;
    let ok = common::post_json(
        &router,
        "/api/authenticate",
        json!({"email": "bob@example.com", "passwd": sha1_hex("bob@example.com:pw")}),
        None,
    )
    .await;
    assert_eq!(ok.status, StatusCode::OK);
    session_cookie(&ok);

    let wrong = common::post_json(
        &router,
        "/api/authenticate",
        json!({"email": "bob@example.com", "passwd": sha1_hex("nope")}),
        None,
    )
    .await;
    assert_eq!(wrong.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong.json()["data"], "passwd");
}

#[tokio::test]
async fn users_are_listed_by_page_with_masked_passwords() {
    let (_, router) = setup().await;
    for email in ["a@example.com", "b@example.com"] {
        register(&router, email).await;
    }
    let res = common::get(&router, "/api/users?page=1").await;
    let body = res.json();
    assert_eq!(body["page"]["item_count"], 2);
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u["passwd"] == "******"));

    let empty = common::get(&router, "/api/users?page=5").await.json();
    assert_eq!(empty["page"]["page_index"], 1);
    assert_eq!(empty["users"], json!([]));
}

#[tokio::test]
async fn creating_blogs_requires_an_admin_session() {
    let (state, router) = setup().await;
    let res = register(&router, "admin@example.com").await;
    let cookie = session_cookie(&res);
    let draft = json!({"name": "Hello", "summary": "first", "content": "body"});

    let anonymous = common::post_json(&router, "/api/blogs", draft.clone(), None).await;
    assert_eq!(anonymous.status, StatusCode::FORBIDDEN);
    assert_eq!(anonymous.json()["error"], "permission:forbidden");

    let not_admin = common::post_json(&router, "/api/blogs", draft.clone(), Some(&cookie)).await;
    assert_eq!(not_admin.status, StatusCode::FORBIDDEN);

    make_admin(&state, "admin@example.com").await;
    let created = common::post_json(&router, "/api/blogs", draft, Some(&cookie)).await;
    assert_eq!(created.status, StatusCode::OK);
    let blog = created.json();
    assert_eq!(blog["user_name"], "Ann");
    let id = blog["id"].as_str().unwrap().to_string();

    let fetched = common::get(&router, &format!("/api/blogs/{}", id)).await.json();
    assert_eq!(fetched["name"], "Hello");
    let listed = common::get(&router, "/api/blogs").await.json();
    assert_eq!(listed["blogs"].as_array().unwrap().len(), 1);
    let comments = common::get(&router, &format!("/api/blogs/{}/comments", id)).await.json();
    assert_eq!(comments["comments"], json!([]));

    let index = common::get(&router, "/").await;
    assert_eq!(index.body, "blogs.html with 1 blogs");
    let manage = common::get_with_cookie(&router, "/manage/blogs", Some(&cookie)).await;
    assert_eq!(manage.status, StatusCode::OK);
}

#[tokio::test]
async fn missing_blogs_and_anonymous_management() {
    let (_, router) = setup().await;
    let api = common::get(&router, "/api/blogs/nope").await;
    assert_eq!(api.status, StatusCode::NOT_FOUND);
    assert_eq!(api.json()["error"], "value:notfound");

    let page = common::get(&router, "/blog/nope").await;
    assert_eq!(page.status, StatusCode::NOT_FOUND);
    assert_eq!(page.body, "blog not found");

    let manage = common::get(&router, "/manage/blogs").await;
    assert_eq!(manage.status, StatusCode::FOUND);
    assert_eq!(manage.header("location"), Some("/signin"));

    let forged = common::get_with_cookie(&router, "/manage/blogs", Some("awesession=u-99999999999-abc")).await;
    assert_eq!(forged.status, StatusCode::FOUND);
}

#[tokio::test]
async fn health_and_readiness() {
    let (_, router) = setup().await;
    assert_eq!(common::get(&router, "/health").await.json()["status"], "ok");
    let ready = common::get(&router, "/ready").await;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.json()["database"], "ok");
}

#[tokio::test]
async fn views_are_not_mounted_without_a_renderer() {
    let router = app(common::state().await, None).unwrap();
    for uri in ["/", "/blog/missing", "/manage/blogs"] {
        assert_eq!(common::get(&router, uri).await.status, StatusCode::NOT_FOUND, "{}", uri);
    }
    let res = common::get(&router, "/api/blogs").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["page"]["item_count"], 0);
}
