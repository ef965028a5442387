mod common;

use axum::http::StatusCode;
use blog_core::dispatch::{Args, ParamSpec, Renderer, Reply, Route, RouteTable};
use blog_core::{into_router, ApiError, AppError};
use serde_json::{json, Value};
use std::sync::Arc;

struct Stub;

impl Renderer for Stub {
    fn render(&self, template: &str, context: &Value) -> Result<String, AppError> {
        Ok(format!("{}:{}", template, context["name"].as_str().unwrap_or("")))
    }
}

async fn echo(_: (), args: Args) -> Result<Reply, AppError> {
    Ok(Value::Object(args.into_values()).into())
}

async fn missing_blog(_: (), _: Args) -> Result<Reply, AppError> {
    Ok((404, "blog not found").into())
}

async fn to_signin(_: (), _: Args) -> Result<Reply, AppError> {
    Ok("redirect:/signin".into())
}

async fn templated(_: (), args: Args) -> Result<Reply, AppError> {
    Ok(json!({ "__template__": "hello.html", "name": args.str("name") }).into())
}

async fn rejects(_: (), _: Args) -> Result<Reply, AppError> {
    Err(ApiError::invalid("email", "Invalid email.").into())
}

async fn breaks(_: (), _: Args) -> Result<Reply, AppError> {
    Err(AppError::Config("boom".into()))
}

async fn sees_request(_: (), args: Args) -> Result<Reply, AppError> {
    let path = args.request().map(|r| r.path().to_string()).unwrap_or_default();
    Ok(Reply::Plain(path))
}

fn router() -> axum::Router {
    let table = RouteTable::new()
        .route(Route::get("/greet", ParamSpec::new().required("name").required("email"), echo).unwrap())
        .unwrap()
        .route(Route::get("/blog/missing", ParamSpec::new(), missing_blog).unwrap())
        .unwrap()
        .route(Route::get("/manage", ParamSpec::new(), to_signin).unwrap())
        .unwrap()
        .route(Route::get("/hello", ParamSpec::new().optional("name", "world"), templated).unwrap())
        .unwrap()
        .route(Route::post("/echo", ParamSpec::new().extra(), echo).unwrap())
        .unwrap()
        .route(Route::post("/items/{id}", ParamSpec::new().required("id").required("name"), echo).unwrap())
        .unwrap()
        .route(Route::get("/items/{id}", ParamSpec::new().required("id"), echo).unwrap())
        .unwrap()
        .route(Route::post("/register", ParamSpec::new().required("email"), rejects).unwrap())
        .unwrap()
        .route(Route::get("/broken", ParamSpec::new(), breaks).unwrap())
        .unwrap()
        .route(Route::get("/raw", ParamSpec::new().request(), sees_request).unwrap())
        .unwrap();
    into_router(table, (), Some(Arc::new(Stub))).unwrap()
}

#[tokio::test]
async fn get_passes_exactly_the_declared_query_values() {
    let res = common::get(&router(), "/greet?name=Ann&email=ann@x.com&admin=true").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({"name": "Ann", "email": "ann@x.com"}));
}

#[tokio::test]
async fn missing_required_argument_is_a_client_error() {
    let res = common::get(&router(), "/greet?name=Ann").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body.contains("email"));
}

#[tokio::test]
async fn status_message_pair() {
    let res = common::get(&router(), "/blog/missing").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body, "blog not found");
}

#[tokio::test]
async fn redirect_prefix() {
    let res = common::get(&router(), "/manage").await;
    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(res.header("location"), Some("/signin"));
}

#[tokio::test]
async fn template_replies_are_rendered_with_defaults_filled() {
    let app = router();
    let res = common::get(&app, "/hello").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.header("content-type"), Some("text/html;charset=utf-8"));
    assert_eq!(res.body, "hello.html:world");

    let res = common::get(&app, "/hello?name=Ann").await;
    assert_eq!(res.body, "hello.html:Ann");
}

#[tokio::test]
async fn post_bodies() {
    let app = router();
    let res = common::post_json(&app, "/echo", json!({"a": 1, "b": [true]}), None).await;
    assert_eq!(res.json(), json!({"a": 1, "b": [true]}));

    let res = common::post(&app, "/echo", "application/x-www-form-urlencoded", "a=1&b=two", None).await;
    assert_eq!(res.json(), json!({"a": "1", "b": "two"}));

    let res = common::post(&app, "/echo", "application/json", "[1, 2]", None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = common::post(&app, "/echo", "text/csv", "a,b", None).await;
    assert_eq!(res.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn multipart_text_fields_become_arguments() {
    let body = "--XyZ\r\n\
                Content-Disposition: form-data; name=\"title\"\r\n\r\n\
                Hello\r\n\
                --XyZ--\r\n";
    let res = common::post(&router(), "/echo", "multipart/form-data; boundary=XyZ", body, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({"title": "Hello"}));
}

#[tokio::test]
async fn path_parameters_override_body_and_fill_gets() {
    let app = router();
    let res = common::post_json(&app, "/items/7", json!({"id": "9", "name": "pen"}), None).await;
    assert_eq!(res.json(), json!({"id": "7", "name": "pen"}));

    let res = common::get(&app, "/items/7").await;
    assert_eq!(res.json(), json!({"id": "7"}));
}

#[tokio::test]
async fn api_errors_become_structured_payloads() {
    let res = common::post_json(&router(), "/register", json!({"email": "bad"}), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.json(),
        json!({"error": "value:invalid", "data": "email", "message": "Invalid email."})
    );
}

#[tokio::test]
async fn infrastructure_errors_become_500() {
    let res = common::get(&router(), "/broken").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()["error"]["code"], "config_error");
}

#[tokio::test]
async fn raw_request_is_injected() {
    let res = common::get(&router(), "/raw").await;
    assert_eq!(res.body, "/raw");
}
