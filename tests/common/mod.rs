#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use blog_core::{AppState, Database, Dialect, Models, PoolConfig, SchemaRegistry};
use std::path::PathBuf;
use tower::ServiceExt;

pub const SECRET: &str = "test-secret";

const SCHEMA: &[&str] = &[
    "create table users (id varchar(50) not null primary key, email varchar(50) not null, \
     passwd varchar(50) not null, admin boolean not null, name varchar(50) not null, \
     image varchar(500) not null, created_at real not null)",
    "create table blogs (id varchar(50) not null primary key, user_id varchar(50) not null, \
     user_name varchar(50) not null, user_image varchar(500) not null, name varchar(50) not null, \
     summary varchar(200) not null, content text not null, created_at real not null)",
    "create table comments (id varchar(50) not null primary key, blog_id varchar(50) not null, \
     user_id varchar(50) not null, user_name varchar(50) not null, user_image varchar(500) not null, \
     content text not null, created_at real not null)",
];

pub async fn memory_db(config: PoolConfig) -> Database {
    let db = Database::connect(&config).await.expect("in-memory pool");
    for ddl in SCHEMA {
        db.execute(ddl, &[]).await.expect("create table");
    }
    db
}

/// Single-connection SQLite pool over a fresh temporary file. Survives a connection being
/// closed, unlike `:memory:`.
pub async fn file_db(autocommit: bool) -> (Database, PathBuf) {
    let path = std::env::temp_dir().join(format!("blog-core-{}.db", uuid::Uuid::new_v4().simple()));
    let mut config = PoolConfig::new(Dialect::Sqlite, "", "", path.to_string_lossy());
    config.max_size = 1;
    config.autocommit = autocommit;
    let db = Database::connect(&config).await.expect("file pool");
    for ddl in SCHEMA {
        db.execute(ddl, &[]).await.expect("create table");
    }
    (db, path)
}

pub async fn state() -> AppState {
    let db = memory_db(PoolConfig::sqlite_memory()).await;
    let registry = SchemaRegistry::new(db.dialect());
    let models = Models::register(&registry).expect("models register");
    AppState::new(db, models, SECRET)
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Reply {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("body should be valid JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub async fn send(app: &axum::Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.expect("response expected");
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body should be readable");
    Reply {
        status,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    }
}

pub async fn get(app: &axum::Router, uri: &str) -> Reply {
    get_with_cookie(app, uri, None).await
}

pub async fn get_with_cookie(app: &axum::Router, uri: &str, cookie: Option<&str>) -> Reply {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(c) = cookie {
        builder = builder.header("cookie", c);
    }
    send(app, builder.body(Body::empty()).expect("request should build")).await
}

pub async fn post(app: &axum::Router, uri: &str, content_type: &str, body: &str, cookie: Option<&str>) -> Reply {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", content_type);
    if let Some(c) = cookie {
        builder = builder.header("cookie", c);
    }
    send(app, builder.body(Body::from(body.to_string())).expect("request should build")).await
}

pub async fn post_json(app: &axum::Router, uri: &str, payload: serde_json::Value, cookie: Option<&str>) -> Reply {
    post(app, uri, "application/json", &payload.to_string(), cookie).await
}
