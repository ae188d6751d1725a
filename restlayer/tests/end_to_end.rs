//! Configuration-driven tests: TOML in, HTTP responses out.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use restlayer::{
    config::{AppConfig, ConfigError},
    descriptor::Method as Operation,
    error::RestError,
    hook::sync_hook,
    http::RestServer,
};

const CONFIG: &str = r#"
mount_path = "/api"

[[collections]]
name = "users"
seed = [
    { _id = "42", name = "Alice", age = 31 },
    { _id = "43", name = "Bob", age = 27 },
]

[[collections]]
name = "posts"
"#;

async fn app_from(config: &AppConfig) -> Router {
    let dispatcher = config.build_dispatcher().await.unwrap();

    RestServer::new(config.server.clone(), dispatcher).into_router()
}

async fn app() -> Router {
    app_from(&AppConfig::from_toml_str(CONFIG).unwrap()).await
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = body
        .map(|value| Body::from(value.to_string()))
        .unwrap_or_default();
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, body)
}

#[tokio::test]
async fn test_seeded_collection_is_listed() {
    let (status, body) = send(app().await, Method::GET, "/api/users", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"_id": "42", "name": "Alice", "age": 31},
            {"_id": "43", "name": "Bob", "age": 27},
        ])
    );
}

#[tokio::test]
async fn test_empty_collection_is_listed() {
    let (status, body) = send(app().await, Method::GET, "/api/posts", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_create_then_read_generated_id() {
    let app = app().await;

    let (status, body) = send(
        app.clone(),
        Method::POST,
        "/api/posts",
        Some(json!({"title": "Hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let id = body["ok"]["_id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());

    let (status, body) = send(app, Method::GET, &format!("/api/posts/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"_id": id, "title": "Hello"}));
}

#[tokio::test]
async fn test_update_ignores_identifier_in_body() {
    let app = app().await;

    let (status, body) = send(
        app.clone(),
        Method::PUT,
        "/api/users/43",
        Some(json!({"_id": "99", "age": 28})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "ok": 1 }));

    let (_, body) = send(app.clone(), Method::GET, "/api/users/43", None).await;
    assert_eq!(body, json!({"_id": "43", "name": "Bob", "age": 28}));

    let (status, _) = send(app, Method::GET, "/api/users/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_removes_record() {
    let app = app().await;

    let (status, body) = send(app.clone(), Method::DELETE, "/api/users/42", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "ok": 1 }));

    let (_, body) = send(app, Method::GET, "/api/users?limit=-1", None).await;
    assert_eq!(body, json!([{"_id": "43", "name": "Bob", "age": 27}]));
}

#[tokio::test]
async fn test_lookup_skip_and_limit() {
    let app = app().await;

    // {"age":{"$gte":30}}
    let lookup = "%7B%22age%22%3A%7B%22%24gte%22%3A30%7D%7D";
    let (status, body) = send(
        app.clone(),
        Method::GET,
        &format!("/api/users?lookup={lookup}&keys=name"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"_id": "42", "name": "Alice"}]));

    let (_, body) = send(app, Method::GET, "/api/users?skip=1&limit=1", None).await;
    assert_eq!(body, json!([{"_id": "43", "name": "Bob", "age": 27}]));
}

#[tokio::test]
async fn test_paths_outside_mount_fall_through() {
    let (status, body) = send(app().await, Method::GET, "/other/users", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "No route for /other/users" }));
}

#[tokio::test]
async fn test_unknown_collection() {
    let (status, body) = send(app().await, Method::GET, "/api/pets", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Collection not found." }));
}

#[tokio::test]
async fn test_hooks_added_after_startup() {
    let config = AppConfig::from_toml_str(CONFIG).unwrap();
    let dispatcher = config.build_dispatcher().await.unwrap();

    let posts = dispatcher.pipeline("posts").await.unwrap();
    posts
        .pre(sync_hook(|ctx| {
            if ctx.descriptor().method() == Operation::Delete {
                return Err(RestError::reject(StatusCode::FORBIDDEN, "posts are append-only"));
            }
            Ok(())
        }))
        .await;

    let app = RestServer::new(config.server.clone(), dispatcher).into_router();

    let (status, body) = send(app.clone(), Method::DELETE, "/api/posts/1", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "posts are append-only" }));

    let (status, _) = send(app, Method::DELETE, "/api/users/42", None).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[test]
fn test_mongodb_store_needs_database() {
    let err = AppConfig::from_toml_str(
        r#"
        [store]
        kind = "mongodb"
        dsn = "mongodb://localhost:27017"
        database = ""

        [[collections]]
        name = "users"
        "#,
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::Validation(errors) if errors.len() == 1));
}
