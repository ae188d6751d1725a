//! Request-level tests for the axum binding.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
    middleware,
    routing::get,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use restlayer_core::{
    dispatcher::CollectionDispatcher, error::RestError, hook::sync_hook, matcher::MountPath,
    model::ModelBuilder,
};
use restlayer_http::{RestServer, RestState, ServerConfig, rest_middleware};
use restlayer_memory::InMemoryModel;

async fn dispatcher() -> Arc<CollectionDispatcher> {
    let dispatcher = CollectionDispatcher::new(MountPath::new("/api"));
    let users = InMemoryModel::builder()
        .seed(vec![
            json!({"_id": "42", "name": "Alice"}),
            json!({"_id": "43", "name": "Bob"}),
        ])
        .build()
        .await
        .unwrap();
    dispatcher.add("users", users).await;

    Arc::new(dispatcher)
}

fn request(method: Method, uri: &str, body: Option<&str>) -> Request<Body> {
    let body = body.map(|text| Body::from(text.to_string())).unwrap_or_default();

    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };

    (status, body)
}

async fn server() -> Router {
    RestServer::new(ServerConfig::default(), dispatcher().await).into_router()
}

#[tokio::test]
async fn test_list_collection() {
    let (status, body) = send(server().await, request(Method::GET, "/api/users", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{"_id": "42", "name": "Alice"}, {"_id": "43", "name": "Bob"}])
    );
}

#[tokio::test]
async fn test_list_with_query_parameters() {
    let lookup = "%7B%22name%22%3A%7B%22%24ne%22%3A%22Alice%22%7D%7D";
    let uri = format!("/api/users?lookup={lookup}&keys=name&limit=-1");

    let (status, body) = send(server().await, request(Method::GET, &uri, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"_id": "43", "name": "Bob"}]));
}

#[tokio::test]
async fn test_delete_record() {
    let app = server().await;

    let (status, body) = send(app.clone(), request(Method::DELETE, "/api/users/42", None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "ok": 1 }));

    let (status, _) = send(app, request(Method::GET, "/api/users/42", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_then_update() {
    let app = server().await;

    let (status, body) = send(
        app.clone(),
        request(Method::POST, "/api/users", Some(r#"{"_id": "7", "name": "Carol"}"#)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "ok": {"_id": "7", "name": "Carol"} }));

    let (status, body) = send(
        app.clone(),
        request(Method::PUT, "/api/users/7", Some(r#"{"name": "Caroline"}"#)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "ok": 1 }));

    let (_, body) = send(app, request(Method::GET, "/api/users/7", None)).await;
    assert_eq!(body, json!({"_id": "7", "name": "Caroline"}));
}

#[tokio::test]
async fn test_claimed_request_errors() {
    let app = server().await;

    let (status, body) = send(app.clone(), request(Method::PATCH, "/api/users/42", None)).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(body["error"].as_str().unwrap().contains("patch"));

    let (status, _) = send(app.clone(), request(Method::POST, "/api/users", Some("{not json"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app.clone(), request(Method::GET, "/api/users?lookup=%7Bbad", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(app, request(Method::GET, "/api/pets", None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Collection not found." }));
}

#[tokio::test]
async fn test_unclaimed_request_hits_fallback() {
    let (status, body) = send(server().await, request(Method::GET, "/other/users", None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "No route for /other/users" }));
}

#[tokio::test]
async fn test_embedded_middleware_passes_through() {
    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .fallback(|| async { StatusCode::IM_A_TEAPOT })
        .layer(middleware::from_fn_with_state(
            RestState::new(dispatcher().await),
            rest_middleware,
        ));

    let (status, body) = send(app.clone(), request(Method::GET, "/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));

    let (status, body) = send(app.clone(), request(Method::GET, "/api/users/43", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"_id": "43", "name": "Bob"}));

    let (status, _) = send(app, request(Method::GET, "/elsewhere", None)).await;
    assert_eq!(status, StatusCode::IM_A_TEAPOT);
}

#[tokio::test]
async fn test_hook_rejection_becomes_response() {
    let dispatcher = dispatcher().await;
    dispatcher
        .pre(sync_hook(|ctx| match ctx.request.header("x-api-key") {
            Some("secret") => Ok(()),
            _ => Err(RestError::reject(StatusCode::UNAUTHORIZED, "invalid api key")),
        }))
        .await;
    let app = RestServer::new(ServerConfig::default(), dispatcher).into_router();

    let (status, body) = send(app.clone(), request(Method::GET, "/api/users", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "invalid api key" }));

    let mut authorized = request(Method::GET, "/api/users", None);
    authorized
        .headers_mut()
        .insert("x-api-key", "secret".parse().unwrap());
    let (status, _) = send(app, authorized).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_body_limit() {
    let config = ServerConfig {
        body_limit_bytes: 8,
        ..ServerConfig::default()
    };
    let app = RestServer::new(config, dispatcher().await).into_router();

    let (status, _) = send(
        app,
        request(Method::POST, "/api/users", Some(r#"{"name": "far too long for the limit"}"#)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
