//! axum middleware binding the collection dispatcher into a router.
//!
//! # Responsibilities
//! - Let requests outside the mount path through untouched
//! - Buffer and decode JSON bodies of claimed requests
//! - Dispatch and convert the result into an HTTP response
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, middleware, routing::get};
//! use restlayer_http::{RestState, rest_middleware};
//!
//! let app = Router::new()
//!     .route("/health", get(|| async { "ok" }))
//!     .layer(middleware::from_fn_with_state(RestState::new(dispatcher), rest_middleware));
//! ```

use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use restlayer_core::{
    dispatcher::{CollectionDispatcher, Dispatch},
    error::RestError,
    request::{RestRequest, RestResponse},
};

/// Default cap on buffered request bodies.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// State shared with [`rest_middleware`].
#[derive(Debug, Clone)]
pub struct RestState {
    dispatcher: Arc<CollectionDispatcher>,
    body_limit: usize,
}

impl RestState {
    pub fn new(dispatcher: Arc<CollectionDispatcher>) -> Self {
        Self {
            dispatcher,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Sets the largest request body, in bytes, that will be buffered.
    pub fn body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    pub fn dispatcher(&self) -> &Arc<CollectionDispatcher> {
        &self.dispatcher
    }
}

/// Serves claimed requests through the dispatcher and forwards every other request to
/// the next handler.
pub async fn rest_middleware(State(state): State<RestState>, request: Request, next: Next) -> Response {
    if !state.dispatcher.mount().claims(request.uri().path()) {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, state.body_limit).await {
        Ok(bytes) => bytes,
        Err(err) => {
            let err = RestError::InvalidBody(format!("failed to read request body: {err}"));
            return error_response(&err);
        }
    };

    let body = match decode_body(&bytes) {
        Ok(body) => body,
        Err(err) => return error_response(&err),
    };

    let rest_request = RestRequest {
        method: parts.method.clone(),
        uri: parts.uri.clone(),
        headers: parts.headers.clone(),
        body,
    };

    match state.dispatcher.dispatch(rest_request).await {
        Ok(Dispatch::Handled(response)) => into_response(response),
        Ok(Dispatch::Continue(_)) => next.run(Request::from_parts(parts, Body::from(bytes))).await,
        Err(err) => error_response(&err),
    }
}

fn decode_body(bytes: &Bytes) -> Result<Option<serde_json::Value>, RestError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|e| RestError::InvalidBody(e.to_string()))
}

fn error_response(err: &RestError) -> Response {
    tracing::warn!(error = %err, status = %err.status(), "rejecting request");

    into_response(RestResponse::error(err))
}

/// Converts a pipeline response into an HTTP response.
pub fn into_response(response: RestResponse) -> Response {
    match response.into_parts() {
        (status, Some(body)) => (status, Json(body)).into_response(),
        (status, None) => status.into_response(),
    }
}
