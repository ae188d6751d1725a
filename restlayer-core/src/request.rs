//! Transport-neutral request and response objects.
//!
//! The HTTP binding converts its native request into a [`RestRequest`] (body already
//! decoded as JSON) and turns the resulting [`RestResponse`] back into a native
//! response. Everything in between works on these two types only.

use http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header::IntoHeaderName};
use serde_json::{Value, json};

use crate::error::RestError;

/// An incoming request as seen by the dispatcher and the pipeline.
#[derive(Debug, Clone)]
pub struct RestRequest {
    /// The transport verb.
    pub method: Method,
    /// Full request URI; only the path and query are inspected.
    pub uri: Uri,
    /// Request headers, available to hooks.
    pub headers: HeaderMap,
    /// Decoded JSON body, if the request carried one.
    pub body: Option<Value>,
}

impl RestRequest {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl IntoHeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns a header as text, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
    }
}

/// The JSON response written by a method operation or by the completion handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestResponse {
    status: Option<StatusCode>,
    body: Option<Value>,
}

impl RestResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the `{"error": message}` response for an error, with its status.
    pub fn error(err: &RestError) -> Self {
        let mut response = Self::new();
        response.json(json!({ "error": err.to_string() }), err.status());
        response
    }

    /// Writes a JSON body with an explicit status, replacing anything written before.
    pub fn json(&mut self, body: Value, status: StatusCode) {
        self.status = Some(status);
        self.body = Some(body);
    }

    /// True once a stage has written a body.
    pub fn is_written(&self) -> bool {
        self.body.is_some()
    }

    /// The status to send; `200 OK` when no stage set one.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn into_parts(self) -> (StatusCode, Option<Value>) {
        (self.status(), self.body)
    }
}
