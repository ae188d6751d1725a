//! HTTP binding for restlayer built on axum.
//!
//! Two ways to serve a [`CollectionDispatcher`](restlayer_core::dispatcher::CollectionDispatcher):
//!
//! - **Embedded** ([`middleware`]) - add [`rest_middleware`] to an existing axum router;
//!   requests outside the mount path reach the router's own handlers
//! - **Standalone** ([`server`]) - [`RestServer`] owns the router, tracing and timeout
//!   layers, and graceful shutdown
//!
//! # Example
//!
//! ```ignore
//! use restlayer_http::{RestServer, ServerConfig, telemetry::init_tracing};
//!
//! init_tracing("restlayer=info,tower_http=debug")?;
//! RestServer::new(ServerConfig::default(), dispatcher).bind_and_run().await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as restlayer_http;

pub mod middleware;
pub mod server;
pub mod telemetry;

pub use middleware::{RestState, into_response, rest_middleware};
pub use server::{RestServer, ServerConfig};
