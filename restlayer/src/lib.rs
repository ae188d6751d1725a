//! Main restlayer crate: a generic REST adapter over document stores.
//!
//! This crate is the primary entry point for users of the restlayer framework. It
//! re-exports the core types from the sub-crates, gives access to the model backends and
//! the HTTP binding, and ships the configuration used by the `restlayer` binary.
//!
//! # Features
//!
//! - **Uniform CRUD endpoints** - Every registered collection is served under one mount path
//! - **Hooks** - Pre and post stages per collection, or fanned out to all of them
//! - **Multiple backends** - In-memory and MongoDB models behind one `Model` trait
//! - **Embeddable** - Use the axum middleware in an existing router, or run the standalone server
//!
//! # Quick Start
//!
//! ```ignore
//! use restlayer::{prelude::*, memory::InMemoryModel, http::{RestServer, ServerConfig}};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = CollectionDispatcher::new(MountPath::new("/api"));
//!
//!     let users = dispatcher.add("users", InMemoryModel::new()).await;
//!     users
//!         .pre(sync_hook(|ctx| match ctx.request.header("x-api-key") {
//!             Some("secret") => Ok(()),
//!             _ => Err(RestError::reject(http::StatusCode::UNAUTHORIZED, "invalid api key")),
//!         }))
//!         .await;
//!
//!     RestServer::new(ServerConfig::default(), Arc::new(dispatcher))
//!         .bind_and_run()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory models for development and testing
//! - [`mongodb`] - MongoDB models (requires the `mongodb` feature)

pub mod config;
pub mod prelude;

pub use restlayer_core::{
    context, descriptor, dispatcher, error, hook, matcher, model, operation, pipeline, query,
    request,
};

/// In-memory model implementations.
pub mod memory {
    pub use restlayer_memory::{InMemoryModel, InMemoryModelBuilder};
}

/// MongoDB model implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use restlayer_mongodb::{MongoModel, MongoModelBuilder, connect};
}

/// The axum HTTP binding.
pub mod http {
    pub use restlayer_http::{
        RestServer, RestState, ServerConfig, into_response, rest_middleware, telemetry,
    };
}
