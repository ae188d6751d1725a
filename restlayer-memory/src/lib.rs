//! In-memory model backend for restlayer.
//!
//! This crate provides a thread-safe, in-memory implementation of the `Model` trait.
//! It uses async-aware read-write locks for concurrent access and is ideal for
//! development, testing, and small-scale deployments.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and exclusive writes through `mea`'s RwLock
//! - **Full lookup support** - Evaluates every lookup operator against JSON records
//! - **Generated identifiers** - Records created without an `_id` receive a UUID
//!
//! # Quick Start
//!
//! ```ignore
//! use restlayer_core::{dispatcher::CollectionDispatcher, matcher::MountPath};
//! use restlayer_memory::InMemoryModel;
//!
//! #[tokio::main]
//! async fn main() {
//!     let dispatcher = CollectionDispatcher::new(MountPath::new("/api"));
//!     dispatcher.add("users", InMemoryModel::new()).await;
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as restlayer_memory;

pub mod evaluator;
pub mod store;

pub use store::{InMemoryModel, InMemoryModelBuilder};
