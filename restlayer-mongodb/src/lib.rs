//! MongoDB model backend for restlayer.
//!
//! This crate provides a MongoDB-based implementation of the `Model` trait, exposing
//! MongoDB collections through the REST dispatcher with filtering, paging and
//! projection pushed down to the MongoDB query engine.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! restlayer = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Features
//!
//! - **Persistent storage** - Records live in MongoDB Atlas or a self-hosted MongoDB
//! - **Native filtering** - Lookups are translated into MongoDB query documents
//! - **ObjectId handling** - Generated ids are exposed and matched as hex strings
//!
//! # Example
//!
//! ```ignore
//! use restlayer_core::model::ModelBuilder;
//! use restlayer_mongodb::{MongoModel, connect};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = connect("mongodb://localhost:27017").await?;
//!     let users = MongoModel::new(&client, "my_database", "users");
//!     let posts = MongoModel::builder("", "my_database", "posts")
//!         .client(client.clone())
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as restlayer_mongodb;

pub mod query;
pub mod store;

pub use store::{MongoModel, MongoModelBuilder, connect};
