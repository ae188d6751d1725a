//! Core of the restlayer project: a generic REST adapter in front of document stores.
//!
//! A single [`CollectionDispatcher`](dispatcher::CollectionDispatcher) mounted at a path
//! prefix exposes any number of collections as CRUD endpoints:
//!
//! | Verb | Path | Operation |
//! |---|---|---|
//! | `GET` | `/{mount}/{collection}` | list records (`limit`, `skip`, `keys`, `lookup`) |
//! | `GET` | `/{mount}/{collection}/{id}` | fetch one record |
//! | `POST` | `/{mount}/{collection}` | create a record |
//! | `PUT` | `/{mount}/{collection}/{id}` | update a record |
//! | `DELETE` | `/{mount}/{collection}/{id}` | remove a record |
//!
//! This crate provides:
//!
//! - **Request parsing** ([`matcher`], [`descriptor`]) - Mount matching and operation descriptors
//! - **Query and filtering** ([`query`]) - Lookup filters, field selection and paging
//! - **Store abstraction** ([`model`]) - The trait every backing store implements
//! - **Hooks** ([`hook`]) - Pre and post stages around each method operation
//! - **Pipelines** ([`pipeline`], [`operation`]) - Per-collection processing chain
//! - **Routing** ([`dispatcher`]) - Collection registry and request dispatch
//! - **Error handling** ([`error`]) - Error type with HTTP status mapping
//!
//! # Example
//!
//! ```ignore
//! use restlayer_core::{dispatcher::{CollectionDispatcher, Dispatch}, matcher::MountPath};
//!
//! let dispatcher = CollectionDispatcher::new(MountPath::new("/api"));
//! dispatcher.add("users", users_model).await;
//!
//! let request = RestRequest::new(http::Method::GET, "/api/users?limit=10".parse()?);
//! if let Dispatch::Handled(response) = dispatcher.dispatch(request).await? {
//!     println!("{:?}", response.body());
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as restlayer_core;

pub mod context;
pub mod descriptor;
pub mod dispatcher;
pub mod error;
pub mod hook;
pub mod matcher;
pub mod model;
pub mod operation;
pub mod pipeline;
pub mod query;
pub mod request;

#[cfg(test)]
pub(crate) mod testing;
