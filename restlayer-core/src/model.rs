//! Store abstraction behind each collection.
//!
//! A [`Model`] is the data-store collaborator bound to one collection. The pipeline's
//! method operations only talk to the store through this trait, so any document store
//! can be exposed by implementing these five calls.
//!
//! # Traits
//!
//! - [`Model`]: the store contract used by the method operations
//! - [`ModelBuilder`]: async factory for models that need connection setup
//!
//! # Example
//!
//! ```ignore
//! use restlayer_core::{model::Model, query::{Expr, FindOptions}};
//! use serde_json::json;
//!
//! let created = model.create(json!({ "name": "Alice" })).await?;
//! let everyone = model.find(&Expr::empty(), None, FindOptions::default()).await?;
//! ```

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::{fmt::Debug, sync::Arc};

use crate::{
    error::RestResult,
    query::{Expr, FieldSelector, FindOptions},
};

/// A single stored record. Records are JSON objects identified by their `_id` field.
pub type Record = Value;

/// Shared handle to the model bound to a collection.
pub type ModelRef = Arc<dyn Model>;

/// Abstract interface for the document store behind a collection.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; one model instance serves every concurrent
/// request addressed to its collection.
///
/// # Error Handling
///
/// Store failures are reported as [`RestError`](crate::error::RestError) values
/// (typically `Backend`) and abort the request's pipeline.
#[async_trait]
pub trait Model: Send + Sync + Debug {
    /// Returns the records matching `filter`, paged by `options`.
    ///
    /// # Arguments
    ///
    /// * `filter` - The filter expression; [`Expr::empty`] matches everything
    /// * `fields` - Optional projection applied to every returned record
    /// * `options` - Limit and skip; a `None` limit is unbounded
    async fn find(
        &self,
        filter: &Expr,
        fields: Option<&FieldSelector>,
        options: FindOptions,
    ) -> RestResult<Vec<Record>>;

    /// Fetches a single record by identifier, or `None` when no record has that id.
    async fn find_by_id(
        &self,
        id: &str,
        fields: Option<&FieldSelector>,
    ) -> RestResult<Option<Record>>;

    /// Persists a new record and returns it as stored, including its `_id`.
    ///
    /// An `_id` already present in `data` is kept.
    async fn create(&self, data: Record) -> RestResult<Record>;

    /// Sets the given fields on the record with identifier `id`.
    ///
    /// # Returns
    ///
    /// The number of records affected; `0` when no record has that id.
    async fn update(&self, id: &str, data: Map<String, Value>) -> RestResult<u64>;

    /// Removes the record with identifier `id`, returning the number removed.
    async fn remove(&self, id: &str) -> RestResult<u64>;
}

#[async_trait]
impl<M> Model for &M
where
    M: Model + ?Sized,
{
    async fn find(
        &self,
        filter: &Expr,
        fields: Option<&FieldSelector>,
        options: FindOptions,
    ) -> RestResult<Vec<Record>> {
        (**self).find(filter, fields, options).await
    }

    async fn find_by_id(
        &self,
        id: &str,
        fields: Option<&FieldSelector>,
    ) -> RestResult<Option<Record>> {
        (**self).find_by_id(id, fields).await
    }

    async fn create(&self, data: Record) -> RestResult<Record> {
        (**self).create(data).await
    }

    async fn update(&self, id: &str, data: Map<String, Value>) -> RestResult<u64> {
        (**self).update(id, data).await
    }

    async fn remove(&self, id: &str) -> RestResult<u64> {
        (**self).remove(id).await
    }
}

#[async_trait]
impl<M> Model for Arc<M>
where
    M: Model + ?Sized,
{
    async fn find(
        &self,
        filter: &Expr,
        fields: Option<&FieldSelector>,
        options: FindOptions,
    ) -> RestResult<Vec<Record>> {
        (**self).find(filter, fields, options).await
    }

    async fn find_by_id(
        &self,
        id: &str,
        fields: Option<&FieldSelector>,
    ) -> RestResult<Option<Record>> {
        (**self).find_by_id(id, fields).await
    }

    async fn create(&self, data: Record) -> RestResult<Record> {
        (**self).create(data).await
    }

    async fn update(&self, id: &str, data: Map<String, Value>) -> RestResult<u64> {
        (**self).update(id, data).await
    }

    async fn remove(&self, id: &str) -> RestResult<u64> {
        (**self).remove(id).await
    }
}

/// Factory trait for models that need asynchronous setup (connections, seeding).
#[async_trait]
pub trait ModelBuilder {
    type Model: Model;

    async fn build(self) -> RestResult<Self::Model>;
}
