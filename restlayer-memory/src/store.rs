//! In-memory model implementation.
//!
//! Records are kept as JSON objects in insertion order behind an async-aware
//! read-write lock.

use async_trait::async_trait;
use mea::rwlock::RwLock;
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use restlayer_core::{
    error::{RestError, RestResult},
    model::{Model, ModelBuilder, Record},
    query::{Expr, FieldSelector, FindOptions},
};

use crate::evaluator::RecordEvaluator;

/// Thread-safe in-memory model for a single collection.
///
/// # Thread Safety
///
/// `InMemoryModel` is cloneable and uses an `Arc`-wrapped record list, so clones share
/// the same data. Reads run concurrently; writes are exclusive.
///
/// # Performance
///
/// Every lookup scans all records (no indexing). Intended for development, tests and
/// small deployments.
///
/// # Example
///
/// ```ignore
/// use restlayer_memory::InMemoryModel;
/// use serde_json::json;
///
/// let users = InMemoryModel::new();
/// let created = users.create(json!({ "name": "Alice" })).await?;
/// assert!(created["_id"].is_string());
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryModel {
    records: Arc<RwLock<Vec<Record>>>,
}

impl InMemoryModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder, optionally seeded with initial records.
    pub fn builder() -> InMemoryModelBuilder {
        InMemoryModelBuilder::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn project(record: &Record, fields: Option<&FieldSelector>) -> Record {
        match fields {
            Some(selector) => selector.apply(record.clone()),
            None => record.clone(),
        }
    }
}

fn record_id(record: &Record) -> Option<String> {
    match record.get("_id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn has_id(record: &Record, id: &str) -> bool {
    record_id(record).as_deref() == Some(id)
}

/// Validates a new record and gives it an `_id` when it has none.
fn prepare(data: Record) -> RestResult<Record> {
    let Value::Object(mut map) = data else {
        return Err(RestError::InvalidDocument(
            "records must be JSON objects".to_string(),
        ));
    };

    match map.get("_id") {
        None | Some(Value::Null) => {
            map.insert("_id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        Some(Value::String(_)) | Some(Value::Number(_)) => {}
        Some(_) => {
            return Err(RestError::InvalidDocument(
                "_id must be a string or a number".to_string(),
            ));
        }
    }

    Ok(Value::Object(map))
}

#[async_trait]
impl Model for InMemoryModel {
    async fn find(
        &self,
        filter: &Expr,
        fields: Option<&FieldSelector>,
        options: FindOptions,
    ) -> RestResult<Vec<Record>> {
        let records = self.records.read().await;

        Ok(RecordEvaluator::filter_records(records.iter(), filter)?
            .into_iter()
            .skip(options.skip)
            .take(options.limit.unwrap_or(usize::MAX))
            .map(|record| Self::project(record, fields))
            .collect())
    }

    async fn find_by_id(
        &self,
        id: &str,
        fields: Option<&FieldSelector>,
    ) -> RestResult<Option<Record>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|record| has_id(record, id))
            .map(|record| Self::project(record, fields)))
    }

    async fn create(&self, data: Record) -> RestResult<Record> {
        let record = prepare(data)?;
        let id = record_id(&record).unwrap_or_default();

        let mut records = self.records.write().await;

        if records.iter().any(|existing| has_id(existing, &id)) {
            return Err(RestError::Backend(format!("duplicate _id {id:?}")));
        }
        records.push(record.clone());

        Ok(record)
    }

    async fn update(&self, id: &str, data: Map<String, Value>) -> RestResult<u64> {
        let mut records = self.records.write().await;

        let Some(Value::Object(record)) = records.iter_mut().find(|record| has_id(record, id)) else {
            return Ok(0);
        };

        for (key, value) in data {
            if key != "_id" {
                record.insert(key, value);
            }
        }

        Ok(1)
    }

    async fn remove(&self, id: &str) -> RestResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();

        records.retain(|record| !has_id(record, id));

        Ok((before - records.len()) as u64)
    }
}

/// Builder for [`InMemoryModel`] instances.
///
/// # Example
///
/// ```ignore
/// use restlayer_memory::InMemoryModel;
/// use restlayer_core::model::ModelBuilder;
///
/// let model = InMemoryModel::builder()
///     .seed(vec![json!({ "_id": "1", "name": "Alice" })])
///     .build()
///     .await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryModelBuilder {
    seed: Vec<Record>,
}

impl InMemoryModelBuilder {
    /// Records stored before the model is handed out.
    pub fn seed(mut self, records: impl IntoIterator<Item = Record>) -> Self {
        self.seed.extend(records);
        self
    }
}

#[async_trait]
impl ModelBuilder for InMemoryModelBuilder {
    type Model = InMemoryModel;

    /// Builds the model, assigning ids to seed records that lack one.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::InvalidDocument`] when a seed record is not an object.
    async fn build(self) -> RestResult<Self::Model> {
        let records = self
            .seed
            .into_iter()
            .map(prepare)
            .collect::<RestResult<Vec<_>>>()?;

        Ok(InMemoryModel {
            records: Arc::new(RwLock::new(records)),
        })
    }
}
