use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

use crate::{
    error::{RestError, RestResult},
    model::{Model, Record},
    query::{Expr, FieldSelector, FindOptions},
};

#[derive(Debug, Default)]
struct State {
    records: Vec<Record>,
    calls: Vec<String>,
    removing: Option<u64>,
    failure: Option<String>,
}

/// Vec-backed model that records every store call it receives.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingModel {
    state: Arc<Mutex<State>>,
}

impl RecordingModel {
    pub fn with_records(records: Vec<Record>) -> Self {
        let model = Self::default();
        model.state.lock().unwrap().records = records;
        model
    }

    /// Overrides the count reported by `remove`.
    pub fn removing(self, count: u64) -> Self {
        self.state.lock().unwrap().removing = Some(count);
        self
    }

    /// Makes every call fail with a backend error.
    pub fn failing(self, message: &str) -> Self {
        self.state.lock().unwrap().failure = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn enter(&self, call: String) -> RestResult<std::sync::MutexGuard<'_, State>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);

        if let Some(message) = state.failure.clone() {
            return Err(RestError::Backend(message));
        }

        Ok(state)
    }
}

fn has_id(record: &Record, id: &str) -> bool {
    record.get("_id").and_then(Value::as_str) == Some(id)
}

#[async_trait]
impl Model for RecordingModel {
    async fn find(
        &self,
        _filter: &Expr,
        _fields: Option<&FieldSelector>,
        options: FindOptions,
    ) -> RestResult<Vec<Record>> {
        let state = self.enter(format!("find limit={:?} skip={}", options.limit, options.skip))?;

        Ok(state
            .records
            .iter()
            .skip(options.skip)
            .take(options.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn find_by_id(
        &self,
        id: &str,
        _fields: Option<&FieldSelector>,
    ) -> RestResult<Option<Record>> {
        let state = self.enter(format!("find_by_id {id}"))?;

        Ok(state.records.iter().find(|record| has_id(record, id)).cloned())
    }

    async fn create(&self, data: Record) -> RestResult<Record> {
        let mut state = self.enter(format!("create {data}"))?;
        state.records.push(data.clone());

        Ok(data)
    }

    async fn update(&self, id: &str, data: Map<String, Value>) -> RestResult<u64> {
        let state = self.enter(format!("update {id} {}", Value::Object(data)))?;

        Ok(state.records.iter().filter(|record| has_id(record, id)).count() as u64)
    }

    async fn remove(&self, id: &str) -> RestResult<u64> {
        let mut state = self.enter(format!("remove {id}"))?;
        let before = state.records.len();
        state.records.retain(|record| !has_id(record, id));
        let removed = (before - state.records.len()) as u64;

        Ok(state.removing.unwrap_or(removed))
    }
}
