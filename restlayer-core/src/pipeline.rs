//! Per-collection operation pipeline.
//!
//! Every request addressed to a collection flows through the same fixed sequence:
//!
//! ```text
//! pre hooks (insertion order) -> method operation -> post hooks (insertion order) -> completion
//! ```
//!
//! The first stage to fail aborts the rest of the sequence, and the completion handler
//! writes that error as the response.

use mea::rwlock::RwLock;
use std::sync::Arc;

use crate::{
    context::PipelineContext,
    descriptor::OperationDescriptor,
    error::RestResult,
    hook::{HookChain, HookRef, Stage},
    model::{Model, ModelRef},
    operation,
    request::{RestRequest, RestResponse},
};

/// The staged processing chain bound to one collection.
///
/// Hooks can be appended at any time, including while requests are in flight; each
/// request runs against the hooks registered when it started.
#[derive(Debug)]
pub struct OperationPipeline {
    name: String,
    model: ModelRef,
    hooks: RwLock<HookChain>,
}

impl OperationPipeline {
    /// Creates an empty pipeline for the named collection.
    pub fn new(name: impl Into<String>, model: impl Model + 'static) -> Self {
        Self::with_model_ref(name, Arc::new(model))
    }

    pub fn with_model_ref(name: impl Into<String>, model: ModelRef) -> Self {
        Self {
            name: name.into(),
            model,
            hooks: RwLock::new(HookChain::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &ModelRef {
        &self.model
    }

    /// Appends a hook that runs before the method operation.
    pub async fn pre(&self, hook: HookRef) {
        self.push(Stage::Pre, hook).await;
    }

    /// Appends a hook that runs after a successful method operation.
    pub async fn post(&self, hook: HookRef) {
        self.push(Stage::Post, hook).await;
    }

    /// Returns the number of hooks registered for a stage.
    pub async fn hook_count(&self, stage: Stage) -> usize {
        self.hooks.read().await.hooks(stage).len()
    }

    async fn push(&self, stage: Stage, hook: HookRef) {
        self.hooks.write().await.push(stage, hook);

        tracing::debug!(collection = %self.name, ?stage, "hook registered");
    }

    /// Runs one request through the pipeline and returns the response to send.
    ///
    /// Never fails: an error from any stage becomes an error response carrying the
    /// error's status and `{"error": message}` body.
    pub async fn process(
        &self,
        request: RestRequest,
        descriptor: OperationDescriptor,
    ) -> RestResponse {
        let mut ctx = PipelineContext::new(request, descriptor, &self.name, self.model.clone());

        // Snapshot so hook registration never waits on in-flight requests.
        let hooks = self.hooks.read().await.clone();

        match Self::run(&hooks, &mut ctx).await {
            Ok(()) => ctx.response,
            Err(err) => {
                tracing::warn!(
                    collection = %self.name,
                    method = %ctx.descriptor().method(),
                    id = ctx.descriptor().id(),
                    error = %err,
                    "request failed"
                );

                RestResponse::error(&err)
            }
        }
    }

    async fn run(hooks: &HookChain, ctx: &mut PipelineContext) -> RestResult<()> {
        hooks.run(Stage::Pre, ctx).await?;
        operation::execute(ctx).await?;
        hooks.run(Stage::Post, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        descriptor::{Method, QueryParams},
        error::RestError,
        hook::{hook_fn, sync_hook},
        testing::RecordingModel,
    };
    use http::StatusCode;
    use serde_json::json;
    use std::sync::Mutex;

    type Trace = Arc<Mutex<Vec<&'static str>>>;

    fn tracing_hook(trace: &Trace, label: &'static str) -> HookRef {
        let trace = trace.clone();
        sync_hook(move |_| {
            trace.lock().unwrap().push(label);
            Ok(())
        })
    }

    fn failing_hook(trace: &Trace, label: &'static str) -> HookRef {
        let trace = trace.clone();
        sync_hook(move |_| {
            trace.lock().unwrap().push(label);
            Err(RestError::reject(StatusCode::FORBIDDEN, "not allowed"))
        })
    }

    fn delete(id: &str) -> (RestRequest, OperationDescriptor) {
        (
            RestRequest::new(http::Method::DELETE, format!("/api/users/{id}").parse().unwrap()),
            OperationDescriptor::new(
                "users",
                Some(id.to_string()),
                Method::Delete,
                QueryParams::default(),
            ),
        )
    }

    #[tokio::test]
    async fn test_hooks_run_in_order_around_operation() {
        let trace = Trace::default();
        let model = RecordingModel::with_records(vec![json!({"_id": "42"})]);
        let pipeline = OperationPipeline::new("users", model.clone());

        pipeline.pre(tracing_hook(&trace, "h1")).await;
        pipeline.pre(tracing_hook(&trace, "h2")).await;
        pipeline.post(tracing_hook(&trace, "h3")).await;
        pipeline.post(tracing_hook(&trace, "h4")).await;

        let (request, descriptor) = delete("42");
        let response = pipeline.process(request, descriptor).await;

        assert_eq!(*trace.lock().unwrap(), ["h1", "h2", "h3", "h4"]);
        assert_eq!(model.calls(), ["find_by_id 42", "remove 42"]);
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.body(), Some(&json!({ "ok": 1 })));
    }

    #[tokio::test]
    async fn test_pre_hook_failure_short_circuits() {
        let trace = Trace::default();
        let model = RecordingModel::with_records(vec![json!({"_id": "42"})]);
        let pipeline = OperationPipeline::new("users", model.clone());

        pipeline.pre(tracing_hook(&trace, "h1")).await;
        pipeline.pre(failing_hook(&trace, "h2")).await;
        pipeline.pre(tracing_hook(&trace, "h3")).await;
        pipeline.post(tracing_hook(&trace, "h4")).await;

        let (request, descriptor) = delete("42");
        let response = pipeline.process(request, descriptor).await;

        assert_eq!(*trace.lock().unwrap(), ["h1", "h2"]);
        assert!(model.calls().is_empty());
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.body(), Some(&json!({ "error": "not allowed" })));
    }

    #[tokio::test]
    async fn test_operation_failure_skips_post_hooks() {
        let trace = Trace::default();
        let pipeline = OperationPipeline::new("users", RecordingModel::default());
        pipeline.post(tracing_hook(&trace, "post")).await;

        let (request, descriptor) = delete("missing");
        let response = pipeline.process(request, descriptor).await;

        assert!(trace.lock().unwrap().is_empty());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_post_hook_failure_replaces_response() {
        let trace = Trace::default();
        let model = RecordingModel::with_records(vec![json!({"_id": "42"})]);
        let pipeline = OperationPipeline::new("users", model);
        pipeline.post(failing_hook(&trace, "post")).await;

        let (request, descriptor) = delete("42");
        let response = pipeline.process(request, descriptor).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.body(), Some(&json!({ "error": "not allowed" })));
    }

    #[tokio::test]
    async fn test_hooks_share_context() {
        let model = RecordingModel::default();
        let pipeline = OperationPipeline::new("users", model.clone());

        pipeline
            .pre(hook_fn(|ctx| {
                Box::pin(async move {
                    ctx.request.body = Some(json!({ "name": "rewritten" }));
                    ctx.locals.insert("stamped".into(), json!(true));
                    Ok(())
                })
            }))
            .await;
        pipeline
            .post(sync_hook(|ctx| {
                let stamped = ctx.locals.get("stamped").cloned().unwrap_or_default();
                ctx.response.json(json!({ "stamped": stamped }), StatusCode::ACCEPTED);
                Ok(())
            }))
            .await;

        let request = RestRequest::new(http::Method::POST, "/api/users".parse().unwrap())
            .with_body(json!({ "name": "original" }));
        let descriptor =
            OperationDescriptor::new("users", None, Method::Create, QueryParams::default());
        let response = pipeline.process(request, descriptor).await;

        assert_eq!(model.calls(), [r#"create {"name":"rewritten"}"#]);
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.body(), Some(&json!({ "stamped": true })));
    }

    #[tokio::test]
    async fn test_pipeline_exposes_its_model() {
        let model = RecordingModel::default();
        let pipeline = OperationPipeline::new("users", model.clone());

        assert_eq!(pipeline.name(), "users");
        assert_eq!(pipeline.model().find_by_id("7", None).await.unwrap(), None);
        assert_eq!(model.calls(), ["find_by_id 7"]);
    }

    #[tokio::test]
    async fn test_hook_count() {
        let pipeline = OperationPipeline::new("users", RecordingModel::default());
        let trace = Trace::default();
        pipeline.pre(tracing_hook(&trace, "a")).await;

        assert_eq!(pipeline.hook_count(Stage::Pre).await, 1);
        assert_eq!(pipeline.hook_count(Stage::Post).await, 0);
    }
}
