//! The request-scoped record threaded through every pipeline stage.

use serde_json::{Map, Value};

use crate::{
    descriptor::OperationDescriptor,
    model::ModelRef,
    request::{RestRequest, RestResponse},
};

/// Mutable state for one request, passed by reference from stage to stage.
///
/// Hooks may rewrite the request (for example the body before a create), attach values
/// to [`locals`](Self::locals) for later stages, or inspect the response written by the
/// method operation. The descriptor is fixed once parsed.
#[derive(Debug)]
pub struct PipelineContext {
    /// The request being served.
    pub request: RestRequest,
    /// The response being built.
    pub response: RestResponse,
    /// Free-form values attached by hooks.
    pub locals: Map<String, Value>,
    descriptor: OperationDescriptor,
    collection: String,
    model: ModelRef,
}

impl PipelineContext {
    /// Seeds the context for one request against the given collection.
    pub fn new(
        request: RestRequest,
        descriptor: OperationDescriptor,
        collection: impl Into<String>,
        model: ModelRef,
    ) -> Self {
        Self {
            request,
            response: RestResponse::new(),
            locals: Map::new(),
            descriptor,
            collection: collection.into(),
            model,
        }
    }

    pub fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    /// Name of the collection whose pipeline owns this request.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The model bound to the owning collection.
    pub fn model(&self) -> &ModelRef {
        &self.model
    }
}
