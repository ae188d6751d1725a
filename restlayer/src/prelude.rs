//! Convenient re-exports of commonly used types from restlayer.
//!
//! ```ignore
//! use restlayer::prelude::*;
//! ```

pub use restlayer_core::{
    context::PipelineContext,
    descriptor::{Method, OperationDescriptor, QueryParams},
    dispatcher::{CollectionDispatcher, Dispatch},
    error::{RestError, RestResult},
    hook::{Hook, HookRef, Stage, hook_fn, sync_hook},
    matcher::{MountPath, PathMatcher},
    model::{Model, ModelBuilder, ModelRef, Record},
    pipeline::OperationPipeline,
    query::{Expr, FieldOp, FieldSelector, Filter, FindOptions, QueryVisitor},
    request::{RestRequest, RestResponse},
};
