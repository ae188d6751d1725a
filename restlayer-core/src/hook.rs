//! Hooks and the ordered hook chain of a pipeline.
//!
//! A [`Hook`] runs before (`Stage::Pre`) or after (`Stage::Post`) the method
//! operation. Returning `Ok(())` continues the chain; returning an error aborts it and
//! no later stage runs.
//!
//! Closures are turned into hooks with [`hook_fn`] (async) or [`sync_hook`]:
//!
//! ```ignore
//! use restlayer_core::hook::{hook_fn, sync_hook};
//!
//! let stamp = sync_hook(|ctx| {
//!     ctx.locals.insert("seen".into(), true.into());
//!     Ok(())
//! });
//!
//! let audit = hook_fn(|ctx| Box::pin(async move {
//!     audit_log.record(ctx.collection()).await?;
//!     Ok(())
//! }));
//! ```

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::{fmt, sync::Arc};

use crate::{context::PipelineContext, error::RestResult};

/// Caller-supplied stage inserted around a method operation.
#[async_trait]
pub trait Hook: Send + Sync {
    async fn call(&self, ctx: &mut PipelineContext) -> RestResult<()>;
}

/// Shared hook handle; one hook may sit in several pipelines.
pub type HookRef = Arc<dyn Hook>;

/// Position of a hook relative to the method operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pre,
    Post,
}

struct HookFn<F>(F);

#[async_trait]
impl<F> Hook for HookFn<F>
where
    F: for<'a> Fn(&'a mut PipelineContext) -> BoxFuture<'a, RestResult<()>> + Send + Sync,
{
    async fn call(&self, ctx: &mut PipelineContext) -> RestResult<()> {
        (self.0)(ctx).await
    }
}

struct SyncHook<F>(F);

#[async_trait]
impl<F> Hook for SyncHook<F>
where
    F: Fn(&mut PipelineContext) -> RestResult<()> + Send + Sync,
{
    async fn call(&self, ctx: &mut PipelineContext) -> RestResult<()> {
        (self.0)(ctx)
    }
}

/// Wraps an async closure as a hook.
pub fn hook_fn<F>(f: F) -> HookRef
where
    F: for<'a> Fn(&'a mut PipelineContext) -> BoxFuture<'a, RestResult<()>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(HookFn(f))
}

/// Wraps a synchronous closure as a hook.
pub fn sync_hook<F>(f: F) -> HookRef
where
    F: Fn(&mut PipelineContext) -> RestResult<()> + Send + Sync + 'static,
{
    Arc::new(SyncHook(f))
}

/// Ordered pre and post hook lists. Hooks are only ever appended.
#[derive(Clone, Default)]
pub struct HookChain {
    pre: Vec<HookRef>,
    post: Vec<HookRef>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hook to the end of the given stage.
    pub fn push(&mut self, stage: Stage, hook: HookRef) {
        match stage {
            Stage::Pre => self.pre.push(hook),
            Stage::Post => self.post.push(hook),
        }
    }

    pub fn hooks(&self, stage: Stage) -> &[HookRef] {
        match stage {
            Stage::Pre => &self.pre,
            Stage::Post => &self.post,
        }
    }

    /// Runs every hook of a stage in insertion order, stopping at the first error.
    pub async fn run(&self, stage: Stage, ctx: &mut PipelineContext) -> RestResult<()> {
        for (position, hook) in self.hooks(stage).iter().enumerate() {
            tracing::trace!(?stage, position, collection = ctx.collection(), "running hook");
            hook.call(ctx).await?;
        }

        Ok(())
    }
}

impl fmt::Debug for HookChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookChain")
            .field("pre", &self.pre.len())
            .field("post", &self.post.len())
            .finish()
    }
}
