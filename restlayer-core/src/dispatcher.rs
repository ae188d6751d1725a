//! Collection registry and request routing.

use mea::rwlock::RwLock;
use std::{collections::HashMap, sync::Arc};

use crate::{
    error::{RestError, RestResult},
    hook::HookRef,
    matcher::{MountPath, PathMatcher},
    model::{Model, ModelRef},
    pipeline::OperationPipeline,
    request::{RestRequest, RestResponse},
};

/// Outcome of dispatching a request.
#[derive(Debug)]
pub enum Dispatch {
    /// The request was claimed; send this response.
    Handled(RestResponse),
    /// The request lies outside the mount path; hand it to the next handler unchanged.
    Continue(RestRequest),
}

/// Routes claimed requests to the pipeline registered for their collection.
///
/// The dispatcher is the entry point the transport binding calls for every request.
/// Collections are registered with [`add`](Self::add) and may be added or removed
/// while requests are being served.
///
/// # Example
///
/// ```ignore
/// use restlayer_core::{dispatcher::CollectionDispatcher, matcher::MountPath};
///
/// let dispatcher = CollectionDispatcher::new(MountPath::new("/api"));
/// let users = dispatcher.add("users", model).await;
/// users.pre(require_tenant).await;
///
/// match dispatcher.dispatch(request).await? {
///     Dispatch::Handled(response) => send(response),
///     Dispatch::Continue(request) => next(request),
/// }
/// ```
#[derive(Debug)]
pub struct CollectionDispatcher {
    matcher: PathMatcher,
    registry: RwLock<HashMap<String, Arc<OperationPipeline>>>,
}

impl CollectionDispatcher {
    pub fn new(mount: MountPath) -> Self {
        Self {
            matcher: PathMatcher::new(mount),
            registry: RwLock::new(HashMap::new()),
        }
    }

    pub fn mount(&self) -> &MountPath {
        self.matcher.mount()
    }

    /// Registers a fresh pipeline for `name`, replacing any existing one along with its
    /// hooks.
    pub async fn add(&self, name: impl Into<String>, model: impl Model + 'static) -> Arc<OperationPipeline> {
        self.add_model_ref(name, Arc::new(model)).await
    }

    /// Same as [`add`](Self::add) for an already shared model.
    pub async fn add_model_ref(&self, name: impl Into<String>, model: ModelRef) -> Arc<OperationPipeline> {
        let name = name.into();
        let pipeline = Arc::new(OperationPipeline::with_model_ref(name.clone(), model));

        let replaced = self
            .registry
            .write()
            .await
            .insert(name.clone(), pipeline.clone())
            .is_some();

        tracing::info!(collection = %name, replaced, "collection registered");

        pipeline
    }

    /// Unregisters `name`. Returns the removed pipeline, if one was registered.
    pub async fn remove(&self, name: &str) -> Option<Arc<OperationPipeline>> {
        let removed = self.registry.write().await.remove(name);

        if removed.is_some() {
            tracing::info!(collection = name, "collection removed");
        }

        removed
    }

    pub async fn pipeline(&self, name: &str) -> Option<Arc<OperationPipeline>> {
        self.registry.read().await.get(name).cloned()
    }

    /// Names of every registered collection, sorted.
    pub async fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registry.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Appends a pre hook to every currently registered pipeline.
    ///
    /// Pipelines registered later do not receive the hook.
    pub async fn pre(&self, hook: HookRef) {
        for pipeline in self.snapshot().await {
            pipeline.pre(hook.clone()).await;
        }
    }

    /// Appends a post hook to every currently registered pipeline.
    ///
    /// Pipelines registered later do not receive the hook.
    pub async fn post(&self, hook: HookRef) {
        for pipeline in self.snapshot().await {
            pipeline.post(hook.clone()).await;
        }
    }

    async fn snapshot(&self) -> Vec<Arc<OperationPipeline>> {
        self.registry.read().await.values().cloned().collect()
    }

    /// Routes one request.
    ///
    /// An unregistered collection is answered before the method and query are
    /// validated, so `PATCH /api/pets?lookup={bad` still reports the missing collection.
    ///
    /// # Returns
    ///
    /// - [`Dispatch::Continue`] with the untouched request when it lies outside the
    ///   mount path
    /// - [`Dispatch::Handled`] with the pipeline's response, or with the
    ///   collection-not-found response when no pipeline is registered for the name
    ///
    /// # Errors
    ///
    /// Parse failures of a request to a registered collection: unsupported method,
    /// malformed filter, or invalid query. Also a claimed path without a collection
    /// segment. No hook has run when these are returned.
    pub async fn dispatch(&self, request: RestRequest) -> RestResult<Dispatch> {
        let path = request.uri.path();

        if !self.mount().claims(path) {
            tracing::debug!(path, "outside mount path, passing through");
            return Ok(Dispatch::Continue(request));
        }

        let pipeline = match self.matcher.collection(path) {
            Some(name) => match self.pipeline(&name).await {
                Some(pipeline) => Some(pipeline),
                None => return Ok(Dispatch::Handled(Self::not_found(&name))),
            },
            None => None,
        };

        let Some(descriptor) = self.matcher.parse(&request.method, &request.uri)? else {
            return Ok(Dispatch::Continue(request));
        };
        let Some(pipeline) = pipeline else {
            return Ok(Dispatch::Handled(Self::not_found(descriptor.collection())));
        };

        tracing::debug!(
            collection = descriptor.collection(),
            method = %descriptor.method(),
            id = descriptor.id(),
            "dispatching request"
        );

        Ok(Dispatch::Handled(pipeline.process(request, descriptor).await))
    }

    fn not_found(collection: &str) -> RestResponse {
        tracing::warn!(collection, "collection not registered");

        RestResponse::error(&RestError::CollectionNotFound(collection.to_string()))
    }
}
