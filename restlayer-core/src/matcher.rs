//! Mount-path matching and request parsing.
//!
//! # Responsibilities
//! - Split request paths into segments
//! - Decide whether a request falls under the configured mount path
//! - Produce an [`OperationDescriptor`] for requests that do
//!
//! # Matching Rules
//! - A single leading and a single trailing empty segment are discarded
//! - The leading request segments must equal the mount segments position by position;
//!   there is no partial or wildcard matching
//! - After the mount: segment 0 is the collection, segment 1 the record id; anything
//!   further is ignored
//! - An empty mount path claims every request

use http::Uri;

use crate::{
    descriptor::{Method, OperationDescriptor, QueryParams},
    error::{RestError, RestResult},
};

/// Splits a URL path on `/`, dropping one leading and one trailing empty segment.
pub fn split_path(path: &str) -> Vec<&str> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_suffix('/').unwrap_or(path);

    if path.is_empty() {
        Vec::new()
    } else {
        path.split('/').collect()
    }
}

/// The path prefix under which requests are claimed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountPath {
    segments: Vec<String>,
}

impl MountPath {
    /// Creates a mount path from its textual form, e.g. `"/api/v1"`.
    pub fn new(path: &str) -> Self {
        Self {
            segments: split_path(path)
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the request segments left after the mount, or `None` when the request
    /// is not under this mount path.
    pub fn strip<'a>(&self, segments: &'a [&'a str]) -> Option<&'a [&'a str]> {
        if segments.len() < self.segments.len() {
            return None;
        }

        let (head, rest) = segments.split_at(self.segments.len());

        head.iter()
            .zip(&self.segments)
            .all(|(segment, mount)| *segment == mount.as_str())
            .then_some(rest)
    }

    /// Returns true when the path lies under this mount path.
    pub fn claims(&self, path: &str) -> bool {
        self.strip(&split_path(path)).is_some()
    }
}

impl std::fmt::Display for MountPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

/// Parses raw requests into operation descriptors for one mount path.
#[derive(Debug, Clone, Default)]
pub struct PathMatcher {
    mount: MountPath,
}

impl PathMatcher {
    pub fn new(mount: MountPath) -> Self {
        Self { mount }
    }

    pub fn mount(&self) -> &MountPath {
        &self.mount
    }

    /// Name of the collection a claimed path addresses, without validating the method
    /// or the query. `None` when the path is not claimed or names no collection.
    pub fn collection(&self, path: &str) -> Option<String> {
        let segments = split_path(path);

        self.mount
            .strip(&segments)?
            .first()
            .filter(|name| !name.is_empty())
            .map(|name| name.to_string())
    }

    /// Parses a request.
    ///
    /// # Returns
    ///
    /// - `Ok(None)` when the request is outside the mount path ("not mine"); nothing
    ///   else is inspected in that case
    /// - `Ok(Some(descriptor))` for a claimed request
    ///
    /// # Errors
    ///
    /// For claimed requests only: [`RestError::UnsupportedMethod`],
    /// [`RestError::CollectionNotFound`] when no collection segment follows the mount,
    /// and the query errors of [`QueryParams::parse`].
    pub fn parse(
        &self,
        method: &http::Method,
        uri: &Uri,
    ) -> RestResult<Option<OperationDescriptor>> {
        let segments = split_path(uri.path());

        let Some(rest) = self.mount.strip(&segments) else {
            return Ok(None);
        };

        let method = Method::from_http(method)?;

        let collection = match rest.first() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(RestError::CollectionNotFound(String::new())),
        };
        let id = rest
            .get(1)
            .filter(|id| !id.is_empty())
            .map(|id| id.to_string());
        let query = QueryParams::parse(uri.query())?;

        Ok(Some(OperationDescriptor::new(collection, id, method, query)))
    }
}
