//! The canonical operation descriptor produced for every claimed request.

use std::fmt;

use url::form_urlencoded;

use crate::{
    error::{RestError, RestResult},
    query::{Expr, FieldSelector, FindOptions},
};

/// The four CRUD operations a collection supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`: list records, or fetch one by id.
    Read,
    /// `POST`: create a record.
    Create,
    /// `PUT`: update a record by id.
    Update,
    /// `DELETE`: remove a record by id.
    Delete,
}

impl Method {
    /// Maps a transport verb onto an operation.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::UnsupportedMethod`] for any verb other than
    /// `GET`, `POST`, `PUT` and `DELETE`.
    pub fn from_http(method: &http::Method) -> RestResult<Self> {
        match *method {
            http::Method::GET => Ok(Method::Read),
            http::Method::POST => Ok(Method::Create),
            http::Method::PUT => Ok(Method::Update),
            http::Method::DELETE => Ok(Method::Delete),
            _ => Err(RestError::UnsupportedMethod(
                method.as_str().to_lowercase(),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Read => "read",
            Method::Create => "create",
            Method::Update => "update",
            Method::Delete => "delete",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paging, projection and filter parameters decoded from the query string.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    /// Maximum records returned by a list read; `None` means unbounded.
    pub limit: Option<usize>,
    /// Records skipped before the first returned one.
    pub skip: usize,
    /// Projection from the `keys` (or `fieldSelector`) parameter.
    pub fields: Option<FieldSelector>,
    /// Filter from the `lookup` (or `filter`) parameter; empty when absent.
    pub filter: Expr,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            limit: Some(Self::DEFAULT_LIMIT),
            skip: 0,
            fields: None,
            filter: Expr::empty(),
        }
    }
}

impl QueryParams {
    /// Limit applied when the caller gives none, or gives `0`.
    pub const DEFAULT_LIMIT: usize = 100;

    /// Decodes the raw (still URL-encoded) query string.
    ///
    /// A negative `limit` disables the limit entirely. Unknown parameters are ignored.
    ///
    /// # Errors
    ///
    /// - [`RestError::InvalidQuery`] for a non-integer `limit` or a negative or
    ///   non-integer `skip`
    /// - [`RestError::MalformedFilter`] when the lookup is present but malformed
    pub fn parse(query: Option<&str>) -> RestResult<Self> {
        let mut params = QueryParams::default();

        let Some(query) = query else {
            return Ok(params);
        };

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "limit" => params.limit = Self::parse_limit(&value)?,
                "skip" => {
                    params.skip = value.trim().parse::<usize>().map_err(|_| {
                        RestError::InvalidQuery(format!("skip must be a non-negative integer, got {value:?}"))
                    })?
                }
                "keys" | "fieldSelector" => params.fields = FieldSelector::parse(&value),
                "lookup" | "filter" => params.filter = Expr::from_lookup(&value)?,
                _ => {}
            }
        }

        Ok(params)
    }

    fn parse_limit(value: &str) -> RestResult<Option<usize>> {
        let limit = value.trim().parse::<i64>().map_err(|_| {
            RestError::InvalidQuery(format!("limit must be an integer, got {value:?}"))
        })?;

        Ok(match limit {
            n if n < 0 => None,
            0 => Some(Self::DEFAULT_LIMIT),
            n => Some(usize::try_from(n).unwrap_or(usize::MAX)),
        })
    }

    /// Paging options for [`Model::find`](crate::model::Model::find).
    pub fn find_options(&self) -> FindOptions {
        FindOptions {
            limit: self.limit,
            skip: self.skip,
        }
    }
}

/// A parsed request: which collection, which record, which operation, which parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescriptor {
    collection: String,
    id: Option<String>,
    method: Method,
    query: QueryParams,
}

impl OperationDescriptor {
    pub fn new(
        collection: impl Into<String>,
        id: Option<String>,
        method: Method,
        query: QueryParams,
    ) -> Self {
        Self {
            collection: collection.into(),
            id,
            method,
            query,
        }
    }

    /// Name of the addressed collection; never empty.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Record identifier, present for single-record operations.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }
}
