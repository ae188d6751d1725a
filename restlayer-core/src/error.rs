//! Error types and result types for request dispatch and pipeline execution.
//!
//! Every fallible operation in the crate returns [`RestResult<T>`]. Errors carry their
//! own HTTP status via [`RestError::status`], so the completion handler and the
//! transport layer answer every failure with an explicit status code and a uniform
//! `{"error": message}` body.

use http::StatusCode;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors raised while routing a request or running a pipeline.
///
/// Covers protocol and validation errors raised during parsing, routing errors raised by
/// the dispatcher, store errors surfaced by a [`Model`](crate::model::Model), and hook
/// rejections.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RestError {
    /// The transport verb has no matching CRUD operation.
    #[error("HTTP method not supported: {0}")]
    UnsupportedMethod(String),
    /// The `lookup` filter was present but could not be parsed.
    #[error("Malformed filter: {0}")]
    MalformedFilter(String),
    /// A query parameter other than the filter had an invalid value.
    #[error("Invalid query parameter: {0}")]
    InvalidQuery(String),
    /// The request body could not be decoded as JSON.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    /// The request addressed a collection that is not registered.
    ///
    /// The message is fixed for wire compatibility; the argument is the requested name.
    #[error("Collection not found.")]
    CollectionNotFound(String),
    /// A single-record operation was issued without a record identifier.
    #[error("Record identifier required for {0}")]
    MissingRecordId(String),
    /// The requested record was not found in the collection.
    /// The first argument is the record ID, the second is the collection name.
    #[error("Document not found {0} in collection {1}")]
    DocumentNotFound(String, String),
    /// The submitted record is not a JSON object or violates store constraints.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// Serialization/deserialization error when converting between record formats.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during model initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// An error occurred in the underlying store.
    #[error("Backend error: {0}")]
    Backend(String),
    /// A hook aborted the chain with its own status code.
    #[error("{message}")]
    Rejected {
        /// Status code answered to the client.
        status: StatusCode,
        /// Message placed in the error body.
        message: String,
    },
}

impl RestError {
    /// Creates a hook rejection carrying its own status code.
    pub fn reject(status: StatusCode, message: impl Into<String>) -> Self {
        RestError::Rejected {
            status,
            message: message.into(),
        }
    }

    /// The HTTP status answered for this error.
    ///
    /// `CollectionNotFound` answers 500 rather than 404 for compatibility with
    /// existing clients.
    pub fn status(&self) -> StatusCode {
        match self {
            RestError::UnsupportedMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
            RestError::MalformedFilter(_)
            | RestError::InvalidQuery(_)
            | RestError::InvalidBody(_)
            | RestError::MissingRecordId(_)
            | RestError::InvalidDocument(_) => StatusCode::BAD_REQUEST,
            RestError::DocumentNotFound(_, _) => StatusCode::NOT_FOUND,
            RestError::CollectionNotFound(_)
            | RestError::Serialization(_)
            | RestError::Initialization(_)
            | RestError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RestError::Rejected { status, .. } => *status,
        }
    }
}

/// A specialized `Result` type for dispatch and pipeline operations.
pub type RestResult<T> = Result<T, RestError>;

impl From<SerdeJsonError> for RestError {
    fn from(err: SerdeJsonError) -> Self {
        RestError::Serialization(err.to_string())
    }
}
