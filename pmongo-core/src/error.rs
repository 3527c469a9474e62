//! Error types and result types for registry and document operations.
//!
//! Local validation failures ([`PMongoError::Config`], [`PMongoError::InvalidId`],
//! [`PMongoError::InvalidArgument`]) are raised before any I/O takes place. Driver
//! failures are passed through as [`PMongoError::Read`] or [`PMongoError::Write`],
//! with the single-document miss split out as [`PMongoError::NoDocuments`].

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors raised by the registry and the document façade.
#[derive(Error, Debug)]
pub enum PMongoError {
    /// The connection config is missing its host URL or database name.
    #[error("Invalid connection info: {0}")]
    Config(String),
    /// Establishing the underlying client failed or timed out.
    /// The first argument is the logical database name.
    #[error("Connection to {0} failed: {1}")]
    Connection(String, String),
    /// No descriptor is registered under the given logical name.
    #[error("Database connection not available for {0}. Perform 'setup' first")]
    NotFound(String),
    /// A single-document query matched nothing. The argument is the collection name.
    #[error("No documents in result for collection {0}")]
    NoDocuments(String),
    /// The given string is not a valid object identifier.
    #[error("Invalid id: {0}")]
    InvalidId(String),
    /// The call was rejected before reaching the driver.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The driver failed while reading.
    #[error("Read error: {0}")]
    Read(String),
    /// The driver failed while writing.
    #[error("Write error: {0}")]
    Write(String),
    /// Converting between Rust values and BSON failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PMongoError {
    /// Returns `true` for the expected "nothing there" outcomes: a registry miss
    /// or a single-document query that matched nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PMongoError::NotFound(_) | PMongoError::NoDocuments(_))
    }
}

/// A specialized `Result` type for registry and document operations.
pub type PMongoResult<T> = Result<T, PMongoError>;

impl From<BsonError> for PMongoError {
    fn from(err: BsonError) -> Self {
        PMongoError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for PMongoError {
    fn from(err: SerdeJsonError) -> Self {
        PMongoError::Serialization(err.to_string())
    }
}
