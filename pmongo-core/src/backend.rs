//! Driver abstraction.
//!
//! The registry and the document façade never talk to a driver directly. They go
//! through three traits:
//!
//! - [`Connector`] establishes a client from a [`ConnectionConfig`]
//! - [`ClientBackend`] is one connected client, able to hand out database handles
//!   with a given read preference
//! - [`DatabaseBackend`] is a database handle exposing the primitive operations the
//!   façade is built from
//!
//! Implementations map driver failures to [`PMongoError::Read`](crate::error::PMongoError::Read) or
//! [`PMongoError::Write`](crate::error::PMongoError::Write) and never retry.

use std::fmt::Debug;

use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument};
use futures::stream::BoxStream;

use crate::{
    config::{ConnectionConfig, ReadMode},
    error::PMongoResult,
    query::{CursorOptions, FindOptions, Q},
};

/// Stream of raw documents produced by [`DatabaseBackend::find_cursor`].
pub type DocumentStream = BoxStream<'static, PMongoResult<BsonDocument>>;

/// Outcome of a replace or update call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteSummary {
    pub matched_count: u64,
    pub modified_count: u64,
    /// Set when an upsert inserted a new document.
    pub upserted_id: Option<Bson>,
}

/// One update statement of a bulk write.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateModel {
    pub filter: Q,
    pub update: Q,
    /// Apply to every match instead of the first one.
    pub multi: bool,
}

impl UpdateModel {
    /// An update applied to every document matching `filter`.
    pub fn many(filter: Q, update: Q) -> Self {
        Self { filter, update, multi: true }
    }
}

/// A handle to one database of a connected client.
///
/// Handles are cheap to clone and carry no state beyond what the driver keeps
/// for the database and its read preference.
#[async_trait]
pub trait DatabaseBackend: Clone + Send + Sync + Debug + 'static {
    /// Name of the database this handle points at.
    fn name(&self) -> &str;

    /// Read preference the handle was created with.
    fn read_mode(&self) -> ReadMode;

    /// Inserts one document, returning its `_id`.
    async fn insert_one(&self, collection: &str, document: BsonDocument) -> PMongoResult<Bson>;

    async fn insert_many(&self, collection: &str, documents: Vec<BsonDocument>) -> PMongoResult<()>;

    /// Replaces the first document matching `filter`. With `upsert` set the
    /// replacement is inserted when nothing matches.
    async fn replace_one(
        &self,
        collection: &str,
        filter: &Q,
        replacement: BsonDocument,
        upsert: bool,
    ) -> PMongoResult<WriteSummary>;

    /// Applies an update expression to the first match.
    async fn update_one(&self, collection: &str, filter: &Q, update: &Q) -> PMongoResult<WriteSummary>;

    /// Applies an update expression to every match.
    async fn update_many(&self, collection: &str, filter: &Q, update: &Q) -> PMongoResult<WriteSummary>;

    /// Deletes the first match. `None` means the driver reported no result.
    async fn delete_one(&self, collection: &str, filter: &Q) -> PMongoResult<Option<u64>>;

    /// Deletes every match. `None` means the driver reported no result.
    async fn delete_many(&self, collection: &str, filter: &Q) -> PMongoResult<Option<u64>>;

    async fn find_one(
        &self,
        collection: &str,
        filter: &Q,
        options: FindOptions,
    ) -> PMongoResult<Option<BsonDocument>>;

    async fn find(
        &self,
        collection: &str,
        filter: &Q,
        options: FindOptions,
    ) -> PMongoResult<Vec<BsonDocument>>;

    /// Opens a cursor. The caller drives it and drops it when done.
    async fn find_cursor(
        &self,
        collection: &str,
        filter: &Q,
        options: CursorOptions,
    ) -> PMongoResult<DocumentStream>;

    /// Distinct values of `field` among documents matching `filter`.
    async fn distinct(&self, collection: &str, field: &str, filter: &Q) -> PMongoResult<Vec<Bson>>;

    /// Executes several update statements in one call. When `ordered` is false a
    /// failing statement does not prevent the others from running.
    async fn bulk_update(
        &self,
        collection: &str,
        models: Vec<UpdateModel>,
        ordered: bool,
    ) -> PMongoResult<WriteSummary>;
}

/// One connected client.
#[async_trait]
pub trait ClientBackend: Send + Sync + Debug + 'static {
    type Database: DatabaseBackend;

    /// Returns a handle to `name` using the given read preference.
    fn database(&self, name: &str, read_mode: ReadMode) -> Self::Database;

    /// Releases the client's resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(&self) -> PMongoResult<()> {
        Ok(())
    }
}

/// Establishes clients from configs.
#[async_trait]
pub trait Connector: Send + Sync {
    type Client: ClientBackend;

    /// Connects and verifies the server is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`PMongoError::Connection`](crate::error::PMongoError::Connection)
    /// when the client cannot be created or the server does not answer in time.
    async fn connect(&self, config: &ConnectionConfig) -> PMongoResult<Self::Client>;
}
