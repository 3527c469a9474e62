//! Document access façade.
//!
//! A [`Connection`] wraps one database handle and exposes CRUD helpers over any
//! [`Document`] type. The helpers add very little on top of the driver:
//!
//! - string ids are parsed before any I/O, so malformed ids never reach the driver
//! - a single-document miss becomes [`PMongoError::NoDocuments`] and is not logged
//! - any other driver failure is logged once, with the collection and query, and
//!   returned unchanged
//!
//! Every operation is an `async fn`. Dropping the returned future cancels the
//! in-flight driver call.
//!
//! # Example
//!
//! ```ignore
//! let conn = registry.connection().await.expect("single database configured");
//!
//! conn.save(&order_status).await?;
//!
//! let found: OrderStatus = conn.find(doc! { "internalStatus": "is" }).await?;
//! ```

use std::collections::HashMap;

use bson::{Bson, Document as BsonDocument, doc};
use tracing::{debug, error};

use crate::{
    backend::{DatabaseBackend, UpdateModel},
    config::ReadMode,
    cursor::DocumentCursor,
    document::{Document, DocumentExt},
    error::{PMongoError, PMongoResult},
    id::{parse_object_id, string_ids_to_object_ids},
    query::{CursorOptions, FindOptions, Q, SortDirection},
};

/// A per-call handle to one logical database.
///
/// Obtained from a [`Registry`](crate::registry::Registry); cheap to clone and
/// safe to share between tasks.
#[derive(Debug, Clone)]
pub struct Connection<D: DatabaseBackend> {
    database: D,
}

impl<D: DatabaseBackend> Connection<D> {
    pub fn new(database: D) -> Self {
        Self { database }
    }

    /// Name of the database this handle points at.
    pub fn database_name(&self) -> &str {
        self.database.name()
    }

    /// Read preference of this handle.
    pub fn read_mode(&self) -> ReadMode {
        self.database.read_mode()
    }

    /// The underlying database handle, for calls the façade does not cover.
    pub fn backend(&self) -> &D {
        &self.database
    }

    /// Inserts `document` into its collection and returns the stored `_id`.
    pub async fn save<T: Document>(&self, document: &T) -> PMongoResult<Bson> {
        let collection = T::collection_name();

        self.database
            .insert_one(collection, document.to_bson_document()?)
            .await
            .inspect_err(|err| error!(collection, error = %err, "Error saving document"))
    }

    /// Inserts raw documents into `collection`.
    pub async fn insert_many(&self, collection: &str, documents: Vec<BsonDocument>) -> PMongoResult<()> {
        self.database
            .insert_many(collection, documents)
            .await
            .inspect_err(|err| error!(collection, error = %err, "Error inserting documents"))
    }

    /// Replaces the first document matching `selector`. Nothing happens when no
    /// document matches.
    pub async fn update<T: Document>(&self, selector: Q, document: &T) -> PMongoResult<()> {
        self.replace(selector, document, false).await
    }

    /// Replaces the first document matching `selector`, inserting `document` when
    /// nothing matches.
    pub async fn upsert<T: Document>(&self, selector: Q, document: &T) -> PMongoResult<()> {
        self.replace(selector, document, true).await
    }

    async fn replace<T: Document>(&self, selector: Q, document: &T, upsert: bool) -> PMongoResult<()> {
        let collection = T::collection_name();

        self.database
            .replace_one(collection, &selector, document.to_bson_document()?, upsert)
            .await
            .inspect_err(|err| {
                error!(collection, query = %selector, upsert, error = %err, "Error replacing document")
            })?;

        Ok(())
    }

    /// [`update`](Self::update) keyed on a hex object id.
    ///
    /// # Errors
    ///
    /// Returns [`PMongoError::InvalidId`] without touching the driver when `id`
    /// does not parse.
    pub async fn update_by_id<T: Document>(&self, id: &str, document: &T) -> PMongoResult<()> {
        let id = parse_object_id(id)?;

        self.update(doc! { "_id": id }, document).await
    }

    /// [`find`](Self::find) keyed on a hex object id.
    pub async fn find_by_id<T: Document>(&self, id: &str) -> PMongoResult<T> {
        let id = parse_object_id(id)?;

        self.find(doc! { "_id": id }).await
    }

    /// Returns the first document matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`PMongoError::NoDocuments`] when nothing matches. That case is
    /// expected and is not logged.
    pub async fn find<T: Document>(&self, query: Q) -> PMongoResult<T> {
        self.find_with_opts(query, FindOptions::default()).await
    }

    /// [`find`](Self::find) with sort, projection, skip and limit options.
    pub async fn find_with_opts<T: Document>(&self, query: Q, options: FindOptions) -> PMongoResult<T> {
        let collection = T::collection_name();

        match self.database.find_one(collection, &query, options).await {
            Ok(Some(document)) => T::from_bson_document(document),
            Ok(None) => Err(PMongoError::NoDocuments(collection.to_string())),
            Err(err) => {
                error!(collection, query = %query, error = %err, "Error fetching document");
                Err(err)
            }
        }
    }

    /// [`find`](Self::find) returning only the fields selected by `projection`.
    pub async fn find_with_projection<T: Document>(&self, query: Q, projection: Q) -> PMongoResult<T> {
        self.find_with_opts(query, FindOptions::with_projection(projection))
            .await
    }

    /// The most recently inserted match, by descending `_id`.
    pub async fn find_latest_document<T: Document>(&self, query: Q) -> PMongoResult<T> {
        self.find_with_opts(query, FindOptions::by_id(SortDirection::Desc))
            .await
    }

    /// The oldest match, by ascending `_id`.
    pub async fn find_first_document<T: Document>(&self, query: Q) -> PMongoResult<T> {
        self.find_with_opts(query, FindOptions::by_id(SortDirection::Asc))
            .await
    }

    /// Returns every document matching `query`.
    pub async fn find_all<T: Document>(&self, query: Q) -> PMongoResult<Vec<T>> {
        self.find_all_with_opts(query, FindOptions::default()).await
    }

    /// [`find_all`](Self::find_all) with sort, projection, skip and limit options.
    pub async fn find_all_with_opts<T: Document>(
        &self,
        query: Q,
        options: FindOptions,
    ) -> PMongoResult<Vec<T>> {
        let collection = T::collection_name();

        self.database
            .find(collection, &query, options)
            .await
            .inspect_err(|err| error!(collection, query = %query, error = %err, "Error fetching documents"))?
            .into_iter()
            .map(T::from_bson_document)
            .collect()
    }

    /// [`find_all`](Self::find_all) returning only the fields selected by `projection`.
    pub async fn find_all_with_projection<T: Document>(
        &self,
        query: Q,
        projection: Q,
    ) -> PMongoResult<Vec<T>> {
        self.find_all_with_opts(query, FindOptions::with_projection(projection))
            .await
    }

    /// Returns the documents whose `_id` is among `ids`. Empty strings are skipped.
    pub async fn find_by_object_ids<T: Document, S: AsRef<str>>(&self, ids: &[S]) -> PMongoResult<Vec<T>> {
        self.find_all(doc! { "_id": { "$in": string_ids_to_object_ids(ids) } })
            .await
    }

    /// Whether a document matches `query`. A miss is `Ok(false)`, other failures
    /// are propagated.
    pub async fn exists<T: Document>(&self, query: Q) -> PMongoResult<bool> {
        match self.find::<T>(query).await {
            Ok(_) => Ok(true),
            Err(PMongoError::NoDocuments(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Deletes the first document matching `query`.
    pub async fn remove<T: Document>(&self, query: Q) -> PMongoResult<()> {
        let collection = T::collection_name();

        self.database
            .delete_one(collection, &query)
            .await
            .inspect_err(|err| error!(collection, query = %query, error = %err, "Error removing document"))?;

        Ok(())
    }

    /// [`remove`](Self::remove) keyed on a hex object id.
    pub async fn remove_by_id<T: Document>(&self, id: &str) -> PMongoResult<()> {
        let id = parse_object_id(id)?;

        self.remove::<T>(doc! { "_id": id }).await
    }

    /// Deletes every document matching `query`.
    pub async fn remove_all<T: Document>(&self, query: Q) -> PMongoResult<()> {
        self.remove_all_with_count::<T>(query).await?;

        Ok(())
    }

    /// Deletes every document matching `query` and returns how many were removed,
    /// or `-1` when the driver reported no result.
    pub async fn remove_all_with_count<T: Document>(&self, query: Q) -> PMongoResult<i64> {
        let collection = T::collection_name();

        let deleted = self.database
            .delete_many(collection, &query)
            .await
            .inspect_err(|err| error!(collection, query = %query, error = %err, "Error removing documents"))?;

        Ok(deleted.map_or(-1, |count| count as i64))
    }

    /// Opens a cursor over `collection`. The caller drives iteration and owns the
    /// cursor's lifetime.
    pub async fn get_cursor(
        &self,
        query: Q,
        collection: &str,
        options: CursorOptions,
    ) -> PMongoResult<DocumentCursor> {
        let stream = self.database
            .find_cursor(collection, &query, options)
            .await
            .inspect_err(|err| error!(collection, query = %query, error = %err, "Error opening cursor"))?;

        Ok(DocumentCursor::new(collection, stream))
    }

    /// Sets a single field on the first document of `collection` matching `query`.
    pub async fn update_field_value(
        &self,
        query: Q,
        collection: &str,
        field: &str,
        value: impl Into<Bson>,
    ) -> PMongoResult<()> {
        let update = doc! { "$set": { field: value.into() } };

        self.database
            .update_one(collection, &query, &update)
            .await
            .inspect_err(|err| error!(collection, query = %query, field, error = %err, "Error updating field"))?;

        Ok(())
    }

    /// Applies a raw update expression (e.g. `{ "$set": {...} }`) to every match.
    pub async fn update_many_using_query<T: Document>(&self, selector: Q, update_query: Q) -> PMongoResult<()> {
        let collection = T::collection_name();

        self.database
            .update_many(collection, &selector, &update_query)
            .await
            .inspect_err(|err| error!(collection, query = %selector, error = %err, "Error updating documents"))?;

        Ok(())
    }

    /// Applies `{ "$set": payload }` to the document with each id, unordered.
    ///
    /// Every id is parsed before anything is sent, so one bad id means nothing in
    /// the batch is written.
    ///
    /// # Errors
    ///
    /// - [`PMongoError::InvalidArgument`] when `documents` is empty
    /// - [`PMongoError::InvalidId`] when any id does not parse
    pub async fn bulk_write_update(
        &self,
        collection: &str,
        documents: HashMap<String, BsonDocument>,
    ) -> PMongoResult<()> {
        if documents.is_empty() {
            return Err(PMongoError::InvalidArgument("No data to update".to_string()));
        }

        let models = documents
            .into_iter()
            .map(|(id, payload)| {
                let id = parse_object_id(&id)?;

                Ok(UpdateModel::many(doc! { "_id": id }, doc! { "$set": payload }))
            })
            .collect::<PMongoResult<Vec<_>>>()?;

        debug!(collection, count = models.len(), "Dispatching bulk update");

        self.database
            .bulk_update(collection, models, false)
            .await
            .inspect_err(|err| error!(collection, error = %err, "Error in bulk update"))?;

        Ok(())
    }

    /// Distinct values of `field` among documents matching `query`.
    pub async fn unique<T: Document>(&self, field: &str, query: Q) -> PMongoResult<Vec<Bson>> {
        let collection = T::collection_name();

        self.database
            .distinct(collection, field, &query)
            .await
            .inspect_err(|err| error!(collection, query = %query, field, error = %err, "Error fetching distinct values"))
    }
}
