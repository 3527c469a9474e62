//! MongoDB implementation of [`DatabaseBackend`].

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::{StreamExt, TryStreamExt};
use mongodb::{
    Collection, Database,
    options::{FindOneOptions, FindOptions as MongoFindOptions, ReadPreference, SelectionCriteria},
};

use pmongo_core::{
    backend::{DatabaseBackend, DocumentStream, UpdateModel, WriteSummary},
    config::ReadMode,
    error::{PMongoError, PMongoResult},
    query::{CursorOptions, FindOptions, Q},
};

fn read_error(e: mongodb::error::Error) -> PMongoError {
    PMongoError::Read(e.to_string())
}

fn write_error(e: mongodb::error::Error) -> PMongoError {
    PMongoError::Write(e.to_string())
}

/// Reads a numeric reply field regardless of the integer width the server used.
fn reply_count(reply: &Document, key: &str) -> u64 {
    match reply.get(key) {
        Some(Bson::Int32(n)) => *n as u64,
        Some(Bson::Int64(n)) => *n as u64,
        Some(Bson::Double(n)) => *n as u64,
        _ => 0,
    }
}

/// Reads the outcome of an `update` command. Statement and write concern
/// failures are reported as [`PMongoError::Write`] even though the command
/// itself succeeded.
fn summary_from_update_reply(reply: &Document) -> PMongoResult<WriteSummary> {
    let mut failures = reply
        .get_array("writeErrors")
        .map(|errors| {
            errors
                .iter()
                .filter_map(Bson::as_document)
                .map(|error| format!(
                    "statement {}: {}",
                    reply_count(error, "index"),
                    error.get_str("errmsg").unwrap_or("unknown error"),
                ))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    if let Ok(concern) = reply.get_document("writeConcernError") {
        failures.push(format!(
            "write concern: {}",
            concern.get_str("errmsg").unwrap_or("unknown error"),
        ));
    }

    if !failures.is_empty() {
        return Err(PMongoError::Write(failures.join("; ")));
    }

    Ok(WriteSummary {
        matched_count: reply_count(reply, "n"),
        modified_count: reply_count(reply, "nModified"),
        upserted_id: None,
    })
}

/// A handle to one MongoDB database with a fixed read preference.
#[derive(Debug, Clone)]
pub struct MongoDatabase {
    database: Database,
    read_mode: ReadMode,
}

impl MongoDatabase {
    pub fn new(database: Database, read_mode: ReadMode) -> Self {
        Self { database, read_mode }
    }

    /// The driver handle, for calls this crate does not cover.
    pub fn inner(&self) -> &Database {
        &self.database
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }
}

#[async_trait]
impl DatabaseBackend for MongoDatabase {
    fn name(&self) -> &str {
        self.database.name()
    }

    fn read_mode(&self) -> ReadMode {
        self.read_mode
    }

    async fn insert_one(&self, collection: &str, document: Document) -> PMongoResult<Bson> {
        Ok(
            self.collection(collection)
                .insert_one(document)
                .await
                .map_err(write_error)?
                .inserted_id
        )
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> PMongoResult<()> {
        self.collection(collection)
            .insert_many(documents)
            .await
            .map_err(write_error)?;

        Ok(())
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: &Q,
        replacement: Document,
        upsert: bool,
    ) -> PMongoResult<WriteSummary> {
        let result = self.collection(collection)
            .replace_one(filter.clone(), replacement)
            .upsert(upsert)
            .await
            .map_err(write_error)?;

        Ok(WriteSummary {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn update_one(&self, collection: &str, filter: &Q, update: &Q) -> PMongoResult<WriteSummary> {
        let result = self.collection(collection)
            .update_one(filter.clone(), update.clone())
            .await
            .map_err(write_error)?;

        Ok(WriteSummary {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn update_many(&self, collection: &str, filter: &Q, update: &Q) -> PMongoResult<WriteSummary> {
        let result = self.collection(collection)
            .update_many(filter.clone(), update.clone())
            .await
            .map_err(write_error)?;

        Ok(WriteSummary {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn delete_one(&self, collection: &str, filter: &Q) -> PMongoResult<Option<u64>> {
        Ok(Some(
            self.collection(collection)
                .delete_one(filter.clone())
                .await
                .map_err(write_error)?
                .deleted_count,
        ))
    }

    async fn delete_many(&self, collection: &str, filter: &Q) -> PMongoResult<Option<u64>> {
        Ok(Some(
            self.collection(collection)
                .delete_many(filter.clone())
                .await
                .map_err(write_error)?
                .deleted_count,
        ))
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Q,
        options: FindOptions,
    ) -> PMongoResult<Option<Document>> {
        let mut find_options = FindOneOptions::default();
        find_options.sort = options.sort;
        find_options.projection = options.projection;
        find_options.skip = options.skip;

        self.collection(collection)
            .find_one(filter.clone())
            .with_options(find_options)
            .await
            .map_err(read_error)
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Q,
        options: FindOptions,
    ) -> PMongoResult<Vec<Document>> {
        let mut find_options = MongoFindOptions::default();
        find_options.sort = options.sort;
        find_options.projection = options.projection;
        find_options.skip = options.skip;
        find_options.limit = options.limit;

        self.collection(collection)
            .find(filter.clone())
            .with_options(find_options)
            .await
            .map_err(read_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(read_error)
    }

    async fn find_cursor(
        &self,
        collection: &str,
        filter: &Q,
        options: CursorOptions,
    ) -> PMongoResult<DocumentStream> {
        let mut find_options = MongoFindOptions::default();
        find_options.batch_size = options.batch_size;
        find_options.skip = options.skip;
        find_options.limit = options.limit;
        find_options.sort = options.sort;

        let cursor = self.collection(collection)
            .find(filter.clone())
            .with_options(find_options)
            .await
            .map_err(read_error)?;

        Ok(cursor.map(|item| item.map_err(read_error)).boxed())
    }

    async fn distinct(&self, collection: &str, field: &str, filter: &Q) -> PMongoResult<Vec<Bson>> {
        self.collection(collection)
            .distinct(field, filter.clone())
            .await
            .map_err(read_error)
    }

    /// Sends every statement in a single `update` command so the server applies
    /// them with the requested ordering.
    async fn bulk_update(
        &self,
        collection: &str,
        models: Vec<UpdateModel>,
        ordered: bool,
    ) -> PMongoResult<WriteSummary> {
        let updates = models
            .into_iter()
            .map(|model| Bson::Document(doc! {
                "q": model.filter,
                "u": model.update,
                "multi": model.multi,
            }))
            .collect::<Vec<_>>();

        let reply = self.database
            .run_command(doc! {
                "update": collection,
                "updates": updates,
                "ordered": ordered,
            })
            .selection_criteria(SelectionCriteria::ReadPreference(ReadPreference::Primary))
            .await
            .map_err(write_error)?;

        summary_from_update_reply(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_reply_counts() {
        let summary = summary_from_update_reply(&doc! { "ok": 1.0, "n": 3, "nModified": 2i64 }).unwrap();

        assert_eq!(summary.matched_count, 3);
        assert_eq!(summary.modified_count, 2);
    }

    #[test]
    fn update_reply_statement_errors() {
        let reply = doc! {
            "ok": 1.0,
            "n": 1,
            "nModified": 1,
            "writeErrors": [{ "index": 1, "code": 66, "errmsg": "immutable field '_id'" }],
        };

        let err = summary_from_update_reply(&reply).unwrap_err();
        assert!(matches!(err, PMongoError::Write(ref msg) if msg.contains("statement 1") && msg.contains("immutable")));
    }

    #[test]
    fn update_reply_write_concern_error() {
        let reply = doc! {
            "ok": 1.0,
            "n": 2,
            "nModified": 2,
            "writeConcernError": { "code": 64, "errmsg": "waiting for replication timed out" },
        };

        let err = summary_from_update_reply(&reply).unwrap_err();
        assert!(matches!(err, PMongoError::Write(ref msg) if msg.contains("replication timed out")));
    }
}
