//! In-memory driver implementation.
//!
//! Documents are kept per server URL, then per database and collection, in
//! insertion order. Filters, updates, sorts and projections are evaluated by
//! [`crate::evaluator`].

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument, oid::ObjectId};
use futures::{StreamExt, stream};
use mea::rwlock::RwLock;
use tracing::debug;

use pmongo_core::{
    backend::{ClientBackend, Connector, DatabaseBackend, DocumentStream, UpdateModel, WriteSummary},
    config::{ConnectionConfig, ReadMode},
    error::{PMongoError, PMongoResult},
    query::{CursorOptions, FindOptions, Q},
};

use crate::evaluator::{Comparable, FilterEvaluator, apply_update, lookup, project, sort_documents};

type CollectionMap = HashMap<String, Vec<BsonDocument>>;
type DatabaseMap = HashMap<String, CollectionMap>;

/// URL scheme accepted by [`InMemoryConnector`].
pub const MEMORY_SCHEME: &str = "memory://";

/// Connector handing out in-memory clients.
///
/// Clients are shared per host URL, so two configs pointing at the same URL see
/// the same server and are separated only by database name, as they would be on
/// a real deployment. Only URLs starting with [`MEMORY_SCHEME`] are accepted.
///
/// # Example
///
/// ```ignore
/// use pmongo::{memory::InMemoryConnector, registry::Registry, config::ConnectionConfig};
///
/// let registry = Registry::new(InMemoryConnector::new());
/// registry.setup(ConnectionConfig::new("memory://local", "root-db")).await?;
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryConnector {
    servers: Arc<RwLock<HashMap<String, InMemoryClient>>>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The client for `host_url`, if something has connected to it.
    pub async fn server(&self, host_url: &str) -> Option<InMemoryClient> {
        self.servers
            .read()
            .await
            .get(host_url)
            .cloned()
    }
}

#[async_trait]
impl Connector for InMemoryConnector {
    type Client = InMemoryClient;

    async fn connect(&self, config: &ConnectionConfig) -> PMongoResult<Self::Client> {
        if !config.host_url.starts_with(MEMORY_SCHEME) {
            return Err(PMongoError::Connection(
                config.db_name.clone(),
                format!("unsupported URL {}, expected {}", config.host_url, MEMORY_SCHEME),
            ));
        }

        Ok(
            self.servers
                .write()
                .await
                .entry(config.host_url.clone())
                .or_default()
                .clone()
        )
    }
}

/// Thread-safe in-memory client.
///
/// Clones share the same data. Every database operation is counted, which lets
/// tests assert that a call never reached the backend.
#[derive(Default, Clone, Debug)]
pub struct InMemoryClient {
    databases: Arc<RwLock<DatabaseMap>>,
    operations: Arc<AtomicUsize>,
}

impl InMemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of database operations executed through any handle of this client.
    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// Names of databases holding at least one collection, sorted.
    pub async fn database_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.databases
            .read()
            .await
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl ClientBackend for InMemoryClient {
    type Database = InMemoryDatabase;

    fn database(&self, name: &str, read_mode: ReadMode) -> Self::Database {
        InMemoryDatabase {
            name: name.to_string(),
            read_mode,
            databases: self.databases.clone(),
            operations: self.operations.clone(),
        }
    }

    async fn shutdown(&self) -> PMongoResult<()> {
        debug!(operations = self.operation_count(), "Shutting down in-memory client");

        Ok(())
    }
}

/// Handle to one in-memory database.
#[derive(Clone, Debug)]
pub struct InMemoryDatabase {
    name: String,
    read_mode: ReadMode,
    databases: Arc<RwLock<DatabaseMap>>,
    operations: Arc<AtomicUsize>,
}

impl InMemoryDatabase {
    /// Number of database operations executed through the owning client.
    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.operations.fetch_add(1, Ordering::SeqCst);
    }

    /// Runs `f` with write access to one collection, creating it if needed.
    async fn with_collection<R>(
        &self,
        collection: &str,
        f: impl FnOnce(&mut Vec<BsonDocument>) -> PMongoResult<R>,
    ) -> PMongoResult<R> {
        let mut databases = self.databases.write().await;
        let documents = databases
            .entry(self.name.clone())
            .or_default()
            .entry(collection.to_string())
            .or_default();

        f(documents)
    }

    /// Matching documents, cloned, after sort, skip, limit and projection.
    async fn select(&self, collection: &str, filter: &Q, options: FindOptions) -> PMongoResult<Vec<BsonDocument>> {
        let databases = self.databases.read().await;
        let documents = match databases.get(&self.name).and_then(|db| db.get(collection)) {
            Some(documents) => documents,
            None => return Ok(vec![]),
        };

        let mut selected = documents
            .iter()
            .filter_map(|document| match FilterEvaluator::new(document).matches(filter) {
                Ok(true) => Some(Ok(document.clone())),
                Ok(false) => None,
                Err(err) => Some(Err(err)),
            })
            .collect::<PMongoResult<Vec<_>>>()?;

        if let Some(sort) = &options.sort {
            sort_documents(&mut selected, sort);
        }

        let limit = match options.limit {
            Some(limit) if limit != 0 => limit.unsigned_abs() as usize,
            _ => usize::MAX,
        };

        Ok(
            selected
                .into_iter()
                .skip(options.skip.unwrap_or(0) as usize)
                .take(limit)
                .map(|document| match &options.projection {
                    Some(projection) => project(document, projection),
                    None => document,
                })
                .collect()
        )
    }
}

fn matching_indexes(documents: &[BsonDocument], filter: &Q, multi: bool) -> PMongoResult<Vec<usize>> {
    let mut indexes = Vec::new();

    for (index, document) in documents.iter().enumerate() {
        if FilterEvaluator::new(document).matches(filter)? {
            indexes.push(index);

            if !multi {
                break;
            }
        }
    }

    Ok(indexes)
}

/// Puts `_id` first, generating one when missing.
fn with_id(document: BsonDocument, id: Option<Bson>) -> (Bson, BsonDocument) {
    let id = id
        .or_else(|| document.get("_id").cloned())
        .unwrap_or_else(|| Bson::ObjectId(ObjectId::new()));

    let stored = BsonDocument::from_iter(
        std::iter::once(("_id".to_string(), id.clone()))
            .chain(document.into_iter().filter(|(key, _)| key != "_id")),
    );

    (id, stored)
}

fn insert(documents: &mut Vec<BsonDocument>, document: BsonDocument, collection: &str) -> PMongoResult<Bson> {
    let (id, stored) = with_id(document, None);

    if documents.iter().any(|existing| existing.get("_id") == Some(&id)) {
        return Err(PMongoError::Write(format!(
            "E11000 duplicate key error collection: {} _id: {}",
            collection, id
        )));
    }

    documents.push(stored);

    Ok(id)
}

fn update(documents: &mut [BsonDocument], filter: &Q, update: &Q, multi: bool) -> PMongoResult<WriteSummary> {
    let indexes = matching_indexes(documents, filter, multi)?;
    let mut summary = WriteSummary {
        matched_count: indexes.len() as u64,
        ..Default::default()
    };

    for index in indexes {
        if apply_update(&mut documents[index], update)? {
            summary.modified_count += 1;
        }
    }

    Ok(summary)
}

fn delete(documents: &mut Vec<BsonDocument>, filter: &Q, multi: bool) -> PMongoResult<Option<u64>> {
    let indexes = matching_indexes(documents, filter, multi)?;

    for index in indexes.iter().rev() {
        documents.remove(*index);
    }

    Ok(Some(indexes.len() as u64))
}

/// The `_id` a filter pins to a single value, used as the id of upserted documents.
fn pinned_id(filter: &Q) -> Option<Bson> {
    match filter.get("_id") {
        Some(Bson::Document(inner)) if inner.keys().any(|k| k.starts_with('$')) => None,
        Some(id) => Some(id.clone()),
        None => None,
    }
}

#[async_trait]
impl DatabaseBackend for InMemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_mode(&self) -> ReadMode {
        self.read_mode
    }

    async fn insert_one(&self, collection: &str, document: BsonDocument) -> PMongoResult<Bson> {
        self.record();
        self.with_collection(collection, |documents| insert(documents, document, collection))
            .await
    }

    async fn insert_many(&self, collection: &str, documents: Vec<BsonDocument>) -> PMongoResult<()> {
        self.record();
        self.with_collection(collection, |stored| {
            for document in documents {
                insert(stored, document, collection)?;
            }

            Ok(())
        })
        .await
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: &Q,
        replacement: BsonDocument,
        upsert: bool,
    ) -> PMongoResult<WriteSummary> {
        self.record();
        self.with_collection(collection, |documents| {
            match matching_indexes(documents, filter, false)?.first() {
                Some(&index) => {
                    let current_id = documents[index].get("_id").cloned();

                    if let Some(id) = replacement.get("_id") {
                        if Some(id) != current_id.as_ref() {
                            return Err(PMongoError::Write(
                                "The _id field cannot be changed by a replacement".to_string(),
                            ));
                        }
                    }

                    let (_, stored) = with_id(replacement, current_id);
                    let modified = documents[index] != stored;
                    documents[index] = stored;

                    Ok(WriteSummary {
                        matched_count: 1,
                        modified_count: modified as u64,
                        upserted_id: None,
                    })
                }
                None if upsert => {
                    let id = replacement.get("_id").cloned().or_else(|| pinned_id(filter));
                    let (_, stored) = with_id(replacement, id);
                    let id = insert(documents, stored, collection)?;

                    Ok(WriteSummary {
                        upserted_id: Some(id),
                        ..Default::default()
                    })
                }
                None => Ok(WriteSummary::default()),
            }
        })
        .await
    }

    async fn update_one(&self, collection: &str, filter: &Q, update_query: &Q) -> PMongoResult<WriteSummary> {
        self.record();
        self.with_collection(collection, |documents| update(documents, filter, update_query, false))
            .await
    }

    async fn update_many(&self, collection: &str, filter: &Q, update_query: &Q) -> PMongoResult<WriteSummary> {
        self.record();
        self.with_collection(collection, |documents| update(documents, filter, update_query, true))
            .await
    }

    async fn delete_one(&self, collection: &str, filter: &Q) -> PMongoResult<Option<u64>> {
        self.record();
        self.with_collection(collection, |documents| delete(documents, filter, false))
            .await
    }

    async fn delete_many(&self, collection: &str, filter: &Q) -> PMongoResult<Option<u64>> {
        self.record();
        self.with_collection(collection, |documents| delete(documents, filter, true))
            .await
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Q,
        options: FindOptions,
    ) -> PMongoResult<Option<BsonDocument>> {
        self.record();

        let options = FindOptions {
            limit: Some(1),
            ..options
        };

        Ok(
            self.select(collection, filter, options)
                .await?
                .into_iter()
                .next()
        )
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Q,
        options: FindOptions,
    ) -> PMongoResult<Vec<BsonDocument>> {
        self.record();
        self.select(collection, filter, options).await
    }

    async fn find_cursor(
        &self,
        collection: &str,
        filter: &Q,
        options: CursorOptions,
    ) -> PMongoResult<DocumentStream> {
        self.record();

        let documents = self
            .select(
                collection,
                filter,
                FindOptions {
                    sort: options.sort,
                    skip: options.skip,
                    limit: options.limit,
                    projection: None,
                },
            )
            .await?;

        Ok(stream::iter(documents.into_iter().map(Ok)).boxed())
    }

    async fn distinct(&self, collection: &str, field: &str, filter: &Q) -> PMongoResult<Vec<Bson>> {
        self.record();

        let documents = self.select(collection, filter, FindOptions::default()).await?;
        let mut values: Vec<Bson> = Vec::new();

        for document in &documents {
            let candidates = match lookup(document, field) {
                Some(Bson::Array(items)) => items.clone(),
                Some(value) => vec![value.clone()],
                None => continue,
            };

            for candidate in candidates {
                let seen = values
                    .iter()
                    .any(|value| Comparable::from(value) == Comparable::from(&candidate));

                if !seen {
                    values.push(candidate);
                }
            }
        }

        Ok(values)
    }

    async fn bulk_update(
        &self,
        collection: &str,
        models: Vec<UpdateModel>,
        ordered: bool,
    ) -> PMongoResult<WriteSummary> {
        self.record();
        self.with_collection(collection, |documents| {
            let mut summary = WriteSummary::default();
            let mut failures = Vec::new();

            for (index, model) in models.iter().enumerate() {
                match update(documents, &model.filter, &model.update, model.multi) {
                    Ok(result) => {
                        summary.matched_count += result.matched_count;
                        summary.modified_count += result.modified_count;
                    }
                    Err(err) => {
                        failures.push(format!("statement {}: {}", index, err));

                        if ordered {
                            break;
                        }
                    }
                }
            }

            if failures.is_empty() {
                Ok(summary)
            } else {
                Err(PMongoError::Write(failures.join("; ")))
            }
        })
        .await
    }
}
