//! Streaming cursor returned by [`Connection::get_cursor`](crate::connection::Connection::get_cursor).

use std::{
    fmt,
    pin::Pin,
    task::{Context, Poll},
};

use bson::{Document as BsonDocument, de::deserialize_from_document};
use futures::{Stream, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;

use crate::{
    backend::DocumentStream,
    error::{PMongoError, PMongoResult},
};

/// A cursor over raw documents.
///
/// Implements [`Stream`], so the usual `futures` combinators apply. The caller owns
/// the cursor; dropping it releases the server-side cursor.
pub struct DocumentCursor {
    collection: String,
    inner: DocumentStream,
}

impl DocumentCursor {
    pub fn new(collection: impl Into<String>, inner: DocumentStream) -> Self {
        Self {
            collection: collection.into(),
            inner,
        }
    }

    /// Collection the cursor reads from.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Advances the cursor and decodes the next document as `T`.
    ///
    /// Returns `None` once the cursor is exhausted.
    pub async fn next_as<T: DeserializeOwned>(&mut self) -> Option<PMongoResult<T>> {
        self.inner
            .next()
            .await
            .map(|item| item.and_then(|document| deserialize_from_document(document).map_err(PMongoError::from)))
    }

    /// Drains the cursor, decoding every remaining document as `T`.
    pub async fn collect_as<T: DeserializeOwned>(self) -> PMongoResult<Vec<T>> {
        self.inner
            .and_then(|document| async move { deserialize_from_document(document).map_err(PMongoError::from) })
            .try_collect()
            .await
    }
}

impl Stream for DocumentCursor {
    type Item = PMongoResult<BsonDocument>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl fmt::Debug for DocumentCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentCursor")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}
