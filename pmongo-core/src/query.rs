//! Query and option types passed through to the driver.
//!
//! Queries are untyped: a [`Q`] is an ordered BSON document of field name to
//! predicate value. Keys must match the stored field names exactly, nothing
//! validates them before they reach the driver.
//!
//! ```ignore
//! use pmongo::query::{FindOptions, SortDirection, Q};
//! use bson::doc;
//!
//! let query: Q = doc! { "internalStatus": "is" };
//! let options = FindOptions::builder()
//!     .sort("_id", SortDirection::Desc)
//!     .limit(10)
//!     .build();
//! ```

use bson::doc;

/// Query representation handed to the driver as-is.
pub type Q = bson::Document;

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// The numeric form used in sort documents.
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

/// Options applied to `find*` calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Sort specification, e.g. `{ "_id": -1 }`.
    pub sort: Option<Q>,
    /// Projection, e.g. `{ "name": 1 }`.
    pub projection: Option<Q>,
    /// Number of matching documents to skip.
    pub skip: Option<u64>,
    /// Maximum number of documents to return.
    pub limit: Option<i64>,
}

impl FindOptions {
    pub fn builder() -> FindOptionsBuilder {
        FindOptionsBuilder::default()
    }

    /// Sort by `_id`, the creation order for object ids.
    pub fn by_id(direction: SortDirection) -> Self {
        Self {
            sort: Some(doc! { "_id": direction.as_i32() }),
            ..Default::default()
        }
    }

    /// Only project the given fields.
    pub fn with_projection(projection: Q) -> Self {
        Self {
            projection: Some(projection),
            ..Default::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct FindOptionsBuilder {
    options: FindOptions,
}

impl FindOptionsBuilder {
    /// Appends a sort key. Keys are applied in insertion order.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.options
            .sort
            .get_or_insert_with(Q::new)
            .insert(field.into(), direction.as_i32());
        self
    }

    /// Replaces the sort specification with a raw document.
    pub fn sort_document(mut self, sort: Q) -> Self {
        self.options.sort = Some(sort);
        self
    }

    pub fn projection(mut self, projection: Q) -> Self {
        self.options.projection = Some(projection);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.options.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.options.limit = Some(limit);
        self
    }

    pub fn build(self) -> FindOptions {
        self.options
    }
}

/// Options for [`Connection::get_cursor`](crate::connection::Connection::get_cursor).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CursorOptions {
    /// Documents fetched per round trip; driver default when unset.
    pub batch_size: Option<u32>,
    pub limit: Option<i64>,
    pub skip: Option<u64>,
    pub sort: Option<Q>,
}

impl CursorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn sort(mut self, sort: Q) -> Self {
        self.sort = Some(sort);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_sort_key_order() {
        let options = FindOptions::builder()
            .sort("status", SortDirection::Asc)
            .sort("_id", SortDirection::Desc)
            .limit(5)
            .build();

        let keys: Vec<_> = options.sort.as_ref().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["status".to_string(), "_id".to_string()]);
        assert_eq!(options.sort.unwrap().get_i32("_id").unwrap(), -1);
        assert_eq!(options.limit, Some(5));
        assert_eq!(options.skip, None);
    }

    #[test]
    fn by_id_sorts_on_identifier() {
        assert_eq!(FindOptions::by_id(SortDirection::Asc).sort, Some(doc! { "_id": 1 }));
        assert_eq!(FindOptions::by_id(SortDirection::Desc).sort, Some(doc! { "_id": -1 }));
    }
}
