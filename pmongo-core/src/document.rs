//! The document capability and its serialization helpers.
//!
//! A type participates in the CRUD façade by implementing [`Document`], which only
//! has to name the collection it lives in. Everything else is plain serde.

use bson::{
    Document as BsonDocument,
    de::deserialize_from_document,
    ser::serialize_to_document,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, from_value, to_value};

use crate::error::{PMongoError, PMongoResult};

/// Core trait implemented by every type persisted through a [`Connection`](crate::connection::Connection).
///
/// The collection name is resolved at compile time, so generic operations such as
/// `find_all::<T>()` know where to look without a value in hand.
///
/// # Example
///
/// ```ignore
/// use pmongo::document::Document;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// pub struct OrderStatus {
///     pub internal_status: String,
///     pub mfr_status: String,
/// }
///
/// impl Document for OrderStatus {
///     fn collection_name() -> &'static str {
///         "orderStatusMappingLookUpInfo"
///     }
/// }
/// ```
///
/// The same impl can be generated with `#[derive(Document)]` and
/// `#[document(collection = "orderStatusMappingLookUpInfo")]`.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Returns the name of the collection this document belongs to.
    ///
    /// Passed to the driver verbatim.
    fn collection_name() -> &'static str;
}

/// Conversion helpers, implemented for every [`Document`].
pub trait DocumentExt: Document {
    /// Serializes this value into a BSON document for the driver.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the value is not a map-like type.
    fn to_bson_document(&self) -> PMongoResult<BsonDocument>;

    /// Deserializes a value from a BSON document returned by the driver.
    fn from_bson_document(document: BsonDocument) -> PMongoResult<Self>;

    /// Converts this value to JSON.
    fn to_json(&self) -> PMongoResult<Value>;

    /// Creates a value from JSON.
    fn from_json(value: Value) -> PMongoResult<Self>;
}

impl<D: Document> DocumentExt for D {
    fn to_bson_document(&self) -> PMongoResult<BsonDocument> {
        serialize_to_document(self).map_err(|e| {
            PMongoError::Serialization(format!("{} in collection {}", e, D::collection_name()))
        })
    }

    fn from_bson_document(document: BsonDocument) -> PMongoResult<Self> {
        Ok(deserialize_from_document(document)?)
    }

    fn to_json(&self) -> PMongoResult<Value> {
        Ok(to_value(self)?)
    }

    fn from_json(value: Value) -> PMongoResult<Self> {
        Ok(from_value(value)?)
    }
}
