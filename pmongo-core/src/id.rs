//! Object identifier helpers and embeddable base fields.

use bson::{Bson, DateTime, oid::ObjectId};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{PMongoError, PMongoResult};

/// Generates a new object identifier.
pub fn new_object_id() -> ObjectId {
    ObjectId::new()
}

/// Parses a 24 character hex string into an [`ObjectId`].
///
/// # Errors
///
/// Returns [`PMongoError::InvalidId`] when the string is not a valid identifier.
pub fn parse_object_id(id: &str) -> PMongoResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| PMongoError::InvalidId(id.to_string()))
}

/// Lenient conversion into an [`ObjectId`].
///
/// Strings are parsed as hex and object ids are passed through. Anything that
/// cannot be converted yields the all-zero identifier.
pub fn object_id_or_default(id: &Bson) -> ObjectId {
    match id {
        Bson::ObjectId(oid) => *oid,
        Bson::String(s) => ObjectId::parse_str(s).unwrap_or_else(|_| ObjectId::from_bytes([0; 12])),
        _ => ObjectId::from_bytes([0; 12]),
    }
}

/// Returns the hex representation of an identifier, the string itself for string
/// ids, and an empty string for anything else.
pub fn string_id(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        _ => String::new(),
    }
}

/// Converts hex strings into object ids, skipping empty strings.
///
/// Non-empty strings that fail to parse become the all-zero identifier, so they
/// match nothing when used in an `$in` selector.
pub fn string_ids_to_object_ids<S: AsRef<str>>(ids: &[S]) -> Vec<ObjectId> {
    ids.iter()
        .map(AsRef::as_ref)
        .filter(|id| !id.is_empty())
        .map(|id| object_id_or_default(&Bson::String(id.to_string())))
        .collect()
}

/// Fields commonly embedded (with `#[serde(flatten)]`) in persisted documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseData {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "createdDate", default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime>,
    #[serde(rename = "updatedDate", default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<DateTime>,
}

impl BaseData {
    /// Creates base fields with a fresh id and both timestamps set to now.
    pub fn new() -> Self {
        let now = DateTime::from_chrono(Utc::now());

        Self {
            id: Some(new_object_id()),
            created_date: Some(now),
            updated_date: Some(now),
        }
    }

    /// Hex form of the id, or an empty string when unset.
    pub fn string_id(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }

    /// Sets the updated timestamp to now.
    pub fn touch(&mut self) {
        self.updated_date = Some(DateTime::from_chrono(Utc::now()));
    }
}

/// A database reference (`{ "$ref": ..., "$id": ... }`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbRef {
    #[serde(rename = "$ref")]
    pub collection: String,
    #[serde(rename = "$id")]
    pub id: Bson,
}

impl DbRef {
    /// Creates a reference to `id` in `collection`. The id is coerced with
    /// [`object_id_or_default`].
    pub fn new(collection: impl Into<String>, id: impl Into<Bson>) -> Self {
        Self {
            collection: collection.into(),
            id: Bson::ObjectId(object_id_or_default(&id.into())),
        }
    }

    /// Hex form of the referenced id, or an empty string if it is not an object id.
    pub fn ref_id(&self) -> String {
        match &self.id {
            Bson::ObjectId(oid) => oid.to_hex(),
            _ => String::new(),
        }
    }
}
