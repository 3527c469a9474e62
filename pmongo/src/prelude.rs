//! Commonly used types in one import:
//!
//! ```ignore
//! use pmongo::prelude::*;
//! ```

pub use bson::{Bson, doc, oid::ObjectId};

pub use pmongo_core::{
    backend::{ClientBackend, Connector, DatabaseBackend},
    config::{ConnectionConfig, ReadMode},
    connection::Connection,
    cursor::DocumentCursor,
    document::{Document, DocumentExt},
    error::{PMongoError, PMongoResult},
    id::{BaseData, DbRef, new_object_id, parse_object_id, string_id, string_ids_to_object_ids},
    query::{CursorOptions, FindOptions, Q, SortDirection},
    registry::{Descriptor, Registry},
};
pub use pmongo_macros::Document;
