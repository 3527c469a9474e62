//! Named MongoDB connections and a thin document access layer.
//!
//! This is the entry point of the pmongo project. It re-exports the registry and
//! façade from `pmongo-core`, the `Document` derive, and the available drivers.
//!
//! # Quick Start
//!
//! ```ignore
//! use pmongo::{prelude::*, memory::InMemoryConnector};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Serialize, Deserialize, Document)]
//! #[document(collection = "orderStatusMappingLookUpInfo")]
//! #[serde(rename_all = "camelCase")]
//! pub struct OrderStatus {
//!     pub internal_status: String,
//!     pub mfr_status: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> PMongoResult<()> {
//!     let registry = Registry::new(InMemoryConnector::new());
//!
//!     registry
//!         .setup_all([
//!             ConnectionConfig::new("memory://local", "root-db"),
//!             ConnectionConfig::new("memory://local", "card-db"),
//!         ])
//!         .await?;
//!
//!     // Two databases are registered, so a name is required.
//!     let conn = registry.connection_by_name("root-db").await?;
//!
//!     conn.save(&OrderStatus {
//!         internal_status: "is".to_string(),
//!         mfr_status: "ms".to_string(),
//!     })
//!     .await?;
//!
//!     let found: OrderStatus = conn.find(doc! { "internalStatus": "is" }).await?;
//!     println!("{:?}", found);
//!
//!     registry.shutdown().await
//! }
//! ```
//!
//! # Drivers
//!
//! - [`memory`] - In-process driver for development and testing
//! - [`mongodb`] - MongoDB driver (requires the `mongodb` feature)

#[allow(unused_extern_crates)]
extern crate self as pmongo;

pub mod prelude;

pub use pmongo_core::{backend, config, connection, cursor, document, error, id, query, registry};
pub use pmongo_macros::Document;

// Re-export BSON types for convenience
pub use bson;

/// In-memory driver.
pub mod memory {
    pub use pmongo_memory::{InMemoryClient, InMemoryConnector, InMemoryDatabase, MEMORY_SCHEME};
}

/// MongoDB driver.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use pmongo_mongodb::{DEFAULT_CONNECT_TIMEOUT, MongoClient, MongoConnector, MongoDatabase};
}
