//! A thin connection registry and document access layer over a document database.
//!
//! This crate is the core of the pmongo project and provides:
//!
//! - **Connection registry** ([`registry`]) - Named connections with primary and secondary read handles
//! - **Document access** ([`connection`]) - CRUD helpers over any [`document::Document`] type
//! - **Document trait** ([`document`]) - The capability a type needs to be persisted
//! - **Driver abstraction** ([`backend`]) - Traits implemented by each driver integration
//! - **Queries and options** ([`query`]) - Untyped queries plus find and cursor options
//! - **Identifiers** ([`id`]) - Object id parsing and embeddable base fields
//! - **Configuration** ([`config`]) - Per-database connection settings
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use pmongo::prelude::*;
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
//! let registry = Registry::new(MongoConnector::new());
//! registry.setup(ConnectionConfig::new("mongodb://localhost:27017", "root-db")).await?;
//!
//! let conn = registry.connection().await.expect("one database registered");
//! let status: OrderStatus = conn.find(doc! { "internalStatus": "is" }).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as pmongo_core;

pub mod backend;
pub mod config;
pub mod connection;
pub mod cursor;
pub mod document;
pub mod error;
pub mod id;
pub mod query;
pub mod registry;
