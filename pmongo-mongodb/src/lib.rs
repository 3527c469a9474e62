//! MongoDB backend for pmongo.
//!
//! Provides a [`Connector`](pmongo_core::backend::Connector) that opens a
//! driver client and pings the target database before handing it to the
//! registry, plus the [`DatabaseBackend`](pmongo_core::backend::DatabaseBackend)
//! the façade runs on.
//!
//! Enable it through the `mongodb` feature of the main crate:
//!
//! ```toml
//! [dependencies]
//! pmongo = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use pmongo::{config::ConnectionConfig, registry::Registry, mongodb::MongoConnector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Registry::new(
//!         MongoConnector::new().with_connect_timeout(Duration::from_secs(5)),
//!     );
//!
//!     registry
//!         .setup(ConnectionConfig::new("mongodb://localhost:27017", "root-db"))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as pmongo_mongodb;

pub mod client;
pub mod database;

pub use client::{DEFAULT_CONNECT_TIMEOUT, MongoClient, MongoConnector};
pub use database::MongoDatabase;
