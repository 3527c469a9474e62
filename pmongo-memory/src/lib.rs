//! In-memory driver for pmongo.
//!
//! This crate implements the driver traits of `pmongo-core` without a server. It
//! evaluates the same filter and update documents the MongoDB driver would send,
//! which makes it suitable for development and tests.
//!
//! # Quick Start
//!
//! ```ignore
//! use pmongo::{prelude::*, memory::InMemoryConnector};
//!
//! #[tokio::main]
//! async fn main() -> PMongoResult<()> {
//!     let registry = Registry::new(InMemoryConnector::new());
//!     registry.setup(ConnectionConfig::new("memory://local", "root-db")).await?;
//!
//!     let conn = registry.connection().await.expect("one database registered");
//!     conn.insert_many("events", vec![doc! { "kind": "created" }]).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as pmongo_memory;

pub mod evaluator;
pub mod store;

pub use store::{InMemoryClient, InMemoryConnector, InMemoryDatabase, MEMORY_SCHEME};
