//! Connecting to MongoDB.

use std::time::Duration;

use async_trait::async_trait;
use bson::doc;
use mongodb::{
    Client,
    options::{ClientOptions, DatabaseOptions, ReadPreference, SelectionCriteria},
};
use tracing::debug;

use pmongo_core::{
    backend::{ClientBackend, Connector},
    config::{ConnectionConfig, ReadMode},
    error::{PMongoError, PMongoResult},
};

use crate::database::MongoDatabase;

/// Default bound on establishing a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Establishes [`MongoClient`]s and verifies the server answers before returning.
#[derive(Debug, Clone)]
pub struct MongoConnector {
    connect_timeout: Duration,
}

impl MongoConnector {
    pub fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Bounds both the TCP connect and server selection for the initial ping.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl Default for MongoConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for MongoConnector {
    type Client = MongoClient;

    async fn connect(&self, config: &ConnectionConfig) -> PMongoResult<Self::Client> {
        let connection_error = |e: mongodb::error::Error| PMongoError::Connection(config.db_name.clone(), e.to_string());

        let mut options = ClientOptions::parse(&config.host_url)
            .await
            .map_err(connection_error)?;
        options.connect_timeout = Some(self.connect_timeout);
        options.server_selection_timeout = Some(self.connect_timeout);

        let client = Client::with_options(options).map_err(connection_error)?;

        client
            .database(&config.db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(connection_error)?;

        debug!(db_name = %config.db_name, "MongoDB answered ping");

        Ok(MongoClient::new(client))
    }
}

/// A connected MongoDB client.
#[derive(Debug, Clone)]
pub struct MongoClient {
    client: Client,
}

impl MongoClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The driver client, for calls this crate does not cover.
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ClientBackend for MongoClient {
    type Database = MongoDatabase;

    fn database(&self, name: &str, read_mode: ReadMode) -> Self::Database {
        let database = match read_mode {
            ReadMode::Primary => self.client.database(name),
            ReadMode::SecondaryPreferred => {
                let mut options = DatabaseOptions::default();
                options.selection_criteria = Some(SelectionCriteria::ReadPreference(
                    ReadPreference::SecondaryPreferred {
                        options: Default::default(),
                    },
                ));

                self.client.database_with_options(name, options)
            }
        };

        MongoDatabase::new(database, read_mode)
    }

    async fn shutdown(&self) -> PMongoResult<()> {
        self.client.clone().shutdown().await;

        Ok(())
    }
}
