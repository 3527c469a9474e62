//! Registry of named database connections.
//!
//! A [`Registry`] maps a logical database name to a [`Descriptor`] holding the
//! config and the connected client. It is an ordinary value: build one at
//! startup, run [`Registry::setup`] for each database, and hand out references
//! (or an `Arc`) to the code that needs connections.
//!
//! # Resolving the default connection
//!
//! Single-database applications can call [`Registry::connection`] without a name.
//! That only resolves when exactly one database is registered; with zero or
//! several it returns `None` and the caller must use
//! [`Registry::connection_by_name`].
//!
//! # Example
//!
//! ```ignore
//! use pmongo::{config::ConnectionConfig, registry::Registry, mongodb::MongoConnector};
//!
//! let registry = Registry::new(MongoConnector::new());
//! registry
//!     .setup_all([
//!         ConnectionConfig::new("mongodb://localhost:27017", "root-db"),
//!         ConnectionConfig::new("mongodb://localhost:27017", "card-db"),
//!     ])
//!     .await?;
//!
//! let cards = registry.connection_by_name("card-db").await?;
//! ```

use std::{collections::HashMap, fmt, sync::Arc};

use mea::{mutex::Mutex, rwlock::RwLock};
use tracing::{debug, error, info, warn};

use crate::{
    backend::{ClientBackend, Connector},
    config::{ConnectionConfig, ReadMode},
    connection::Connection,
    error::{PMongoError, PMongoResult},
};

/// Database handle type produced by a connector's clients.
pub type DatabaseOf<K> = <<K as Connector>::Client as ClientBackend>::Database;

/// The stored config and client for one logical database name.
#[derive(Debug)]
pub struct Descriptor<C: ClientBackend> {
    config: ConnectionConfig,
    client: C,
}

impl<C: ClientBackend> Descriptor<C> {
    pub fn new(config: ConnectionConfig, client: C) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// A handle using the config's read mode, primary unless the config says otherwise.
    pub fn connection(&self) -> Connection<C::Database> {
        Connection::new(
            self.client
                .database(&self.config.db_name, self.config.read_mode),
        )
    }

    /// A handle requesting secondary-preferred reads.
    pub fn secondary_connection(&self) -> Connection<C::Database> {
        Connection::new(
            self.client
                .database(&self.config.db_name, ReadMode::SecondaryPreferred),
        )
    }
}

/// Registry of connected databases keyed by logical name.
pub struct Registry<K: Connector> {
    connector: K,
    setup_lock: Mutex<()>,
    descriptors: RwLock<HashMap<String, Arc<Descriptor<K::Client>>>>,
}

impl<K: Connector> Registry<K> {
    /// Creates an empty registry that establishes clients with `connector`.
    pub fn new(connector: K) -> Self {
        Self {
            connector,
            setup_lock: Mutex::new(()),
            descriptors: RwLock::new(HashMap::new()),
        }
    }

    pub fn connector(&self) -> &K {
        &self.connector
    }

    /// Validates `config`, connects, and registers the client under `config.db_name`.
    ///
    /// Setups are serialized with each other, but lookups are not blocked while a
    /// connect is in flight; the descriptor map is only locked for the insert.
    /// Registering a name again with an identical config is a no-op. With a
    /// different config the previous descriptor is replaced and its client shut
    /// down.
    ///
    /// # Errors
    ///
    /// - [`PMongoError::Config`] if the URL or name is empty. Nothing is attempted.
    /// - [`PMongoError::Connection`] if the client cannot connect. The failure is
    ///   logged and returned; it is never retried.
    pub async fn setup(&self, config: ConnectionConfig) -> PMongoResult<()> {
        config.validate()?;

        let _setup = self.setup_lock.lock().await;

        if let Some(existing) = self.descriptors.read().await.get(&config.db_name) {
            if existing.config() == &config {
                debug!(db_name = %config.db_name, "Connection already set up");
                return Ok(());
            }

            warn!(db_name = %config.db_name, "Replacing existing connection with a new config");
        }

        let client = self
            .connector
            .connect(&config)
            .await
            .inspect_err(|err| error!(db_name = %config.db_name, error = %err, "Connection failed"))?;

        info!(db_name = %config.db_name, "Connected successfully");

        let db_name = config.db_name.clone();
        let replaced = self.descriptors
            .write()
            .await
            .insert(db_name.clone(), Arc::new(Descriptor::new(config, client)));

        if let Some(replaced) = replaced {
            if let Err(err) = replaced.client().shutdown().await {
                warn!(db_name = %db_name, error = %err, "Failed to shut down replaced client");
            }
        }

        Ok(())
    }

    /// Runs [`setup`](Self::setup) for each config in order, stopping at the first
    /// failure. Configs set up before the failure stay registered.
    pub async fn setup_all(
        &self,
        configs: impl IntoIterator<Item = ConnectionConfig>,
    ) -> PMongoResult<()> {
        for config in configs {
            self.setup(config).await?;
        }

        Ok(())
    }

    /// Returns the descriptor registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`PMongoError::NotFound`] if `name` was never set up.
    pub async fn get(&self, name: &str) -> PMongoResult<Arc<Descriptor<K::Client>>> {
        self.descriptors
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| PMongoError::NotFound(name.to_string()))
    }

    /// The only registered descriptor, if exactly one is registered.
    async fn single(&self) -> Option<Arc<Descriptor<K::Client>>> {
        let descriptors = self.descriptors.read().await;

        if descriptors.len() != 1 {
            debug!(registered = descriptors.len(), "No default connection, a name is required");
            return None;
        }

        descriptors.values().next().cloned()
    }

    /// Handle to the only registered database, using its configured read mode.
    ///
    /// Returns `None` when zero or several databases are registered.
    pub async fn connection(&self) -> Option<Connection<DatabaseOf<K>>> {
        self.single()
            .await
            .map(|descriptor| descriptor.connection())
    }

    /// Handle to the database registered under `name`.
    pub async fn connection_by_name(&self, name: &str) -> PMongoResult<Connection<DatabaseOf<K>>> {
        Ok(self.get(name).await?.connection())
    }

    /// Secondary-preferred handle to the only registered database.
    ///
    /// Returns `None` when zero or several databases are registered.
    pub async fn secondary_connection(&self) -> Option<Connection<DatabaseOf<K>>> {
        self.single()
            .await
            .map(|descriptor| descriptor.secondary_connection())
    }

    /// Secondary-preferred handle to the database registered under `name`.
    pub async fn secondary_connection_by_name(
        &self,
        name: &str,
    ) -> PMongoResult<Connection<DatabaseOf<K>>> {
        Ok(self.get(name).await?.secondary_connection())
    }

    /// Registered names, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.descriptors
            .read()
            .await
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub async fn len(&self) -> usize {
        self.descriptors.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.descriptors.read().await.is_empty()
    }

    /// Unregisters every database and shuts its client down.
    ///
    /// Handles obtained earlier must not be used afterwards.
    pub async fn shutdown(&self) -> PMongoResult<()> {
        let drained: Vec<_> = self.descriptors
            .write()
            .await
            .drain()
            .collect();

        for (name, descriptor) in drained {
            debug!(db_name = %name, "Shutting down client");
            descriptor.client().shutdown().await?;
        }

        Ok(())
    }
}

impl<K: Connector> fmt::Debug for Registry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").finish_non_exhaustive()
    }
}
