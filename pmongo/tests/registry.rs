use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use futures::{channel::oneshot, lock::Mutex};
use pmongo::{
    memory::{InMemoryClient, InMemoryConnector, InMemoryDatabase},
    prelude::*,
};
use serde::{Deserialize, Serialize};

const HOST: &str = "memory://local";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Document)]
#[document(collection = "orderStatusMappingLookUpInfo")]
#[serde(rename_all = "camelCase")]
struct OrderStatus {
    internal_status: String,
    mfr_status: String,
}

impl OrderStatus {
    fn new(internal_status: &str, mfr_status: &str) -> Self {
        Self {
            internal_status: internal_status.to_string(),
            mfr_status: mfr_status.to_string(),
        }
    }
}

/// Wraps the in-memory connector: counts client shutdowns and can hold one
/// database's connect until released.
#[derive(Default)]
struct TrackingConnector {
    inner: InMemoryConnector,
    shutdowns: Arc<AtomicUsize>,
    held: Mutex<Option<(String, oneshot::Receiver<()>)>>,
}

impl TrackingConnector {
    /// Makes the next connect for `db_name` wait until the returned sender fires.
    async fn hold(&self, db_name: &str) -> oneshot::Sender<()> {
        let (release, wait) = oneshot::channel();
        *self.held.lock().await = Some((db_name.to_string(), wait));
        release
    }
}

#[derive(Debug)]
struct TrackingClient {
    inner: InMemoryClient,
    shutdowns: Arc<AtomicUsize>,
}

#[async_trait]
impl ClientBackend for TrackingClient {
    type Database = InMemoryDatabase;

    fn database(&self, name: &str, read_mode: ReadMode) -> Self::Database {
        self.inner.database(name, read_mode)
    }

    async fn shutdown(&self) -> PMongoResult<()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        self.inner.shutdown().await
    }
}

#[async_trait]
impl Connector for TrackingConnector {
    type Client = TrackingClient;

    async fn connect(&self, config: &ConnectionConfig) -> PMongoResult<Self::Client> {
        let wait = {
            let mut held = self.held.lock().await;
            match held.take() {
                Some((db_name, wait)) if db_name == config.db_name => Some(wait),
                other => {
                    *held = other;
                    None
                }
            }
        };

        if let Some(wait) = wait {
            let _ = wait.await;
        }

        Ok(TrackingClient {
            inner: self.inner.connect(config).await?,
            shutdowns: self.shutdowns.clone(),
        })
    }
}

#[test]
fn derive_uses_collection_attribute() {
    assert_eq!(OrderStatus::collection_name(), "orderStatusMappingLookUpInfo");
}

#[tokio::test]
async fn setup_rejects_empty_config_without_connecting() {
    let registry = Registry::new(InMemoryConnector::new());

    let err = registry
        .setup(ConnectionConfig::new("", "root-db"))
        .await
        .unwrap_err();
    assert!(matches!(err, PMongoError::Config(_)));

    let err = registry
        .setup(ConnectionConfig::new(HOST, "  "))
        .await
        .unwrap_err();
    assert!(matches!(err, PMongoError::Config(_)));

    assert!(registry.is_empty().await);
    assert!(registry.connector().server(HOST).await.is_none());
}

#[tokio::test]
async fn setup_reports_connection_failure() {
    let registry = Registry::new(InMemoryConnector::new());

    let err = registry
        .setup(ConnectionConfig::new("mongodb://localhost:27017", "root-db"))
        .await
        .unwrap_err();

    match err {
        PMongoError::Connection(db_name, _) => assert_eq!(db_name, "root-db"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn unnamed_connection_requires_exactly_one_database() {
    let registry = Registry::new(InMemoryConnector::new());

    assert!(registry.connection().await.is_none());
    assert!(registry.secondary_connection().await.is_none());

    registry
        .setup(ConnectionConfig::new(HOST, "root-db"))
        .await
        .unwrap();

    let conn = registry.connection().await.unwrap();
    assert_eq!(conn.database_name(), "root-db");

    registry
        .setup(ConnectionConfig::new(HOST, "card-db"))
        .await
        .unwrap();

    assert!(registry.connection().await.is_none());
    assert!(registry.secondary_connection().await.is_none());
    assert_eq!(registry.names().await, vec!["card-db", "root-db"]);

    let conn = registry.connection_by_name("card-db").await.unwrap();
    assert_eq!(conn.database_name(), "card-db");
}

#[tokio::test]
async fn unknown_name_is_not_found() {
    let registry = Registry::new(InMemoryConnector::new());
    registry
        .setup(ConnectionConfig::new(HOST, "root-db"))
        .await
        .unwrap();

    let err = registry.connection_by_name("card-db").await.unwrap_err();
    assert!(matches!(err, PMongoError::NotFound(ref name) if name == "card-db"));
    assert!(err.is_not_found());

    let err = registry
        .secondary_connection_by_name("card-db")
        .await
        .unwrap_err();
    assert!(matches!(err, PMongoError::NotFound(_)));
}

#[tokio::test]
async fn secondary_handles_prefer_secondaries() {
    let registry = Registry::new(InMemoryConnector::new());
    registry
        .setup(ConnectionConfig::new(HOST, "root-db"))
        .await
        .unwrap();

    let primary = registry.connection().await.unwrap();
    let secondary = registry.secondary_connection().await.unwrap();

    assert_eq!(primary.read_mode(), ReadMode::Primary);
    assert_eq!(secondary.read_mode(), ReadMode::SecondaryPreferred);
    assert_eq!(secondary.database_name(), "root-db");

    let named = registry
        .secondary_connection_by_name("root-db")
        .await
        .unwrap();
    assert_eq!(named.read_mode(), ReadMode::SecondaryPreferred);
}

#[tokio::test]
async fn configured_read_mode_applies_to_default_handle() {
    let registry = Registry::new(InMemoryConnector::new());
    registry
        .setup(ConnectionConfig::new(HOST, "root-db").with_read_mode(ReadMode::SecondaryPreferred))
        .await
        .unwrap();

    let conn = registry.connection().await.unwrap();
    assert_eq!(conn.read_mode(), ReadMode::SecondaryPreferred);
}

#[tokio::test]
async fn repeated_setup_keeps_one_descriptor() {
    let registry = Registry::new(InMemoryConnector::new());
    let config = ConnectionConfig::new(HOST, "root-db");

    registry.setup(config.clone()).await.unwrap();
    registry.setup(config.clone()).await.unwrap();
    assert_eq!(registry.len().await, 1);

    registry
        .setup(config.with_read_mode(ReadMode::SecondaryPreferred))
        .await
        .unwrap();
    assert_eq!(registry.len().await, 1);

    let descriptor = registry.get("root-db").await.unwrap();
    assert_eq!(descriptor.config().read_mode, ReadMode::SecondaryPreferred);
}

#[tokio::test]
async fn concurrent_setups_all_register() {
    let registry = Registry::new(InMemoryConnector::new());

    let (root, card) = tokio::join!(
        registry.setup(ConnectionConfig::new(HOST, "root-db")),
        registry.setup(ConnectionConfig::new(HOST, "card-db")),
    );
    root.unwrap();
    card.unwrap();

    assert_eq!(registry.names().await, vec!["card-db", "root-db"]);
}

#[tokio::test]
async fn setup_all_stops_at_first_failure() {
    let registry = Registry::new(InMemoryConnector::new());

    let err = registry
        .setup_all([
            ConnectionConfig::new(HOST, "root-db"),
            ConnectionConfig::new("", "card-db"),
            ConnectionConfig::new(HOST, "audit-db"),
        ])
        .await
        .unwrap_err();

    assert!(matches!(err, PMongoError::Config(_)));
    assert_eq!(registry.names().await, vec!["root-db"]);
}

#[tokio::test]
async fn databases_on_one_server_are_isolated() {
    let registry = Registry::new(InMemoryConnector::new());
    registry
        .setup_all([
            ConnectionConfig::new(HOST, "root-db"),
            ConnectionConfig::new(HOST, "card-db"),
        ])
        .await
        .unwrap();

    let root = registry.connection_by_name("root-db").await.unwrap();
    let card = registry.connection_by_name("card-db").await.unwrap();

    root.save(&OrderStatus::new("is", "ms")).await.unwrap();

    let found: OrderStatus = root.find(doc! { "internalStatus": "is" }).await.unwrap();
    assert_eq!(found, OrderStatus::new("is", "ms"));

    let err = card
        .find::<OrderStatus>(doc! { "internalStatus": "is" })
        .await
        .unwrap_err();
    assert!(matches!(err, PMongoError::NoDocuments(ref collection) if collection == "orderStatusMappingLookUpInfo"));
}

#[tokio::test]
async fn shutdown_unregisters_everything() {
    let registry = Registry::new(InMemoryConnector::new());
    registry
        .setup_all([
            ConnectionConfig::new(HOST, "root-db"),
            ConnectionConfig::new(HOST, "card-db"),
        ])
        .await
        .unwrap();

    registry.shutdown().await.unwrap();

    assert!(registry.is_empty().await);
    assert!(matches!(
        registry.connection_by_name("root-db").await,
        Err(PMongoError::NotFound(_))
    ));
}

#[tokio::test]
async fn lookups_proceed_while_another_setup_connects() {
    let registry = Registry::new(TrackingConnector::default());
    registry
        .setup(ConnectionConfig::new(HOST, "root-db"))
        .await
        .unwrap();

    let release = registry.connector().hold("card-db").await;

    let (setup, looked_up) = tokio::join!(
        registry.setup(ConnectionConfig::new(HOST, "card-db")),
        async {
            let found = registry.connection_by_name("root-db").await.map(|conn| conn.database_name().to_string());
            let pending = registry.names().await;
            release.send(()).unwrap();
            (found, pending)
        },
    );

    setup.unwrap();
    let (found, pending) = looked_up;
    assert_eq!(found.unwrap(), "root-db");
    assert_eq!(pending, vec!["root-db"]);
    assert_eq!(registry.names().await, vec!["card-db", "root-db"]);
}

#[tokio::test]
async fn replacing_a_descriptor_shuts_down_the_old_client() {
    let registry = Registry::new(TrackingConnector::default());
    let config = ConnectionConfig::new(HOST, "root-db");

    registry.setup(config.clone()).await.unwrap();
    registry.setup(config.clone()).await.unwrap();
    assert_eq!(registry.connector().shutdowns.load(Ordering::SeqCst), 0);

    registry
        .setup(config.with_read_mode(ReadMode::SecondaryPreferred))
        .await
        .unwrap();
    assert_eq!(registry.connector().shutdowns.load(Ordering::SeqCst), 1);

    registry.shutdown().await.unwrap();
    assert_eq!(registry.connector().shutdowns.load(Ordering::SeqCst), 2);
}
