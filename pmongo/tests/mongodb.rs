#![cfg(feature = "mongodb")]

use std::{collections::HashMap, time::Duration};

use pmongo::{mongodb::MongoConnector, prelude::*};
use serde::{Deserialize, Serialize};

const URL_VAR: &str = "PMONGO_TEST_MONGODB_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Document)]
#[document(collection = "orderStatusMappingLookUpInfo")]
#[serde(rename_all = "camelCase")]
struct OrderStatus {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    internal_status: String,
    mfr_status: String,
}

#[tokio::test]
async fn unreachable_server_is_a_connection_error() {
    let registry = Registry::new(
        MongoConnector::new().with_connect_timeout(Duration::from_millis(500)),
    );

    let err = registry
        .setup(ConnectionConfig::new("mongodb://127.0.0.1:1", "root-db"))
        .await
        .unwrap_err();

    assert!(matches!(err, PMongoError::Connection(ref db_name, _) if db_name == "root-db"));
    assert!(registry.is_empty().await);
}

/// Runs against a live server when `PMONGO_TEST_MONGODB_URL` is set.
#[tokio::test]
async fn round_trip_against_live_server() {
    let Ok(url) = std::env::var(URL_VAR) else {
        println!("Skipping round_trip_against_live_server: {URL_VAR} not set");
        return;
    };

    let registry = Registry::new(MongoConnector::new());
    registry
        .setup_all([
            ConnectionConfig::new(url.clone(), "pmongo-test-root-db"),
            ConnectionConfig::new(url, "pmongo-test-card-db"),
        ])
        .await
        .unwrap();

    let root = registry.connection_by_name("pmongo-test-root-db").await.unwrap();
    let card = registry.connection_by_name("pmongo-test-card-db").await.unwrap();

    root.remove_all::<OrderStatus>(doc! {}).await.unwrap();
    card.remove_all::<OrderStatus>(doc! {}).await.unwrap();

    let id = root
        .save(&OrderStatus {
            id: None,
            internal_status: "is".to_string(),
            mfr_status: "ms".to_string(),
        })
        .await
        .unwrap()
        .as_object_id()
        .unwrap();

    let found: OrderStatus = root.find_by_id(&id.to_hex()).await.unwrap();
    assert_eq!(found.mfr_status, "ms");

    assert!(matches!(
        card.find::<OrderStatus>(doc! { "internalStatus": "is" }).await,
        Err(PMongoError::NoDocuments(_))
    ));

    root.bulk_write_update(
        OrderStatus::collection_name(),
        HashMap::from([(id.to_hex(), doc! { "mfrStatus": "shipped" })]),
    )
    .await
    .unwrap();

    let secondary = registry
        .secondary_connection_by_name("pmongo-test-root-db")
        .await
        .unwrap();
    assert_eq!(secondary.read_mode(), ReadMode::SecondaryPreferred);

    let found: OrderStatus = root.find_by_id(&id.to_hex()).await.unwrap();
    assert_eq!(found.mfr_status, "shipped");

    assert_eq!(
        root.remove_all_with_count::<OrderStatus>(doc! {}).await.unwrap(),
        1
    );

    registry.shutdown().await.unwrap();
}
