//! Integration tests for secret publishing.
//!
//! These tests drive [`SecretClient::publish_secrets`] against the
//! in-memory store and validate the idempotent short-circuit, prior
//! version retirement, and failure aggregation across names.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use secretbind::{ClientOptions, Result, SecretClient, SecretsError, VersionState};

use common::MemoryStore;

fn pairs(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Test that publishing creates the first version of a secret.
#[tokio::test]
async fn test_publish_creates_first_version() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let client = SecretClient::new(store.clone(), ClientOptions::new())?;

    client.publish_secrets(pairs(&[("API_KEY", "v1")])).await?;

    assert_eq!(
        store.versions_of("API_KEY"),
        vec![(VersionState::Enabled, "v1".to_string())]
    );
    Ok(())
}

/// Test that republishing an unchanged value adds no version.
#[tokio::test]
async fn test_publish_is_idempotent() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let client = SecretClient::new(store.clone(), ClientOptions::new())?;

    let secrets = pairs(&[("API_KEY", "v1")]);
    client.publish_secrets(secrets.clone()).await?;
    client.publish_secrets(secrets).await?;

    assert_eq!(store.versions_of("API_KEY").len(), 1);
    Ok(())
}

/// Test that disable-prior leaves exactly one live version holding the
/// newest value.
#[tokio::test]
async fn test_disable_prior_leaves_single_live_version() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let client = SecretClient::new(
        store.clone(),
        ClientOptions::new().with_disable_prior(),
    )?;

    client.publish_secrets(pairs(&[("S", "v1")])).await?;
    client.publish_secrets(pairs(&[("S", "v2")])).await?;

    assert_eq!(store.live_payloads("S"), vec!["v2".to_string()]);
    assert_eq!(
        store.versions_of("S")[0],
        (VersionState::Destroyed, String::new())
    );

    // Republishing the same value must not disturb the surviving version.
    client.publish_secrets(pairs(&[("S", "v2")])).await?;
    assert_eq!(store.live_payloads("S"), vec!["v2".to_string()]);
    Ok(())
}

/// Test that already-destroyed versions are skipped during cleanup
/// instead of failing the slot.
#[tokio::test]
async fn test_disable_prior_skips_already_destroyed_versions() -> Result<()> {
    let store = Arc::new(
        MemoryStore::new()
            .with_version("API_KEY", "old1", VersionState::Destroyed)
            .with_version("API_KEY", "old2", VersionState::Enabled),
    );
    let client = SecretClient::new(
        store.clone(),
        ClientOptions::new().with_disable_prior(),
    )?;

    // The in-memory store rejects a second destroy of the same version,
    // so this call succeeding proves the destroyed one was skipped.
    client.publish_secrets(pairs(&[("API_KEY", "new")])).await?;

    let states: Vec<VersionState> = store
        .versions_of("API_KEY")
        .into_iter()
        .map(|(state, _)| state)
        .collect();
    assert_eq!(
        states,
        [
            VersionState::Destroyed,
            VersionState::Destroyed,
            VersionState::Enabled
        ]
    );
    Ok(())
}

/// Test that one name's failure is aggregated without blocking others.
#[tokio::test]
async fn test_publish_failures_aggregate_across_names() {
    let store = Arc::new(MemoryStore::new().with_add_failure("BROKEN"));
    let client = SecretClient::new(store.clone(), ClientOptions::new()).unwrap();

    let err = client
        .publish_secrets(pairs(&[("API_KEY", "v1"), ("BROKEN", "v1")]))
        .await
        .unwrap_err();

    let agg = match err {
        SecretsError::Aggregate(agg) => agg,
        other => panic!("expected aggregate error, got {:?}", other),
    };
    assert_eq!(agg.len(), 1);
    assert_eq!(agg.failures()[0].name, "BROKEN");

    // The healthy name was still published.
    assert_eq!(store.versions_of("API_KEY").len(), 1);
    assert!(store.versions_of("BROKEN").is_empty());
}

/// Test that publish names are used exactly as written.
#[tokio::test]
async fn test_publish_keeps_name_case() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let client = SecretClient::new(store.clone(), ClientOptions::new())?;

    client.publish_secrets(pairs(&[("api_key", "v1")])).await?;

    assert_eq!(store.versions_of("api_key").len(), 1);
    assert!(store.versions_of("API_KEY").is_empty());
    Ok(())
}

/// Test that publishing an empty map is a no-op.
#[tokio::test]
async fn test_publish_empty_map_is_noop() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let client = SecretClient::new(store.clone(), ClientOptions::new())?;

    client.publish_secrets(HashMap::new()).await?;

    assert_eq!(store.access_calls(), 0);
    Ok(())
}
