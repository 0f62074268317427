//! Common test utilities for all integration tests.
//!
//! Provides an in-memory, versioned secret store with call counters and
//! an in-flight gauge for asserting concurrency bounds.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use secretbind::{Result, SecretInfo, SecretStore, SecretVersion, SecretsError, VersionState};

struct StoredVersion {
    name: String,
    state: VersionState,
    payload: Vec<u8>,
}

/// Versioned in-memory [`SecretStore`].
///
/// Listing a name with no stored versions returns an empty list, which
/// models a pre-created secret container that has never been written.
pub struct MemoryStore {
    secrets: Mutex<HashMap<String, Vec<StoredVersion>>>,
    fail_adds: HashSet<String>,
    latency: Option<Duration>,
    access_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            secrets: Mutex::new(HashMap::new()),
            fail_adds: HashSet::new(),
            latency: None,
            access_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Seeds one enabled version holding `value`.
    pub fn with_secret(self, name: &str, value: &str) -> Self {
        self.with_version(name, value, VersionState::Enabled)
    }

    /// Seeds one version in an explicit state.
    pub fn with_version(self, name: &str, value: &str, state: VersionState) -> Self {
        {
            let mut secrets = self.secrets.lock().unwrap();
            let versions = secrets.entry(name.to_string()).or_default();
            let version_name = format!(
                "projects/test/secrets/{}/versions/{}",
                name,
                versions.len() + 1
            );
            versions.push(StoredVersion {
                name: version_name,
                state,
                payload: value.as_bytes().to_vec(),
            });
        }
        self
    }

    /// Makes every `add_version` for `name` fail.
    pub fn with_add_failure(mut self, name: &str) -> Self {
        self.fail_adds.insert(name.to_string());
        self
    }

    /// Holds every `access_latest` open for `latency`, so overlapping
    /// calls are observable through the in-flight gauge.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn access_calls(&self) -> usize {
        self.access_calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Snapshot of `(state, payload)` per version, in creation order.
    pub fn versions_of(&self, name: &str) -> Vec<(VersionState, String)> {
        let secrets = self.secrets.lock().unwrap();
        secrets
            .get(name)
            .map(|versions| {
                versions
                    .iter()
                    .map(|v| (v.state, String::from_utf8_lossy(&v.payload).into_owned()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Payloads of versions that are not destroyed.
    pub fn live_payloads(&self, name: &str) -> Vec<String> {
        self.versions_of(name)
            .into_iter()
            .filter(|(state, _)| *state != VersionState::Destroyed)
            .map(|(_, payload)| payload)
            .collect()
    }

    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn access_latest(&self, name: &str) -> Result<Vec<u8>> {
        self.access_calls.fetch_add(1, Ordering::SeqCst);
        self.enter();
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let result = {
            let secrets = self.secrets.lock().unwrap();
            match secrets.get(name).and_then(|versions| versions.last()) {
                Some(version) if version.state == VersionState::Destroyed => Err(
                    SecretsError::store(format!("secret {}: latest version is destroyed", name)),
                ),
                Some(version) => Ok(version.payload.clone()),
                None => Err(SecretsError::not_found(name)),
            }
        };
        self.exit();
        result
    }

    async fn add_version(&self, name: &str, payload: &[u8]) -> Result<SecretVersion> {
        if self.fail_adds.contains(name) {
            return Err(SecretsError::store(format!(
                "secret {}: add rejected by test store",
                name
            )));
        }

        let mut secrets = self.secrets.lock().unwrap();
        let versions = secrets.entry(name.to_string()).or_default();
        let version_name = format!(
            "projects/test/secrets/{}/versions/{}",
            name,
            versions.len() + 1
        );
        versions.push(StoredVersion {
            name: version_name.clone(),
            state: VersionState::Enabled,
            payload: payload.to_vec(),
        });
        Ok(SecretVersion::new(version_name, VersionState::Enabled))
    }

    async fn list_versions(&self, name: &str) -> Result<Vec<SecretVersion>> {
        let secrets = self.secrets.lock().unwrap();
        Ok(secrets
            .get(name)
            .map(|versions| {
                versions
                    .iter()
                    .map(|v| SecretVersion::new(v.name.clone(), v.state))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn destroy_version(&self, version_name: &str) -> Result<()> {
        let mut secrets = self.secrets.lock().unwrap();
        for versions in secrets.values_mut() {
            if let Some(version) = versions.iter_mut().find(|v| v.name == version_name) {
                if version.state == VersionState::Destroyed {
                    return Err(SecretsError::store(format!(
                        "version {}: already destroyed",
                        version_name
                    )));
                }
                version.state = VersionState::Destroyed;
                version.payload.clear();
                return Ok(());
            }
        }
        Err(SecretsError::not_found(version_name))
    }

    async fn get(&self, name: &str) -> Result<SecretInfo> {
        let secrets = self.secrets.lock().unwrap();
        if secrets.contains_key(name) {
            Ok(SecretInfo {
                name: format!("projects/test/secrets/{}", name),
                create_time: None,
            })
        } else {
            Err(SecretsError::not_found(name))
        }
    }
}
