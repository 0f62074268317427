//! Remote secret store interface.
//!
//! The resolution engine and the version publisher talk to the store
//! exclusively through [`SecretStore`], so any backend that can fetch, list,
//! append, and destroy secret versions can drive them. The crate ships a
//! Google Cloud Secret Manager implementation behind the `gcp` feature;
//! tests use in-memory implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Result;

/// Lifecycle state of a stored secret version.
///
/// Mirrors the wire states of Secret Manager; `Unspecified` covers an unset
/// or unrecognized state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VersionState {
    /// State was absent or unknown.
    #[serde(rename = "STATE_UNSPECIFIED")]
    Unspecified,
    /// Version is live and its payload can be accessed.
    Enabled,
    /// Version exists but access is currently denied.
    Disabled,
    /// Payload is gone; the version is a tombstone.
    Destroyed,
}

impl VersionState {
    /// Wire representation of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "STATE_UNSPECIFIED",
            Self::Enabled => "ENABLED",
            Self::Disabled => "DISABLED",
            Self::Destroyed => "DESTROYED",
        }
    }
}

impl FromStr for VersionState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "STATE_UNSPECIFIED" => Ok(Self::Unspecified),
            "ENABLED" => Ok(Self::Enabled),
            "DISABLED" => Ok(Self::Disabled),
            "DESTROYED" => Ok(Self::Destroyed),
            _ => Err(format!("unknown secret version state: {}", s)),
        }
    }
}

impl fmt::Display for VersionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable payload revision of a named secret.
///
/// The store owns versions; this crate only reads them and requests state
/// transitions (destroy). The `name` is the store's full resource identifier
/// for the version and is the handle used to destroy it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretVersion {
    /// Store-assigned resource name of this version.
    pub name: String,
    /// Lifecycle state at the time it was listed.
    pub state: VersionState,
    /// When the version was created, if the store reported it.
    pub create_time: Option<DateTime<Utc>>,
}

impl SecretVersion {
    /// Create a version handle without a creation timestamp.
    pub fn new(name: impl Into<String>, state: VersionState) -> Self {
        Self { name: name.into(), state, create_time: None }
    }

    /// Attach the creation timestamp.
    pub fn with_create_time(mut self, create_time: DateTime<Utc>) -> Self {
        self.create_time = Some(create_time);
        self
    }
}

/// Metadata for a named secret, without any payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretInfo {
    /// Store-assigned resource name of the secret.
    pub name: String,
    /// When the secret container was created, if reported.
    pub create_time: Option<DateTime<Utc>>,
}

/// Interface the engine requires from a remote secret store.
///
/// Implementations must be `Send + Sync`; the fan-out executor shares one
/// store across all in-flight slot tasks. Implementations must never log
/// payload bytes.
///
/// # Errors
///
/// Absence is reported as [`SecretsError::NotFound`]; every other failure as
/// [`SecretsError::Store`]. The resolution policies treat the two alike, but
/// the distinction is preserved in per-slot outcomes.
///
/// [`SecretsError::NotFound`]: crate::error::SecretsError::NotFound
/// [`SecretsError::Store`]: crate::error::SecretsError::Store
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the payload of the latest version of `name`.
    async fn access_latest(&self, name: &str) -> Result<Vec<u8>>;

    /// Append a new version of `name` holding `payload`.
    async fn add_version(&self, name: &str, payload: &[u8]) -> Result<SecretVersion>;

    /// List the versions of `name`, up to the store's page limit of 1000.
    ///
    /// Secrets with more than one page of versions are not paginated
    /// further; callers see the first page only.
    async fn list_versions(&self, name: &str) -> Result<Vec<SecretVersion>>;

    /// Ask the store to destroy one version by its resource name.
    ///
    /// Destroying is terminal; the payload becomes unrecoverable.
    async fn destroy_version(&self, version_name: &str) -> Result<()>;

    /// Fetch metadata for `name`, or `NotFound` when the secret is absent.
    async fn get(&self, name: &str) -> Result<SecretInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_state_roundtrip() {
        for state in [
            VersionState::Unspecified,
            VersionState::Enabled,
            VersionState::Disabled,
            VersionState::Destroyed,
        ] {
            let s = state.as_str();
            let parsed: VersionState = s.parse().unwrap();
            assert_eq!(state, parsed);
        }
    }

    #[test]
    fn test_version_state_rejects_unknown() {
        let parsed = "CORRUPTED".parse::<VersionState>();
        assert!(parsed.is_err());
    }

    #[test]
    fn test_version_state_serialization() {
        let json = serde_json::to_string(&VersionState::Destroyed).unwrap();
        assert_eq!(json, "\"DESTROYED\"");

        let parsed: VersionState = serde_json::from_str("\"STATE_UNSPECIFIED\"").unwrap();
        assert_eq!(parsed, VersionState::Unspecified);
    }

    #[test]
    fn test_secret_version_builder() {
        let created = Utc::now();
        let version = SecretVersion::new("projects/p/secrets/s/versions/3", VersionState::Enabled)
            .with_create_time(created);

        assert_eq!(version.name, "projects/p/secrets/s/versions/3");
        assert_eq!(version.state, VersionState::Enabled);
        assert_eq!(version.create_time, Some(created));
    }
}
