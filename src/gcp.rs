//! GCP Secret Manager backend.
//!
//! Implements [`SecretStore`] against Google Cloud Secret Manager and
//! provides one-shot helpers that build a throwaway client per call.
//!
//! Authentication reads a service account key from the path in
//! `GOOGLE_APPLICATION_CREDENTIALS`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use google_secretmanager1::api::{
    AddSecretVersionRequest, DestroySecretVersionRequest, SecretPayload,
};
use google_secretmanager1::{hyper_rustls, hyper_util, SecretManager};

use crate::binder::BindableConfig;
use crate::client::{ClientOptions, SecretClient};
use crate::envfile::EnvFileAction;
use crate::error::{Result, SecretsError};
use crate::store::{SecretInfo, SecretStore, SecretVersion, VersionState};

/// [`SecretStore`] backed by Google Cloud Secret Manager.
pub struct GcpSecretStore {
    hub: SecretManager<
        hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
    >,
    project: String,
}

impl fmt::Debug for GcpSecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcpSecretStore")
            .field("project", &self.project)
            .field("hub", &"[SecretManager]")
            .finish()
    }
}

impl GcpSecretStore {
    /// Connects to Secret Manager for one project.
    pub async fn new(project: impl Into<String>) -> Result<Self> {
        let project = project.into();

        let client =
            hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
                .build(
                    hyper_rustls::HttpsConnectorBuilder::new()
                        .with_native_roots()
                        .map_err(|e| {
                            SecretsError::client_construction(format!(
                                "failed to load native TLS roots: {}",
                                e
                            ))
                        })?
                        .https_or_http()
                        .enable_http2()
                        .build(),
                );

        let key_path =
            std::env::var("GOOGLE_APPLICATION_CREDENTIALS").unwrap_or_else(|_| String::new());
        let auth = yup_oauth2::ServiceAccountAuthenticator::builder(
            yup_oauth2::read_service_account_key(key_path)
                .await
                .map_err(|e| {
                    SecretsError::client_construction(format!(
                        "failed to read GCP credentials, set GOOGLE_APPLICATION_CREDENTIALS \
                         to a service account key file: {}",
                        e
                    ))
                })?,
        )
        .build()
        .await
        .map_err(|e| {
            SecretsError::client_construction(format!("failed to build GCP authenticator: {}", e))
        })?;

        let hub = SecretManager::new(client, auth);

        info!(project = %project, "initialized GCP Secret Manager store");

        Ok(Self { hub, project })
    }

    pub fn project(&self) -> &str {
        &self.project
    }
}

fn secret_path(project: &str, name: &str) -> String {
    format!("projects/{}/secrets/{}", project, name)
}

fn latest_version_path(project: &str, name: &str) -> String {
    format!("{}/versions/latest", secret_path(project, name))
}

/// Maps a Secret Manager error onto the store taxonomy, keeping the
/// backend's message.
fn classify(name: &str, err: impl ToString) -> SecretsError {
    let text = err.to_string();
    if text.contains("NOT_FOUND") || text.contains("404") {
        SecretsError::not_found(name)
    } else {
        SecretsError::store(format!("secret {}: {}", name, text))
    }
}

fn convert_version(version: google_secretmanager1::api::SecretVersion) -> SecretVersion {
    let state = version
        .state
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or(VersionState::Unspecified);
    let mut converted = SecretVersion::new(version.name.unwrap_or_default(), state);
    if let Some(create_time) = version.create_time {
        converted = converted.with_create_time(create_time);
    }
    converted
}

#[async_trait]
impl SecretStore for GcpSecretStore {
    async fn access_latest(&self, name: &str) -> Result<Vec<u8>> {
        let resource = latest_version_path(&self.project, name);
        debug!(secret = %name, resource = %resource, "accessing latest secret version");

        match self
            .hub
            .projects()
            .secrets_versions_access(&resource)
            .doit()
            .await
        {
            Ok((_, response)) => {
                let payload = response.payload.ok_or_else(|| {
                    SecretsError::invalid_payload(format!("secret {} has no payload", name))
                })?;
                Ok(payload.data.unwrap_or_default())
            }
            Err(e) => {
                error!(secret = %name, error = %e, "failed to access latest secret version");
                Err(classify(name, e))
            }
        }
    }

    async fn add_version(&self, name: &str, payload: &[u8]) -> Result<SecretVersion> {
        let parent = secret_path(&self.project, name);
        debug!(secret = %name, "adding secret version");

        let request = AddSecretVersionRequest {
            payload: Some(SecretPayload {
                data: Some(payload.to_vec()),
                ..Default::default()
            }),
            ..Default::default()
        };

        match self
            .hub
            .projects()
            .secrets_add_version(request, &parent)
            .doit()
            .await
        {
            Ok((_, version)) => Ok(convert_version(version)),
            Err(e) => Err(classify(name, e)),
        }
    }

    async fn list_versions(&self, name: &str) -> Result<Vec<SecretVersion>> {
        let parent = secret_path(&self.project, name);
        debug!(secret = %name, "listing secret versions");

        match self
            .hub
            .projects()
            .secrets_versions_list(&parent)
            .page_size(1000)
            .doit()
            .await
        {
            Ok((_, response)) => Ok(response
                .versions
                .unwrap_or_default()
                .into_iter()
                .map(convert_version)
                .collect()),
            Err(e) => Err(classify(name, e)),
        }
    }

    async fn destroy_version(&self, version_name: &str) -> Result<()> {
        debug!(version = %version_name, "destroying secret version");

        match self
            .hub
            .projects()
            .secrets_versions_destroy(DestroySecretVersionRequest::default(), version_name)
            .doit()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => Err(classify(version_name, e)),
        }
    }

    async fn get(&self, name: &str) -> Result<SecretInfo> {
        let resource = secret_path(&self.project, name);
        debug!(secret = %name, "fetching secret metadata");

        match self.hub.projects().secrets_get(&resource).doit().await {
            Ok((_, secret)) => Ok(SecretInfo {
                name: secret.name.unwrap_or(resource),
                create_time: secret.create_time,
            }),
            Err(e) => Err(classify(name, e)),
        }
    }
}

/// Fills `config` from Secret Manager with default options and the given
/// environment policy.
pub async fn resolve_config(
    config: &mut dyn BindableConfig,
    project: &str,
    action: EnvFileAction,
) -> Result<()> {
    resolve_config_with(config, project, ClientOptions::new().with_env_file(action)).await
}

/// Fills `config` from Secret Manager with explicit options.
pub async fn resolve_config_with(
    config: &mut dyn BindableConfig,
    project: &str,
    options: ClientOptions,
) -> Result<()> {
    let store = GcpSecretStore::new(project).await?;
    let client = SecretClient::new(Arc::new(store), options)?;
    client.resolve_config(config).await
}

/// Publishes each pair as the latest version of its secret.
pub async fn publish_secrets(
    project: &str,
    secrets: HashMap<String, String>,
    options: ClientOptions,
) -> Result<()> {
    let store = GcpSecretStore::new(project).await?;
    let client = SecretClient::new(Arc::new(store), options)?;
    client.publish_secrets(secrets).await
}

/// Fetches one secret holding a YAML document and deserializes it.
pub async fn fetch_config_yaml<T: DeserializeOwned>(project: &str, secret: &str) -> Result<T> {
    let store = GcpSecretStore::new(project).await?;
    let client = SecretClient::new(Arc::new(store), ClientOptions::new())?;
    client.fetch_config_yaml(secret).await
}
