//! High-level client over a [`SecretStore`].
//!
//! [`SecretClient`] drives the three batch operations: filling a config
//! struct, resolving an explicit name list, and publishing new secret
//! versions. All three fan out through the same bounded executor and
//! aggregate per-slot failures instead of aborting on the first one.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::binder::{slot_names, write_back, BindableConfig};
use crate::envfile::{load_env_file, EnvFileAction};
use crate::error::{AggregateError, Result, SecretsError, SlotFailure};
use crate::executor::FanOutExecutor;
use crate::mirror::SharedMirror;
use crate::publisher::{publish_slot, PublishContext};
use crate::resolver::{resolve_slot, SlotContext};
use crate::store::SecretStore;

/// Default number of in-flight store calls per batch.
pub const DEFAULT_CONCURRENCY: usize = 50;

/// Tunables for a [`SecretClient`].
#[derive(Clone)]
pub struct ClientOptions {
    concurrency: usize,
    env_file: EnvFileAction,
    mirror: Option<SharedMirror>,
    disable_prior: bool,
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of concurrent store calls. Must be greater than
    /// zero; validated when the client is built.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit;
        self
    }

    /// Controls how environment values interact with store lookups.
    pub fn with_env_file(mut self, action: EnvFileAction) -> Self {
        self.env_file = action;
        self
    }

    /// Mirrors every resolved value into `mirror` under the lower-cased
    /// slot name.
    pub fn with_mirror(mut self, mirror: SharedMirror) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Destroys prior versions after each successful publish.
    pub fn with_disable_prior(mut self) -> Self {
        self.disable_prior = true;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn env_file(&self) -> EnvFileAction {
        self.env_file
    }

    pub fn disable_prior(&self) -> bool {
        self.disable_prior
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            env_file: EnvFileAction::default(),
            mirror: None,
            disable_prior: false,
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("concurrency", &self.concurrency)
            .field("env_file", &self.env_file)
            .field("mirror", &self.mirror.is_some())
            .field("disable_prior", &self.disable_prior)
            .finish()
    }
}

/// Batch client for resolving and publishing secrets.
#[derive(Clone)]
pub struct SecretClient {
    store: Arc<dyn SecretStore>,
    options: ClientOptions,
    executor: FanOutExecutor,
}

impl SecretClient {
    /// Builds a client over `store`. Fails fast when the options are
    /// invalid, before any store call is made.
    pub fn new(store: Arc<dyn SecretStore>, options: ClientOptions) -> Result<Self> {
        let executor = FanOutExecutor::new(options.concurrency)?;
        Ok(Self {
            store,
            options,
            executor,
        })
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Fills every slot of `config` from the store, subject to the
    /// configured environment policy.
    ///
    /// All slots are attempted before the call returns. Successfully
    /// resolved slots are written back even when others fail; the
    /// failures come back as one [`AggregateError`] naming each slot.
    pub async fn resolve_config(&self, config: &mut dyn BindableConfig) -> Result<()> {
        let names = slot_names(config)?;
        let (values, failures) = self.resolve_batch(names).await;
        write_back(config, &values);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(AggregateError::new(failures).into())
        }
    }

    /// Resolves an explicit list of slot names to their values.
    pub async fn resolve_named(&self, names: Vec<String>) -> Result<HashMap<String, String>> {
        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(SecretsError::precondition(format!(
                    "duplicate slot name: {}",
                    name
                )));
            }
        }

        let (values, failures) = self.resolve_batch(names).await;
        if failures.is_empty() {
            Ok(values)
        } else {
            Err(AggregateError::new(failures).into())
        }
    }

    /// Publishes each `name -> value` pair as the latest secret version,
    /// skipping names whose latest version already matches. With the
    /// disable-prior option set, superseded versions are destroyed.
    pub async fn publish_secrets(&self, secrets: HashMap<String, String>) -> Result<()> {
        let ctx = Arc::new(PublishContext {
            store: Arc::clone(&self.store),
            disable_prior: self.options.disable_prior,
        });

        let mut tasks = Vec::with_capacity(secrets.len());
        for (name, value) in secrets {
            let ctx = Arc::clone(&ctx);
            tasks.push((name.clone(), publish_slot(ctx, name, value)));
        }

        let outcomes = self.executor.run(tasks).await;

        let mut failures = Vec::new();
        for outcome in outcomes {
            if let Err(err) = outcome.result {
                failures.push(SlotFailure::new(outcome.name, err));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(AggregateError::new(failures).into())
        }
    }

    /// Fetches one secret holding a whole YAML document and deserializes
    /// it into `T`. The secret name is used as written.
    pub async fn fetch_config_yaml<T: DeserializeOwned>(&self, secret: &str) -> Result<T> {
        let payload = self.store.access_latest(secret).await?;
        serde_yaml::from_slice(&payload).map_err(|err| {
            SecretsError::invalid_payload(format!("secret {} is not valid YAML: {}", secret, err))
        })
    }

    /// Reports whether a secret exists, without touching its payload.
    pub async fn secret_exists(&self, name: &str) -> Result<bool> {
        match self.store.get(name).await {
            Ok(_) => Ok(true),
            Err(SecretsError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn resolve_batch(
        &self,
        names: Vec<String>,
    ) -> (HashMap<String, String>, Vec<SlotFailure>) {
        if self.options.env_file != EnvFileAction::Disable {
            load_env_file();
        }

        let ctx = Arc::new(SlotContext {
            store: Arc::clone(&self.store),
            action: self.options.env_file,
            mirror: self.options.mirror.clone(),
        });

        let mut tasks = Vec::with_capacity(names.len());
        for name in names {
            let ctx = Arc::clone(&ctx);
            tasks.push((name.clone(), resolve_slot(ctx, name)));
        }

        let outcomes = self.executor.run(tasks).await;

        let mut values = HashMap::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome.result {
                Ok(value) => {
                    values.insert(outcome.name, value);
                }
                Err(err) => failures.push(SlotFailure::new(outcome.name, err)),
            }
        }
        (values, failures)
    }
}

impl fmt::Debug for SecretClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretClient")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
