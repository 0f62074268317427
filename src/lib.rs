//! # Secretbind
//!
//! Secretbind fills a configuration struct's string fields from a remote
//! secret store, with optional environment-variable overrides, bounded
//! concurrency, and per-slot failure aggregation. A companion publisher
//! pushes local key/value pairs back into the store as new secret
//! versions, optionally retiring the versions they supersede.
//!
//! ## Core Components
//!
//! - **Config binding**: [`BindableConfig`] and the [`bind_slots!`] macro map struct fields onto named slots
//! - **Resolution engine**: bounded fan-out over a [`SecretStore`] with policy-driven environment overrides
//! - **Version publisher**: idempotent publishing with optional retirement of prior versions
//! - **GCP backend** (`gcp` feature): Google Cloud Secret Manager implementation of [`SecretStore`]
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use secretbind::{bind_slots, ClientOptions, EnvFileAction, SecretClient, SecretStore};
//!
//! #[derive(Default)]
//! struct AppConfig {
//!     database_url: String,
//!     api_key: String,
//! }
//!
//! bind_slots!(AppConfig { database_url, api_key });
//!
//! # fn store() -> Arc<dyn SecretStore> { unimplemented!() }
//! #[tokio::main]
//! async fn main() -> secretbind::Result<()> {
//!     let client = SecretClient::new(
//!         store(),
//!         ClientOptions::new().with_env_file(EnvFileAction::Fallback),
//!     )?;
//!
//!     let mut config = AppConfig::default();
//!     client.resolve_config(&mut config).await?;
//!     assert!(!config.database_url.is_empty());
//!     Ok(())
//! }
//! ```

pub mod binder;
pub mod client;
pub mod envfile;
pub mod error;
pub mod executor;
#[cfg(feature = "gcp")]
pub mod gcp;
pub mod mirror;
mod publisher;
mod resolver;
pub mod store;

// Re-export commonly used types and traits
pub use binder::BindableConfig;
pub use client::{ClientOptions, SecretClient, DEFAULT_CONCURRENCY};
pub use envfile::EnvFileAction;
pub use error::{AggregateError, Result, SecretsError, SlotFailure};
pub use executor::{FanOutExecutor, SlotOutcome};
pub use mirror::{MirrorSink, SharedMirror};
pub use store::{SecretInfo, SecretStore, SecretVersion, VersionState};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
