//! Version publishing against the secret store.
//!
//! Publishing a slot is idempotent: when the latest version already holds
//! the desired value nothing is written and prior versions are left alone.

use std::sync::Arc;

use crate::error::Result;
use crate::store::{SecretStore, SecretVersion, VersionState};

/// Shared context handed to every publish task in a batch.
pub(crate) struct PublishContext {
    pub(crate) store: Arc<dyn SecretStore>,
    pub(crate) disable_prior: bool,
}

/// Ensures the latest version of `name` carries `value`.
///
/// Versions are listed before the new one is added, so prior-version
/// cleanup never touches the version this call just created.
pub(crate) async fn publish_slot(
    ctx: Arc<PublishContext>,
    name: String,
    value: String,
) -> Result<()> {
    let prior = ctx.store.list_versions(&name).await?;

    match ctx.store.access_latest(&name).await {
        Ok(latest) if latest == value.as_bytes() => {
            tracing::debug!(secret = %name, "latest version already holds the desired value");
            return Ok(());
        }
        Ok(_) => {}
        Err(err) => {
            // An unreadable latest version only disables the unchanged
            // check; the write below establishes one.
            tracing::debug!(
                secret = %name,
                error = %err,
                "could not read latest version before publishing"
            );
        }
    }

    let version = ctx.store.add_version(&name, value.as_bytes()).await?;
    tracing::info!(secret = %name, version = %version.name, "published new secret version");

    if ctx.disable_prior {
        destroy_prior(ctx.store.as_ref(), &name, &prior).await?;
    }
    Ok(())
}

async fn destroy_prior(
    store: &dyn SecretStore,
    name: &str,
    prior: &[SecretVersion],
) -> Result<()> {
    for version in prior {
        if version.state == VersionState::Destroyed {
            continue;
        }
        store.destroy_version(&version.name).await?;
        tracing::debug!(secret = %name, version = %version.name, "destroyed prior version");
    }
    Ok(())
}
