//! Per-slot resolution policy.
//!
//! A slot is resolved from the secret store, the process environment, or
//! both, depending on the configured [`EnvFileAction`]. Store lookups use
//! the upper-cased slot name; environment lookups use the name as written.

use std::sync::Arc;

use crate::envfile::{env_lookup, EnvFileAction};
use crate::error::{Result, SecretsError};
use crate::mirror::{mirror_set, SharedMirror};
use crate::store::SecretStore;

/// Shared context handed to every slot task in a batch.
pub(crate) struct SlotContext {
    pub(crate) store: Arc<dyn SecretStore>,
    pub(crate) action: EnvFileAction,
    pub(crate) mirror: Option<SharedMirror>,
}

/// Resolves one slot to its final string value.
pub(crate) async fn resolve_slot(ctx: Arc<SlotContext>, name: String) -> Result<String> {
    match ctx.action {
        EnvFileAction::Disable => {
            let value = fetch_remote(&ctx, &name).await?;
            record(&ctx, &name, &value);
            Ok(value)
        }
        EnvFileAction::Prioritize => {
            if let Some(value) = env_lookup(&name) {
                tracing::debug!(slot = %name, "environment value takes precedence");
                record(&ctx, &name, &value);
                return Ok(value);
            }
            let value = fetch_remote(&ctx, &name).await?;
            record(&ctx, &name, &value);
            Ok(value)
        }
        EnvFileAction::Fallback => match fetch_remote(&ctx, &name).await {
            Ok(value) => {
                record(&ctx, &name, &value);
                Ok(value)
            }
            Err(err) => match env_lookup(&name) {
                Some(value) => {
                    tracing::warn!(
                        slot = %name,
                        error = %err,
                        "store lookup failed, using environment fallback"
                    );
                    record(&ctx, &name, &value);
                    Ok(value)
                }
                None => Err(err),
            },
        },
    }
}

async fn fetch_remote(ctx: &SlotContext, name: &str) -> Result<String> {
    let payload = ctx.store.access_latest(&name.to_uppercase()).await?;
    String::from_utf8(payload)
        .map_err(|_| SecretsError::invalid_payload(format!("secret {} is not valid UTF-8", name)))
}

fn record(ctx: &SlotContext, name: &str, value: &str) {
    if let Some(mirror) = &ctx.mirror {
        mirror_set(mirror, name, value);
    }
}
