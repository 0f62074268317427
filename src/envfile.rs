//! Environment layer: `.env` loading and process-environment lookups.
//!
//! Resolution can consult the process environment either before the remote
//! store (local overrides win) or after it (local values rescue remote
//! failures). A `.env` file in the working directory is folded into the
//! process environment once per resolution call; a missing file is logged
//! and ignored, never fatal.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

/// What role the local environment plays during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvFileAction {
    /// Never load a `.env` file and never consult the environment; the
    /// remote store is the only source.
    Disable,
    /// An environment value wins outright; the store is not queried for
    /// slots the environment satisfies.
    Prioritize,
    /// The store is tried first; the environment value is used only when
    /// the remote lookup fails.
    #[default]
    Fallback,
}

impl EnvFileAction {
    /// Stable lower-case name of this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disable => "disable",
            Self::Prioritize => "prioritize",
            Self::Fallback => "fallback",
        }
    }
}

impl FromStr for EnvFileAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "disable" => Ok(Self::Disable),
            "prioritize" => Ok(Self::Prioritize),
            "fallback" => Ok(Self::Fallback),
            _ => Err(format!("unknown env file action: {}", s)),
        }
    }
}

impl fmt::Display for EnvFileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fold a `.env` file from the working directory into the process
/// environment. Returns whether a file was loaded.
///
/// Missing or unreadable files are logged as a warning, never an error.
pub(crate) fn load_env_file() -> bool {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!(path = %path.display(), "loaded environment file");
            true
        }
        Err(err) => {
            warn!(
                error = %err,
                "could not load .env file; pass EnvFileAction::Disable to skip environment files"
            );
            false
        }
    }
}

/// Read one variable from the process environment by slot name.
///
/// An empty value counts as absent, so `FOO=` in the environment does not
/// shadow or rescue a remote value.
pub(crate) fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
