//! Error types for secret resolution and publishing.

use std::fmt;

use thiserror::Error;

/// Result type for secretbind operations.
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Errors that can occur while resolving or publishing secrets.
#[derive(Error, Debug)]
pub enum SecretsError {
    /// Caller-supplied inputs were rejected before any remote call was made.
    #[error("precondition failed: {message}")]
    Precondition { message: String },

    /// The remote store client could not be constructed (credentials,
    /// TLS setup, transport).
    #[error("could not construct secret store client: {message}")]
    ClientConstruction { message: String },

    /// The named secret (or its latest version) does not exist in the store.
    #[error("secret not found: {name}")]
    NotFound { name: String },

    /// The remote store call failed for any reason other than absence.
    #[error("secret store error: {message}")]
    Store { message: String },

    /// The secret payload exists but could not be interpreted.
    #[error("invalid secret payload: {message}")]
    InvalidPayload { message: String },

    /// A worker task failed outside the store call itself (e.g. a panic).
    #[error("internal error: {message}")]
    Internal { message: String },

    /// One or more slots failed; every failing slot is listed exactly once.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl SecretsError {
    /// Create a precondition error.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition { message: message.into() }
    }

    /// Create a client construction error.
    pub fn client_construction(message: impl Into<String>) -> Self {
        Self::ClientConstruction { message: message.into() }
    }

    /// Create a not found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store { message: message.into() }
    }

    /// Create an invalid payload error.
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload { message: message.into() }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }
}

/// One slot's failure inside an [`AggregateError`].
#[derive(Debug)]
pub struct SlotFailure {
    /// Slot name as the caller supplied it.
    pub name: String,
    /// The underlying per-slot error.
    pub error: SecretsError,
}

impl SlotFailure {
    /// Pair a slot name with the error that sank it.
    pub fn new(name: impl Into<String>, error: SecretsError) -> Self {
        Self { name: name.into(), error }
    }
}

/// Collection of per-slot failures from one fan-out run.
///
/// Failures are sorted by slot name at construction so that the rendered
/// message is deterministic regardless of task completion order. Every
/// failing slot appears exactly once.
#[derive(Debug)]
pub struct AggregateError {
    failures: Vec<SlotFailure>,
}

impl AggregateError {
    /// Build an aggregate from per-slot failures, sorting by slot name.
    pub fn new(mut failures: Vec<SlotFailure>) -> Self {
        failures.sort_by(|a, b| a.name.cmp(&b.name));
        Self { failures }
    }

    /// The individual failures, sorted by slot name.
    pub fn failures(&self) -> &[SlotFailure] {
        &self.failures
    }

    /// Number of failed slots.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// True when no slot failed.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} secret(s) failed: ", self.failures.len())?;
        for (idx, failure) in self.failures.iter().enumerate() {
            if idx > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", failure.name, failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}
