//! Mirror sink: an optional secondary key/value target for resolved values.
//!
//! When a sink is configured, every successfully resolved value is copied
//! into it under the lower-cased slot name, alongside the normal writeback
//! into the caller's record. The sink is shared across all concurrent slot
//! workers behind one mutex, locked only for the duration of each `set`
//! call; the lock travels inside the client options rather than living in
//! process-wide state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Receives a copy of each successfully resolved value.
///
/// Keys arrive lower-cased. Implementations run under an external mutex and
/// therefore take `&mut self`; they should not block.
pub trait MirrorSink: Send {
    /// Record `value` under `key`.
    fn set(&mut self, key: &str, value: &str);
}

/// A mirror sink shared across concurrent slot workers.
pub type SharedMirror = Arc<Mutex<dyn MirrorSink>>;

impl MirrorSink for HashMap<String, String> {
    fn set(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }
}

/// Write one entry to a shared sink, holding the lock only for the call.
///
/// A poisoned lock (a panicked sibling writer) is recovered, not
/// propagated; a mirror write never fails a slot that already resolved.
pub(crate) fn mirror_set(mirror: &SharedMirror, key: &str, value: &str) {
    let mut sink = match mirror.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    sink.set(&key.to_lowercase(), value);
}
