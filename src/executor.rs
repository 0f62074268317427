//! Bounded fan-out execution for per-slot resolution tasks.
//!
//! Every task waits for a semaphore permit before it touches the secret
//! store, so at most `limit` lookups are in flight at once. Outcomes keep
//! their slot name, and a panicking task is reported as that slot's
//! failure instead of tearing down the whole batch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{Result, SecretsError};

/// Outcome of a single slot task, keyed by the slot name it ran for.
#[derive(Debug)]
pub struct SlotOutcome<T = String> {
    pub name: String,
    pub result: Result<T>,
}

/// Runs a batch of named async tasks with a fixed concurrency ceiling.
#[derive(Debug, Clone, Copy)]
pub struct FanOutExecutor {
    limit: usize,
}

impl FanOutExecutor {
    /// Creates an executor that admits at most `limit` tasks at a time.
    pub fn new(limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(SecretsError::precondition(
                "concurrency limit must be greater than zero",
            ));
        }
        Ok(Self { limit })
    }

    /// Maximum number of tasks admitted at once.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Spawns every task, waits for all of them, and returns one outcome
    /// per input pair. Completion order is not defined; callers that need
    /// determinism sort by name.
    pub async fn run<T, Fut>(&self, tasks: Vec<(String, Fut)>) -> Vec<SlotOutcome<T>>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let total = tasks.len();
        tracing::debug!(tasks = total, limit = self.limit, "dispatching slot tasks");

        let semaphore = Arc::new(Semaphore::new(self.limit));
        let mut join_set = JoinSet::new();
        let mut names: HashMap<tokio::task::Id, String> = HashMap::with_capacity(total);

        for (name, fut) in tasks {
            let semaphore = Arc::clone(&semaphore);
            let task_name = name.clone();
            let handle = join_set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return SlotOutcome {
                            name: task_name,
                            result: Err(SecretsError::internal("executor semaphore closed")),
                        }
                    }
                };
                SlotOutcome {
                    name: task_name,
                    result: fut.await,
                }
            });
            names.insert(handle.id(), name);
        }

        let mut outcomes = Vec::with_capacity(total);
        while let Some(joined) = join_set.join_next_with_id().await {
            match joined {
                Ok((_, outcome)) => outcomes.push(outcome),
                Err(err) => {
                    let name = names
                        .get(&err.id())
                        .cloned()
                        .unwrap_or_else(|| "<unknown>".to_string());
                    tracing::warn!(slot = %name, error = %err, "slot task aborted");
                    outcomes.push(SlotOutcome {
                        name,
                        result: Err(SecretsError::internal(format!(
                            "resolution task failed: {}",
                            err
                        ))),
                    });
                }
            }
        }
        outcomes
    }
}
