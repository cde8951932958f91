//! Spawn-then-join-or-abort task group
//!
//! Collects the results of every child task in spawn order, or returns the first
//! failure after aborting the remaining siblings and letting them settle.
//! Used once per nesting level: registers under a store, stores under the chain.

use crate::error::SalesError;
use std::future::Future;
use tokio::task::JoinSet;
use tracing::warn;

pub struct TaskGroup<T> {
    scope: String,
    set: JoinSet<(usize, Result<T, SalesError>)>,
    spawned: usize,
}

impl<T: Send + 'static> TaskGroup<T> {
    pub fn new(scope: impl Into<String>) -> Self {
        Self { scope: scope.into(), set: JoinSet::new(), spawned: 0 }
    }

    pub fn len(&self) -> usize {
        self.spawned
    }

    pub fn is_empty(&self) -> bool {
        self.spawned == 0
    }

    /// Spawn a child task; its result lands at the next index
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Result<T, SalesError>> + Send + 'static,
    {
        let index = self.spawned;
        self.spawned += 1;
        self.set.spawn(async move { (index, task.await) });
    }

    /// Wait for all children. Results are ordered by spawn index, not completion order.
    pub async fn join_all(mut self) -> Result<Vec<T>, SalesError> {
        let mut slots: Vec<Option<T>> = (0..self.spawned).map(|_| None).collect();

        while let Some(joined) = self.set.join_next().await {
            let failure = match joined {
                Ok((index, Ok(value))) => {
                    slots[index] = Some(value);
                    continue;
                }
                Ok((_, Err(e))) => e,
                Err(join_err) if join_err.is_panic() => {
                    SalesError::task(&self.scope, "child task panicked")
                }
                Err(_) => SalesError::task(&self.scope, "child task was cancelled"),
            };

            let cancelled = self.abort_remaining().await;
            warn!(scope = %self.scope, error = %failure, cancelled = %cancelled, "task_group_failed");
            return Err(failure);
        }

        slots
            .into_iter()
            .collect::<Option<Vec<T>>>()
            .ok_or_else(|| SalesError::task(&self.scope, "child task result missing"))
    }

    /// Abort every child still in the set and wait for all of them to settle.
    /// Returns how many were actually cancelled; children that had already finished
    /// are drained but not counted.
    async fn abort_remaining(&mut self) -> usize {
        self.set.abort_all();
        let mut cancelled = 0usize;
        while let Some(joined) = self.set.join_next().await {
            if matches!(joined, Err(ref e) if e.is_cancelled()) {
                cancelled += 1;
            }
        }
        cancelled
    }
}
