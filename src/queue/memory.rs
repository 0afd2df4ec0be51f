use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};
use tracing::debug;

use super::{validate_bulk, WorkQueue};
use crate::error::QueueError;

#[derive(Debug, Clone, PartialEq)]
pub struct QueueElement {
    pub reference: String,
    pub data: String,
    pub created_at: DateTime<Utc>,
}

/// Process-local queue with the same uniqueness rule as the orchestrator's:
/// a reference may exist only once per queue.
#[derive(Debug, Default)]
pub struct InMemoryQueue {
    queues: Mutex<HashMap<String, Vec<QueueElement>>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the elements currently in `queue`, insertion order.
    pub fn elements(&self, queue: &str) -> Vec<QueueElement> {
        self.lock()
            .map(|q| q.get(queue).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<QueueElement>>>, QueueError> {
        self.queues
            .lock()
            .map_err(|_| QueueError::Backend("queue lock poisoned".into()))
    }
}

#[async_trait]
impl WorkQueue for InMemoryQueue {
    async fn clear(&self, queue: &str) -> Result<usize, QueueError> {
        let mut queues = self.lock()?;
        let removed = queues.remove(queue).map(|v| v.len()).unwrap_or(0);
        debug!(queue, removed, "queue cleared");
        Ok(removed)
    }

    async fn bulk_create(
        &self,
        queue: &str,
        references: &[String],
        payloads: &[String],
    ) -> Result<(), QueueError> {
        validate_bulk(references, payloads)?;

        let mut queues = self.lock()?;
        let existing = queues.entry(queue.to_string()).or_default();
        let mut seen: HashSet<&str> = existing.iter().map(|e| e.reference.as_str()).collect();
        for reference in references {
            if !seen.insert(reference.as_str()) {
                return Err(QueueError::Integrity {
                    queue: queue.to_string(),
                    reference: reference.clone(),
                });
            }
        }

        let now = Utc::now();
        existing.extend(references.iter().zip(payloads).map(|(r, p)| QueueElement {
            reference: r.clone(),
            data: p.clone(),
            created_at: now,
        }));
        debug!(queue, added = references.len(), "queue elements created");
        Ok(())
    }
}
