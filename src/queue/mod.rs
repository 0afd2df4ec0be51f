// src/queue/mod.rs

use async_trait::async_trait;

use crate::error::QueueError;

pub mod memory;

pub use memory::{InMemoryQueue, QueueElement};

/// The downstream work queue the approved records are handed to.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Remove every pending element; returns how many were removed.
    async fn clear(&self, queue: &str) -> Result<usize, QueueError>;

    /// Create one element per (reference, payload) pair, all or nothing.
    async fn bulk_create(
        &self,
        queue: &str,
        references: &[String],
        payloads: &[String],
    ) -> Result<(), QueueError>;
}

/// Shape checks shared by queue backends: paired lengths and JSON-object payloads.
pub fn validate_bulk(references: &[String], payloads: &[String]) -> Result<(), QueueError> {
    if references.len() != payloads.len() {
        return Err(QueueError::InvalidPayload(format!(
            "{} references but {} payloads",
            references.len(),
            payloads.len()
        )));
    }
    for (i, payload) in payloads.iter().enumerate() {
        match serde_json::from_str::<serde_json::Value>(payload) {
            Ok(serde_json::Value::Object(_)) => {}
            Ok(_) => {
                return Err(QueueError::InvalidPayload(format!(
                    "payload {i} is not a JSON object"
                )))
            }
            Err(e) => return Err(QueueError::InvalidPayload(format!("payload {i}: {e}"))),
        }
    }
    Ok(())
}
