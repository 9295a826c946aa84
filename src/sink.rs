//! Entity sink seam
//!
//! The sink receives one batch per run: the complete entity set for the
//! provider's partition key. Everything previously submitted under the
//! same key and absent from the batch is superseded by the sink's own
//! full-replace semantics.

use crate::models::Entity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;

/// Full-replacement entity set for one provider partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullReplaceBatch {
    /// Partition key; identifies which prior entities this batch
    /// supersedes.
    pub provider_name: String,
    pub entities: Vec<Entity>,
}

/// Errors raised by a sink implementation.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("entity sink rejected the batch: {0}")]
    Rejected(String),

    #[error("entity sink unavailable: {0}")]
    Unavailable(String),
}

/// Outbound collaborator accepting the final entity set of a run.
#[async_trait]
pub trait EntitySink: Send + Sync {
    async fn apply(&self, batch: FullReplaceBatch) -> Result<(), SinkError>;
}

/// Sink that records every batch in memory. Used by tests and local
/// dry runs.
#[derive(Debug, Default)]
pub struct InMemorySink {
    batches: Mutex<Vec<FullReplaceBatch>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All batches applied so far, oldest first.
    pub fn batches(&self) -> Vec<FullReplaceBatch> {
        self.batches.lock().expect("sink mutex poisoned").clone()
    }

    /// The most recent batch, if any run completed.
    pub fn last_batch(&self) -> Option<FullReplaceBatch> {
        self.batches
            .lock()
            .expect("sink mutex poisoned")
            .last()
            .cloned()
    }
}

#[async_trait]
impl<T: EntitySink + ?Sized> EntitySink for std::sync::Arc<T> {
    async fn apply(&self, batch: FullReplaceBatch) -> Result<(), SinkError> {
        (**self).apply(batch).await
    }
}

#[async_trait]
impl EntitySink for InMemorySink {
    async fn apply(&self, batch: FullReplaceBatch) -> Result<(), SinkError> {
        self.batches.lock().expect("sink mutex poisoned").push(batch);
        Ok(())
    }
}
