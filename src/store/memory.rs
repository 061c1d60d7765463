//! In-memory pipeline store for tests and ephemeral serving.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::orchestrator::Pipeline;
use crate::store::{PipelineStore, SessionSummary};

/// Stores pipelines in a process-local map. Everything is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    pipelines: RwLock<HashMap<Uuid, Pipeline>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PipelineStore for MemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Pipeline>, StoreError> {
        Ok(self.pipelines.read().await.get(&id).cloned())
    }

    async fn put(&self, pipeline: &Pipeline) -> Result<(), StoreError> {
        self.pipelines
            .write()
            .await
            .insert(pipeline.id, pipeline.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, StoreError> {
        let mut summaries: Vec<SessionSummary> = self
            .pipelines
            .read()
            .await
            .values()
            .map(SessionSummary::of)
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(summaries)
    }
}
