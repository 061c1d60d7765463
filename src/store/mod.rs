//! Durable storage for pipelines.
//!
//! The store is a key-value protocol keyed by session id: `get` one
//! pipeline, `put` the whole entity back. No cross-key transactions. The
//! orchestrator is the only writer; the one read-only extra is `list`,
//! which feeds the session-history endpoint.

mod libsql;
mod memory;

pub use self::libsql::LibSqlStore;
pub use self::memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::orchestrator::{Pipeline, PipelineStatus};

/// One row of the session-history listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub job_title: String,
    pub company: String,
    pub created_at: DateTime<Utc>,
    pub status: PipelineStatus,
    pub question_count: usize,
    pub answer_count: usize,
}

impl SessionSummary {
    pub fn of(pipeline: &Pipeline) -> Self {
        Self {
            id: pipeline.id,
            job_title: pipeline.job_title.clone(),
            company: pipeline.company.clone(),
            created_at: pipeline.created_at,
            status: pipeline.status,
            question_count: pipeline.question_count(),
            answer_count: pipeline.answer_count(),
        }
    }
}

/// Abstract durable store for pipelines.
#[async_trait]
pub trait PipelineStore: Send + Sync {
    /// Fetch the pipeline stored under `id`, if any.
    async fn get(&self, id: Uuid) -> Result<Option<Pipeline>, StoreError>;

    /// Persist the full pipeline snapshot, replacing any previous one.
    async fn put(&self, pipeline: &Pipeline) -> Result<(), StoreError>;

    /// Summaries of every stored session, newest first.
    async fn list(&self) -> Result<Vec<SessionSummary>, StoreError>;
}
