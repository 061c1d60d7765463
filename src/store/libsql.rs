//! libSQL-backed pipeline store.
//!
//! One row per pipeline: the whole entity serialized as JSON in `data`,
//! rewritten on every put. Simple and strongly consistent; a very long
//! session pays for it with larger rewrites (bounded in practice by the
//! note count of a single interview).

use std::path::Path;

use async_trait::async_trait;
use libsql::params;
use uuid::Uuid;

use crate::error::StoreError;
use crate::orchestrator::Pipeline;
use crate::store::{PipelineStore, SessionSummary};

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS pipelines (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    data TEXT NOT NULL
)";

/// Pipeline store backed by a local libSQL database file.
pub struct LibSqlStore {
    db: libsql::Database,
}

impl LibSqlStore {
    /// Open (or create) the database at `path` and ensure the schema.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Open {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let store = Self { db };
        store
            .connect()?
            .execute(SCHEMA, params![])
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(store)
    }

    fn connect(&self) -> Result<libsql::Connection, StoreError> {
        self.db
            .connect()
            .map_err(|e| StoreError::Query(e.to_string()))
    }
}

#[async_trait]
impl PipelineStore for LibSqlStore {
    async fn get(&self, id: Uuid) -> Result<Option<Pipeline>, StoreError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(
                "SELECT data FROM pipelines WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?
        else {
            return Ok(None);
        };

        let data: String = row.get(0).map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    async fn put(&self, pipeline: &Pipeline) -> Result<(), StoreError> {
        let conn = self.connect()?;
        let data = serde_json::to_string(pipeline)?;
        conn.execute(
            "INSERT INTO pipelines (id, created_at, data) VALUES (?1, ?2, ?3) \
             ON CONFLICT(id) DO UPDATE SET data = excluded.data",
            params![
                pipeline.id.to_string(),
                pipeline.created_at.to_rfc3339(),
                data
            ],
        )
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, StoreError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(
                "SELECT data FROM pipelines ORDER BY created_at DESC, id ASC",
                params![],
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut summaries = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?
        {
            let data: String = row.get(0).map_err(|e| StoreError::Query(e.to_string()))?;
            let pipeline: Pipeline = serde_json::from_str(&data)?;
            summaries.push(SessionSummary::of(&pipeline));
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::orchestrator::Orchestrator;

    #[tokio::test]
    async fn round_trips_a_pipeline_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = LibSqlStore::open(&dir.path().join("greenroom.db")).await.unwrap();

        let orch = Orchestrator::new(Arc::new(store));
        let id = orch.start("Engineer", "Acme", "Build systems.").await.unwrap();

        let loaded = orch.get_status(id).await.unwrap();
        assert_eq!(loaded.job_title, "Engineer");
        assert!(loaded.notes.is_empty());
    }

    #[tokio::test]
    async fn put_replaces_the_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("greenroom.db");
        let store = LibSqlStore::open(&path).await.unwrap();

        let orch = Orchestrator::new(Arc::new(store));
        let id = orch.start("Engineer", "Acme", "jd").await.unwrap();
        orch.advance_phase(id, "questioning").await.unwrap();

        // Reopen from the same file: the update survived, unduplicated.
        let reopened = LibSqlStore::open(&path).await.unwrap();
        let listed = reopened.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        let loaded = reopened.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.current_phase, "questioning");
    }

    #[tokio::test]
    async fn get_unknown_id_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LibSqlStore::open(&dir.path().join("greenroom.db")).await.unwrap();
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }
}
