//! The per-session interview pipeline state machine.
//!
//! One [`Pipeline`] exists per mock-interview session. It owns the session
//! lifecycle (`pending → in_progress → complete`), the free-form phase
//! label, and the append-only note log that accumulates generated
//! questions, evaluation results, and tone readings.
//!
//! # Concurrency
//!
//! Every mutation is a load→mutate→persist cycle over the whole entity.
//! The [`Orchestrator`] binds each session id to one async mutex, so
//! concurrent calls on the same id queue instead of racing — two
//! simultaneous `record_note` calls both land, in some order, with neither
//! lost. Calls on different ids share no state and run in parallel.
//! Model calls never happen under a session lock; the lock covers only the
//! store round-trip.

pub mod api;

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::contracts::{EvaluationResult, GeneratedQuestion, ToneResult};
use crate::error::PipelineError;
use crate::store::PipelineStore;

/// Lifecycle status of a pipeline. Only ever advances forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Pending,
    InProgress,
    Complete,
}

/// One annotation in a pipeline's note log.
///
/// The state machine appends and persists notes without interpreting them;
/// only the question builder and the aggregation engine read specific
/// kinds back out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineNote {
    Question {
        question_id: Uuid,
        question: GeneratedQuestion,
    },
    Evaluation {
        question_id: Uuid,
        result: EvaluationResult,
    },
    Tone {
        result: ToneResult,
    },
}

/// The persisted state of one interview session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub job_title: String,
    pub company: String,
    pub jd: String,
    pub status: PipelineStatus,
    pub current_phase: String,
    pub notes: Vec<PipelineNote>,
}

impl Pipeline {
    /// The phase every new session starts in.
    pub const INITIAL_PHASE: &'static str = "analysis";

    fn new(job_title: String, company: String, jd: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            job_title,
            company,
            jd,
            status: PipelineStatus::Pending,
            current_phase: Self::INITIAL_PHASE.to_string(),
            notes: Vec::new(),
        }
    }

    fn append_note(&mut self, note: PipelineNote) {
        self.notes.push(note);
        if self.status == PipelineStatus::Pending {
            self.status = PipelineStatus::InProgress;
        }
    }

    fn mark_complete(&mut self) {
        self.status = PipelineStatus::Complete;
    }

    /// Texts of every question asked so far, in order.
    pub fn question_texts(&self) -> Vec<String> {
        self.notes
            .iter()
            .filter_map(|note| match note {
                PipelineNote::Question { question, .. } => Some(question.question.clone()),
                _ => None,
            })
            .collect()
    }

    /// Look up a previously asked question by its id.
    pub fn find_question(&self, question_id: Uuid) -> Option<&GeneratedQuestion> {
        self.notes.iter().find_map(|note| match note {
            PipelineNote::Question { question_id: id, question } if *id == question_id => {
                Some(question)
            }
            _ => None,
        })
    }

    /// All evaluation results recorded so far, in order.
    pub fn evaluation_results(&self) -> Vec<&EvaluationResult> {
        self.notes
            .iter()
            .filter_map(|note| match note {
                PipelineNote::Evaluation { result, .. } => Some(result),
                _ => None,
            })
            .collect()
    }

    /// Deduplicated weaknesses surfaced by evaluations so far. Feeds the
    /// question builder's `known_weak_areas`.
    pub fn weak_areas(&self) -> Vec<String> {
        let mut seen = std::collections::BTreeSet::new();
        for result in self.evaluation_results() {
            seen.extend(result.weaknesses.iter().cloned());
        }
        seen.into_iter().collect()
    }

    /// Number of evaluated answers.
    pub fn answer_count(&self) -> usize {
        self.evaluation_results().len()
    }

    /// Number of questions asked.
    pub fn question_count(&self) -> usize {
        self.question_texts().len()
    }
}

/// One async mutex per session id. Entries are created on first touch and
/// kept for the life of the process.
#[derive(Default)]
struct SessionLocks {
    inner: StdMutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    fn handle(&self, id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut map = match self.inner.lock() {
            Ok(m) => m,
            Err(e) => e.into_inner(),
        };
        map.entry(id).or_default().clone()
    }
}

/// The pipeline state machine: owns every [`Pipeline`] and is the only
/// writer to the store.
pub struct Orchestrator {
    store: Arc<dyn PipelineStore>,
    locks: SessionLocks,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn PipelineStore>) -> Self {
        Self {
            store,
            locks: SessionLocks::default(),
        }
    }

    /// Create and persist a new session. Returns its id.
    ///
    /// Fails with a validation error if `job_title` or `jd` is empty; the
    /// company name may legitimately be blank ("stealth startup").
    pub async fn start(
        &self,
        job_title: &str,
        company: &str,
        jd: &str,
    ) -> Result<Uuid, crate::error::Error> {
        if job_title.trim().is_empty() {
            return Err(PipelineError::validation("job_title", "must not be empty").into());
        }
        if jd.trim().is_empty() {
            return Err(PipelineError::validation("jd", "must not be empty").into());
        }

        let pipeline = Pipeline::new(
            job_title.to_string(),
            company.to_string(),
            jd.to_string(),
        );
        let id = pipeline.id;
        self.store.put(&pipeline).await?;

        tracing::info!(pipeline_id = %id, job_title, "Started interview pipeline");
        Ok(id)
    }

    /// Current persisted snapshot of a session.
    pub async fn get_status(&self, id: Uuid) -> Result<Pipeline, crate::error::Error> {
        self.load(id).await
    }

    /// Append a note to the session's log and persist.
    ///
    /// The first note moves the session from `pending` to `in_progress`.
    pub async fn record_note(
        &self,
        id: Uuid,
        note: PipelineNote,
    ) -> Result<(), crate::error::Error> {
        self.mutate(id, |pipeline| pipeline.append_note(note)).await
    }

    /// Set the session's current phase label.
    ///
    /// The phase vocabulary belongs to the caller; the only check is that
    /// the label is non-empty.
    pub async fn advance_phase(&self, id: Uuid, phase: &str) -> Result<(), crate::error::Error> {
        if phase.trim().is_empty() {
            return Err(PipelineError::validation("phase", "must not be empty").into());
        }
        let phase = phase.to_string();
        self.mutate(id, |pipeline| pipeline.current_phase = phase)
            .await
    }

    /// Mark the session concluded. Idempotent once complete.
    pub async fn complete(&self, id: Uuid) -> Result<(), crate::error::Error> {
        self.mutate(id, Pipeline::mark_complete).await
    }

    async fn load(&self, id: Uuid) -> Result<Pipeline, crate::error::Error> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| PipelineError::NotFound { id }.into())
    }

    /// Serialized load→mutate→persist cycle for one session id.
    async fn mutate(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut Pipeline),
    ) -> Result<(), crate::error::Error> {
        let lock = self.locks.handle(id);
        let _guard = lock.lock().await;

        let mut pipeline = self.load(id).await?;
        apply(&mut pipeline);
        self.store.put(&pipeline).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::contracts::Scorecard;
    use crate::error::Error;
    use crate::store::MemoryStore;

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(Arc::new(MemoryStore::new()))
    }

    fn question_note(text: &str) -> PipelineNote {
        PipelineNote::Question {
            question_id: Uuid::new_v4(),
            question: GeneratedQuestion {
                question: text.to_string(),
                scorecard: Scorecard {
                    competencies: vec!["ownership".to_string()],
                    signals: vec![],
                    failure_modes: vec![],
                },
            },
        }
    }

    #[tokio::test]
    async fn start_creates_pending_pipeline_with_fresh_id() {
        let orch = orchestrator();
        let a = orch.start("Engineer", "Acme", "Build systems.").await.unwrap();
        let b = orch.start("Engineer", "Acme", "Build systems.").await.unwrap();
        assert_ne!(a, b);

        let pipeline = orch.get_status(a).await.unwrap();
        assert_eq!(pipeline.status, PipelineStatus::Pending);
        assert_eq!(pipeline.current_phase, "analysis");
        assert!(pipeline.notes.is_empty());
    }

    #[tokio::test]
    async fn start_rejects_empty_job_title_and_jd() {
        let orch = orchestrator();
        assert!(matches!(
            orch.start("  ", "Acme", "jd").await,
            Err(Error::Pipeline(PipelineError::Validation { .. }))
        ));
        assert!(matches!(
            orch.start("Engineer", "Acme", "").await,
            Err(Error::Pipeline(PipelineError::Validation { .. }))
        ));
    }

    #[tokio::test]
    async fn get_status_on_unknown_id_is_not_found() {
        let orch = orchestrator();
        assert!(matches!(
            orch.get_status(Uuid::new_v4()).await,
            Err(Error::Pipeline(PipelineError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn first_note_moves_pending_to_in_progress() {
        let orch = orchestrator();
        let id = orch.start("Engineer", "Acme", "jd").await.unwrap();

        orch.record_note(id, question_note("Q1")).await.unwrap();
        let pipeline = orch.get_status(id).await.unwrap();
        assert_eq!(pipeline.status, PipelineStatus::InProgress);
        assert_eq!(pipeline.notes.len(), 1);
    }

    #[tokio::test]
    async fn status_never_regresses() {
        let orch = orchestrator();
        let id = orch.start("Engineer", "Acme", "jd").await.unwrap();

        orch.complete(id).await.unwrap();
        orch.record_note(id, question_note("late")).await.unwrap();

        let pipeline = orch.get_status(id).await.unwrap();
        assert_eq!(pipeline.status, PipelineStatus::Complete);
        // The late note still lands; the status just doesn't move backwards.
        assert_eq!(pipeline.notes.len(), 1);
    }

    #[tokio::test]
    async fn advance_phase_rejects_empty_label() {
        let orch = orchestrator();
        let id = orch.start("Engineer", "Acme", "jd").await.unwrap();
        assert!(orch.advance_phase(id, " ").await.is_err());

        orch.advance_phase(id, "questioning").await.unwrap();
        assert_eq!(orch.get_status(id).await.unwrap().current_phase, "questioning");
    }

    #[tokio::test]
    async fn record_note_on_unknown_id_mutates_nothing() {
        let orch = orchestrator();
        assert!(matches!(
            orch.record_note(Uuid::new_v4(), question_note("Q")).await,
            Err(Error::Pipeline(PipelineError::NotFound { .. }))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_record_note_loses_no_updates() {
        let orch = Arc::new(orchestrator());
        let id = orch.start("Engineer", "Acme", "jd").await.unwrap();

        let mut handles = Vec::new();
        for i in 0..32 {
            let orch = Arc::clone(&orch);
            handles.push(tokio::spawn(async move {
                orch.record_note(id, question_note(&format!("Q{i}"))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let pipeline = orch.get_status(id).await.unwrap();
        assert_eq!(pipeline.notes.len(), 32);
    }

    #[tokio::test]
    async fn pipeline_note_queries() {
        let orch = orchestrator();
        let id = orch.start("Engineer", "Acme", "jd").await.unwrap();

        let question_id = Uuid::new_v4();
        orch.record_note(
            id,
            PipelineNote::Question {
                question_id,
                question: GeneratedQuestion {
                    question: "Q1".to_string(),
                    scorecard: Scorecard {
                        competencies: vec![],
                        signals: vec![],
                        failure_modes: vec![],
                    },
                },
            },
        )
        .await
        .unwrap();
        orch.record_note(
            id,
            PipelineNote::Evaluation {
                question_id,
                result: EvaluationResult {
                    scores: Default::default(),
                    strengths: vec![],
                    weaknesses: vec!["vague results".to_string(), "no metrics".to_string()],
                    coaching_notes: String::new(),
                    improvement_plan: vec![],
                },
            },
        )
        .await
        .unwrap();

        let pipeline = orch.get_status(id).await.unwrap();
        assert_eq!(pipeline.question_texts(), vec!["Q1"]);
        assert!(pipeline.find_question(question_id).is_some());
        assert!(pipeline.find_question(Uuid::new_v4()).is_none());
        assert_eq!(pipeline.weak_areas(), vec!["no metrics", "vague results"]);
        assert_eq!(pipeline.question_count(), 1);
        assert_eq!(pipeline.answer_count(), 1);
    }
}
