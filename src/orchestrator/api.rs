//! HTTP gateway for the interview pipeline.
//!
//! The two pipeline endpoints (`/pipeline/start`, `/pipeline/status/{id}`)
//! are the stable core surface; the `/session/*` routes drive the full
//! interview loop — next question, answer upload, tone feedback, results,
//! completion — by composing the state machine with the contract layer and
//! the model invoker. Model calls happen outside any session lock, and a
//! note is recorded only after the response validates.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Path, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::analysis::{AnalysisSummary, aggregate};
use crate::contracts::{
    EvaluationResult, Scorecard, ToneMetrics, ToneResult, build_evaluation_prompt,
    build_question_prompt, build_tone_prompt, parse_evaluation_response, parse_question_response,
    parse_tone_response,
};
use crate::error::{Error, PipelineError};
use crate::llm::ModelInvoker;
use crate::orchestrator::{Orchestrator, Pipeline, PipelineNote};
use crate::store::{PipelineStore, SessionSummary};
use crate::transcription::{AudioFormat, TranscriptionError, TranscriptionProvider};

/// Phase labels the gateway moves sessions through. The state machine
/// itself treats phases as caller-defined vocabulary.
const PHASE_QUESTIONING: &str = "questioning";
const PHASE_SCORING: &str = "scoring";

/// Uploaded audio larger than this is rejected at the body layer.
const MAX_UPLOAD_BYTES: usize = 30 * 1024 * 1024;

/// Shared state for the gateway.
#[derive(Clone)]
pub struct GatewayState {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<dyn PipelineStore>,
    pub model: Arc<dyn ModelInvoker>,
    pub transcription: Option<Arc<dyn TranscriptionProvider>>,
}

/// The pipeline gateway server.
pub struct Gateway;

impl Gateway {
    /// Build the axum router for the gateway.
    pub fn router(state: GatewayState) -> Router {
        Router::new()
            .route("/pipeline/start", post(start_pipeline))
            .route("/pipeline/status/{id}", get(pipeline_status))
            .route("/session/{id}/next-question", post(next_question))
            .route("/session/{id}/answer", post(submit_answer))
            .route("/session/{id}/tone", post(tone_feedback))
            .route("/session/{id}/results", get(session_results))
            .route("/session/{id}/complete", post(complete_session))
            .route("/sessions", get(list_sessions))
            .route("/health", get(health_check))
            .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
            .layer(tower_http::trace::TraceLayer::new_for_http())
            .layer(tower_http::cors::CorsLayer::permissive())
            .with_state(state)
    }

    /// Start the gateway server on the given address.
    pub async fn start(state: GatewayState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
        let router = Self::router(state);

        tracing::info!("Greenroom gateway listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;
        Ok(())
    }
}

// -- Error mapping --

/// Wrapper that renders core errors as `{error}` JSON with an HTTP status.
struct ApiError(Error);

macro_rules! api_error_from {
    ($($source:ty),* $(,)?) => {
        $(impl From<$source> for ApiError {
            fn from(e: $source) -> Self {
                Self(e.into())
            }
        })*
    };
}

api_error_from!(
    Error,
    PipelineError,
    crate::error::StoreError,
    crate::error::ContractError,
    crate::error::ModelError,
    TranscriptionError,
);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::Pipeline(PipelineError::NotFound { .. }) => {
                (StatusCode::NOT_FOUND, "not_found".to_string())
            }
            Error::Pipeline(PipelineError::Validation { .. }) => {
                (StatusCode::BAD_REQUEST, self.0.to_string())
            }
            Error::Contract(_) | Error::Model(_) | Error::Transcription(_) => {
                tracing::error!("Upstream failure: {}", self.0);
                (StatusCode::BAD_GATEWAY, self.0.to_string())
            }
            Error::Store(_) | Error::Config(_) => {
                tracing::error!("Internal failure: {}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

// -- DTOs --

#[derive(Debug, Deserialize)]
struct StartPipelineRequest {
    job_title: String,
    #[serde(default)]
    company: String,
    jd: String,
}

#[derive(Debug, Serialize)]
struct StartPipelineResponse {
    pipeline_id: Uuid,
    pipeline: Pipeline,
}

#[derive(Debug, Serialize)]
struct PipelineStatusResponse {
    pipeline: Pipeline,
}

#[derive(Debug, Serialize)]
struct NextQuestionResponse {
    question_id: Uuid,
    question: String,
    scorecard: Scorecard,
}

#[derive(Debug, Deserialize)]
struct AnswerRequest {
    question_id: Uuid,
    transcript: String,
}

#[derive(Debug, Serialize)]
struct AnswerResponse {
    transcript: String,
    analysis: EvaluationResult,
}

#[derive(Debug, Deserialize)]
struct ToneRequest {
    transcript: String,
    metrics: ToneMetrics,
}

#[derive(Debug, Serialize)]
struct ToneResponse {
    tone: ToneResult,
}

#[derive(Debug, Serialize)]
struct SessionListResponse {
    sessions: Vec<SessionSummary>,
}

// -- Handlers --

async fn health_check() -> &'static str {
    "ok"
}

async fn start_pipeline(
    State(state): State<GatewayState>,
    Json(req): Json<StartPipelineRequest>,
) -> Result<Json<StartPipelineResponse>, ApiError> {
    let id = state
        .orchestrator
        .start(&req.job_title, &req.company, &req.jd)
        .await?;
    let pipeline = state.orchestrator.get_status(id).await?;

    Ok(Json(StartPipelineResponse {
        pipeline_id: id,
        pipeline,
    }))
}

async fn pipeline_status(
    State(state): State<GatewayState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PipelineStatusResponse>, ApiError> {
    let pipeline = state.orchestrator.get_status(id).await?;
    Ok(Json(PipelineStatusResponse { pipeline }))
}

async fn next_question(
    State(state): State<GatewayState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NextQuestionResponse>, ApiError> {
    let pipeline = state.orchestrator.get_status(id).await?;

    let prompt = build_question_prompt(
        &pipeline.job_title,
        &pipeline.company,
        &pipeline.jd,
        &pipeline.question_texts(),
        &pipeline.weak_areas(),
    );
    let raw = state.model.invoke(&prompt.system, &prompt.user).await?;
    let question = parse_question_response(&raw)?;

    let question_id = Uuid::new_v4();
    state
        .orchestrator
        .record_note(
            id,
            PipelineNote::Question {
                question_id,
                question: question.clone(),
            },
        )
        .await?;
    state.orchestrator.advance_phase(id, PHASE_QUESTIONING).await?;

    tracing::info!(pipeline_id = %id, %question_id, "Generated interview question");

    Ok(Json(NextQuestionResponse {
        question_id,
        question: question.question,
        scorecard: question.scorecard,
    }))
}

async fn submit_answer(
    State(state): State<GatewayState>,
    Path(id): Path<Uuid>,
    request: Request,
) -> Result<Json<AnswerResponse>, ApiError> {
    let (question_id, transcript) = read_answer_input(&state, request).await?;

    let pipeline = state.orchestrator.get_status(id).await?;
    let question = pipeline
        .find_question(question_id)
        .ok_or_else(|| {
            PipelineError::validation("question_id", "no such question in this session")
        })?
        .clone();

    let prompt = build_evaluation_prompt(&question.question, &transcript, &question.scorecard);
    let raw = state.model.invoke(&prompt.system, &prompt.user).await?;
    let analysis = parse_evaluation_response(&raw)?;

    state
        .orchestrator
        .record_note(
            id,
            PipelineNote::Evaluation {
                question_id,
                result: analysis.clone(),
            },
        )
        .await?;
    state.orchestrator.advance_phase(id, PHASE_SCORING).await?;

    tracing::info!(pipeline_id = %id, %question_id, "Recorded answer evaluation");

    Ok(Json(AnswerResponse {
        transcript,
        analysis,
    }))
}

async fn tone_feedback(
    State(state): State<GatewayState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ToneRequest>,
) -> Result<Json<ToneResponse>, ApiError> {
    // Existence check up front so a bad session id 404s before a model call.
    state.orchestrator.get_status(id).await?;

    let prompt = build_tone_prompt(&req.transcript, &req.metrics);
    let raw = state.model.invoke(&prompt.system, &prompt.user).await?;
    let tone = parse_tone_response(&raw)?;

    state
        .orchestrator
        .record_note(id, PipelineNote::Tone { result: tone.clone() })
        .await?;

    Ok(Json(ToneResponse { tone }))
}

async fn session_results(
    State(state): State<GatewayState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisSummary>, ApiError> {
    let pipeline = state.orchestrator.get_status(id).await?;
    let results: Vec<EvaluationResult> = pipeline
        .evaluation_results()
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(aggregate(id, &results)))
}

async fn complete_session(
    State(state): State<GatewayState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PipelineStatusResponse>, ApiError> {
    state.orchestrator.complete(id).await?;
    let pipeline = state.orchestrator.get_status(id).await?;
    Ok(Json(PipelineStatusResponse { pipeline }))
}

async fn list_sessions(
    State(state): State<GatewayState>,
) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions = state.store.list().await?;
    Ok(Json(SessionListResponse { sessions }))
}

// -- Answer input handling --

/// Pull `(question_id, transcript)` out of an answer submission.
///
/// JSON bodies carry an inline transcript; multipart bodies carry raw
/// audio under `audio` plus a `question_id` field, and go through the
/// transcription provider.
async fn read_answer_input(
    state: &GatewayState,
    request: Request,
) -> Result<(Uuid, String), ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| PipelineError::validation("body", e.to_string()))?;
        return read_multipart_answer(state, multipart).await;
    }

    let Json(req): Json<AnswerRequest> = Json::from_request(request, state)
        .await
        .map_err(|e| PipelineError::validation("body", e.to_string()))?;

    if req.transcript.trim().is_empty() {
        return Err(PipelineError::validation("transcript", "must not be empty").into());
    }
    Ok((req.question_id, req.transcript))
}

async fn read_multipart_answer(
    state: &GatewayState,
    mut multipart: Multipart,
) -> Result<(Uuid, String), ApiError> {
    let mut question_id: Option<Uuid> = None;
    let mut audio: Option<(Vec<u8>, AudioFormat)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PipelineError::validation("body", e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("question_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| PipelineError::validation("question_id", e.to_string()))?;
                let parsed = text
                    .trim()
                    .parse()
                    .map_err(|_| PipelineError::validation("question_id", "must be a UUID"))?;
                question_id = Some(parsed);
            }
            Some("audio") => {
                let mime = field.content_type().unwrap_or("").to_string();
                let format = AudioFormat::from_mime_type(&mime)
                    .ok_or(TranscriptionError::UnsupportedFormat { mime_type: mime })?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| PipelineError::validation("audio", e.to_string()))?;
                audio = Some((bytes.to_vec(), format));
            }
            _ => {}
        }
    }

    let question_id =
        question_id.ok_or_else(|| PipelineError::validation("question_id", "missing field"))?;
    let (bytes, format) =
        audio.ok_or_else(|| PipelineError::validation("audio", "missing field"))?;

    let provider = state
        .transcription
        .as_ref()
        .ok_or_else(|| TranscriptionError::NotConfigured {
            reason: "no transcription API key; submit a transcript instead".to_string(),
        })?;

    let transcript = provider.transcribe(&bytes, format, None).await?;
    Ok((question_id, transcript))
}
