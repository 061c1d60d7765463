//! Request/response contracts for the external generative model.
//!
//! Three tasks are driven through the model: question generation, answer
//! evaluation, and delivery-tone analysis. Each task has a pure prompt
//! builder (same inputs, same payload, no I/O) and a strict parser that
//! validates the model's untrusted JSON into a typed result before any
//! pipeline state is touched.

mod parse;
mod prompts;

pub use parse::{parse_evaluation_response, parse_question_response, parse_tone_response};
pub use prompts::{build_evaluation_prompt, build_question_prompt, build_tone_prompt};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A `{system, user}` pair ready to send to the model.
///
/// `user` is structured JSON rather than prose: the model sees the exact
/// fields it must work from, and identical inputs always produce an
/// identical payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptRequest {
    pub system: String,
    pub user: serde_json::Value,
}

/// The rubric attached to one generated question.
///
/// Created atomically with its question and never edited afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    pub competencies: Vec<String>,
    pub signals: Vec<String>,
    pub failure_modes: Vec<String>,
}

/// A question produced by the model, with its scorecard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub scorecard: Scorecard,
}

/// The structured scoring output for one answered question.
///
/// `scores` maps competency name to a value in `[1, 5]`. Competency names
/// come verbatim from the model and are matched by exact string equality
/// during aggregation; the same skill phrased two ways stays two entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub scores: BTreeMap<String, f64>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub coaching_notes: String,
    pub improvement_plan: Vec<String>,
}

/// Numeric delivery metrics measured from a spoken answer.
///
/// All fields are optional except `filler_count`; a metric the measuring
/// side could not compute is simply absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneMetrics {
    #[serde(default)]
    pub speed_wpm: Option<f64>,
    /// Approximate, in `[0, 1]`.
    #[serde(default)]
    pub pitch_variance: Option<f64>,
    #[serde(default)]
    pub volume_avg: Option<f64>,
    #[serde(default)]
    pub filler_count: u32,
    #[serde(default)]
    pub pauses_ratio: Option<f64>,
}

/// The model's read on delivery style: echoed metrics, a short summary,
/// and delivery-only suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneResult {
    pub metrics: ToneMetrics,
    pub summary: String,
    pub suggestions: Vec<String>,
}
