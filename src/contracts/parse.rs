//! Strict parsers for model responses.
//!
//! The model returns free-form JSON; nothing here trusts it. A response
//! missing a required key or carrying the wrong shape is rejected with a
//! [`ContractError`] and never reaches pipeline state. The one deliberate
//! tolerance: individual score values that fail numeric coercion are
//! dropped rather than failing the whole response, matching the
//! aggregation engine's treatment of non-finite values.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::contracts::{EvaluationResult, GeneratedQuestion, Scorecard, ToneMetrics, ToneResult};
use crate::error::ContractError;

/// Parse a question-generation response: `{question, scorecard}`.
pub fn parse_question_response(value: &Value) -> Result<GeneratedQuestion, ContractError> {
    let obj = value.as_object().ok_or(ContractError::NotAnObject)?;

    let question = require_str(obj, "question")?;
    if question.trim().is_empty() {
        return Err(ContractError::Empty { key: "question" });
    }

    let scorecard = obj
        .get("scorecard")
        .ok_or(ContractError::MissingKey { key: "scorecard" })?;
    let scorecard = scorecard.as_object().ok_or(ContractError::WrongShape {
        key: "scorecard",
        expected: "object",
    })?;

    let scorecard = Scorecard {
        competencies: require_string_array(scorecard, "competencies")?,
        signals: require_string_array(scorecard, "signals")?,
        failure_modes: require_string_array(scorecard, "failure_modes")?,
    };

    Ok(GeneratedQuestion {
        question: question.to_string(),
        scorecard,
    })
}

/// Parse an answer-evaluation response:
/// `{scores, strengths, weaknesses, coaching_notes, improvement_plan}`.
pub fn parse_evaluation_response(value: &Value) -> Result<EvaluationResult, ContractError> {
    let obj = value.as_object().ok_or(ContractError::NotAnObject)?;

    let raw_scores = obj
        .get("scores")
        .ok_or(ContractError::MissingKey { key: "scores" })?;
    let raw_scores = raw_scores.as_object().ok_or(ContractError::WrongShape {
        key: "scores",
        expected: "object",
    })?;

    let mut scores = BTreeMap::new();
    for (competency, raw) in raw_scores {
        if let Some(score) = coerce_score(raw) {
            scores.insert(competency.clone(), score);
        } else {
            tracing::warn!(%competency, %raw, "Dropping non-numeric score from model response");
        }
    }

    Ok(EvaluationResult {
        scores,
        strengths: require_string_array(obj, "strengths")?,
        weaknesses: require_string_array(obj, "weaknesses")?,
        coaching_notes: require_str(obj, "coaching_notes")?.to_string(),
        improvement_plan: require_string_array(obj, "improvement_plan")?,
    })
}

/// Parse a tone-analysis response: `{metrics, summary, suggestions}`.
pub fn parse_tone_response(value: &Value) -> Result<ToneResult, ContractError> {
    let obj = value.as_object().ok_or(ContractError::NotAnObject)?;

    let metrics = obj
        .get("metrics")
        .ok_or(ContractError::MissingKey { key: "metrics" })?;
    let metrics: ToneMetrics =
        serde_json::from_value(metrics.clone()).map_err(|_| ContractError::WrongShape {
            key: "metrics",
            expected: "tone metrics object",
        })?;

    Ok(ToneResult {
        metrics,
        summary: require_str(obj, "summary")?.to_string(),
        suggestions: require_string_array(obj, "suggestions")?,
    })
}

/// Coerce a raw score value to a finite number.
///
/// Numbers pass through; strings get a standard decimal parse. Anything
/// else, or anything non-finite, is `None`.
fn coerce_score(raw: &Value) -> Option<f64> {
    let n = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn require_str<'a>(
    obj: &'a serde_json::Map<String, Value>,
    key: &'static str,
) -> Result<&'a str, ContractError> {
    let value = obj.get(key).ok_or(ContractError::MissingKey { key })?;
    value.as_str().ok_or(ContractError::WrongShape {
        key,
        expected: "string",
    })
}

fn require_string_array(
    obj: &serde_json::Map<String, Value>,
    key: &'static str,
) -> Result<Vec<String>, ContractError> {
    let value = obj.get(key).ok_or(ContractError::MissingKey { key })?;
    let items = value.as_array().ok_or(ContractError::WrongShape {
        key,
        expected: "array of strings",
    })?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or(ContractError::WrongShape {
                    key,
                    expected: "array of strings",
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn valid_evaluation() -> Value {
        json!({
            "scores": {"ownership": 4, "communication": 3},
            "strengths": ["clear structure"],
            "weaknesses": ["vague metrics"],
            "coaching_notes": "Solid overall.",
            "improvement_plan": ["quantify outcomes"]
        })
    }

    #[test]
    fn parses_valid_question_response() {
        let value = json!({
            "question": "Describe a system you scaled.",
            "scorecard": {
                "competencies": ["systems thinking"],
                "signals": ["names concrete bottlenecks"],
                "failure_modes": ["hand-waves the numbers"]
            }
        });
        let parsed = parse_question_response(&value).unwrap();
        assert_eq!(parsed.question, "Describe a system you scaled.");
        assert_eq!(parsed.scorecard.competencies, vec!["systems thinking"]);
    }

    #[test]
    fn question_without_scorecard_is_rejected() {
        let value = json!({"question": "Q?"});
        assert!(matches!(
            parse_question_response(&value),
            Err(ContractError::MissingKey { key: "scorecard" })
        ));
    }

    #[test]
    fn blank_question_is_rejected() {
        let value = json!({
            "question": "   ",
            "scorecard": {"competencies": [], "signals": [], "failure_modes": []}
        });
        assert!(matches!(
            parse_question_response(&value),
            Err(ContractError::Empty { key: "question" })
        ));
    }

    #[test]
    fn non_object_response_is_rejected() {
        assert!(matches!(
            parse_evaluation_response(&json!("just text")),
            Err(ContractError::NotAnObject)
        ));
    }

    #[test]
    fn parses_valid_evaluation_response() {
        let parsed = parse_evaluation_response(&valid_evaluation()).unwrap();
        assert_eq!(parsed.scores.get("ownership"), Some(&4.0));
        assert_eq!(parsed.coaching_notes, "Solid overall.");
    }

    #[test]
    fn evaluation_without_scores_is_rejected() {
        let mut value = valid_evaluation();
        value.as_object_mut().unwrap().remove("scores");
        assert!(matches!(
            parse_evaluation_response(&value),
            Err(ContractError::MissingKey { key: "scores" })
        ));
    }

    #[test]
    fn string_scores_are_coerced() {
        let mut value = valid_evaluation();
        value["scores"] = json!({"ownership": "4.5"});
        let parsed = parse_evaluation_response(&value).unwrap();
        assert_eq!(parsed.scores.get("ownership"), Some(&4.5));
    }

    #[test]
    fn unparseable_scores_are_dropped_not_zeroed() {
        let mut value = valid_evaluation();
        value["scores"] = json!({"x": "not-a-number", "y": null, "ownership": 4});
        let parsed = parse_evaluation_response(&value).unwrap();
        assert!(!parsed.scores.contains_key("x"));
        assert!(!parsed.scores.contains_key("y"));
        assert_eq!(parsed.scores.get("ownership"), Some(&4.0));
    }

    #[test]
    fn non_string_strengths_are_rejected() {
        let mut value = valid_evaluation();
        value["strengths"] = json!(["fine", 7]);
        assert!(matches!(
            parse_evaluation_response(&value),
            Err(ContractError::WrongShape { key: "strengths", .. })
        ));
    }

    #[test]
    fn parses_valid_tone_response() {
        let value = json!({
            "metrics": {"speed_wpm": 180.0, "filler_count": 9, "pauses_ratio": 0.02},
            "summary": "Fast with many fillers.",
            "suggestions": ["pause between STAR sections"]
        });
        let parsed = parse_tone_response(&value).unwrap();
        assert_eq!(parsed.metrics.speed_wpm, Some(180.0));
        assert_eq!(parsed.metrics.filler_count, 9);
        assert_eq!(parsed.suggestions.len(), 1);
    }

    #[test]
    fn tone_without_summary_is_rejected() {
        let value = json!({
            "metrics": {"filler_count": 0},
            "suggestions": []
        });
        assert!(matches!(
            parse_tone_response(&value),
            Err(ContractError::MissingKey { key: "summary" })
        ));
    }
}
