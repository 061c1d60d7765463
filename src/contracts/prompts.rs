//! Prompt builders for the three model tasks.
//!
//! Each builder is a pure function: structured inputs in, a
//! [`PromptRequest`] out, nothing else. The system text carries the policy
//! the model must follow; the user payload carries the data plus a
//! response-format example pinning the exact JSON shape we will accept.

use serde_json::json;

use crate::contracts::{PromptRequest, Scorecard, ToneMetrics};

/// Job descriptions are truncated to this many characters before being
/// sent, to respect model input limits.
const MAX_JD_CHARS: usize = 8000;

/// Build the question-generation prompt.
///
/// `previous_questions` keeps the model from repeating itself across a
/// session; `known_weak_areas` (weaknesses surfaced by earlier
/// evaluations) steers it toward ground worth probing again.
pub fn build_question_prompt(
    job_title: &str,
    company: &str,
    jd: &str,
    previous_questions: &[String],
    known_weak_areas: &[String],
) -> PromptRequest {
    let system = "\
You are an expert interview question generator for high-level tech roles.

You MUST:
- Ask ONE question per call.
- Tailor it to the role and job description.
- Prefer behavior / systems / execution questions over trivia.
- Return a STRICT JSON object with \"question\" and \"scorecard\".

The scorecard must define:
- \"competencies\": skills/behaviors being assessed.
- \"signals\": what good looks like.
- \"failure_modes\": what bad answers look like."
        .to_string();

    let user = json!({
        "job_title": job_title,
        "company": company,
        "job_description": truncate_chars(jd, MAX_JD_CHARS),
        "previous_questions": previous_questions,
        "known_weak_areas": known_weak_areas,
        "response_format_example": {
            "question": "Tell me about a time you had to align misaligned stakeholders in a complex cross-functional project.",
            "scorecard": {
                "competencies": ["stakeholder management", "communication", "ownership"],
                "signals": [
                    "clearly identifies stakeholders and their incentives",
                    "uses structured communication to align them",
                    "shows ownership for outcome"
                ],
                "failure_modes": [
                    "vague story, no clear stakeholders",
                    "no clear conflict or misalignment",
                    "blames others, no ownership"
                ]
            }
        }
    });

    PromptRequest { system, user }
}

/// Build the answer-evaluation prompt.
///
/// Applies a STAR (Situation/Task/Action/Result) rubric against the
/// scorecard that was generated alongside the question.
pub fn build_evaluation_prompt(
    question: &str,
    transcript: &str,
    scorecard: &Scorecard,
) -> PromptRequest {
    let system = "\
You are an expert interview evaluator.

You MUST:
- Use the STAR framework (Situation, Task, Action, Result).
- Evaluate the candidate answer to the given question.
- Use the provided scorecard.
- Be specific and concrete in feedback.
- Return STRICT JSON with keys: scores, strengths, weaknesses, coaching_notes, improvement_plan.

Scoring:
- scores is a map of competency -> 1 to 5.
- 1 = very weak, 3 = acceptable, 5 = excellent."
        .to_string();

    let user = json!({
        "question": question,
        "transcript": transcript,
        "scorecard": scorecard,
        "instructions": [
            "Identify whether the candidate covered S, T, A, and R.",
            "Highlight specific strengths with quotes or paraphrases.",
            "Highlight specific weaknesses (missing details, vague results, no metrics, etc.).",
            "Give coaching_notes as a paragraph.",
            "Give improvement_plan as a list of concrete actions the candidate can take."
        ],
        "response_format_example": {
            "scores": {
                "stakeholder management": 4,
                "communication": 3
            },
            "strengths": [
                "Clearly identified stakeholders and conflict",
                "Demonstrated proactive communication"
            ],
            "weaknesses": [
                "Result metrics were vague",
                "Did not clearly state their unique contribution"
            ],
            "coaching_notes": "Overall a solid answer with good structure, but the Result portion needs more concrete metrics.",
            "improvement_plan": [
                "Practice quantifying outcomes: time saved, risk reduced, dollars saved.",
                "Explicitly call out 'my role' and 'what I did' separate from the team."
            ]
        }
    });

    PromptRequest { system, user }
}

/// Build the tone-analysis prompt.
///
/// Suggestions must address delivery style only, never answer content.
pub fn build_tone_prompt(transcript: &str, metrics: &ToneMetrics) -> PromptRequest {
    let system = "\
You are an interview communication coach.

You receive:
- The transcript of the answer.
- Low-level numeric metrics about delivery (pace, pitch, volume, filler words, pauses).

You MUST:
- Interpret the metrics.
- Combine them with the content to assess delivery quality.
- Return STRICT JSON with: metrics, summary, suggestions.

\"summary\" is a short paragraph overview.
\"suggestions\" is a list of concrete actions, specific to speaking style (not content)."
        .to_string();

    let user = json!({
        "transcript": transcript,
        "metrics": metrics,
        "guidance": [
            "If pace is very high, mention rushing.",
            "If filler_count is high, mention filler words explicitly.",
            "If pitch_variance is low, suggest adding more vocal variety.",
            "If pauses_ratio is low or zero, suggest natural pauses."
        ],
        "response_format_example": {
            "metrics": metrics,
            "summary": "You spoke at a slightly fast pace with moderate filler usage and somewhat flat intonation.",
            "suggestions": [
                "Slow down slightly and leave a short pause between STAR sections.",
                "Reduce filler words like 'um' and 'like' by practicing with a timer.",
                "Add more vocal emphasis when describing the 'Result' to make impact clear."
            ]
        }
    });

    PromptRequest { system, user }
}

/// Truncate to at most `max` characters on a char boundary.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn question_prompt_is_deterministic() {
        let prev = vec!["Q1".to_string()];
        let weak = vec!["ownership".to_string()];
        let a = build_question_prompt("Engineer", "Acme", "Build systems.", &prev, &weak);
        let b = build_question_prompt("Engineer", "Acme", "Build systems.", &prev, &weak);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a.user).unwrap(),
            serde_json::to_string(&b.user).unwrap()
        );
    }

    #[test]
    fn question_prompt_truncates_long_jd() {
        let jd = "x".repeat(MAX_JD_CHARS + 500);
        let prompt = build_question_prompt("Engineer", "Acme", &jd, &[], &[]);
        let sent = prompt.user["job_description"].as_str().unwrap();
        assert_eq!(sent.chars().count(), MAX_JD_CHARS);
    }

    #[test]
    fn question_prompt_truncation_respects_char_boundaries() {
        let jd = "é".repeat(MAX_JD_CHARS + 10);
        let prompt = build_question_prompt("Engineer", "Acme", &jd, &[], &[]);
        let sent = prompt.user["job_description"].as_str().unwrap();
        assert_eq!(sent.chars().count(), MAX_JD_CHARS);
    }

    #[test]
    fn question_prompt_enforces_single_question_policy() {
        let prompt = build_question_prompt("Engineer", "Acme", "jd", &[], &[]);
        assert!(prompt.system.contains("ONE question per call"));
        assert!(prompt.system.contains("over trivia"));
    }

    #[test]
    fn evaluation_prompt_carries_star_rubric_and_scorecard() {
        let scorecard = Scorecard {
            competencies: vec!["ownership".to_string()],
            signals: vec!["names their own decisions".to_string()],
            failure_modes: vec!["blames others".to_string()],
        };
        let prompt = build_evaluation_prompt("Q", "my answer", &scorecard);
        assert!(prompt.system.contains("STAR"));
        assert!(prompt.system.contains("1 = very weak, 3 = acceptable, 5 = excellent"));
        assert_eq!(prompt.user["scorecard"]["competencies"][0], "ownership");
    }

    #[test]
    fn tone_prompt_targets_delivery_not_content() {
        let metrics = ToneMetrics {
            speed_wpm: Some(190.0),
            pitch_variance: Some(0.1),
            volume_avg: None,
            filler_count: 12,
            pauses_ratio: Some(0.0),
        };
        let prompt = build_tone_prompt("my answer", &metrics);
        assert!(prompt.system.contains("not content"));
        assert_eq!(prompt.user["metrics"]["filler_count"], 12);
        // The echoed metrics in the example match the input metrics.
        assert_eq!(prompt.user["response_format_example"]["metrics"], prompt.user["metrics"]);
    }
}
