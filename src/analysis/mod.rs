//! Session-level aggregation of evaluation results.
//!
//! The stored [`EvaluationResult`] notes are the source of truth; the
//! summary is recomputed on demand and never persisted. Aggregation is a
//! pure function of its inputs, so running it twice over the same results
//! yields byte-identical output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contracts::EvaluationResult;

/// Average score for one competency across a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyScore {
    pub competency: String,
    pub score: f64,
}

/// The derived, recomputed-on-demand view of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub session_id: Uuid,
    pub overall_notes: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub competency_scores: Vec<CompetencyScore>,
}

/// Reduce a session's evaluation results into an [`AnalysisSummary`].
///
/// Strengths and weaknesses are deduplicated unions (sorted, so output is
/// deterministic). Scores are arithmetic means per competency name, exact
/// string match — "communication" and "stakeholder communication" stay
/// separate entries. Non-finite values are skipped entirely: they add to
/// neither sum nor count, and a competency with no finite samples is never
/// emitted.
pub fn aggregate(session_id: Uuid, results: &[EvaluationResult]) -> AnalysisSummary {
    let mut strengths = std::collections::BTreeSet::new();
    let mut weaknesses = std::collections::BTreeSet::new();
    let mut running: BTreeMap<&str, (f64, u32)> = BTreeMap::new();

    for result in results {
        strengths.extend(result.strengths.iter().cloned());
        weaknesses.extend(result.weaknesses.iter().cloned());

        for (competency, &score) in &result.scores {
            if !score.is_finite() {
                continue;
            }
            let entry = running.entry(competency).or_insert((0.0, 0));
            entry.0 += score;
            entry.1 += 1;
        }
    }

    let competency_scores = running
        .into_iter()
        .map(|(competency, (sum, count))| CompetencyScore {
            competency: competency.to_string(),
            score: sum / f64::from(count),
        })
        .collect();

    AnalysisSummary {
        session_id,
        overall_notes: format!(
            "Aggregated results across {} evaluated answer(s).",
            results.len()
        ),
        strengths: strengths.into_iter().collect(),
        weaknesses: weaknesses.into_iter().collect(),
        competency_scores,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn result(scores: &[(&str, f64)], strengths: &[&str], weaknesses: &[&str]) -> EvaluationResult {
        EvaluationResult {
            scores: scores
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
            strengths: strengths.iter().map(|s| s.to_string()).collect(),
            weaknesses: weaknesses.iter().map(|s| s.to_string()).collect(),
            coaching_notes: String::new(),
            improvement_plan: vec![],
        }
    }

    #[test]
    fn averages_scores_per_exact_competency_name() {
        let results = vec![
            result(&[("ownership", 4.0)], &["clear"], &[]),
            result(&[("ownership", 2.0), ("communication", 5.0)], &[], &["rushed"]),
        ];
        let summary = aggregate(Uuid::nil(), &results);

        assert_eq!(
            summary.competency_scores,
            vec![
                CompetencyScore {
                    competency: "communication".to_string(),
                    score: 5.0
                },
                CompetencyScore {
                    competency: "ownership".to_string(),
                    score: 3.0
                },
            ]
        );
        assert_eq!(summary.strengths, vec!["clear"]);
        assert_eq!(summary.weaknesses, vec!["rushed"]);
    }

    #[test]
    fn unscored_competencies_never_appear() {
        let summary = aggregate(Uuid::nil(), &[result(&[("ownership", 4.0)], &[], &[])]);
        assert_eq!(summary.competency_scores.len(), 1);
        assert!(
            summary
                .competency_scores
                .iter()
                .all(|c| c.competency == "ownership")
        );
    }

    #[test]
    fn non_finite_scores_are_skipped_not_zeroed() {
        let results = vec![
            result(&[("ownership", f64::NAN)], &[], &[]),
            result(&[("ownership", 4.0)], &[], &[]),
        ];
        let summary = aggregate(Uuid::nil(), &results);
        // The NaN neither zeroes the mean nor inflates the count.
        assert_eq!(summary.competency_scores[0].score, 4.0);

        let only_nan = aggregate(Uuid::nil(), &[result(&[("x", f64::INFINITY)], &[], &[])]);
        assert!(only_nan.competency_scores.is_empty());
    }

    #[test]
    fn strengths_and_weaknesses_are_deduplicated() {
        let results = vec![
            result(&[], &["clear", "concise"], &["vague result"]),
            result(&[], &["clear"], &["vague result", "no metrics"]),
        ];
        let summary = aggregate(Uuid::nil(), &results);
        assert_eq!(summary.strengths, vec!["clear", "concise"]);
        assert_eq!(summary.weaknesses, vec!["no metrics", "vague result"]);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let results = vec![
            result(&[("a", 1.0), ("b", 3.5)], &["s1", "s2"], &["w1"]),
            result(&[("a", 2.0)], &["s2"], &["w2", "w1"]),
        ];
        let first = serde_json::to_vec(&aggregate(Uuid::nil(), &results)).unwrap();
        let second = serde_json::to_vec(&aggregate(Uuid::nil(), &results)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_input_yields_empty_summary() {
        let summary = aggregate(Uuid::nil(), &[]);
        assert!(summary.strengths.is_empty());
        assert!(summary.weaknesses.is_empty());
        assert!(summary.competency_scores.is_empty());
    }
}
