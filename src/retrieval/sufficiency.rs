//! Sufficiency classification
//!
//! A pure summary of a result set's score distribution. The downstream
//! answer layer uses it to decide between leaning on retrieved notes,
//! supplementing them, or falling back to general knowledge.

use super::RetrievedChunk;
use serde::{Deserialize, Serialize};

/// How well the retrieved context covers the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sufficiency {
    /// At least two strong matches and a solid mean score
    Sufficient,
    /// At least one strong match
    Partial,
    /// No strong matches
    Insufficient,
}

/// Score thresholds for the classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SufficiencyThresholds {
    /// A result above this score counts as a strong match
    pub high_score: f32,
    /// Mean score the whole result set must clear to be sufficient
    pub mean_score: f32,
}

impl Default for SufficiencyThresholds {
    fn default() -> Self {
        Self {
            high_score: 0.3,
            mean_score: 0.25,
        }
    }
}

/// Classify a result set; returns the label and the mean score
pub fn classify_sufficiency(
    results: &[RetrievedChunk],
    thresholds: &SufficiencyThresholds,
) -> (Sufficiency, f32) {
    if results.is_empty() {
        return (Sufficiency::Insufficient, 0.0);
    }

    let mean = results.iter().map(|r| r.score).sum::<f32>() / results.len() as f32;
    let strong = results
        .iter()
        .filter(|r| r.score > thresholds.high_score)
        .count();

    let label = if strong >= 2 && mean > thresholds.mean_score {
        Sufficiency::Sufficient
    } else if strong >= 1 {
        Sufficiency::Partial
    } else {
        Sufficiency::Insufficient
    };

    (label, mean)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(score: f32) -> RetrievedChunk {
        RetrievedChunk {
            text: "chunk".to_string(),
            score,
            document_id: "doc".to_string(),
            document_name: "doc.txt".to_string(),
            sequence_index: 0,
        }
    }

    #[test]
    fn empty_results_are_insufficient() {
        let (label, mean) = classify_sufficiency(&[], &SufficiencyThresholds::default());
        assert_eq!(label, Sufficiency::Insufficient);
        assert_eq!(mean, 0.0);
    }

    #[test]
    fn two_strong_matches_with_good_mean_are_sufficient() {
        let results = vec![chunk(0.6), chunk(0.5), chunk(0.1)];
        let (label, mean) = classify_sufficiency(&results, &SufficiencyThresholds::default());
        assert_eq!(label, Sufficiency::Sufficient);
        assert!((mean - 0.4).abs() < 1e-6);
    }

    #[test]
    fn single_strong_match_is_partial() {
        let results = vec![chunk(0.5), chunk(0.05), chunk(0.02)];
        let (label, _) = classify_sufficiency(&results, &SufficiencyThresholds::default());
        assert_eq!(label, Sufficiency::Partial);
    }

    #[test]
    fn two_strong_matches_with_poor_mean_are_partial() {
        // Strong outliers dragged down by many weak results
        let results = vec![chunk(0.35), chunk(0.32), chunk(0.0), chunk(0.0), chunk(0.0)];
        let (label, _) = classify_sufficiency(&results, &SufficiencyThresholds::default());
        assert_eq!(label, Sufficiency::Partial);
    }

    #[test]
    fn weak_results_are_insufficient() {
        let results = vec![chunk(0.2), chunk(0.1)];
        let (label, _) = classify_sufficiency(&results, &SufficiencyThresholds::default());
        assert_eq!(label, Sufficiency::Insufficient);
    }

    #[test]
    fn thresholds_are_configurable() {
        let lax = SufficiencyThresholds {
            high_score: 0.05,
            mean_score: 0.01,
        };
        let results = vec![chunk(0.2), chunk(0.1)];
        let (label, _) = classify_sufficiency(&results, &lax);
        assert_eq!(label, Sufficiency::Sufficient);
    }
}
