/// Source-weight learning from user feedback.
///
/// Each cycle nudges a source's weight by a fixed step when its blended useful-rate leaves
/// the neutral band, clamped so no source can dominate or vanish. Weight keys are always
/// lowercase to match `RankConfig::source_weight`.
use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const RECENT_SHARE: f64 = 0.7;
const LONGTERM_SHARE: f64 = 0.3;

/// Aggregated feedback for one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FeedbackStats {
    pub source: String,
    pub total: u32,
    pub useful: u32,
    pub rate_7d: f64,
    pub rate_longterm: f64,
    /// `0.7 * rate_7d + 0.3 * rate_longterm`
    pub effective_rate: f64,
}

impl FeedbackStats {
    pub fn new(
        source: impl Into<String>,
        total: u32,
        useful: u32,
        rate_7d: f64,
        rate_longterm: f64,
    ) -> Self {
        Self {
            source: source.into(),
            total,
            useful,
            rate_7d,
            rate_longterm,
            effective_rate: compute_effective_rate(rate_7d, rate_longterm),
        }
    }
}

pub fn compute_effective_rate(rate_7d: f64, rate_longterm: f64) -> f64 {
    RECENT_SHARE * rate_7d + LONGTERM_SHARE * rate_longterm
}

/// Tuning for `compute_weight_adjustments`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AdjustmentParams {
    pub step: f64,
    pub min_weight: f64,
    pub max_weight: f64,
    pub high_threshold: f64,
    pub low_threshold: f64,
}

impl Default for AdjustmentParams {
    fn default() -> Self {
        Self {
            step: 0.1,
            min_weight: 0.5,
            max_weight: 2.0,
            high_threshold: 0.7,
            low_threshold: 0.3,
        }
    }
}

/// Propose new weights. Sources without feedback keep their current weight; sources new to
/// `current` start from 1.0.
pub fn compute_weight_adjustments(
    current: &BTreeMap<String, f64>,
    feedback: &[FeedbackStats],
    params: &AdjustmentParams,
) -> BTreeMap<String, f64> {
    let mut proposed = current.clone();

    for stats in feedback {
        let key = stats.source.to_lowercase();
        let weight = proposed.get(&key).copied().unwrap_or(1.0);

        let adjusted = if stats.effective_rate > params.high_threshold {
            (weight + params.step).min(params.max_weight)
        } else if stats.effective_rate < params.low_threshold {
            (weight - params.step).max(params.min_weight)
        } else {
            weight
        };

        proposed.insert(key, round2(adjusted));
    }

    proposed
}

/// One row of a weight-update report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WeightChange {
    pub source: String,
    pub before: f64,
    pub after: f64,
    pub change: f64,
    pub reason: String,
}

/// Per-source before/after rows, sorted by source.
pub fn compute_weight_changes(
    before: &BTreeMap<String, f64>,
    after: &BTreeMap<String, f64>,
    feedback: &[FeedbackStats],
) -> Vec<WeightChange> {
    let rates: BTreeMap<String, f64> = feedback
        .iter()
        .map(|s| (s.source.to_lowercase(), s.effective_rate))
        .collect();

    let sources: BTreeSet<&String> = before.keys().chain(after.keys()).collect();

    sources
        .into_iter()
        .map(|source| {
            let w_before = before.get(source).copied().unwrap_or(1.0);
            let w_after = after.get(source).copied().unwrap_or(1.0);
            let change = w_after - w_before;

            let reason = match rates.get(source) {
                None => "no feedback data".to_string(),
                Some(rate) if change > 0.0 => format!("effective_rate {rate:.2} > 0.7"),
                Some(rate) if change < 0.0 => format!("effective_rate {rate:.2} < 0.3"),
                Some(rate) => format!("neutral zone ({rate:.2})"),
            };

            WeightChange {
                source: source.clone(),
                before: w_before,
                after: w_after,
                change,
                reason,
            }
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(s, w)| (s.to_string(), *w)).collect()
    }

    #[test]
    fn test_effective_rate_blend() {
        assert!((compute_effective_rate(1.0, 0.0) - 0.7).abs() < 1e-12);
        assert!((compute_effective_rate(0.0, 1.0) - 0.3).abs() < 1e-12);
        assert!((compute_effective_rate(0.5, 0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_adjustments_follow_thresholds() {
        let current = weights(&[("good", 1.0), ("bad", 1.0), ("meh", 1.2), ("quiet", 1.3)]);
        let feedback = vec![
            FeedbackStats::new("Good", 10, 9, 0.9, 0.9),
            FeedbackStats::new("bad", 10, 1, 0.1, 0.1),
            FeedbackStats::new("meh", 10, 5, 0.5, 0.5),
        ];

        let proposed = compute_weight_adjustments(&current, &feedback, &AdjustmentParams::default());

        assert_eq!(proposed["good"], 1.1);
        assert_eq!(proposed["bad"], 0.9);
        assert_eq!(proposed["meh"], 1.2);
        assert_eq!(proposed["quiet"], 1.3);
        assert!(!proposed.contains_key("Good"));
    }

    #[test]
    fn test_adjustments_clamp_to_bounds() {
        let current = weights(&[("top", 1.95), ("bottom", 0.55)]);
        let feedback = vec![
            FeedbackStats::new("top", 10, 10, 1.0, 1.0),
            FeedbackStats::new("bottom", 10, 0, 0.0, 0.0),
        ];
        let proposed = compute_weight_adjustments(&current, &feedback, &AdjustmentParams::default());
        assert_eq!(proposed["top"], 2.0);
        assert_eq!(proposed["bottom"], 0.5);
    }

    #[test]
    fn test_new_source_starts_at_one() {
        let feedback = vec![FeedbackStats::new("newcomer", 8, 8, 1.0, 1.0)];
        let proposed =
            compute_weight_adjustments(&BTreeMap::new(), &feedback, &AdjustmentParams::default());
        assert_eq!(proposed["newcomer"], 1.1);
    }

    #[test]
    fn test_weight_changes_report_reasons() {
        let before = weights(&[("bad", 1.0), ("good", 1.0), ("meh", 1.0), ("quiet", 1.0)]);
        let after = weights(&[("bad", 0.9), ("good", 1.1), ("meh", 1.0), ("quiet", 1.0)]);
        let feedback = vec![
            FeedbackStats::new("good", 10, 9, 0.9, 0.9),
            FeedbackStats::new("bad", 10, 1, 0.1, 0.1),
            FeedbackStats::new("meh", 10, 5, 0.5, 0.5),
        ];

        let rows = compute_weight_changes(&before, &after, &feedback);
        let sources: Vec<&str> = rows.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["bad", "good", "meh", "quiet"]);

        assert_eq!(rows[0].reason, "effective_rate 0.10 < 0.3");
        assert_eq!(rows[1].reason, "effective_rate 0.90 > 0.7");
        assert_eq!(rows[2].reason, "neutral zone (0.50)");
        assert_eq!(rows[3].reason, "no feedback data");
        assert!(rows[1].change > 0.0);
    }
}
