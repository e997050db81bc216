//! Derived statistics over the history log.
//!
//! [`compute_stats`] is a pure function of the log; nothing here is
//! persisted. The engine recomputes after every load, append and clear.

use serde::Serialize;

use super::entry::HistoryEntry;

/// Summary shown above the history log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStats {
    pub total_predictions: usize,
    /// Mean budget in crore, rounded half-up to 2 decimals.
    pub avg_budget: f64,
    pub last_prediction: Option<HistoryEntry>,
}

/// Compute stats for a newest-first log.
///
/// Empty log → `{0, 0, None}`.
pub fn compute_stats(log: &[HistoryEntry]) -> DerivedStats {
    let Some(first) = log.first() else {
        return DerivedStats::default();
    };

    let total: f64 = log.iter().map(|e| e.inputs.budget).sum();
    let avg_budget = round_half_up(total / log.len() as f64, 2);

    DerivedStats {
        total_predictions: log.len(),
        avg_budget,
        last_prediction: Some(first.clone()),
    }
}

/// Round to `decimals` places, halves away from zero, using the shortest
/// decimal representation of `value` (so `1.005` → `1.01`).
pub fn round_half_up(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() || value == 0.0 {
        return value;
    }

    let repr = value.abs().to_string();
    let (int_part, frac_part) = repr.split_once('.').unwrap_or((repr.as_str(), ""));
    let places = decimals as usize;

    // Beyond u128 range there is nothing meaningful left to round.
    if int_part.len() + places > 36 {
        return value;
    }

    let mut digits = String::with_capacity(int_part.len() + places);
    digits.push_str(int_part);
    digits.extend(frac_part.chars().chain(std::iter::repeat('0')).take(places));

    let Ok(mut scaled) = digits.parse::<u128>() else {
        return value;
    };
    if frac_part.as_bytes().get(places).is_some_and(|&d| d >= b'5') {
        scaled += 1;
    }

    let rounded = scaled as f64 / 10f64.powi(decimals as i32);
    rounded.copysign(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::{PredictionInputs, PredictionResult};

    fn entry(id: i64, budget: f64) -> HistoryEntry {
        HistoryEntry {
            id,
            timestamp: format!("entry {id}"),
            inputs: PredictionInputs {
                budget,
                location: Default::default(),
                tower_type: Default::default(),
                substation_type: Default::default(),
            },
            results: PredictionResult::new(),
        }
    }

    #[test]
    fn empty_log_has_default_stats() {
        let stats = compute_stats(&[]);
        assert_eq!(stats.total_predictions, 0);
        assert_eq!(stats.avg_budget, 0.0);
        assert!(stats.last_prediction.is_none());
    }

    #[test]
    fn single_entry_stats() {
        let e = entry(1, 42.5);
        let stats = compute_stats(std::slice::from_ref(&e));
        assert_eq!(stats.total_predictions, 1);
        assert_eq!(stats.avg_budget, 42.5);
        assert_eq!(stats.last_prediction, Some(e));
    }

    #[test]
    fn average_of_ten_twenty_thirty() {
        let log = vec![entry(3, 30.0), entry(2, 20.0), entry(1, 10.0)];
        let stats = compute_stats(&log);
        assert_eq!(stats.total_predictions, 3);
        assert_eq!(stats.avg_budget, 20.0);
        assert_eq!(stats.last_prediction.unwrap().id, 3);
    }

    #[test]
    fn average_is_rounded_to_two_places() {
        let log = vec![entry(3, 10.0), entry(2, 10.0), entry(1, 11.0)];
        // 31 / 3 = 10.333…
        assert_eq!(compute_stats(&log).avg_budget, 10.33);

        let log = vec![entry(2, 1.0), entry(1, 2.0)];
        assert_eq!(compute_stats(&log).avg_budget, 1.5);
    }

    #[test]
    fn round_half_up_cases() {
        assert_eq!(round_half_up(1.005, 2), 1.01);
        assert_eq!(round_half_up(2.675, 2), 2.68);
        assert_eq!(round_half_up(10.334, 2), 10.33);
        assert_eq!(round_half_up(10.335, 2), 10.34);
        assert_eq!(round_half_up(20.0, 2), 20.0);
        assert_eq!(round_half_up(-1.005, 2), -1.01);
        assert_eq!(round_half_up(0.0, 2), 0.0);
    }

    #[test]
    fn stats_serialize_with_dashboard_names() {
        let json = serde_json::to_value(compute_stats(&[])).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"totalPredictions": 0, "avgBudget": 0.0, "lastPrediction": null})
        );
    }
}
