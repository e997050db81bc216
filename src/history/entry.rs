use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::prediction::{PredictionInputs, PredictionResult};

/// One submitted input set paired with its returned prediction.
///
/// Immutable once created. `id` is a millisecond clock reading taken at
/// creation, bumped past the newest existing id when the clock has not moved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    /// Human-readable local creation time, e.g. `3/14/2026, 9:26:53 AM`.
    pub timestamp: String,
    pub inputs: PredictionInputs,
    pub results: PredictionResult,
}

impl HistoryEntry {
    /// Stamp a new entry with the current time.
    ///
    /// `newest_id` is the id at the head of the log, if any.
    pub fn record(
        inputs: PredictionInputs,
        results: PredictionResult,
        newest_id: Option<i64>,
    ) -> Self {
        Self::record_at(Local::now(), inputs, results, newest_id)
    }

    /// Like [`record`](Self::record) with an explicit creation time.
    pub fn record_at<Tz: TimeZone>(
        now: DateTime<Tz>,
        inputs: PredictionInputs,
        results: PredictionResult,
        newest_id: Option<i64>,
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            id: next_id(now.timestamp_millis(), newest_id),
            timestamp: display_timestamp(&now),
            inputs,
            results,
        }
    }
}

/// Pick an id that is strictly greater than the newest one.
pub fn next_id(now_millis: i64, newest_id: Option<i64>) -> i64 {
    match newest_id {
        Some(newest) if now_millis <= newest => newest.saturating_add(1),
        _ => now_millis,
    }
}

/// Format a timestamp the way the dashboard shows it.
pub fn display_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}
