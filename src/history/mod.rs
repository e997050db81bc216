//! History & stats engine.
//!
//! Owns the prediction history log: newest entry first, at most
//! [`MAX_HISTORY_ENTRIES`] long, persisted as one JSON array under
//! [`PREDICTION_HISTORY_KEY`]. Derived stats are recomputed on every change
//! and never stored.
//!
//! # Failure policy
//!
//! - **Load** never fails. A missing, unreadable or unparsable record means
//!   an empty log; individually malformed entries are skipped.
//! - **Append / clear** always update the in-memory log. A storage write
//!   failure is reported alongside the new state in [`Change::persist_error`];
//!   the in-memory log stays authoritative for the session.
//!
//! The new log is fully built before it replaces the current one, so a
//! failure part-way through never leaves a half-applied state.

pub mod entry;
pub mod stats;

use serde_json::Value;

pub use entry::HistoryEntry;
pub use stats::{DerivedStats, compute_stats};

use crate::error::StorageError;
use crate::prediction::{PredictionInputs, PredictionResult};
use crate::storage::{KeyValueStore, PREDICTION_HISTORY_KEY};

/// Maximum number of entries kept. Older entries are evicted silently.
pub const MAX_HISTORY_ENTRIES: usize = 10;

/// Result of a mutating engine operation.
#[derive(Debug)]
pub struct Change {
    /// Stats for the log after the change.
    pub stats: DerivedStats,
    /// Set when the new log could not be persisted.
    pub persist_error: Option<StorageError>,
}

/// Why a load fell back to an empty or partial log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadIssue {
    /// The store could not be read.
    Unreadable(String),
    /// The record is not a JSON array.
    Unparsable(String),
    /// Entries that did not decode and were dropped.
    SkippedEntries(usize),
}

#[derive(Debug, Clone, Default)]
pub struct HistoryEngine {
    entries: Vec<HistoryEntry>,
    stats: DerivedStats,
}

impl HistoryEngine {
    /// Empty engine, nothing read from storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an in-memory newest-first log, truncating to the limit.
    pub fn from_entries(mut entries: Vec<HistoryEntry>) -> Self {
        entries.truncate(MAX_HISTORY_ENTRIES);
        let stats = compute_stats(&entries);
        Self { entries, stats }
    }

    /// Read the persisted log. Never fails; see the module docs.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        Self::load_with_issues(store).0
    }

    /// Like [`load`](Self::load), also reporting why the log degraded.
    pub fn load_with_issues(store: &dyn KeyValueStore) -> (Self, Option<LoadIssue>) {
        let raw = match store.get(PREDICTION_HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return (Self::new(), None),
            Err(e) => return (Self::new(), Some(LoadIssue::Unreadable(e.to_string()))),
        };

        let items: Vec<Value> = match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => return (Self::new(), Some(LoadIssue::Unparsable(e.to_string()))),
        };

        let total = items.len();
        let entries: Vec<HistoryEntry> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();

        let skipped = total - entries.len();
        let issue = (skipped > 0).then_some(LoadIssue::SkippedEntries(skipped));
        (Self::from_entries(entries), issue)
    }

    /// Prepend `entry`, evict beyond the limit, recompute stats, persist.
    pub fn append(&mut self, store: &mut dyn KeyValueStore, entry: HistoryEntry) -> Change {
        let mut next = Vec::with_capacity(MAX_HISTORY_ENTRIES + 1);
        next.push(entry);
        next.extend(self.entries.iter().cloned());
        next.truncate(MAX_HISTORY_ENTRIES);

        let stats = compute_stats(&next);
        let persist_error = persist(store, &next).err();

        self.entries = next;
        self.stats = stats.clone();

        Change {
            stats,
            persist_error,
        }
    }

    /// Drop every entry and remove the persisted record.
    ///
    /// The caller is responsible for getting the user's confirmation first.
    pub fn clear(&mut self, store: &mut dyn KeyValueStore) -> Change {
        let persist_error = store.remove(PREDICTION_HISTORY_KEY).err();

        self.entries.clear();
        self.stats = DerivedStats::default();

        Change {
            stats: self.stats.clone(),
            persist_error,
        }
    }

    /// Newest-first entries.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn stats(&self) -> &DerivedStats {
        &self.stats
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    pub fn get(&self, id: i64) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stamp a new entry for `inputs`/`results` with an id after the head.
    pub fn new_entry(&self, inputs: PredictionInputs, results: PredictionResult) -> HistoryEntry {
        HistoryEntry::record(inputs, results, self.latest().map(|e| e.id))
    }
}

fn persist(store: &mut dyn KeyValueStore, entries: &[HistoryEntry]) -> Result<(), StorageError> {
    let json = serde_json::to_string(entries).map_err(|e| StorageError::Serialize {
        key: PREDICTION_HISTORY_KEY.to_string(),
        details: e.to_string(),
    })?;
    store.set(PREDICTION_HISTORY_KEY, &json)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn entry(id: i64, budget: f64) -> HistoryEntry {
        let mut results = PredictionResult::new();
        results.insert("Steel (tons)", id);
        HistoryEntry {
            id,
            timestamp: format!("t{id}"),
            inputs: PredictionInputs {
                budget,
                location: Default::default(),
                tower_type: Default::default(),
                substation_type: Default::default(),
            },
            results,
        }
    }

    /// Store whose writes always fail.
    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Write {
                key: key.to_string(),
                path: "/read-only".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            self.set(key, "")
        }
    }

    #[test]
    fn append_prepends_and_persists() {
        let mut store = MemoryStore::new();
        let mut engine = HistoryEngine::new();

        engine.append(&mut store, entry(1, 10.0));
        let change = engine.append(&mut store, entry(2, 30.0));

        assert!(change.persist_error.is_none());
        assert_eq!(change.stats.total_predictions, 2);
        assert_eq!(change.stats.avg_budget, 20.0);
        assert_eq!(engine.entries()[0].id, 2);

        let reloaded = HistoryEngine::load(&store);
        assert_eq!(reloaded.entries(), engine.entries());
        assert_eq!(reloaded.stats(), engine.stats());
    }

    #[test]
    fn append_evicts_beyond_limit() {
        let mut store = MemoryStore::new();
        let mut engine = HistoryEngine::new();
        for id in 1..=15 {
            engine.append(&mut store, entry(id, id as f64));
        }

        let ids: Vec<i64> = engine.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, (6..=15).rev().collect::<Vec<_>>());
        assert_eq!(engine.stats().total_predictions, MAX_HISTORY_ENTRIES);
    }

    #[test]
    fn write_failure_keeps_memory_authoritative() {
        let mut store = ReadOnlyStore(MemoryStore::new());
        let mut engine = HistoryEngine::new();

        let change = engine.append(&mut store, entry(1, 50.0));
        assert!(change.persist_error.is_some());
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.stats().avg_budget, 50.0);

        let change = engine.clear(&mut store);
        assert!(change.persist_error.is_some());
        assert!(engine.is_empty());
    }

    #[test]
    fn clear_removes_record() {
        let mut store = MemoryStore::new();
        let mut engine = HistoryEngine::new();
        engine.append(&mut store, entry(1, 10.0));
        assert!(store.contains(PREDICTION_HISTORY_KEY));

        let change = engine.clear(&mut store);
        assert_eq!(change.stats, DerivedStats::default());
        assert!(!store.contains(PREDICTION_HISTORY_KEY));
    }

    #[test]
    fn load_garbage_is_empty() {
        let mut store = MemoryStore::new();
        store.set(PREDICTION_HISTORY_KEY, "{not json").unwrap();

        let (engine, issue) = HistoryEngine::load_with_issues(&store);
        assert!(engine.is_empty());
        assert!(matches!(issue, Some(LoadIssue::Unparsable(_))));
    }

    #[test]
    fn load_skips_malformed_entries() {
        let mut store = MemoryStore::new();
        let good = serde_json::to_value(entry(7, 12.0)).unwrap();
        let raw = serde_json::json!([good, {"id": "nope"}, 3]).to_string();
        store.set(PREDICTION_HISTORY_KEY, &raw).unwrap();

        let (engine, issue) = HistoryEngine::load_with_issues(&store);
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.entries()[0].id, 7);
        assert_eq!(issue, Some(LoadIssue::SkippedEntries(2)));
    }

    #[test]
    fn load_skips_non_finite_budgets() {
        let mut store = MemoryStore::new();
        let mut records = Vec::new();
        for (id, budget) in [(4, "NaN"), (3, "inf"), (2, "-infinity"), (1, "10")] {
            let mut record = serde_json::to_value(entry(id, 0.0)).unwrap();
            record["inputs"]["budget"] = serde_json::json!(budget);
            records.push(record);
        }
        store
            .set(PREDICTION_HISTORY_KEY, &serde_json::Value::Array(records).to_string())
            .unwrap();

        let (engine, issue) = HistoryEngine::load_with_issues(&store);
        assert_eq!(engine.len(), 1);
        assert_eq!(issue, Some(LoadIssue::SkippedEntries(3)));
        assert_eq!(engine.stats().avg_budget, 10.0);
        let stats = serde_json::to_value(engine.stats()).unwrap();
        assert_eq!(stats["avgBudget"], 10.0);
    }

    #[test]
    fn load_unwraps_enveloped_results() {
        let mut store = MemoryStore::new();
        let mut record = serde_json::to_value(entry(5, 20.0)).unwrap();
        record["results"] = serde_json::json!({
            "predictions": {"Steel (tons)": 125.3, "Insulators (units)": "247"}
        });
        store
            .set(PREDICTION_HISTORY_KEY, &serde_json::json!([record]).to_string())
            .unwrap();

        let (engine, issue) = HistoryEngine::load_with_issues(&store);
        assert_eq!(issue, None);
        let results = &engine.entries()[0].results;
        let materials: Vec<&str> = results.iter().map(|(name, _)| name).collect();
        assert_eq!(materials, ["Steel (tons)", "Insulators (units)"]);
    }

    #[test]
    fn load_truncates_oversized_record() {
        let mut store = MemoryStore::new();
        let entries: Vec<HistoryEntry> = (1..=12).rev().map(|id| entry(id, 5.0)).collect();
        store
            .set(PREDICTION_HISTORY_KEY, &serde_json::to_string(&entries).unwrap())
            .unwrap();

        let engine = HistoryEngine::load(&store);
        assert_eq!(engine.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(engine.latest().unwrap().id, 12);
    }

    #[test]
    fn new_entry_id_follows_head() {
        let engine = HistoryEngine::from_entries(vec![entry(i64::MAX - 1, 1.0)]);
        let next = engine.new_entry(entry(0, 1.0).inputs, PredictionResult::new());
        assert_eq!(next.id, i64::MAX);
    }
}
