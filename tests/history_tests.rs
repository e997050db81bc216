/// History & stats engine against the file-backed store.
///
/// Unit tests for the engine itself live in `src/history`. These tests cover
/// the on-disk record: what gets written, what survives a reload, and how a
/// damaged record degrades.
mod common;

use common::temp_dir;
use gridcast::history::{DerivedStats, HistoryEngine, HistoryEntry, MAX_HISTORY_ENTRIES, compute_stats};
use gridcast::prediction::{Location, PredictionInputs, PredictionResult, SubstationType, TowerType};
use gridcast::storage::{FileStore, KeyValueStore, PREDICTION_HISTORY_KEY};

fn entry(id: i64, budget: f64) -> HistoryEntry {
    let mut results = PredictionResult::new();
    results.insert("Steel (MT)", id);
    HistoryEntry {
        id,
        timestamp: format!("1/{}/2026, 10:00:00 AM", id % 28 + 1),
        inputs: PredictionInputs {
            budget,
            location: Location::Gujarat,
            tower_type: TowerType::Kv400,
            substation_type: SubstationType::Gis,
        },
        results,
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn record_is_a_newest_first_json_array() {
    let dir = temp_dir("history-record");
    let mut store = FileStore::new(&dir);
    let mut engine = HistoryEngine::load(&store);
    assert!(engine.is_empty());

    engine.append(&mut store, entry(1, 10.0));
    engine.append(&mut store, entry(2, 20.0));

    let raw = std::fs::read_to_string(store.record_path(PREDICTION_HISTORY_KEY)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let ids: Vec<i64> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, [2, 1]);
    assert_eq!(value[0]["inputs"]["tower_type"], "400kV");
    assert_eq!(value[0]["results"]["Steel (MT)"], 2);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn stats_are_recomputed_on_reload() {
    let dir = temp_dir("history-reload");
    let mut store = FileStore::new(&dir);
    let mut engine = HistoryEngine::new();
    for (id, budget) in [(1, 10.0), (2, 20.0), (3, 3.333)] {
        engine.append(&mut store, entry(id, budget));
    }

    let reloaded = HistoryEngine::load(&store);
    let stats = reloaded.stats();
    assert_eq!(stats.total_predictions, 3);
    // (10 + 20 + 3.333) / 3 = 11.111
    assert_eq!(stats.avg_budget, 11.11);
    assert_eq!(stats.last_prediction.as_ref().unwrap().id, 3);
    assert_eq!(stats, &compute_stats(reloaded.entries()));

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn clear_then_reload_is_empty() {
    let dir = temp_dir("history-clear");
    let mut store = FileStore::new(&dir);
    let mut engine = HistoryEngine::new();
    engine.append(&mut store, entry(1, 10.0));

    let change = engine.clear(&mut store);
    assert!(change.persist_error.is_none());
    assert_eq!(change.stats, DerivedStats::default());
    assert!(!store.record_path(PREDICTION_HISTORY_KEY).exists());
    assert!(HistoryEngine::load(&store).is_empty());

    // Clearing an already empty log is fine.
    assert!(engine.clear(&mut store).persist_error.is_none());

    let _ = std::fs::remove_dir_all(dir);
}

// ---------------------------------------------------------------------------
// Bounds and degradation
// ---------------------------------------------------------------------------

#[test]
fn never_more_than_ten_entries_on_disk() {
    let dir = temp_dir("history-bound");
    let mut store = FileStore::new(&dir);
    let mut engine = HistoryEngine::new();
    for id in 1..=25 {
        let change = engine.append(&mut store, entry(id, 5.0));
        assert!(change.stats.total_predictions <= MAX_HISTORY_ENTRIES);
    }

    let raw = store.get(PREDICTION_HISTORY_KEY).unwrap().unwrap();
    let on_disk: Vec<HistoryEntry> = serde_json::from_str(&raw).unwrap();
    assert_eq!(on_disk.len(), MAX_HISTORY_ENTRIES);
    assert_eq!(on_disk[0].id, 25);
    assert_eq!(on_disk[9].id, 16);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn truncated_record_loads_empty() {
    let dir = temp_dir("history-truncated");
    let mut store = FileStore::new(&dir);
    store
        .set(PREDICTION_HISTORY_KEY, r#"[{"id": 1, "timestamp": "x", "inp"#)
        .unwrap();

    let engine = HistoryEngine::load(&store);
    assert!(engine.is_empty());
    assert_eq!(engine.stats(), &DerivedStats::default());

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn legacy_string_budget_loads() {
    let dir = temp_dir("history-legacy");
    let mut store = FileStore::new(&dir);
    let raw = r#"[{
        "id": 1700000000000,
        "timestamp": "11/14/2023, 10:13:20 PM",
        "inputs": {"budget": "50", "location": "Tamil Nadu", "tower_type": "132kV", "substation_type": "AIS"},
        "results": {"Steel (tons)": 125.3}
    }]"#;
    store.set(PREDICTION_HISTORY_KEY, raw).unwrap();

    let engine = HistoryEngine::load(&store);
    assert_eq!(engine.len(), 1);
    assert_eq!(engine.entries()[0].inputs.budget, 50.0);
    assert_eq!(engine.entries()[0].inputs.location, Location::TamilNadu);
    assert_eq!(engine.stats().avg_budget, 50.0);

    let _ = std::fs::remove_dir_all(dir);
}
