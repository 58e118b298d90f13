//! CSV export and the end-to-end pipeline.

use loantape_core::{
    config::TapeConfig,
    error::TapeError,
    export::export_rollups,
    generator::make_loans,
    pipeline,
    store::{BandCountRow, StateSummaryRow, TapeStore},
    tape::read_tape,
};
use std::collections::HashSet;
use std::path::Path;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn make_store() -> TapeStore {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = TapeStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

fn headers(path: &Path) -> Vec<String> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.headers().unwrap().iter().map(String::from).collect()
}

fn read_rows<T: serde::de::DeserializeOwned>(path: &Path) -> Vec<T> {
    csv::Reader::from_path(path)
        .unwrap()
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .unwrap()
}

// ── Exporter ─────────────────────────────────────────────────────────────────

#[test]
fn export_before_load_fails_without_writing() {
    let store = make_store();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("data");

    let err = export_rollups(&store, &out).unwrap_err();
    assert!(matches!(err, TapeError::MissingInput { .. }), "got {err:?}");
    assert!(!out.exists(), "No output may be produced when the table is missing");
}

#[test]
fn export_of_empty_table_fails_without_writing() {
    let store = make_store();
    store.replace_loan_tape(&[]).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let err = export_rollups(&store, dir.path()).unwrap_err();
    assert!(matches!(err, TapeError::MissingInput { .. }), "got {err:?}");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn export_writes_full_views_with_headers() {
    let store = make_store();
    let loans = make_loans(1_000, 7).unwrap();
    store.replace_loan_tape(&loans).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let report = export_rollups(&store, dir.path()).unwrap();

    let state_path = &report.state_summary.path;
    let band_path = &report.band_distribution.path;
    assert_eq!(state_path, &dir.path().join("state_summary.csv"));
    assert_eq!(band_path, &dir.path().join("fico_ltv_bands.csv"));
    assert_eq!(headers(state_path), ["state", "loan_count", "total_balance"]);
    assert_eq!(headers(band_path), ["fico_band", "ltv_band", "loan_count"]);

    let states: Vec<StateSummaryRow> = read_rows(state_path);
    let bands: Vec<BandCountRow> = read_rows(band_path);

    let distinct_states: HashSet<&str> = loans.iter().map(|l| l.state.as_str()).collect();
    let distinct_bands: HashSet<(String, String)> = loans
        .iter()
        .map(|l| (l.fico_band.to_string(), l.ltv_band.to_string()))
        .collect();
    assert_eq!(states.len(), distinct_states.len());
    assert_eq!(bands.len(), distinct_bands.len());
    assert!(states.len() <= 11 && bands.len() <= 16);
    assert_eq!(report.state_summary.rows, states.len());
    assert_eq!(report.band_distribution.rows, bands.len());

    assert_eq!(states, store.state_summary(None).unwrap());
    assert_eq!(bands, store.band_distribution(None).unwrap());
    assert_eq!(states.iter().map(|s| s.loan_count).sum::<i64>(), 1_000);
    assert_eq!(bands.iter().map(|b| b.loan_count).sum::<i64>(), 1_000);
}

#[test]
fn failed_band_write_leaves_previous_export_pair_untouched() {
    let store = make_store();
    store.replace_loan_tape(&make_loans(100, 3).unwrap()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state_summary.csv");
    let band_path = dir.path().join("fico_ltv_bands.csv");
    std::fs::write(&state_path, "previous state summary\n").unwrap();
    std::fs::write(&band_path, "previous bands\n").unwrap();

    // A directory where the band temp file should go makes that write fail.
    std::fs::create_dir(dir.path().join("fico_ltv_bands.tmp")).unwrap();

    let err = export_rollups(&store, dir.path()).unwrap_err();
    assert!(matches!(err, TapeError::Csv(_) | TapeError::Io(_)), "got {err:?}");
    assert_eq!(std::fs::read_to_string(&state_path).unwrap(), "previous state summary\n");
    assert_eq!(std::fs::read_to_string(&band_path).unwrap(), "previous bands\n");
    assert!(
        !dir.path().join("state_summary.tmp").exists(),
        "Staged state summary left behind after a failed export"
    );
}

// ── Pipeline ─────────────────────────────────────────────────────────────────

#[test]
fn full_run_scenario_thousand_loans_seed_seven() {
    let dir = tempfile::tempdir().unwrap();
    let config = TapeConfig::default_test(dir.path());
    assert_eq!((config.loan_count, config.seed), (1_000, 7));

    let summary = pipeline::run(&config).unwrap();
    assert_eq!(summary.generate.tape.rows, 1_000);
    assert_eq!(summary.generate.loaded_rows, 1_000);
    assert_eq!(summary.generate.preview.top_states.len(), 5);
    assert!(summary.generate.preview.top_bands.len() <= 10);
    assert!(config.state_summary_path().exists());
    assert!(config.band_distribution_path().exists());

    // Regenerating gives the same tape.
    let first = read_tape(&config.tape_path()).unwrap();
    pipeline::generate(&config).unwrap();
    let second = read_tape(&config.tape_path()).unwrap();
    assert_eq!(first, second);

    let ids: Vec<i64> = second.iter().map(|l| l.loan_id).collect();
    assert_eq!(ids, (1..=1_000).collect::<Vec<i64>>());
    assert!(second.iter().all(|l| l.within_bounds()));

    let store = pipeline::open_store(&config).unwrap();
    let run = store.last_run().unwrap().expect("run_log entry");
    assert_eq!((run.seed, run.loan_count), (7, 1_000));
    assert_eq!(store.band_mismatch_count().unwrap(), 0);
}

#[test]
fn pipeline_export_before_generate_is_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let config = TapeConfig::default_test(dir.path());

    let err = pipeline::export(&config).unwrap_err();
    assert!(matches!(err, TapeError::MissingInput { .. }), "got {err:?}");
    assert!(!config.state_summary_path().exists());
    assert!(!config.band_distribution_path().exists());
}

#[test]
fn pipeline_load_without_tape_is_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let config = TapeConfig::default_test(dir.path());

    let err = pipeline::load(&config).unwrap_err();
    assert!(matches!(err, TapeError::MissingInput { .. }), "got {err:?}");
}

#[test]
fn reload_from_tape_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = TapeConfig::default_test(dir.path());
    pipeline::generate(&config).unwrap();

    assert_eq!(pipeline::load(&config).unwrap(), 1_000);
    assert_eq!(pipeline::load(&config).unwrap(), 1_000);

    let store = pipeline::open_store(&config).unwrap();
    assert_eq!(store.all_loans().unwrap(), read_tape(&config.tape_path()).unwrap());
}

#[test]
fn sanity_check_counts_runs() {
    let dir = tempfile::tempdir().unwrap();
    let config = TapeConfig::default_test(dir.path());

    let first = pipeline::sanity_check(&config).unwrap();
    let second = pipeline::sanity_check(&config).unwrap();
    assert_eq!(first.sanity_rows, 1);
    assert_eq!(second.sanity_rows, 2);
    assert!(!second.data_dir_exists);
    assert_eq!(second.db_path, config.db_path);
}
