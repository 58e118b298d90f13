//! Stage orchestration: Generator -> Writer -> Loader -> Views -> Exporter.
//!
//! Each entry point opens its own store handle and drops it before
//! returning, on success or error.

use crate::{
    config::TapeConfig,
    error::{TapeError, TapeResult},
    export::{export_rollups, ExportReport},
    generator::make_loans,
    store::{BandCountRow, RunLogEntry, StateSummaryRow, TapeStore},
    tape::{read_tape, write_tape, TapeWriteReport},
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const STATE_PREVIEW_LIMIT: usize = 5;
pub const BAND_PREVIEW_LIMIT: usize = 10;

/// Console-sized view of the rollups.
#[derive(Debug, Clone, Serialize)]
pub struct RollupPreview {
    pub wac: f64,
    pub top_states: Vec<StateSummaryRow>,
    pub top_bands: Vec<BandCountRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateSummary {
    pub seed: u64,
    pub tape: TapeWriteReport,
    pub loaded_rows: usize,
    pub preview: RollupPreview,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generate: GenerateSummary,
    pub export: ExportReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanityReport {
    pub root: PathBuf,
    pub data_dir_exists: bool,
    pub db_path: PathBuf,
    pub sanity_rows: i64,
}

fn ensure_dir(dir: &Path) -> TapeResult<()> {
    fs::create_dir_all(dir).map_err(|e| TapeError::Config {
        message: format!("cannot create directory {}: {e}", dir.display()),
    })
}

/// Open the configured store, creating its directory and applying migrations.
pub fn open_store(config: &TapeConfig) -> TapeResult<TapeStore> {
    if let Some(dir) = config.db_dir() {
        ensure_dir(dir)?;
    }
    let store = TapeStore::open(&config.db_path).map_err(|e| TapeError::Config {
        message: format!("cannot open store {}: {e}", config.db_path.display()),
    })?;
    store.migrate()?;
    Ok(store)
}

/// (Re)create loan_tape from the Parquet file at `tape_path`.
pub fn load_tape(store: &TapeStore, tape_path: &Path) -> TapeResult<usize> {
    let loans = read_tape(tape_path)?;
    store.replace_loan_tape(&loans)
}

/// WAC plus the top states and band pairs.
pub fn preview(store: &TapeStore) -> TapeResult<RollupPreview> {
    Ok(RollupPreview {
        wac: store.weighted_average_coupon()?,
        top_states: store.state_summary(Some(STATE_PREVIEW_LIMIT))?,
        top_bands: store.band_distribution(Some(BAND_PREVIEW_LIMIT))?,
    })
}

/// Generate the tape, write it, load it and preview the rollups.
pub fn generate(config: &TapeConfig) -> TapeResult<GenerateSummary> {
    ensure_dir(&config.data_dir)?;
    let started_at = chrono::Utc::now().to_rfc3339();

    let loans = make_loans(config.loan_count, config.seed)?;
    let tape = write_tape(&config.tape_path(), &loans)?;

    let store = open_store(config)?;
    let loaded_rows = load_tape(&store, &tape.path)?;
    store.insert_run(&RunLogEntry {
        started_at,
        seed: config.seed,
        loan_count: loaded_rows as i64,
        tape_path: tape.path.display().to_string(),
    })?;

    Ok(GenerateSummary {
        seed: config.seed,
        tape,
        loaded_rows,
        preview: preview(&store)?,
    })
}

/// Reload loan_tape from the existing tape file.
pub fn load(config: &TapeConfig) -> TapeResult<usize> {
    let store = open_store(config)?;
    load_tape(&store, &config.tape_path())
}

/// Export the rollups of whatever loan_tape currently holds.
pub fn export(config: &TapeConfig) -> TapeResult<ExportReport> {
    let store = open_store(config)?;
    export_rollups(&store, &config.data_dir)
}

/// Full run: generate, load, export.
pub fn run(config: &TapeConfig) -> TapeResult<RunSummary> {
    let generate = generate(config)?;
    let export = export(config)?;
    Ok(RunSummary { generate, export })
}

/// Environment check: store writable, data dir present.
pub fn sanity_check(config: &TapeConfig) -> TapeResult<SanityReport> {
    let store = open_store(config)?;
    let sanity_rows = store.record_sanity_check(
        &chrono::Utc::now().to_rfc3339(),
        env!("CARGO_PKG_VERSION"),
    )?;
    Ok(SanityReport {
        root: config.root.clone(),
        data_dir_exists: config.data_dir.exists(),
        db_path: config.db_path.clone(),
        sanity_rows,
    })
}
