//! CSV export of the rollup views.
//!
//! Preconditions are checked before any file is touched: exporting from
//! a missing or empty loan_tape fails with MissingInput and leaves the
//! output directory as it was.

use crate::{
    config::{BAND_DISTRIBUTION_FILE, STATE_SUMMARY_FILE},
    error::{TapeError, TapeResult},
    store::TapeStore,
    types::LOAN_TABLE,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct ExportedFile {
    pub view: &'static str,
    pub path: PathBuf,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub state_summary: ExportedFile,
    pub band_distribution: ExportedFile,
}

/// Write the full state summary and band distribution to `out_dir`.
pub fn export_rollups(store: &TapeStore, out_dir: &Path) -> TapeResult<ExportReport> {
    let loans = store.loan_count()?;
    if loans == 0 {
        return Err(TapeError::MissingInput {
            what: format!("table {LOAN_TABLE} is empty; nothing to export"),
        });
    }

    let states = store.state_summary(None)?;
    let bands = store.band_distribution(None)?;

    fs::create_dir_all(out_dir)?;
    let state_path = out_dir.join(STATE_SUMMARY_FILE);
    let band_path = out_dir.join(BAND_DISTRIBUTION_FILE);

    // Stage both, then rename both. A failed write leaves the prior pair as it was.
    let state_temp = stage_csv(&state_path, &states)?;
    let band_temp = match stage_csv(&band_path, &bands) {
        Ok(temp) => temp,
        Err(e) => {
            let _ = fs::remove_file(&state_temp);
            return Err(e);
        }
    };
    fs::rename(&state_temp, &state_path)?;
    fs::rename(&band_temp, &band_path)?;

    let state_summary = exported("v_state_summary", state_path, states.len());
    let band_distribution = exported("v_fico_ltv_bands", band_path, bands.len());
    Ok(ExportReport {
        state_summary,
        band_distribution,
    })
}

/// Serialize `rows` with a header row (the row type's field order) to a
/// temp file next to `path`, returning the temp file's path.
fn stage_csv<T: Serialize>(path: &Path, rows: &[T]) -> TapeResult<PathBuf> {
    let temp_path = path.with_extension("tmp");
    if let Err(e) = write_rows(&temp_path, rows) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    Ok(temp_path)
}

fn exported(view: &'static str, path: PathBuf, rows: usize) -> ExportedFile {
    log::info!("export: {view} -> {} ({rows} rows)", path.display());
    ExportedFile { view, path, rows }
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> TapeResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
