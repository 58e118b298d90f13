//! Parquet persistence for the loan tape.
//!
//! The tape is written to `<path>.tmp` first and renamed over the target
//! only once the Parquet footer is closed, so a failed write never
//! replaces the previous good file.

use crate::{
    error::{TapeError, TapeResult},
    loan::LoanRecord,
};
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct TapeWriteReport {
    pub path: PathBuf,
    pub rows: usize,
    pub bytes: u64,
}

/// Column layout of the tape, in file order.
pub fn tape_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("loan_id", DataType::Int64, false),
        Field::new("state", DataType::Utf8, false),
        Field::new("term_months", DataType::Int64, false),
        Field::new("fico", DataType::Int64, false),
        Field::new("ltv", DataType::Float64, false),
        Field::new("note_rate", DataType::Float64, false),
        Field::new("orig_balance", DataType::Int64, false),
        Field::new("fico_band", DataType::Utf8, false),
        Field::new("ltv_band", DataType::Utf8, false),
    ]))
}

/// Convert loans to a single record batch, preserving row order.
pub fn to_record_batch(loans: &[LoanRecord]) -> TapeResult<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(loans.iter().map(|l| l.loan_id))),
        Arc::new(StringArray::from_iter_values(loans.iter().map(|l| l.state.as_str()))),
        Arc::new(Int64Array::from_iter_values(loans.iter().map(|l| l.term_months))),
        Arc::new(Int64Array::from_iter_values(loans.iter().map(|l| l.fico))),
        Arc::new(Float64Array::from_iter_values(loans.iter().map(|l| l.ltv))),
        Arc::new(Float64Array::from_iter_values(loans.iter().map(|l| l.note_rate))),
        Arc::new(Int64Array::from_iter_values(loans.iter().map(|l| l.orig_balance))),
        Arc::new(StringArray::from_iter_values(loans.iter().map(|l| l.fico_band.as_str()))),
        Arc::new(StringArray::from_iter_values(loans.iter().map(|l| l.ltv_band.as_str()))),
    ];
    Ok(RecordBatch::try_new(tape_schema(), columns)?)
}

/// Write the tape to `path`, creating parent directories and
/// overwriting any existing file.
pub fn write_tape(path: &Path, loans: &[LoanRecord]) -> TapeResult<TapeWriteReport> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let batch = to_record_batch(loans)?;
    let temp_path = path.with_extension("tmp");

    if let Err(e) = write_batch(&temp_path, &batch) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    fs::rename(&temp_path, path)?;

    let bytes = fs::metadata(path)?.len();
    log::info!("tape: wrote {} rows ({bytes} bytes) -> {}", loans.len(), path.display());
    Ok(TapeWriteReport {
        path: path.to_path_buf(),
        rows: loans.len(),
        bytes,
    })
}

fn write_batch(path: &Path, batch: &RecordBatch) -> TapeResult<()> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_dictionary_enabled(true)
        .build();
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

/// Read every row of the tape at `path`, in file order.
pub fn read_tape(path: &Path) -> TapeResult<Vec<LoanRecord>> {
    if !path.exists() {
        return Err(TapeError::MissingInput {
            what: format!("loan tape {} (run `generate` first)", path.display()),
        });
    }

    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?.build()?;
    let mut loans = Vec::new();
    for batch in reader {
        append_batch(&batch?, &mut loans)?;
    }
    log::debug!("tape: read {} rows <- {}", loans.len(), path.display());
    Ok(loans)
}

fn append_batch(batch: &RecordBatch, loans: &mut Vec<LoanRecord>) -> TapeResult<()> {
    let loan_id = int_column(batch, "loan_id")?;
    let state = str_column(batch, "state")?;
    let term_months = int_column(batch, "term_months")?;
    let fico = int_column(batch, "fico")?;
    let ltv = float_column(batch, "ltv")?;
    let note_rate = float_column(batch, "note_rate")?;
    let orig_balance = int_column(batch, "orig_balance")?;
    let fico_band = str_column(batch, "fico_band")?;
    let ltv_band = str_column(batch, "ltv_band")?;

    loans.reserve(batch.num_rows());
    for i in 0..batch.num_rows() {
        loans.push(LoanRecord {
            loan_id: loan_id.value(i),
            state: state.value(i).to_string(),
            term_months: term_months.value(i),
            fico: fico.value(i),
            ltv: ltv.value(i),
            note_rate: note_rate.value(i),
            orig_balance: orig_balance.value(i),
            fico_band: fico_band.value(i).parse()?,
            ltv_band: ltv_band.value(i).parse()?,
        });
    }
    Ok(())
}

fn column<'a, T: Array + 'static>(
    batch: &'a RecordBatch,
    name: &str,
    expected: &str,
) -> TapeResult<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .filter(|c| c.null_count() == 0)
        .ok_or_else(|| TapeError::SchemaMismatch {
            column: name.to_string(),
            expected: expected.to_string(),
        })
}

fn int_column<'a>(batch: &'a RecordBatch, name: &str) -> TapeResult<&'a Int64Array> {
    column(batch, name, "non-null Int64")
}

fn float_column<'a>(batch: &'a RecordBatch, name: &str) -> TapeResult<&'a Float64Array> {
    column(batch, name, "non-null Float64")
}

fn str_column<'a>(batch: &'a RecordBatch, name: &str) -> TapeResult<&'a StringArray> {
    column(batch, name, "non-null Utf8")
}
