//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database.
//! Pipeline stages call store methods; they never execute SQL directly.

use crate::{
    error::{TapeError, TapeResult},
    loan::LoanRecord,
    types::LOAN_TABLE,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

mod rollup;

pub use rollup::{BandCountRow, StateSummaryRow};

pub struct TapeStore {
    conn: Connection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunLogEntry {
    pub started_at: String,
    pub seed: u64,
    pub loan_count: i64,
    pub tape_path: String,
}

impl TapeStore {
    /// Open (or create) the store file at `path`.
    pub fn open(path: &Path) -> TapeResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only for real files; ignore failures on exotic filesystems.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> TapeResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> TapeResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_sanity_check.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_run_log.sql"))?;
        Ok(())
    }

    pub fn table_exists(&self, name: &str) -> TapeResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    // ── Loan tape ──────────────────────────────────────────────

    /// Drop and recreate `loan_tape` (and its views) from `loans`.
    /// One transaction: either the new table is complete or the old one stays.
    pub fn replace_loan_tape(&self, loans: &[LoanRecord]) -> TapeResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(include_str!("../../../sql/loan_tape.sql"))?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO loan_tape (
                    loan_id, state, term_months, fico, ltv,
                    note_rate, orig_balance, fico_band, ltv_band
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for loan in loans {
                stmt.execute(params![
                    loan.loan_id,
                    loan.state,
                    loan.term_months,
                    loan.fico,
                    loan.ltv,
                    loan.note_rate,
                    loan.orig_balance,
                    loan.fico_band.as_str(),
                    loan.ltv_band.as_str(),
                ])?;
            }
        }
        tx.execute_batch(include_str!("../../../sql/rollup_views.sql"))?;
        tx.commit()?;
        log::info!("store: replaced {LOAN_TABLE} with {} rows", loans.len());
        Ok(loans.len())
    }

    /// Row count of `loan_tape`; MissingInput if it was never loaded.
    pub fn loan_count(&self) -> TapeResult<i64> {
        self.require_loan_tape()?;
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM loan_tape", [], |row| row.get(0))?)
    }

    /// Every loan in `loan_id` order.
    pub fn all_loans(&self) -> TapeResult<Vec<LoanRecord>> {
        self.require_loan_tape()?;
        let mut stmt = self.conn.prepare(
            "SELECT loan_id, state, term_months, fico, ltv,
                    note_rate, orig_balance, fico_band, ltv_band
             FROM loan_tape ORDER BY loan_id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    LoanRecord::new(
                        row.get(0)?,
                        row.get::<_, String>(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                    ),
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(mut loan, fico_band, ltv_band)| -> TapeResult<LoanRecord> {
                loan.fico_band = fico_band.parse()?;
                loan.ltv_band = ltv_band.parse()?;
                Ok(loan)
            })
            .collect()
    }

    fn require_loan_tape(&self) -> TapeResult<()> {
        if self.table_exists(LOAN_TABLE)? {
            Ok(())
        } else {
            Err(TapeError::MissingInput {
                what: format!("table {LOAN_TABLE} is not loaded (run `load` first)"),
            })
        }
    }

    // ── Diagnostics ────────────────────────────────────────────

    /// Insert one sanity_check row and return the table's row count.
    pub fn record_sanity_check(&self, checked_at: &str, version: &str) -> TapeResult<i64> {
        self.conn.execute(
            "INSERT INTO sanity_check (checked_at, version) VALUES (?1, ?2)",
            params![checked_at, version],
        )?;
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM sanity_check", [], |row| row.get(0))?)
    }

    pub fn insert_run(&self, entry: &RunLogEntry) -> TapeResult<()> {
        self.conn.execute(
            "INSERT INTO run_log (started_at, seed, loan_count, tape_path)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.started_at,
                entry.seed as i64,
                entry.loan_count,
                entry.tape_path,
            ],
        )?;
        Ok(())
    }

    pub fn last_run(&self) -> TapeResult<Option<RunLogEntry>> {
        Ok(self
            .conn
            .query_row(
                "SELECT started_at, seed, loan_count, tape_path
                 FROM run_log ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok(RunLogEntry {
                        started_at: row.get(0)?,
                        seed: row.get::<_, i64>(1)? as u64,
                        loan_count: row.get(2)?,
                        tape_path: row.get(3)?,
                    })
                },
            )
            .optional()?)
    }
}
