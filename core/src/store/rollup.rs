use super::TapeStore;
use crate::{
    band::{FicoBand, LtvBand},
    error::{TapeError, TapeResult},
};
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// One row of `v_state_summary`. Field order is the export column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSummaryRow {
    pub state: String,
    pub loan_count: i64,
    pub total_balance: i64,
}

/// One row of `v_fico_ltv_bands`. Field order is the export column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandCountRow {
    pub fico_band: String,
    pub ltv_band: String,
    pub loan_count: i64,
}

/// SQLite treats a negative LIMIT as "no limit".
fn sql_limit(limit: Option<usize>) -> i64 {
    limit.map(|n| n as i64).unwrap_or(-1)
}

impl TapeStore {
    // ── Rollups ────────────────────────────────────────────────

    /// Balance-weighted mean note rate over the whole tape.
    /// NoData when the table is empty instead of a NaN.
    pub fn weighted_average_coupon(&self) -> TapeResult<f64> {
        self.require_loan_tape()?;
        let wac: Option<f64> = self
            .conn
            .query_row("SELECT wac FROM v_wac", [], |row| row.get(0))?;
        match wac {
            Some(v) if v.is_finite() => Ok(v),
            _ => Err(TapeError::NoData {
                what: "weighted average coupon of an empty loan_tape".into(),
            }),
        }
    }

    /// Loans and balance per state, largest balance first.
    /// `None` returns every state.
    pub fn state_summary(&self, limit: Option<usize>) -> TapeResult<Vec<StateSummaryRow>> {
        self.require_loan_tape()?;
        let mut stmt = self.conn.prepare(
            "SELECT state, loan_count, total_balance
             FROM v_state_summary
             ORDER BY total_balance DESC, state ASC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![sql_limit(limit)], |row| {
                Ok(StateSummaryRow {
                    state: row.get(0)?,
                    loan_count: row.get(1)?,
                    total_balance: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Loan count per (fico_band, ltv_band), most common first.
    /// `None` returns every pair present.
    pub fn band_distribution(&self, limit: Option<usize>) -> TapeResult<Vec<BandCountRow>> {
        self.require_loan_tape()?;
        let mut stmt = self.conn.prepare(
            "SELECT fico_band, ltv_band, loan_count
             FROM v_fico_ltv_bands
             ORDER BY loan_count DESC, fico_band ASC, ltv_band ASC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![sql_limit(limit)], |row| {
                Ok(BandCountRow {
                    fico_band: row.get(0)?,
                    ltv_band: row.get(1)?,
                    loan_count: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Rows whose stored bands disagree with bands recomputed in SQL
    /// from the raw fico/ltv columns. Zero on a consistent tape.
    pub fn band_mismatch_count(&self) -> TapeResult<i64> {
        self.require_loan_tape()?;
        let sql = format!(
            "SELECT COUNT(*) FROM loan_tape
             WHERE fico_band <> ({})
                OR ltv_band <> ({})",
            FicoBand::sql_case("fico"),
            LtvBand::sql_case("ltv"),
        );
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }
}
