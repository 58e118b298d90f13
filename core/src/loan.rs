//! The loan record and the fixed value domains it is drawn from.

use crate::{
    band::{FicoBand, LtvBand},
    types::LoanId,
};

pub const STATES: [&str; 11] = ["NJ", "NY", "PA", "CT", "MA", "MD", "VA", "NC", "FL", "CA", "TX"];
pub const TERMS_MONTHS: [i64; 3] = [180, 240, 360]; // 15/20/30y

pub const FICO_MIN: i64 = 560;
pub const FICO_MAX: i64 = 850;
pub const LTV_MIN: f64 = 30.0;
pub const LTV_MAX: f64 = 97.0;
pub const NOTE_RATE_MIN: f64 = 2.5;
pub const NOTE_RATE_MAX: f64 = 12.0;
pub const BALANCE_MIN: i64 = 40_000;
pub const BALANCE_MAX: i64 = 1_500_000;

/// One row of the tape.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanRecord {
    pub loan_id: LoanId,
    pub state: String,
    pub term_months: i64,
    pub fico: i64,
    pub ltv: f64,       // percent, 1 dp
    pub note_rate: f64, // percent, 3 dp
    pub orig_balance: i64,
    pub fico_band: FicoBand,
    pub ltv_band: LtvBand,
}

impl LoanRecord {
    /// Build a record, deriving both bands from the raw values.
    pub fn new(
        loan_id: LoanId,
        state: impl Into<String>,
        term_months: i64,
        fico: i64,
        ltv: f64,
        note_rate: f64,
        orig_balance: i64,
    ) -> Self {
        Self {
            loan_id,
            state: state.into(),
            term_months,
            fico,
            ltv,
            note_rate,
            orig_balance,
            fico_band: FicoBand::from_fico(fico),
            ltv_band: LtvBand::from_ltv(ltv),
        }
    }

    /// True when every numeric field sits inside its clip range.
    pub fn within_bounds(&self) -> bool {
        (FICO_MIN..=FICO_MAX).contains(&self.fico)
            && (LTV_MIN..=LTV_MAX).contains(&self.ltv)
            && (NOTE_RATE_MIN..=NOTE_RATE_MAX).contains(&self.note_rate)
            && (BALANCE_MIN..=BALANCE_MAX).contains(&self.orig_balance)
    }
}
