//! Synthetic loan generation.
//!
//! Every column is drawn from its own stream of the run's DrawBank, so
//! the tape for a given (count, seed) is fully reproducible and adding a
//! column later never shifts the values of existing ones.
//!
//! Per-value order is fixed: raw draw -> clip -> round. The note rate is
//! derived from the final (clipped, rounded) fico and ltv, then clipped
//! and rounded itself. Bands are derived last.

use crate::{
    error::{TapeError, TapeResult},
    loan::{
        LoanRecord, BALANCE_MAX, BALANCE_MIN, FICO_MAX, FICO_MIN, LTV_MAX, LTV_MIN,
        NOTE_RATE_MAX, NOTE_RATE_MIN, STATES, TERMS_MONTHS,
    },
    rng::{DrawBank, DrawSlot},
    types::Seed,
};
use rand_distr::{LogNormal, Normal};

pub const FICO_MEAN: f64 = 720.0;
pub const FICO_SD: f64 = 45.0;
pub const LTV_MEAN: f64 = 78.0;
pub const LTV_SD: f64 = 12.0;
pub const BASE_RATE_MEAN: f64 = 6.25;
pub const BASE_RATE_SD: f64 = 0.75;
pub const BALANCE_MEDIAN: f64 = 275_000.0;
pub const BALANCE_SIGMA: f64 = 0.55;

/// Rate adjustment per FICO point above 720 (higher score, lower rate).
pub const RATE_PER_FICO_POINT: f64 = 0.004;
/// Rate adjustment per LTV point above 80 (higher leverage, higher rate).
pub const RATE_PER_LTV_POINT: f64 = 0.015;

pub struct LoanGenerator {
    bank: DrawBank,
    fico: Normal<f64>,
    ltv: Normal<f64>,
    base_rate: Normal<f64>,
    balance: LogNormal<f64>,
}

impl LoanGenerator {
    pub fn new(seed: Seed) -> TapeResult<Self> {
        Ok(Self {
            bank: DrawBank::new(seed),
            fico: Normal::new(FICO_MEAN, FICO_SD)?,
            ltv: Normal::new(LTV_MEAN, LTV_SD)?,
            base_rate: Normal::new(BASE_RATE_MEAN, BASE_RATE_SD)?,
            balance: LogNormal::new(BALANCE_MEDIAN.ln(), BALANCE_SIGMA)?,
        })
    }

    /// Generate exactly `n` loans with ids 1..=n.
    pub fn generate(&self, n: usize) -> TapeResult<Vec<LoanRecord>> {
        if n == 0 {
            return Err(TapeError::InvalidLoanCount { count: n });
        }

        let mut fico_rng = self.bank.for_slot(DrawSlot::Fico);
        let mut ltv_rng = self.bank.for_slot(DrawSlot::Ltv);
        let mut rate_rng = self.bank.for_slot(DrawSlot::BaseRate);
        let mut balance_rng = self.bank.for_slot(DrawSlot::Balance);
        let mut state_rng = self.bank.for_slot(DrawSlot::State);
        let mut term_rng = self.bank.for_slot(DrawSlot::Term);

        let mut loans = Vec::with_capacity(n);
        for i in 0..n {
            let fico = fico_rng
                .sample(&self.fico)
                .clamp(FICO_MIN as f64, FICO_MAX as f64)
                .round_ties_even() as i64;
            let ltv = round_to(ltv_rng.sample(&self.ltv).clamp(LTV_MIN, LTV_MAX), 1);

            let base = rate_rng.sample(&self.base_rate);
            let note_rate = round_to(
                adjusted_rate(base, fico, ltv).clamp(NOTE_RATE_MIN, NOTE_RATE_MAX),
                3,
            );

            let orig_balance = balance_rng
                .sample(&self.balance)
                .clamp(BALANCE_MIN as f64, BALANCE_MAX as f64)
                .round_ties_even() as i64;

            let state = *state_rng.choose(&STATES);
            let term_months = *term_rng.choose(&TERMS_MONTHS);

            loans.push(LoanRecord::new(
                i as i64 + 1,
                state,
                term_months,
                fico,
                ltv,
                note_rate,
                orig_balance,
            ));
        }
        Ok(loans)
    }
}

/// Generate `n` loans from `seed`. Same inputs, same tape.
pub fn make_loans(n: usize, seed: Seed) -> TapeResult<Vec<LoanRecord>> {
    let loans = LoanGenerator::new(seed)?.generate(n)?;
    log::info!("generator: generated {} loans seed={seed}", loans.len());
    Ok(loans)
}

/// Unclipped, unrounded note rate.
pub fn adjusted_rate(base: f64, fico: i64, ltv: f64) -> f64 {
    base - (fico - 720) as f64 * RATE_PER_FICO_POINT + (ltv - 80.0) * RATE_PER_LTV_POINT
}

/// Round half-to-even at `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}
