//! Shared primitive types used across the whole pipeline.

/// Sequential loan identifier, 1..=N.
pub type LoanId = i64;

/// Master seed for a generation run.
pub type Seed = u64;

pub const DEFAULT_SEED: Seed = 42;
pub const DEFAULT_LOAN_COUNT: usize = 50_000;

/// Name of the loan table in the analytical store.
pub const LOAN_TABLE: &str = "loan_tape";
