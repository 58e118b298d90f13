//! Loan generation: determinism, clip bounds, banding, id layout.

use loantape_core::{
    band::{FicoBand, LtvBand},
    error::TapeError,
    generator::make_loans,
    loan::{STATES, TERMS_MONTHS},
};
use std::collections::HashSet;

#[test]
fn same_seed_produces_identical_tapes() {
    let a = make_loans(2_000, 42).unwrap();
    let b = make_loans(2_000, 42).unwrap();

    assert_eq!(a.len(), b.len());
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        assert_eq!(x, y, "Tapes diverged at row {i}");
        assert_eq!(x.ltv.to_bits(), y.ltv.to_bits());
        assert_eq!(x.note_rate.to_bits(), y.note_rate.to_bits());
    }
}

#[test]
fn different_seeds_produce_different_tapes() {
    let a = make_loans(500, 42).unwrap();
    let b = make_loans(500, 99).unwrap();
    assert_ne!(a, b, "Different seeds produced identical tapes: seed is not being used");
}

#[test]
fn count_is_exact_and_ids_are_contiguous() {
    let loans = make_loans(1_234, 3).unwrap();
    assert_eq!(loans.len(), 1_234);
    for (i, loan) in loans.iter().enumerate() {
        assert_eq!(loan.loan_id, i as i64 + 1, "loan_id out of sequence at row {i}");
    }
}

#[test]
fn every_value_sits_inside_its_clip_bounds() {
    let loans = make_loans(20_000, 42).unwrap();
    for loan in &loans {
        assert!((560..=850).contains(&loan.fico), "fico {} out of range", loan.fico);
        assert!((30.0..=97.0).contains(&loan.ltv), "ltv {} out of range", loan.ltv);
        assert!(
            (2.5..=12.0).contains(&loan.note_rate),
            "note_rate {} out of range",
            loan.note_rate
        );
        assert!(
            (40_000..=1_500_000).contains(&loan.orig_balance),
            "orig_balance {} out of range",
            loan.orig_balance
        );
        assert!(loan.within_bounds());
    }
}

#[test]
fn decimals_keep_their_precision() {
    for loan in make_loans(5_000, 8).unwrap() {
        let ltv_tenths = loan.ltv * 10.0;
        assert!(
            (ltv_tenths - ltv_tenths.round()).abs() < 1e-6,
            "ltv {} has more than 1 decimal",
            loan.ltv
        );
        let rate_thousandths = loan.note_rate * 1_000.0;
        assert!(
            (rate_thousandths - rate_thousandths.round()).abs() < 1e-6,
            "note_rate {} has more than 3 decimals",
            loan.note_rate
        );
    }
}

#[test]
fn bands_match_independent_recomputation() {
    for loan in make_loans(10_000, 5).unwrap() {
        assert_eq!(loan.fico_band, FicoBand::from_fico(loan.fico), "fico {}", loan.fico);
        assert_eq!(loan.ltv_band, LtvBand::from_ltv(loan.ltv), "ltv {}", loan.ltv);
    }
}

#[test]
fn categorical_columns_draw_from_fixed_domains() {
    let loans = make_loans(20_000, 42).unwrap();

    let states: HashSet<&str> = loans.iter().map(|l| l.state.as_str()).collect();
    assert!(states.iter().all(|s| STATES.contains(s)));
    assert_eq!(states.len(), STATES.len(), "Expected every state to appear in 20k loans");

    let terms: HashSet<i64> = loans.iter().map(|l| l.term_months).collect();
    assert!(terms.iter().all(|t| TERMS_MONTHS.contains(t)));
    assert_eq!(terms.len(), 3);
}

#[test]
fn distributions_have_the_expected_shape() {
    let loans = make_loans(20_000, 42).unwrap();
    let n = loans.len() as f64;

    let mean_fico = loans.iter().map(|l| l.fico as f64).sum::<f64>() / n;
    assert!((mean_fico - 720.0).abs() < 3.0, "mean fico {mean_fico:.1}");

    // Clipping at 97 pulls the mean slightly below 78.
    let mean_ltv = loans.iter().map(|l| l.ltv).sum::<f64>() / n;
    assert!((mean_ltv - 78.0).abs() < 1.0, "mean ltv {mean_ltv:.2}");

    let mut balances: Vec<i64> = loans.iter().map(|l| l.orig_balance).collect();
    balances.sort_unstable();
    let median = balances[balances.len() / 2];
    assert!(
        (255_000..=295_000).contains(&median),
        "median balance {median} should sit near 275,000"
    );

    // Better credit should price lower on average.
    let avg_rate = |band: FicoBand| {
        let rates: Vec<f64> = loans
            .iter()
            .filter(|l| l.fico_band == band)
            .map(|l| l.note_rate)
            .collect();
        rates.iter().sum::<f64>() / rates.len() as f64
    };
    assert!(avg_rate(FicoBand::SuperPrime) < avg_rate(FicoBand::Subprime));
}

#[test]
fn zero_loans_is_rejected() {
    let err = make_loans(0, 42).unwrap_err();
    assert!(
        matches!(err, TapeError::InvalidLoanCount { count: 0 }),
        "Expected InvalidLoanCount, got {err:?}"
    );
}
