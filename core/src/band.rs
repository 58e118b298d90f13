//! FICO and LTV banding.
//!
//! Both ladders are defined once, as threshold tables. The Rust
//! classifiers and the SQL `CASE` expressions used to recheck stored
//! bands inside the store are generated from the same table, so the
//! two call sites cannot drift apart.

use crate::error::TapeError;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FicoBand {
    Subprime,
    NearPrime,
    Prime,
    SuperPrime,
}

/// Upper bounds are exclusive: a score equal to the bound falls in the next band.
const FICO_LADDER: [(i64, FicoBand); 3] = [
    (660, FicoBand::Subprime),
    (720, FicoBand::NearPrime),
    (780, FicoBand::Prime),
];

impl FicoBand {
    pub const ALL: [FicoBand; 4] = [
        FicoBand::Subprime,
        FicoBand::NearPrime,
        FicoBand::Prime,
        FicoBand::SuperPrime,
    ];

    pub fn from_fico(fico: i64) -> Self {
        FICO_LADDER
            .iter()
            .find(|(upper, _)| fico < *upper)
            .map(|(_, band)| *band)
            .unwrap_or(FicoBand::SuperPrime)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subprime => "subprime",
            Self::NearPrime => "near_prime",
            Self::Prime => "prime",
            Self::SuperPrime => "super_prime",
        }
    }

    /// SQL expression computing the band from `column`.
    pub fn sql_case(column: &str) -> String {
        let mut sql = String::from("CASE");
        for (upper, band) in FICO_LADDER {
            sql.push_str(&format!(" WHEN {column} < {upper} THEN '{}'", band.as_str()));
        }
        sql.push_str(&format!(" ELSE '{}' END", FicoBand::SuperPrime.as_str()));
        sql
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LtvBand {
    UpTo60,
    From60To80,
    From80To90,
    Over90,
}

/// Upper bounds are inclusive: 60.0 is `<=60`, 80.0 is `60-80`, 90.0 is `80-90`.
const LTV_LADDER: [(f64, LtvBand); 3] = [
    (60.0, LtvBand::UpTo60),
    (80.0, LtvBand::From60To80),
    (90.0, LtvBand::From80To90),
];

impl LtvBand {
    pub const ALL: [LtvBand; 4] = [
        LtvBand::UpTo60,
        LtvBand::From60To80,
        LtvBand::From80To90,
        LtvBand::Over90,
    ];

    pub fn from_ltv(ltv: f64) -> Self {
        LTV_LADDER
            .iter()
            .find(|(upper, _)| ltv <= *upper)
            .map(|(_, band)| *band)
            .unwrap_or(LtvBand::Over90)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpTo60 => "<=60",
            Self::From60To80 => "60-80",
            Self::From80To90 => "80-90",
            Self::Over90 => "90+",
        }
    }

    /// SQL expression computing the band from `column`.
    pub fn sql_case(column: &str) -> String {
        let mut sql = String::from("CASE");
        for (upper, band) in LTV_LADDER {
            sql.push_str(&format!(" WHEN {column} <= {upper:.1} THEN '{}'", band.as_str()));
        }
        sql.push_str(&format!(" ELSE '{}' END", LtvBand::Over90.as_str()));
        sql
    }
}

impl fmt::Display for FicoBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LtvBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FicoBand {
    type Err = TapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FicoBand::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| TapeError::InvalidBand {
                column: "fico_band".into(),
                value: s.to_string(),
            })
    }
}

impl FromStr for LtvBand {
    type Err = TapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LtvBand::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| TapeError::InvalidBand {
                column: "ltv_band".into(),
                value: s.to_string(),
            })
    }
}
