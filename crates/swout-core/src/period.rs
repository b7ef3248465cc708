//! Output periods and aggregation policies.
//!
//! Mirrors the DY/WK/MO/YR and OFF/SUM/AVG/FIN keywords of the output
//! setup file. Periods are ordered from finest to coarsest.

use std::fmt;

use crate::constants::N_PERIODS;
use crate::error::OutputError;

/// Temporal granularity of an output row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutPeriod {
    Day,
    Week,
    Month,
    Year,
}

impl OutPeriod {
    /// All periods in order.
    pub const ALL: [OutPeriod; N_PERIODS] = [
        OutPeriod::Day,
        OutPeriod::Week,
        OutPeriod::Month,
        OutPeriod::Year,
    ];

    /// Position in per-period tables.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Setup file keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            OutPeriod::Day => "DY",
            OutPeriod::Week => "WK",
            OutPeriod::Month => "MO",
            OutPeriod::Year => "YR",
        }
    }

    /// Column header of the period sub-unit.
    pub fn long_name(self) -> &'static str {
        match self {
            OutPeriod::Day => "Day",
            OutPeriod::Week => "Week",
            OutPeriod::Month => "Month",
            OutPeriod::Year => "Year",
        }
    }

    /// Number of leading time columns (year, plus the sub-unit if any).
    pub fn n_time_cols(self) -> usize {
        match self {
            OutPeriod::Year => 1,
            _ => 2,
        }
    }

    /// Parse a period keyword, case-insensitive.
    pub fn parse(s: &str) -> Result<Self, OutputError> {
        OutPeriod::ALL
            .into_iter()
            .find(|p| p.keyword().eq_ignore_ascii_case(s))
            .ok_or_else(|| OutputError::UnknownPeriod(s.to_string()))
    }
}

impl fmt::Display for OutPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Aggregation policy turning a period's daily values into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutSum {
    #[default]
    Off,
    Sum,
    Average,
    /// Value of the last day of the period.
    FinalValue,
}

impl OutSum {
    pub const ALL: [OutSum; 4] = [OutSum::Off, OutSum::Sum, OutSum::Average, OutSum::FinalValue];

    /// Setup file keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            OutSum::Off => "OFF",
            OutSum::Sum => "SUM",
            OutSum::Average => "AVG",
            OutSum::FinalValue => "FIN",
        }
    }

    /// Parse a summary type keyword, case-insensitive.
    pub fn parse(s: &str) -> Result<Self, OutputError> {
        OutSum::ALL
            .into_iter()
            .find(|t| t.keyword().eq_ignore_ascii_case(s))
            .ok_or_else(|| OutputError::UnknownPolicy(s.to_string()))
    }
}

impl fmt::Display for OutSum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
