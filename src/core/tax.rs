//! Federal income tax on tax-deferred withdrawals.
//!
//! Withdrawals are the only taxed income: there is no state tax, no standard
//! deduction and no filing status. The schedule is a fixed approximation of
//! the single-filer brackets.

use super::error::{SimulationError, SimulationResult};

/// A single bracket in a progressive schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxBracket {
    /// Income where this bracket begins (inclusive).
    pub lower_bound: f64,
    /// Marginal rate for income inside this bracket.
    pub rate: f64,
}

/// Sorted by `lower_bound` ascending; the first bracket starts at zero.
pub const FEDERAL_BRACKETS: [TaxBracket; 7] = [
    TaxBracket {
        lower_bound: 0.0,
        rate: 0.10,
    },
    TaxBracket {
        lower_bound: 11_925.0,
        rate: 0.12,
    },
    TaxBracket {
        lower_bound: 48_475.0,
        rate: 0.22,
    },
    TaxBracket {
        lower_bound: 103_350.0,
        rate: 0.24,
    },
    TaxBracket {
        lower_bound: 197_300.0,
        rate: 0.32,
    },
    TaxBracket {
        lower_bound: 250_525.0,
        rate: 0.35,
    },
    TaxBracket {
        lower_bound: 626_350.0,
        rate: 0.37,
    },
];

/// Index of the bracket containing `withdrawal`.
pub fn bracket_index(withdrawal: f64) -> SimulationResult<usize> {
    if !withdrawal.is_finite() || withdrawal < FEDERAL_BRACKETS[0].lower_bound {
        return Err(SimulationError::InvalidTaxBracketInput { withdrawal });
    }
    let above = FEDERAL_BRACKETS.partition_point(|bracket| bracket.lower_bound <= withdrawal);
    Ok(above - 1)
}

/// Tax owed on the full width of every bracket below `index`.
fn tax_below_bracket(index: usize) -> f64 {
    FEDERAL_BRACKETS
        .windows(2)
        .take(index)
        .map(|pair| (pair[1].lower_bound - pair[0].lower_bound) * pair[0].rate)
        .sum()
}

pub fn tax_owed(withdrawal: f64) -> SimulationResult<f64> {
    let index = bracket_index(withdrawal)?;
    let bracket = FEDERAL_BRACKETS[index];
    Ok(tax_below_bracket(index) + (withdrawal - bracket.lower_bound) * bracket.rate)
}

/// Average tax rate paid on `withdrawal`. A zero withdrawal reports the
/// first bracket's marginal rate, the limit of the average as it approaches zero.
pub fn effective_tax_rate(withdrawal: f64) -> SimulationResult<f64> {
    let index = bracket_index(withdrawal)?;
    if withdrawal == 0.0 {
        return Ok(FEDERAL_BRACKETS[index].rate);
    }
    Ok(tax_owed(withdrawal)? / withdrawal)
}

/// Fraction of a gross withdrawal kept after tax, always in (0, 1].
pub fn retention_fraction(withdrawal: f64) -> SimulationResult<f64> {
    Ok(1.0 - effective_tax_rate(withdrawal)?)
}
