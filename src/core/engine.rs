use tracing::debug;

use super::error::SimulationResult;
use super::tax::retention_fraction;
use super::types::{ScenarioInputs, ScenarioResult, TaxDeferredSource, YearlySeries};

/// Last simulated year of each phase.
pub const FINAL_YEAR: u32 = 50;

/// Upper bound on the number of rows a single run can record.
pub const MAX_SERIES_LEN: usize = 2 * FINAL_YEAR as usize;

/// Future value of `years` contributions, each added before that year's growth.
pub fn accumulate_balance(return_factor: f64, years: u32, annual_contribution: f64) -> f64 {
    (0..years).fold(0.0, |balance, _| {
        (balance + annual_contribution) * return_factor
    })
}

pub fn tax_deferred_balance(source: TaxDeferredSource) -> f64 {
    match source {
        TaxDeferredSource::Accumulate(plan) => accumulate_balance(
            plan.return_factor,
            plan.contribution_years,
            plan.annual_contribution,
        ),
        TaxDeferredSource::Manual(balance) => balance,
    }
}

fn nominal_spending(inputs: &ScenarioInputs, year: u32) -> f64 {
    inputs.annual_spending * inputs.inflation.powi(year as i32)
}

pub fn run_decumulation(
    inputs: &ScenarioInputs,
    tax_deferred_start: f64,
) -> SimulationResult<YearlySeries> {
    let mut series = YearlySeries::with_capacity(MAX_SERIES_LEN);
    let mut other = inputs.other_assets;
    let mut tax_deferred = tax_deferred_start;
    let mut total = other + tax_deferred;
    let mut year = 1;
    let mut exhausted = false;

    while year <= FINAL_YEAR {
        let spending = nominal_spending(inputs, year);
        let draw = spending * inputs.tax_deferred_portion;
        let retention = retention_fraction(draw)?;

        other = other * inputs.retirement_return - spending * (1.0 - inputs.tax_deferred_portion);
        tax_deferred = tax_deferred * inputs.retirement_return - draw / retention;
        total = other + tax_deferred;
        series.push_combined(total, 1.0 - retention, spending);

        if tax_deferred <= 0.0 {
            // The gross-up already counted the overdrawn part at the full
            // pre-tax amount; only its tax share stays as a loss.
            total -= retention * tax_deferred;
            series.set_last_total(total);
            exhausted = true;
        }
        if total <= 0.0 || total.is_nan() {
            debug!(year, total, "assets depleted while drawing from the 401k");
            return Ok(series);
        }
        if exhausted {
            break;
        }
        year += 1;
    }

    if exhausted {
        debug!(year, tax_deferred, "401k exhausted; continuing on other assets");
        // The exhaustion year is simulated again on other assets alone.
        while year <= FINAL_YEAR {
            let spending = nominal_spending(inputs, year);
            total = total * inputs.retirement_return - spending;
            series.push_other_only(total, spending);
            if total <= 0.0 || total.is_nan() {
                break;
            }
            year += 1;
        }
    }

    Ok(series)
}

pub fn run_scenario(inputs: &ScenarioInputs) -> SimulationResult<ScenarioResult> {
    let tax_deferred_at_retirement = tax_deferred_balance(inputs.tax_deferred);
    let series = run_decumulation(inputs, tax_deferred_at_retirement)?;
    debug!(
        tax_deferred_at_retirement,
        years = series.len(),
        phase_a_years = series.phase_a_years(),
        "scenario simulated"
    );
    Ok(ScenarioResult {
        tax_deferred_at_retirement,
        series,
    })
}
