use serde::Serialize;

pub const DISCLAIMER: &str = "Note: This simulator assumes zero state tax. Federal taxes are calculated based on marginal brackets and only apply to 401k withdrawals. Other assets are assumed to be tax-free.";

/// Contribution schedule used to grow the 401k balance before retirement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccumulationPlan {
    /// Growth factor per year, e.g. 1.06 for 6%.
    pub return_factor: f64,
    pub contribution_years: u32,
    pub annual_contribution: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaxDeferredSource {
    Accumulate(AccumulationPlan),
    Manual(f64),
}

#[derive(Debug, Clone)]
pub struct ScenarioInputs {
    pub tax_deferred: TaxDeferredSource,
    pub other_assets: f64,
    /// Annual spending in today's money.
    pub annual_spending: f64,
    /// Share of spending funded from the tax-deferred account, 0..=1.
    pub tax_deferred_portion: f64,
    pub retirement_return: f64,
    pub inflation: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Tax-deferred and other assets both funding spending.
    Combined,
    /// Tax-deferred account exhausted.
    OtherOnly,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRow {
    pub year: u32,
    pub phase: Phase,
    pub total_assets: f64,
    pub tax_rate: Option<f64>,
    pub spending: f64,
}

/// Parallel per-year sequences. Position `i` is retirement year `i + 1`.
#[derive(Debug, Clone, Default)]
pub struct YearlySeries {
    total_assets: Vec<f64>,
    tax_rate: Vec<Option<f64>>,
    spending: Vec<f64>,
    phase_a_years: usize,
}

impl YearlySeries {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            total_assets: Vec::with_capacity(capacity),
            tax_rate: Vec::with_capacity(capacity),
            spending: Vec::with_capacity(capacity),
            phase_a_years: 0,
        }
    }

    pub(crate) fn push_combined(&mut self, total: f64, tax_rate: f64, spending: f64) {
        self.total_assets.push(total);
        self.tax_rate.push(Some(tax_rate));
        self.spending.push(spending);
        self.phase_a_years += 1;
    }

    pub(crate) fn push_other_only(&mut self, total: f64, spending: f64) {
        self.total_assets.push(total);
        self.tax_rate.push(None);
        self.spending.push(spending);
    }

    pub(crate) fn set_last_total(&mut self, total: f64) {
        if let Some(last) = self.total_assets.last_mut() {
            *last = total;
        }
    }

    pub fn len(&self) -> usize {
        self.total_assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_assets.is_empty()
    }

    pub fn total_assets(&self) -> &[f64] {
        &self.total_assets
    }

    pub fn tax_rate(&self) -> &[Option<f64>] {
        &self.tax_rate
    }

    pub fn spending(&self) -> &[f64] {
        &self.spending
    }

    /// Number of leading rows simulated while the tax-deferred account still had funds.
    pub fn phase_a_years(&self) -> usize {
        self.phase_a_years
    }

    /// Tax rates recorded during the combined phase, in year order.
    pub fn recorded_tax_rates(&self) -> Vec<f64> {
        self.tax_rate.iter().filter_map(|rate| *rate).collect()
    }

    pub fn rows(&self) -> Vec<YearRow> {
        (0..self.len())
            .map(|idx| YearRow {
                year: idx as u32 + 1,
                phase: if idx < self.phase_a_years {
                    Phase::Combined
                } else {
                    Phase::OtherOnly
                },
                total_assets: self.total_assets[idx],
                tax_rate: self.tax_rate[idx],
                spending: self.spending[idx],
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub tax_deferred_at_retirement: f64,
    pub series: YearlySeries,
}
