mod engine;
mod error;
mod tax;
mod types;

pub use engine::{
    FINAL_YEAR, MAX_SERIES_LEN, accumulate_balance, run_decumulation, run_scenario,
    tax_deferred_balance,
};
pub use error::{SimulationError, SimulationResult};
pub use tax::{
    FEDERAL_BRACKETS, TaxBracket, bracket_index, effective_tax_rate, retention_fraction, tax_owed,
};
pub use types::{
    AccumulationPlan, DISCLAIMER, Phase, ScenarioInputs, ScenarioResult, TaxDeferredSource,
    YearRow, YearlySeries,
};
