use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SimulationError {
    #[error("withdrawal {withdrawal} is outside every federal tax bracket")]
    InvalidTaxBracketInput { withdrawal: f64 },
}

pub type SimulationResult<T> = Result<T, SimulationError>;
