use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("invalid locomotive address '{0}'")]
    InvalidAddress(String),
    #[error("invalid function number '{0}'")]
    InvalidFunction(String),
    #[error("function number {0} out of range (F0..F9)")]
    FunctionOutOfRange(i64),
    #[error("unrecognized power state '{0}'")]
    UnrecognizedPowerState(String),
}
