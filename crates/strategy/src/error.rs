use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum StrategyError {
    #[error("extremum window order must be at least 1")]
    InvalidOrder,
    #[error("confirmation count must be at least 1")]
    InvalidConfirmationCount,
    #[error("price must be finite and positive, got {0}")]
    NonPositivePrice(f64),
    #[error("cash must be finite and non-negative, got {0}")]
    InvalidCash(f64),
}
