use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("candle {time:?} is missing required field `{field}`")]
    MissingField { time: String, field: &'static str },
    #[error("candle {time:?} is invalid: {reason}")]
    InvalidInput { time: String, reason: String },
    #[error("candle payload is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("rsi period must be at least 1")]
    InvalidPeriod,
}
