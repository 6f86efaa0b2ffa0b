use std::collections::HashMap;

use series::{Candle, SeriesError};
use thiserror::Error;
use time::{Date, Weekday};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("{0} is not a trading day")]
    NotTradingDay(Date),
    #[error("no candles found for {0}")]
    NoData(String),
    #[error("market data source failed: {0}")]
    Upstream(String),
    #[error(transparent)]
    InvalidInput(#[from] SeriesError),
}

/// Supplies the RSI-annotated candles of one symbol for one trading day.
pub trait CandleSource: Send + Sync + 'static {
    fn fetch(&self, symbol: &str, day: Date) -> Result<Vec<Candle>, SourceError>;
}

pub fn is_trading_day(day: Date) -> bool {
    !matches!(day.weekday(), Weekday::Saturday | Weekday::Sunday)
}

pub fn ensure_trading_day(day: Date) -> Result<(), SourceError> {
    if is_trading_day(day) {
        Ok(())
    } else {
        Err(SourceError::NotTradingDay(day))
    }
}

/// In-memory source keyed by upper-cased symbol. The same series is served
/// for every trading day.
#[derive(Debug, Default, Clone)]
pub struct StaticCandleSource {
    series: HashMap<String, Vec<Candle>>,
}

impl StaticCandleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.series.insert(symbol.to_uppercase(), candles);
        self
    }
}

impl CandleSource for StaticCandleSource {
    fn fetch(&self, symbol: &str, day: Date) -> Result<Vec<Candle>, SourceError> {
        ensure_trading_day(day)?;
        match self.series.get(&symbol.to_uppercase()) {
            Some(candles) if !candles.is_empty() => Ok(candles.clone()),
            _ => Err(SourceError::NoData(symbol.to_string())),
        }
    }
}
