use serde::Serialize;
use series::Candle;
use strategy::{
    liquidation_value, shares_affordable, DivergenceEvent, DivergenceKind, DivergenceMatcher,
    DivergenceQuery, MatcherConfig, StrategyError,
};
use thiserror::Error;

use crate::logging::{NoopRunLogWriter, RunLogEvent, RunLogEventKind, RunLogWriter};

pub const DEFAULT_STARTING_CASH: f64 = 50_000.0;

/// The simulator only acts on divergences confirmed by two older extrema.
pub const SIMULATOR_CONFIRMATION_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SimulationError {
    #[error("starting cash must be finite and non-negative, got {0}")]
    InvalidStartingCash(f64),
    #[error("invalid matcher configuration: {0}")]
    InvalidConfig(#[source] StrategyError),
    #[error("candle {index} cannot be traded: {source}")]
    InvalidInput {
        index: usize,
        #[source]
        source: StrategyError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorConfig {
    pub starting_cash: f64,
    pub matcher: MatcherConfig,
}

impl SimulatorConfig {
    pub fn new(starting_cash: f64) -> Result<Self, SimulationError> {
        let matcher = MatcherConfig::default()
            .with_confirmation_count(SIMULATOR_CONFIRMATION_COUNT)
            .map_err(SimulationError::InvalidConfig)?;

        Ok(Self {
            starting_cash,
            matcher,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PortfolioState {
    pub cash: f64,
    pub shares: u64,
}

impl PortfolioState {
    pub fn new(cash: f64) -> Self {
        Self { cash, shares: 0 }
    }

    pub fn valuation(&self, price: f64) -> f64 {
        self.cash + self.shares as f64 * price
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEntry {
    pub index: usize,
    pub time: String,
    pub divergence: DivergenceEvent,
    pub action: TradeAction,
    pub price: f64,
    pub shares: u64,
    pub cash_after: f64,
    pub shares_after: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub starting_cash: f64,
    pub final_cash: f64,
    pub final_shares: u64,
    pub final_valuation: f64,
    pub trace: Vec<TraceEntry>,
}

/// Walks a series one position at a time, buying on confirmed bullish
/// divergences and liquidating on confirmed bearish ones.
#[derive(Debug, Clone)]
pub struct TradingSimulator<Q = DivergenceMatcher> {
    starting_cash: f64,
    query: Q,
}

impl TradingSimulator<DivergenceMatcher> {
    pub fn new(config: SimulatorConfig) -> Result<Self, SimulationError> {
        Self::with_query(config.starting_cash, DivergenceMatcher::new(config.matcher))
    }
}

impl<Q: DivergenceQuery> TradingSimulator<Q> {
    pub fn with_query(starting_cash: f64, query: Q) -> Result<Self, SimulationError> {
        if !starting_cash.is_finite() || starting_cash < 0.0 {
            return Err(SimulationError::InvalidStartingCash(starting_cash));
        }

        Ok(Self {
            starting_cash,
            query,
        })
    }

    pub fn starting_cash(&self) -> f64 {
        self.starting_cash
    }

    pub fn simulate(&self, series: &[Candle]) -> Result<SimulationReport, SimulationError> {
        self.simulate_with_log(series, &mut NoopRunLogWriter)
    }

    pub fn simulate_with_log(
        &self,
        series: &[Candle],
        log: &mut dyn RunLogWriter,
    ) -> Result<SimulationReport, SimulationError> {
        let mut portfolio = PortfolioState::new(self.starting_cash);
        let mut trace = Vec::new();

        for (index, candle) in series.iter().enumerate() {
            let Some(divergence) = self.query.divergence_at(series, index) else {
                continue;
            };
            log.write(
                RunLogEvent::new(index, candle.time(), RunLogEventKind::DivergenceConfirmed)
                    .with_divergence(divergence),
            );

            let price = candle.close();
            let invalid = |source| SimulationError::InvalidInput { index, source };
            let (action, quantity) = match divergence.kind {
                DivergenceKind::Bullish => {
                    let quantity = shares_affordable(portfolio.cash, price).map_err(invalid)?;
                    if quantity == 0 {
                        continue;
                    }
                    portfolio.cash = (portfolio.cash - quantity as f64 * price).max(0.0);
                    portfolio.shares += quantity;
                    (TradeAction::Buy, quantity)
                }
                DivergenceKind::Bearish => {
                    let quantity = portfolio.shares;
                    if quantity == 0 {
                        continue;
                    }
                    portfolio.cash += liquidation_value(quantity, price).map_err(invalid)?;
                    portfolio.shares = 0;
                    (TradeAction::Sell, quantity)
                }
            };

            let kind = match action {
                TradeAction::Buy => RunLogEventKind::SharesBought,
                TradeAction::Sell => RunLogEventKind::SharesSold,
            };
            log.write(
                RunLogEvent::new(index, candle.time(), kind).with_trade(
                    quantity,
                    price,
                    portfolio.cash,
                ),
            );
            trace.push(TraceEntry {
                index,
                time: candle.time().to_string(),
                divergence,
                action,
                price,
                shares: quantity,
                cash_after: portfolio.cash,
                shares_after: portfolio.shares,
            });
        }

        let final_valuation = match series.last() {
            Some(last) => portfolio.valuation(last.close()),
            None => portfolio.cash,
        };
        log.write(
            RunLogEvent::new(series.len(), "", RunLogEventKind::RunCompleted).with_trade(
                portfolio.shares,
                final_valuation,
                portfolio.cash,
            ),
        );

        Ok(SimulationReport {
            starting_cash: self.starting_cash,
            final_cash: portfolio.cash,
            final_shares: portfolio.shares,
            final_valuation,
            trace,
        })
    }
}
