pub mod divergence;
pub mod error;
pub mod extrema;
pub mod matcher;
pub mod sizing;

pub use divergence::{DivergenceEvent, DivergenceKind};
pub use error::StrategyError;
pub use extrema::{is_extremum, is_peak, is_trough, ExtremumKind, DEFAULT_ORDER};
pub use matcher::{
    DivergenceMatcher, DivergenceQuery, ExtremaHistory, MatcherConfig, BEARISH_RSI_ZONE,
    BULLISH_RSI_ZONE, DEFAULT_CONFIRMATION_COUNT, MAX_PAIR_DISTANCE, MIN_PAIR_DISTANCE,
};
pub use sizing::{liquidation_value, shares_affordable};
