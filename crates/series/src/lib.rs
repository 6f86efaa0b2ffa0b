mod candle;
mod error;
mod generators;
mod rsi;

pub use candle::{parse_candles_json, Candle, RawCandle};
pub use error::SeriesError;
pub use generators::CandleGenerator;
pub use rsi::{attach_rsi, parse_series_json, Bar, DEFAULT_RSI_PERIOD};
