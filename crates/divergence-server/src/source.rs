use std::{
    fs, io,
    path::{Path, PathBuf},
};

use api::{ensure_trading_day, CandleSource, SourceError};
use series::{parse_series_json, Candle, DEFAULT_RSI_PERIOD};
use time::Date;

/// Reads `<dir>/<SYMBOL>.json`, an array of candle records. Files that carry
/// no RSI column get 14-period Wilder RSI computed, dropping the warm-up
/// bars. The file is re-read on every fetch so an external writer can
/// refresh it between polls.
#[derive(Debug, Clone)]
pub struct JsonDirCandleSource {
    dir: PathBuf,
}

impl JsonDirCandleSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> Option<PathBuf> {
        let valid = !symbol.is_empty()
            && !symbol.starts_with('.')
            && symbol
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_'));
        valid.then(|| self.dir.join(format!("{}.json", symbol.to_uppercase())))
    }

    pub fn load(&self, symbol: &str) -> Result<Vec<Candle>, SourceError> {
        let path = self
            .path_for(symbol)
            .ok_or_else(|| SourceError::NoData(symbol.to_string()))?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(SourceError::NoData(symbol.to_string()));
            }
            Err(err) => return Err(upstream(&path, err)),
        };

        let candles = parse_series_json(&raw, DEFAULT_RSI_PERIOD)?;
        if candles.is_empty() {
            return Err(SourceError::NoData(symbol.to_string()));
        }
        Ok(candles)
    }
}

impl CandleSource for JsonDirCandleSource {
    fn fetch(&self, symbol: &str, day: Date) -> Result<Vec<Candle>, SourceError> {
        ensure_trading_day(day)?;
        self.load(symbol)
    }
}

fn upstream(path: &Path, err: io::Error) -> SourceError {
    SourceError::Upstream(format!("{}: {err}", path.display()))
}
