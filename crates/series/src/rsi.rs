use serde::{Deserialize, Serialize};

use crate::{
    candle::{decode_records, missing, record_time, Candle, RawCandle},
    error::SeriesError,
};

pub const DEFAULT_RSI_PERIOD: usize = 14;

/// A price bar before the oscillator column has been attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: String,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl TryFrom<RawCandle> for Bar {
    type Error = SeriesError;

    fn try_from(raw: RawCandle) -> Result<Self, Self::Error> {
        let time = record_time(raw.time)?;
        let high = raw.high.ok_or_else(|| missing(&time, "high"))?;
        let low = raw.low.ok_or_else(|| missing(&time, "low"))?;
        let close = raw.close.ok_or_else(|| missing(&time, "close"))?;

        Ok(Self {
            time,
            high,
            low,
            close,
        })
    }
}

/// Decodes a JSON array of records into candles. An array in which no record
/// carries RSI is read as plain bars and gets Wilder RSI over `period`
/// attached; otherwise every record must bring its own RSI.
pub fn parse_series_json(raw: &str, period: usize) -> Result<Vec<Candle>, SeriesError> {
    let records = decode_records(raw)?;
    if records.iter().any(|record| record.rsi.is_some()) {
        return records.into_iter().map(Candle::try_from).collect();
    }

    let bars = records
        .into_iter()
        .map(Bar::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    attach_rsi(&bars, period)
}

/// Computes Wilder RSI over `close` and returns the bars that have a value.
///
/// The first `period` bars only seed the averages and are dropped from the
/// output, so the result is `bars.len() - period` candles long (or empty).
pub fn attach_rsi(bars: &[Bar], period: usize) -> Result<Vec<Candle>, SeriesError> {
    if period == 0 {
        return Err(SeriesError::InvalidPeriod);
    }
    if bars.len() <= period {
        return Ok(Vec::new());
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for pair in bars[..=period].windows(2) {
        let (gain, loss) = split_change(pair[1].close - pair[0].close);
        avg_gain += gain;
        avg_loss += loss;
    }
    let period_f = period as f64;
    avg_gain /= period_f;
    avg_loss /= period_f;

    let mut candles = Vec::with_capacity(bars.len() - period);
    candles.push(to_candle(&bars[period], rsi_value(avg_gain, avg_loss))?);

    for index in (period + 1)..bars.len() {
        let (gain, loss) = split_change(bars[index].close - bars[index - 1].close);
        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;
        candles.push(to_candle(&bars[index], rsi_value(avg_gain, avg_loss))?);
    }

    Ok(candles)
}

fn split_change(change: f64) -> (f64, f64) {
    if change > 0.0 {
        (change, 0.0)
    } else {
        (0.0, -change)
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    let total = avg_gain + avg_loss;
    if total == 0.0 {
        0.0
    } else {
        100.0 * avg_gain / total
    }
}

fn to_candle(bar: &Bar, rsi: f64) -> Result<Candle, SeriesError> {
    Candle::new(bar.time.clone(), bar.high, bar.low, bar.close, rsi)
}
