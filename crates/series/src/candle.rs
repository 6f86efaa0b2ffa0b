use serde::{Deserialize, Serialize};

use crate::error::SeriesError;

/// One time-ordered price bar with its precomputed RSI value.
///
/// Candles are validated once at construction and never mutated afterwards.
/// Deserialization goes through [`RawCandle`], so a record without an RSI
/// value is rejected before it can reach the divergence engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCandle")]
pub struct Candle {
    time: String,
    high: f64,
    low: f64,
    close: f64,
    rsi: f64,
}

impl Candle {
    pub fn new(
        time: impl Into<String>,
        high: f64,
        low: f64,
        close: f64,
        rsi: f64,
    ) -> Result<Self, SeriesError> {
        let time = time.into();
        for (field, value) in [("high", high), ("low", low), ("close", close), ("rsi", rsi)] {
            if !value.is_finite() {
                return Err(SeriesError::InvalidInput {
                    time,
                    reason: format!("{field} must be finite"),
                });
            }
        }
        if high < low {
            return Err(SeriesError::InvalidInput {
                time,
                reason: "high must not be below low".to_string(),
            });
        }

        Ok(Self {
            time,
            high,
            low,
            close,
            rsi,
        })
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn close(&self) -> f64 {
        self.close
    }

    pub fn rsi(&self) -> f64 {
        self.rsi
    }
}

/// Wire shape accepted from callers and data files. Every field is optional
/// here so that a missing value surfaces as a typed error instead of a
/// generic decoding failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCandle {
    pub time: Option<serde_json::Value>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    #[serde(alias = "RSI")]
    pub rsi: Option<f64>,
}

impl TryFrom<RawCandle> for Candle {
    type Error = SeriesError;

    fn try_from(raw: RawCandle) -> Result<Self, Self::Error> {
        let time = record_time(raw.time)?;
        let high = raw.high.ok_or_else(|| missing(&time, "high"))?;
        let low = raw.low.ok_or_else(|| missing(&time, "low"))?;
        let close = raw.close.ok_or_else(|| missing(&time, "close"))?;
        let rsi = raw.rsi.ok_or_else(|| missing(&time, "rsi"))?;

        Candle::new(time, high, low, close, rsi)
    }
}

/// Keeps string times verbatim and renders any other JSON value as text.
pub(crate) fn record_time(time: Option<serde_json::Value>) -> Result<String, SeriesError> {
    match time {
        Some(serde_json::Value::String(value)) => Ok(value),
        Some(serde_json::Value::Null) | None => Err(missing("", "time")),
        Some(other) => Ok(other.to_string()),
    }
}

pub(crate) fn missing(time: &str, field: &'static str) -> SeriesError {
    SeriesError::MissingField {
        time: time.to_string(),
        field,
    }
}

pub(crate) fn decode_records(raw: &str) -> Result<Vec<RawCandle>, SeriesError> {
    serde_json::from_str(raw).map_err(|err| SeriesError::InvalidJson(err.to_string()))
}

pub fn parse_candles_json(raw: &str) -> Result<Vec<Candle>, SeriesError> {
    decode_records(raw)?
        .into_iter()
        .map(Candle::try_from)
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{parse_candles_json, Candle};
    use crate::SeriesError;

    #[test]
    fn parses_candle_records_with_upper_case_rsi_column() {
        let raw = r#"[
            {"time":"2025-12-04 09:15:00","open":25.1,"high":25.4,"low":25.0,"close":25.3,
             "volume":1200,"RSI":61.5},
            {"time":"2025-12-04 09:16:00","high":25.6,"low":25.2,"close":25.5,"rsi":64.0}
        ]"#;

        let candles = parse_candles_json(raw).unwrap();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].time(), "2025-12-04 09:15:00");
        assert_eq!(candles[0].rsi(), 61.5);
        assert_eq!(candles[1].high(), 25.6);
    }

    #[test]
    fn rejects_record_without_rsi() {
        let raw = r#"[{"time":"t0","high":10.0,"low":9.0,"close":9.5}]"#;

        let err = parse_candles_json(raw).unwrap_err();

        assert_eq!(
            err,
            SeriesError::MissingField {
                time: "t0".to_string(),
                field: "rsi",
            }
        );
    }

    #[test]
    fn rejects_record_without_time() {
        for raw in [
            r#"[{"high":10.0,"low":9.0,"close":9.5,"rsi":50.0}]"#,
            r#"[{"time":null,"high":10.0,"low":9.0,"close":9.5,"rsi":50.0}]"#,
        ] {
            let err = parse_candles_json(raw).unwrap_err();

            assert_eq!(
                err,
                SeriesError::MissingField {
                    time: String::new(),
                    field: "time",
                }
            );
        }
    }

    #[test]
    fn rejects_non_finite_values_at_construction() {
        let err = Candle::new("t0", 10.0, 9.0, f64::NAN, 50.0).unwrap_err();

        assert!(matches!(err, SeriesError::InvalidInput { .. }));
    }

    #[test]
    fn rejects_inverted_high_low() {
        let err = Candle::new("t0", 9.0, 10.0, 9.5, 50.0).unwrap_err();

        assert!(matches!(err, SeriesError::InvalidInput { .. }));
    }

    #[test]
    fn numeric_time_is_kept_as_opaque_text() {
        let raw = r#"[{"time":1733300100000,"high":2.0,"low":1.0,"close":1.5,"rsi":40.0}]"#;

        let candles = parse_candles_json(raw).unwrap();

        assert_eq!(candles[0].time(), "1733300100000");
    }

    #[test]
    fn empty_array_parses_to_empty_series() {
        assert!(parse_candles_json("[]").unwrap().is_empty());
    }

    #[test]
    fn serializes_with_lower_case_field_names() {
        let candle = Candle::new("t0", 10.0, 9.0, 9.5, 42.0).unwrap();

        assert_eq!(
            serde_json::to_value(&candle).unwrap(),
            json!({"time": "t0", "high": 10.0, "low": 9.0, "close": 9.5, "rsi": 42.0})
        );
    }

    #[test]
    fn deserializing_a_single_candle_validates_fields() {
        let record = json!({"time": "t0", "high": 10.0, "low": 9.0, "rsi": 42.0});

        let result: Result<Candle, _> = serde_json::from_value(record);

        assert!(result.is_err());
    }
}
