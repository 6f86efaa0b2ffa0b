use std::{fmt, time::Duration};

use serde::Serialize;
use series::Candle;
use strategy::{DivergenceEvent, DivergenceKind};
use thiserror::Error;

use crate::config::TelegramConfig;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("telegram request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("telegram responded with HTTP {0}")]
    Status(reqwest::StatusCode),
}

/// Renders a divergence as a short plain-text alert. Bearish divergences are
/// described by their highs, bullish ones by their lows.
pub fn format_divergence_message(
    symbol: &str,
    series: &[Candle],
    event: &DivergenceEvent,
) -> String {
    let price_label = match event.kind {
        DivergenceKind::Bearish => "high",
        DivergenceKind::Bullish => "low",
    };
    let describe = |index: usize| match series.get(index) {
        Some(candle) => {
            let price = match event.kind {
                DivergenceKind::Bearish => candle.high(),
                DivergenceKind::Bullish => candle.low(),
            };
            format!(
                "{} {price_label} {price:.2} RSI {:.1}",
                candle.time(),
                candle.rsi()
            )
        }
        None => format!("#{index}"),
    };

    format!(
        "{symbol} {} RSI divergence\nfrom {}\nto {}",
        event.kind.as_str(),
        describe(event.prefix_index),
        describe(event.suffix_index)
    )
}

#[derive(Debug, Clone)]
pub enum Notifier {
    Disabled,
    Telegram(TelegramNotifier),
}

impl Notifier {
    pub fn from_config(telegram: Option<&TelegramConfig>) -> Result<Self, NotifyError> {
        match telegram {
            Some(config) => Ok(Self::Telegram(TelegramNotifier::new(
                TELEGRAM_API_BASE,
                config,
            )?)),
            None => Ok(Self::Disabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Telegram(_))
    }

    pub async fn send(&self, text: &str) -> Result<(), NotifyError> {
        match self {
            Self::Disabled => Ok(()),
            Self::Telegram(telegram) => telegram.send(text).await,
        }
    }
}

#[derive(Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    endpoint: String,
    chat_id: String,
}

impl fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

impl TelegramNotifier {
    pub fn new(api_base: &str, config: &TelegramConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                api_base.trim_end_matches('/'),
                config.token
            ),
            chat_id: config.chat_id.clone(),
        })
    }

    pub async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status));
        }
        Ok(())
    }
}
