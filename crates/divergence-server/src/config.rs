use std::{
    env, fmt,
    net::{AddrParseError, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use thiserror::Error;

const DEFAULT_LISTEN_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8080);
const DEFAULT_MODE: RunMode = RunMode::Serve;
const DEFAULT_CANDLES_DIR: &str = "data";
const DEFAULT_WATCHLIST: &str = "VGI";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_STARTING_CASH: f64 = runtime::DEFAULT_STARTING_CASH;
const DEFAULT_REPLAY_OUTPUT_PATH: &str = "artifacts/trace.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Serve,
    Simulate,
}

impl RunMode {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "serve" => Some(Self::Serve),
            "simulate" => Some(Self::Simulate),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Serve => "serve",
            Self::Simulate => "simulate",
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub mode: RunMode,
    pub candles_dir: PathBuf,
    pub watchlist: Vec<String>,
    pub poll_interval: Duration,
    pub starting_cash: f64,
    pub replay_output_path: String,
    pub telegram: Option<TelegramConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DIVERGENCE_SERVER_ADDR is not a valid socket address: {0}")]
    InvalidListenAddr(#[source] AddrParseError),
    #[error("DIVERGENCE_SERVER_MODE must be one of: serve, simulate")]
    InvalidMode,
    #[error("DIVERGENCE_CANDLES_DIR must not be empty or whitespace")]
    InvalidCandlesDir,
    #[error("DIVERGENCE_WATCHLIST must name at least one symbol")]
    InvalidWatchlist,
    #[error("DIVERGENCE_POLL_INTERVAL_SECS must be a positive whole number of seconds")]
    InvalidPollInterval,
    #[error("DIVERGENCE_STARTING_CASH must be a finite, non-negative amount")]
    InvalidStartingCash,
    #[error("DIVERGENCE_REPLAY_OUTPUT must not be empty or whitespace")]
    InvalidReplayOutputPath,
    #[error("TELEGRAM_TOKEN and TELEGRAM_CHAT_ID must be set together")]
    IncompleteTelegram,
    #[error("{0} contains non-unicode data")]
    NonUnicode(&'static str),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_addr = match read_var("DIVERGENCE_SERVER_ADDR")? {
            Some(value) => value.parse().map_err(ConfigError::InvalidListenAddr)?,
            None => SocketAddr::from(DEFAULT_LISTEN_ADDR),
        };

        let mode = match read_var("DIVERGENCE_SERVER_MODE")? {
            Some(value) => RunMode::parse(value.trim()).ok_or(ConfigError::InvalidMode)?,
            None => DEFAULT_MODE,
        };

        let candles_dir = PathBuf::from(non_blank(
            read_var("DIVERGENCE_CANDLES_DIR")?,
            DEFAULT_CANDLES_DIR,
            ConfigError::InvalidCandlesDir,
        )?);

        let watchlist = parse_watchlist(
            read_var("DIVERGENCE_WATCHLIST")?
                .as_deref()
                .unwrap_or(DEFAULT_WATCHLIST),
        )
        .ok_or(ConfigError::InvalidWatchlist)?;

        let poll_interval = match read_var("DIVERGENCE_POLL_INTERVAL_SECS")? {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidPollInterval),
            },
            None => Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        };

        let starting_cash = match read_var("DIVERGENCE_STARTING_CASH")? {
            Some(value) => match value.trim().parse::<f64>() {
                Ok(cash) if cash.is_finite() && cash >= 0.0 => cash,
                _ => return Err(ConfigError::InvalidStartingCash),
            },
            None => DEFAULT_STARTING_CASH,
        };

        let replay_output_path = non_blank(
            read_var("DIVERGENCE_REPLAY_OUTPUT")?,
            DEFAULT_REPLAY_OUTPUT_PATH,
            ConfigError::InvalidReplayOutputPath,
        )?;

        let token = read_var("TELEGRAM_TOKEN")?.filter(|value| !value.trim().is_empty());
        let chat_id = read_var("TELEGRAM_CHAT_ID")?.filter(|value| !value.trim().is_empty());
        let telegram = match (token, chat_id) {
            (Some(token), Some(chat_id)) => Some(TelegramConfig { token, chat_id }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTelegram),
        };

        Ok(Self {
            listen_addr,
            mode,
            candles_dir,
            watchlist,
            poll_interval,
            starting_cash,
            replay_output_path,
            telegram,
        })
    }
}

fn read_var(key: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NonUnicode(key)),
    }
}

fn non_blank(
    value: Option<String>,
    default_value: &str,
    invalid_error: ConfigError,
) -> Result<String, ConfigError> {
    match value {
        Some(value) if value.trim().is_empty() => Err(invalid_error),
        Some(value) => Ok(value),
        None => Ok(default_value.to_owned()),
    }
}

/// Upper-cases, trims and de-duplicates a comma separated symbol list,
/// keeping first-seen order. Returns `None` when no symbol remains.
fn parse_watchlist(value: &str) -> Option<Vec<String>> {
    let mut symbols: Vec<String> = Vec::new();
    for symbol in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let symbol = symbol.to_uppercase();
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    (!symbols.is_empty()).then_some(symbols)
}
