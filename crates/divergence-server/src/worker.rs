use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use api::{AppState, CandleSource, RuntimeEvent, SourceError};
use runtime::{report_divergences, TracingRunLogWriter};
use series::Candle;
use strategy::{DivergenceEvent, DivergenceKind, DivergenceMatcher, MatcherConfig};
use time::{Date, OffsetDateTime};
use tokio::time::MissedTickBehavior;

use crate::notifier::{format_divergence_message, Notifier};

/// Kind plus prefix and suffix candle times of an announced divergence.
type SeenKey = (DivergenceKind, String, String);

/// Periodically scans every watchlist symbol and announces divergences that
/// have not been seen before for that symbol. Remembered divergences are
/// forgotten once their candles drop out of the fetched series.
pub struct WatchWorker {
    source: Arc<dyn CandleSource>,
    state: AppState,
    notifier: Notifier,
    watchlist: Vec<String>,
    interval: Duration,
    matcher: MatcherConfig,
    seen: HashMap<String, HashSet<SeenKey>>,
}

impl WatchWorker {
    pub fn new(
        state: AppState,
        notifier: Notifier,
        watchlist: Vec<String>,
        interval: Duration,
    ) -> Self {
        Self {
            source: state.source(),
            state,
            notifier,
            watchlist,
            interval,
            matcher: MatcherConfig::default(),
            seen: HashMap::new(),
        }
    }

    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            symbols = self.watchlist.len(),
            interval_secs = self.interval.as_secs(),
            notifications = self.notifier.is_enabled(),
            "watch worker started"
        );

        loop {
            ticker.tick().await;
            self.poll_once(OffsetDateTime::now_utc().date()).await;
        }
    }

    /// Runs one pass over the watchlist and returns how many new divergences
    /// were announced. Failures are logged and left for the next pass.
    pub async fn poll_once(&mut self, day: Date) -> usize {
        let mut announced = 0;
        for symbol in self.watchlist.clone() {
            match self.scan_symbol(&symbol, day).await {
                Ok((series, events)) => announced += self.announce_new(&symbol, &series, &events),
                Err(SourceError::NotTradingDay(_)) => {
                    tracing::debug!(%day, "skipping poll on non-trading day");
                    return announced;
                }
                Err(err) => {
                    tracing::warn!(%symbol, error = %err, "divergence scan failed");
                }
            }
        }
        announced
    }

    async fn scan_symbol(
        &self,
        symbol: &str,
        day: Date,
    ) -> Result<(Vec<Candle>, Vec<DivergenceEvent>), SourceError> {
        let source = Arc::clone(&self.source);
        let matcher = DivergenceMatcher::new(self.matcher);
        let symbol = symbol.to_string();

        tokio::task::spawn_blocking(move || {
            let series = source.fetch(&symbol, day)?;
            let events = matcher.scan(&series);
            Ok::<_, SourceError>((series, events))
        })
        .await
        .map_err(|err| SourceError::Upstream(err.to_string()))?
    }

    fn announce_new(
        &mut self,
        symbol: &str,
        series: &[Candle],
        events: &[DivergenceEvent],
    ) -> usize {
        let time_at = |index: usize| series.get(index).map(Candle::time).unwrap_or_default();
        let seen = self.seen.entry(symbol.to_string()).or_default();

        let live_times: HashSet<&str> = series.iter().map(Candle::time).collect();
        seen.retain(|(_, prefix, suffix)| {
            live_times.contains(prefix.as_str()) && live_times.contains(suffix.as_str())
        });

        let fresh: Vec<DivergenceEvent> = events
            .iter()
            .filter(|event| {
                seen.insert((
                    event.kind,
                    time_at(event.prefix_index).to_string(),
                    time_at(event.suffix_index).to_string(),
                ))
            })
            .copied()
            .collect();
        report_divergences(series, &fresh, &mut TracingRunLogWriter::new(symbol));

        for event in &fresh {
            // Err only means nobody is subscribed.
            let _ = self.state.publish_event(RuntimeEvent::divergence_detected(
                symbol,
                *event,
                time_at(event.prefix_index),
                time_at(event.suffix_index),
            ));

            if self.notifier.is_enabled() {
                let notifier = self.notifier.clone();
                let text = format_divergence_message(symbol, series, event);
                tokio::spawn(async move {
                    if let Err(err) = notifier.send(&text).await {
                        tracing::warn!(error = %err, "divergence notification failed");
                    }
                });
            }
        }
        fresh.len()
    }
}
