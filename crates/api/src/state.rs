use std::{fmt, sync::Arc};

use strategy::{DivergenceEvent, DivergenceKind};
use tokio::sync::broadcast;

use crate::source::{CandleSource, StaticCandleSource};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    Connected,
    DivergenceDetected {
        symbol: String,
        kind: DivergenceKind,
        prefix_index: usize,
        suffix_index: usize,
        prefix_time: String,
        suffix_time: String,
    },
}

impl RuntimeEvent {
    pub fn connected() -> Self {
        Self::Connected
    }

    pub fn divergence_detected(
        symbol: impl Into<String>,
        event: DivergenceEvent,
        prefix_time: impl Into<String>,
        suffix_time: impl Into<String>,
    ) -> Self {
        Self::DivergenceDetected {
            symbol: symbol.into(),
            kind: event.kind,
            prefix_index: event.prefix_index,
            suffix_index: event.suffix_index,
            prefix_time: prefix_time.into(),
            suffix_time: suffix_time.into(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn CandleSource>,
    events_tx: broadcast::Sender<RuntimeEvent>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("subscribers", &self.events_tx.receiver_count())
            .finish_non_exhaustive()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(StaticCandleSource::new()))
    }
}

impl AppState {
    pub fn new(source: Arc<dyn CandleSource>) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { source, events_tx }
    }

    pub fn source(&self) -> Arc<dyn CandleSource> {
        Arc::clone(&self.source)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.events_tx.subscribe()
    }

    pub fn publish_event(
        &self,
        event: RuntimeEvent,
    ) -> Result<usize, broadcast::error::SendError<RuntimeEvent>> {
        self.events_tx.send(event)
    }
}
