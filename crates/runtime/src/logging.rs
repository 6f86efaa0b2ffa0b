use series::Candle;
use strategy::DivergenceEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLogEventKind {
    DivergenceDetected,
    DivergenceConfirmed,
    SharesBought,
    SharesSold,
    RunCompleted,
    TraceWritten,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunLogEvent {
    pub index: usize,
    pub time: String,
    pub kind: RunLogEventKind,
    pub divergence: Option<DivergenceEvent>,
    pub quantity: u64,
    pub price: Option<f64>,
    pub cash: Option<f64>,
}

impl RunLogEvent {
    pub fn new(index: usize, time: impl Into<String>, kind: RunLogEventKind) -> Self {
        Self {
            index,
            time: time.into(),
            kind,
            divergence: None,
            quantity: 0,
            price: None,
            cash: None,
        }
    }

    pub fn with_divergence(mut self, divergence: DivergenceEvent) -> Self {
        self.divergence = Some(divergence);
        self
    }

    pub fn with_trade(mut self, quantity: u64, price: f64, cash: f64) -> Self {
        self.quantity = quantity;
        self.price = Some(price);
        self.cash = Some(cash);
        self
    }
}

/// Optional observer for human-readable reporting. Nothing in the detection
/// or simulation path depends on what a writer does with the events.
pub trait RunLogWriter {
    fn write(&mut self, event: RunLogEvent);
}

#[derive(Debug, Default)]
pub struct InMemoryRunLogWriter {
    events: Vec<RunLogEvent>,
}

impl InMemoryRunLogWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[RunLogEvent] {
        &self.events
    }

    pub fn kinds(&self) -> Vec<RunLogEventKind> {
        self.events.iter().map(|event| event.kind).collect()
    }
}

impl RunLogWriter for InMemoryRunLogWriter {
    fn write(&mut self, event: RunLogEvent) {
        self.events.push(event);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRunLogWriter;

impl RunLogWriter for NoopRunLogWriter {
    fn write(&mut self, _event: RunLogEvent) {}
}

/// Forwards run events to `tracing` under the `divergence` target.
#[derive(Debug, Clone)]
pub struct TracingRunLogWriter {
    label: String,
}

impl TracingRunLogWriter {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl RunLogWriter for TracingRunLogWriter {
    fn write(&mut self, event: RunLogEvent) {
        let label = self.label.as_str();
        match event.kind {
            RunLogEventKind::DivergenceDetected | RunLogEventKind::DivergenceConfirmed => {
                let confirmed = event.kind == RunLogEventKind::DivergenceConfirmed;
                if let Some(divergence) = event.divergence {
                    tracing::info!(
                        target: "divergence",
                        label,
                        kind = divergence.kind.as_str(),
                        prefix_index = divergence.prefix_index,
                        suffix_index = divergence.suffix_index,
                        time = %event.time,
                        confirmed,
                        "divergence found"
                    );
                }
            }
            RunLogEventKind::SharesBought | RunLogEventKind::SharesSold => {
                let side = match event.kind {
                    RunLogEventKind::SharesBought => "buy",
                    _ => "sell",
                };
                tracing::info!(
                    target: "divergence",
                    label,
                    index = event.index,
                    time = %event.time,
                    side,
                    quantity = event.quantity,
                    price = event.price.unwrap_or_default(),
                    cash = event.cash.unwrap_or_default(),
                    "simulated trade"
                );
            }
            RunLogEventKind::RunCompleted => {
                tracing::info!(
                    target: "divergence",
                    label,
                    candles = event.index,
                    shares = event.quantity,
                    cash = event.cash.unwrap_or_default(),
                    valuation = event.price.unwrap_or_default(),
                    "simulation completed"
                );
            }
            RunLogEventKind::TraceWritten => {
                tracing::debug!(target: "divergence", label, rows = event.index, "trace written");
            }
        }
    }
}

/// Writes one `DivergenceDetected` event per batch-scan result, stamped with
/// the time of the suffix candle.
pub fn report_divergences(
    series: &[Candle],
    events: &[DivergenceEvent],
    writer: &mut dyn RunLogWriter,
) {
    for divergence in events {
        let time = series
            .get(divergence.suffix_index)
            .map(|candle| candle.time().to_string())
            .unwrap_or_default();
        writer.write(
            RunLogEvent::new(divergence.suffix_index, time, RunLogEventKind::DivergenceDetected)
                .with_divergence(*divergence),
        );
    }
}
