pub mod logging;
pub mod replay;
pub mod simulator;

pub use logging::{
    report_divergences, InMemoryRunLogWriter, NoopRunLogWriter, RunLogEvent, RunLogEventKind,
    RunLogWriter, TracingRunLogWriter,
};
pub use replay::{TraceCsvWriter, TRACE_CSV_HEADER};
pub use simulator::{
    PortfolioState, SimulationError, SimulationReport, SimulatorConfig, TraceEntry, TradeAction,
    TradingSimulator, DEFAULT_STARTING_CASH, SIMULATOR_CONFIRMATION_COUNT,
};
