mod config;
mod notifier;
mod source;
mod wiring;
mod worker;

use std::error::Error;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::Path;

use config::{Config, RunMode};
use runtime::{
    RunLogWriter, SimulationReport, SimulatorConfig, TraceCsvWriter, TracingRunLogWriter,
    TradingSimulator,
};
use source::JsonDirCandleSource;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(mode = config.mode.as_str(), "starting divergence server");

    match config.mode {
        RunMode::Serve => serve(config).await,
        RunMode::Simulate => simulate(&config),
    }
}

async fn serve(config: Config) -> Result<(), Box<dyn Error>> {
    let services = wiring::build_services(&config)?;
    tokio::spawn(services.worker.run());

    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "listening");
    axum::serve(listener, services.app).await?;
    Ok(())
}

fn simulate(config: &Config) -> Result<(), Box<dyn Error>> {
    let symbol = config
        .watchlist
        .first()
        .ok_or("watchlist must name at least one symbol")?;
    let series = JsonDirCandleSource::new(&config.candles_dir).load(symbol)?;
    let simulator = TradingSimulator::new(SimulatorConfig::new(config.starting_cash)?)?;
    let mut log = TracingRunLogWriter::new(symbol.as_str());

    let report = simulator.simulate_with_log(&series, &mut log)?;
    write_trace(&config.replay_output_path, &report, &mut log)?;
    tracing::info!(
        %symbol,
        trades = report.trace.len(),
        final_cash = report.final_cash,
        final_shares = report.final_shares,
        final_valuation = report.final_valuation,
        output = %config.replay_output_path,
        "simulation finished"
    );
    Ok(())
}

fn write_trace(
    path: &str,
    report: &SimulationReport,
    log: &mut dyn RunLogWriter,
) -> Result<(), io::Error> {
    let trace_path = Path::new(path);

    if let Some(parent) = trace_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        fs::create_dir_all(parent)?;
    }

    let trace_file = BufWriter::new(File::create(trace_path)?);
    TraceCsvWriter::new(trace_file).write_report_and_log(report, log)
}
