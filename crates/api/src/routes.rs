use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use runtime::{SimulationReport, SimulatorConfig, TradingSimulator, DEFAULT_STARTING_CASH};
use serde::{Deserialize, Serialize};
use series::Candle;
use strategy::{
    DivergenceEvent, DivergenceMatcher, MatcherConfig, DEFAULT_CONFIRMATION_COUNT, DEFAULT_ORDER,
};
use time::{macros::format_description, Date, OffsetDateTime};

use crate::{error::ApiError, state::AppState, ws};

pub const DEFAULT_SYMBOL: &str = "VGI";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/divergences", post(scan_divergences))
        .route("/simulations", post(run_simulation))
        .route("/stock/divergences", get(symbol_divergences))
        .route("/ws/events", get(ws::events_socket))
        .with_state(state)
}

async fn healthcheck() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub candles: Vec<Candle>,
    #[serde(default)]
    pub order: Option<usize>,
    #[serde(default)]
    pub confirmation_count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub divergences: Vec<DivergenceEvent>,
}

async fn scan_divergences(
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanResponse>, ApiError> {
    let Json(request) = payload?;
    let config = MatcherConfig::new(
        request.order.unwrap_or(DEFAULT_ORDER),
        request
            .confirmation_count
            .unwrap_or(DEFAULT_CONFIRMATION_COUNT),
    )?;

    let divergences =
        tokio::task::spawn_blocking(move || DivergenceMatcher::new(config).scan(&request.candles))
            .await?;

    Ok(Json(ScanResponse { divergences }))
}

#[derive(Debug, Deserialize)]
pub struct SimulationRequest {
    pub candles: Vec<Candle>,
    #[serde(default)]
    pub starting_cash: Option<f64>,
}

async fn run_simulation(
    payload: Result<Json<SimulationRequest>, JsonRejection>,
) -> Result<Json<SimulationReport>, ApiError> {
    let Json(request) = payload?;
    let config = SimulatorConfig::new(request.starting_cash.unwrap_or(DEFAULT_STARTING_CASH))?;
    let simulator = TradingSimulator::new(config)?;

    let report = tokio::task::spawn_blocking(move || simulator.simulate(&request.candles)).await??;

    Ok(Json(report))
}

#[derive(Debug, Default, Deserialize)]
pub struct SymbolQuery {
    pub symbol: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SymbolDivergencesResponse {
    pub symbol: String,
    pub data: Vec<Candle>,
    pub divergences: Vec<DivergenceEvent>,
}

async fn symbol_divergences(
    State(state): State<AppState>,
    query: Result<Query<SymbolQuery>, QueryRejection>,
) -> Result<Json<SymbolDivergencesResponse>, ApiError> {
    let Query(query) = query?;
    let day = match query.date.as_deref() {
        Some(raw) => parse_day(raw)?,
        None => OffsetDateTime::now_utc().date(),
    };
    let symbol = query
        .symbol
        .as_deref()
        .map(str::trim)
        .filter(|symbol| !symbol.is_empty())
        .unwrap_or(DEFAULT_SYMBOL)
        .to_uppercase();

    let source = state.source();
    let lookup = symbol.clone();
    let (data, divergences) = tokio::task::spawn_blocking(move || {
        let candles = source.fetch(&lookup, day)?;
        let divergences = DivergenceMatcher::new(MatcherConfig::default()).scan(&candles);
        Ok::<_, ApiError>((candles, divergences))
    })
    .await??;

    tracing::debug!(%symbol, %day, found = divergences.len(), "symbol scan served");
    Ok(Json(SymbolDivergencesResponse {
        symbol,
        data,
        divergences,
    }))
}

fn parse_day(raw: &str) -> Result<Date, ApiError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| ApiError::Validation(format!("date {raw:?} must use YYYY-MM-DD")))
}
