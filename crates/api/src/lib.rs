pub mod error;
pub mod routes;
pub mod source;
pub mod state;
pub mod ws;

use axum::Router;

pub use error::ApiError;
pub use routes::DEFAULT_SYMBOL;
pub use source::{
    ensure_trading_day, is_trading_day, CandleSource, SourceError, StaticCandleSource,
};
pub use state::{AppState, RuntimeEvent};

pub fn app(state: AppState) -> Router {
    routes::router(state)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use futures_util::StreamExt;
    use serde_json::{json, Value};
    use series::Candle;
    use strategy::{DivergenceEvent, DivergenceKind};
    use tokio_tungstenite::tungstenite::Message;
    use tower::ServiceExt;

    use crate::{app, AppState, RuntimeEvent, StaticCandleSource};

    fn bearish_records() -> Vec<Value> {
        (0..40)
            .map(|index| {
                let (high, rsi) = match index {
                    10 => (110.0, 78.0),
                    22 => (112.0, 66.0),
                    _ => (100.0, 50.0),
                };
                json!({
                    "time": format!("2025-12-04 09:{index:02}:00"),
                    "high": high,
                    "low": 90.0,
                    "close": 95.0,
                    "RSI": rsi,
                })
            })
            .collect()
    }

    fn bearish_series() -> Vec<Candle> {
        serde_json::from_value(Value::Array(bearish_records())).unwrap()
    }

    fn test_app() -> Router {
        let source = StaticCandleSource::new().with_series("VGI", bearish_series());
        app(AppState::new(Arc::new(source)))
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        read_json(app.oneshot(request).await.unwrap()).await
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        read_json(app.oneshot(request).await.unwrap()).await
    }

    async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn healthcheck_responds_ok() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn post_divergences_returns_batch_scan() {
        let (status, body) =
            post_json(test_app(), "/divergences", json!({ "candles": bearish_records() })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "divergences": [{ "prefixIndex": 10, "suffixIndex": 22, "type": "bearish" }] })
        );
    }

    #[tokio::test]
    async fn post_divergences_honours_confirmation_count() {
        let (status, body) = post_json(
            test_app(),
            "/divergences",
            json!({ "candles": bearish_records(), "confirmation_count": 2 }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "divergences": [] }));
    }

    #[tokio::test]
    async fn post_divergences_rejects_candle_without_rsi() {
        let mut records = bearish_records();
        records[3].as_object_mut().unwrap().remove("RSI");

        let (status, body) =
            post_json(test_app(), "/divergences", json!({ "candles": records })).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.contains("missing required field `rsi`"), "{detail}");
    }

    #[tokio::test]
    async fn post_divergences_rejects_zero_confirmation_count() {
        let (status, body) = post_json(
            test_app(),
            "/divergences",
            json!({ "candles": [], "confirmation_count": 0 }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn post_simulations_reports_untouched_cash_without_signals() {
        let (status, body) = post_json(
            test_app(),
            "/simulations",
            json!({ "candles": bearish_records(), "starting_cash": 1000.0 }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["starting_cash"], json!(1000.0));
        assert_eq!(body["final_valuation"], json!(1000.0));
        assert_eq!(body["final_shares"], json!(0));
        assert_eq!(body["trace"], json!([]));
    }

    #[tokio::test]
    async fn post_simulations_rejects_negative_cash() {
        let (status, _) = post_json(
            test_app(),
            "/simulations",
            json!({ "candles": [], "starting_cash": -5.0 }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn stock_divergences_returns_candles_and_events() {
        let (status, body) =
            get_json(test_app(), "/stock/divergences?symbol=vgi&date=2025-12-04").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], json!("VGI"));
        assert_eq!(body["data"].as_array().unwrap().len(), 40);
        assert_eq!(body["data"][10]["rsi"], json!(78.0));
        assert_eq!(
            body["divergences"],
            json!([{ "prefixIndex": 10, "suffixIndex": 22, "type": "bearish" }])
        );
    }

    #[tokio::test]
    async fn stock_divergences_rejects_weekends() {
        let (status, body) =
            get_json(test_app(), "/stock/divergences?symbol=VGI&date=2025-12-06").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "detail": "Date is not a trading day" }));
    }

    #[tokio::test]
    async fn stock_divergences_reports_unknown_symbol_as_not_found() {
        let (status, _) =
            get_json(test_app(), "/stock/divergences?symbol=SPY&date=2025-12-04").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stock_divergences_rejects_malformed_date() {
        let (status, _) = get_json(test_app(), "/stock/divergences?date=04-12-2025").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn websocket_streams_published_divergences() {
        let state = AppState::default();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server_app = app(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, server_app).await.unwrap();
        });

        let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/events"))
            .await
            .unwrap();

        let next_json = |message: Message| -> Value {
            match message {
                Message::Text(text) => serde_json::from_str(&text).unwrap(),
                other => panic!("unexpected frame {other:?}"),
            }
        };

        let connected = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(next_json(connected), json!({ "event_type": "connected" }));

        state
            .publish_event(RuntimeEvent::divergence_detected(
                "VGI",
                DivergenceEvent::new(10, 22, DivergenceKind::Bearish),
                "09:10",
                "09:22",
            ))
            .unwrap();

        let detected = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let detected = next_json(detected);
        assert_eq!(detected["event_type"], json!("divergence_detected"));
        assert_eq!(detected["suffix_index"], json!(22));
    }
}
