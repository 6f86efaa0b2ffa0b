use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use runtime::SimulationError;
use serde_json::json;
use strategy::StrategyError;
use thiserror::Error;
use tokio::task::JoinError;

use crate::source::SourceError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    System(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::System(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            Self::InvalidInput(message) | Self::Validation(message) | Self::NotFound(message) => {
                message.clone()
            }
            Self::System(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::System(reason) = &self {
            tracing::error!(%reason, "request failed");
        }
        let body = Json(json!({ "detail": self.detail() }));
        (self.status(), body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl From<StrategyError> for ApiError {
    fn from(err: StrategyError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<SimulationError> for ApiError {
    fn from(err: SimulationError) -> Self {
        match err {
            SimulationError::InvalidStartingCash(_) | SimulationError::InvalidConfig(_) => {
                Self::Validation(err.to_string())
            }
            SimulationError::InvalidInput { .. } => Self::InvalidInput(err.to_string()),
        }
    }
}

impl From<SourceError> for ApiError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotTradingDay(_) => {
                Self::Validation("Date is not a trading day".to_string())
            }
            SourceError::NoData(_) => Self::NotFound(err.to_string()),
            SourceError::InvalidInput(_) => Self::InvalidInput(err.to_string()),
            SourceError::Upstream(reason) => Self::System(reason),
        }
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        Self::System(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
    use runtime::SimulationError;
    use time::macros::date;

    use super::ApiError;
    use crate::source::SourceError;

    #[tokio::test]
    async fn system_errors_hide_internal_details() {
        let response = ApiError::System("disk on fire".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, serde_json::json!({ "detail": "Internal server error" }));
    }

    #[test]
    fn source_errors_map_to_http_categories() {
        assert_eq!(
            ApiError::from(SourceError::NotTradingDay(date!(2025 - 12 - 06))).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(SourceError::NoData("VGI".to_string())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(SourceError::Upstream("timeout".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn invalid_starting_cash_is_a_validation_error() {
        let err = ApiError::from(SimulationError::InvalidStartingCash(-1.0));

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
