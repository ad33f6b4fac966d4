// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the queue REST API.
//!
//! Every field of every request is optional at the wire level: missing or
//! unknown values are normalized by the engine, and only values that cannot
//! be normalized come back as 400.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tokenq_core::{HealthStatus, IssuedToken, PluginAdapter, TokenqError};
use tokenq_engine::{
    CallOutcome, CompleteOutcome, LastPrintedView, QueueView, RecallView, StatusView,
    TransferOutcome,
};

use crate::server::GatewayState;

/// Request body for POST /api/print-token.
#[derive(Debug, Default, Deserialize)]
pub struct PrintTokenRequest {
    #[serde(default)]
    pub dept: Option<String>,
    #[serde(default)]
    pub visit_type: Option<String>,
}

/// Request body for POST /api/call-next.
#[derive(Debug, Default, Deserialize)]
pub struct CallNextRequest {
    #[serde(default)]
    pub dept: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub counter: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
}

/// Request body for POST /api/transfer-previous.
#[derive(Debug, Default, Deserialize)]
pub struct TransferRequest {
    #[serde(default)]
    pub dept: Option<String>,
    #[serde(default)]
    pub counter: Option<String>,
    #[serde(default)]
    pub from_stage: Option<String>,
    #[serde(default)]
    pub to_stage: Option<String>,
}

/// Request body for POST /api/complete-previous and POST /api/recall-last.
#[derive(Debug, Default, Deserialize)]
pub struct CounterRequest {
    #[serde(default)]
    pub dept: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub counter: Option<String>,
}

/// Query string for the read endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    pub dept: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" when storage is healthy, "degraded" otherwise.
    pub status: String,
    /// Binary version.
    pub version: String,
    /// Seconds since the gateway state was created.
    pub uptime_secs: u64,
    /// Storage health detail.
    pub storage: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// A [`TokenqError`] rendered as an HTTP response.
///
/// Validation failures are the caller's fault (400). Lock contention is
/// transient (503 with `Retry-After`). Anything else is a server failure.
#[derive(Debug)]
pub struct ApiError(pub TokenqError);

impl From<TokenqError> for ApiError {
    fn from(err: TokenqError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            TokenqError::Validation(_) => StatusCode::BAD_REQUEST,
            TokenqError::ResourceBusy { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self.0, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %self.0, "request rejected");
        }

        let mut response = (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response();
        if self.0.is_retryable() {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// POST /api/print-token
pub async fn print_token(
    State(state): State<GatewayState>,
    Json(body): Json<PrintTokenRequest>,
) -> ApiResult<IssuedToken> {
    let issued = state
        .engine
        .issue_token(body.dept.as_deref(), body.visit_type.as_deref())
        .await?;
    Ok(Json(issued))
}

/// POST /api/call-next
///
/// Finishes whatever the counter was serving (entry stage: hand off,
/// otherwise: complete) and calls the next token in one transaction.
/// A null `token_no` means the queue is empty.
pub async fn call_next(
    State(state): State<GatewayState>,
    Json(body): Json<CallNextRequest>,
) -> ApiResult<CallOutcome> {
    let outcome = state
        .engine
        .advance(
            body.dept.as_deref(),
            body.stage.as_deref(),
            body.counter.as_deref(),
            body.mode.as_deref(),
        )
        .await?;
    Ok(Json(outcome))
}

/// POST /api/transfer-previous
pub async fn transfer_previous(
    State(state): State<GatewayState>,
    Json(body): Json<TransferRequest>,
) -> ApiResult<TransferOutcome> {
    let outcome = state
        .engine
        .transfer_previous_to_stage(
            body.dept.as_deref(),
            body.counter.as_deref(),
            body.from_stage.as_deref(),
            body.to_stage.as_deref(),
        )
        .await?;
    Ok(Json(outcome))
}

/// POST /api/complete-previous
pub async fn complete_previous(
    State(state): State<GatewayState>,
    Json(body): Json<CounterRequest>,
) -> ApiResult<CompleteOutcome> {
    let outcome = state
        .engine
        .complete_previous(
            body.dept.as_deref(),
            body.stage.as_deref(),
            body.counter.as_deref(),
        )
        .await?;
    Ok(Json(outcome))
}

/// POST /api/recall-last
pub async fn recall_last(
    State(state): State<GatewayState>,
    Json(body): Json<CounterRequest>,
) -> ApiResult<RecallView> {
    let view = state
        .engine
        .recall(
            body.dept.as_deref(),
            body.stage.as_deref(),
            body.counter.as_deref(),
        )
        .await?;
    Ok(Json(view))
}

/// GET /api/status?dept&stage
pub async fn get_status(
    State(state): State<GatewayState>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<StatusView> {
    let view = state
        .engine
        .status(query.dept.as_deref(), query.stage.as_deref())
        .await?;
    Ok(Json(view))
}

/// GET /api/queue?dept&stage
pub async fn get_queue(
    State(state): State<GatewayState>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<QueueView> {
    let view = state
        .engine
        .queue(query.dept.as_deref(), query.stage.as_deref())
        .await?;
    Ok(Json(view))
}

/// GET /api/last-printed?dept
pub async fn get_last_printed(
    State(state): State<GatewayState>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<LastPrintedView> {
    let view = state.engine.last_printed(query.dept.as_deref()).await?;
    Ok(Json(view))
}

/// GET /health
///
/// Unauthenticated liveness check; reports 503 when storage is unhealthy.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let (status, storage) = match state.engine.store().health_check().await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "healthy".to_string()),
        Ok(HealthStatus::Degraded(detail)) => (StatusCode::OK, format!("degraded: {detail}")),
        Ok(HealthStatus::Unhealthy(detail)) => {
            (StatusCode::SERVICE_UNAVAILABLE, format!("unhealthy: {detail}"))
        }
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, format!("unhealthy: {e}")),
    };
    let body = HealthResponse {
        status: if status == StatusCode::OK { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        storage,
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_next_request_accepts_empty_object() {
        let req: CallNextRequest = serde_json::from_str("{}").unwrap();
        assert!(req.dept.is_none());
        assert!(req.stage.is_none());
        assert!(req.counter.is_none());
        assert!(req.mode.is_none());
    }

    #[test]
    fn transfer_request_deserializes_all_fields() {
        let json = r#"{
            "dept": "welfare",
            "counter": "Counter2",
            "from_stage": "reception",
            "to_stage": "lab"
        }"#;
        let req: TransferRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.dept.as_deref(), Some("welfare"));
        assert_eq!(req.counter.as_deref(), Some("Counter2"));
        assert_eq!(req.from_stage.as_deref(), Some("reception"));
        assert_eq!(req.to_stage.as_deref(), Some("lab"));
    }

    #[test]
    fn print_token_request_tolerates_unknown_visit_type() {
        let req: PrintTokenRequest =
            serde_json::from_str(r#"{"visit_type": "vip"}"#).unwrap();
        assert_eq!(req.visit_type.as_deref(), Some("vip"));
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let err = ApiError(TokenqError::Validation("counter is required".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let response = err.into_response();
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }

    #[test]
    fn busy_maps_to_service_unavailable_with_retry_after() {
        let err = ApiError(TokenqError::ResourceBusy {
            detail: "database is locked".into(),
        });
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        let response = err.into_response();
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).map(|v| v.as_bytes()),
            Some(&b"1"[..])
        );
    }

    #[test]
    fn storage_failure_maps_to_internal_error() {
        let err = ApiError(TokenqError::Storage {
            source: Box::new(std::io::Error::other("disk gone")),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn only_busy_errors_carry_retry_after() {
        for err in [
            TokenqError::Internal("boom".into()),
            TokenqError::Config("bad".into()),
        ] {
            let response = ApiError(err).into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert!(response.headers().get(header::RETRY_AFTER).is_none());
        }
    }

    #[test]
    fn error_response_serializes() {
        let resp = ErrorResponse {
            error: "something went wrong".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"error":"something went wrong"}"#);
    }

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
            uptime_secs: 42,
            storage: "healthy".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"uptime_secs\":42"));
        assert!(json.contains("\"storage\":\"healthy\""));
    }
}
