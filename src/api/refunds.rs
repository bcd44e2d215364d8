use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::refund_attempt_repository::{RefundAttempt, RefundAttemptRepository};
use crate::middleware::error::{
    get_request_id_from_headers, json_error_response, refund_error_response, ErrorResponse,
};
use crate::refund::breakdown::parse_amount;
use crate::refund::processor::RefundProcessor;
use crate::refund::types::{EligibilityResult, RefundOutcome, RefundRequest};

/// Shared state for the refund routes. The attempt repository is optional so
/// the API can run against a stubbed store without a database.
#[derive(Clone)]
pub struct RefundState {
    pub processor: Arc<RefundProcessor>,
    pub attempts: Option<Arc<RefundAttemptRepository>>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub transaction_id: Uuid,
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub transaction_id: Uuid,
    pub requested_amount: String,
    pub processing_fee: String,
    pub net_amount: String,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRefundRequest {
    pub transaction_id: Uuid,
    pub amount: String,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct AttemptsQuery {
    pub limit: Option<i64>,
}

/// GET /api/refunds/eligibility/{transaction_id}
pub async fn get_eligibility(
    State(state): State<RefundState>,
    Path(transaction_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<EligibilityResult>, (StatusCode, Json<ErrorResponse>)> {
    let request_id = get_request_id_from_headers(&headers);
    info!(transaction_id = %transaction_id, "Eligibility check requested");

    state
        .processor
        .eligibility(transaction_id)
        .await
        .map(Json)
        .map_err(|e| refund_error_response(e, request_id))
}

/// POST /api/refunds/preview
pub async fn preview_refund(
    State(state): State<RefundState>,
    headers: HeaderMap,
    Json(payload): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request_id = get_request_id_from_headers(&headers);

    let requested_amount = parse_amount(&payload.amount)
        .map_err(|e| refund_error_response(e, request_id.clone()))?;

    let breakdown = state
        .processor
        .preview(payload.transaction_id, requested_amount)
        .await
        .map_err(|e| refund_error_response(e, request_id))?;

    Ok(Json(PreviewResponse {
        transaction_id: payload.transaction_id,
        requested_amount: requested_amount.to_string(),
        processing_fee: breakdown.processing_fee.to_string(),
        net_amount: breakdown.net_amount.to_string(),
    }))
}

/// POST /api/refunds
///
/// Every attempt, won or lost, comes back as a structured outcome and is
/// written to the audit trail. The HTTP status reflects the failure kind.
pub async fn execute_refund(
    State(state): State<RefundState>,
    headers: HeaderMap,
    Json(payload): Json<ExecuteRefundRequest>,
) -> Result<(StatusCode, Json<RefundOutcome>), (StatusCode, Json<ErrorResponse>)> {
    let request_id = get_request_id_from_headers(&headers);

    let requested_amount = parse_amount(&payload.amount)
        .map_err(|e| refund_error_response(e, request_id.clone()))?;

    info!(
        transaction_id = %payload.transaction_id,
        requested_amount = %requested_amount,
        request_id = request_id.as_deref().unwrap_or("-"),
        "Refund execution requested"
    );

    let outcome = state
        .processor
        .execute_refund(RefundRequest {
            transaction_id: payload.transaction_id,
            requested_amount,
            reason: payload.reason.clone(),
        })
        .await;

    record_attempt(&state, &payload, &outcome).await;

    let status = if outcome.success {
        StatusCode::OK
    } else {
        status_for_kind(outcome.failure_kind.as_deref().unwrap_or("unknown"))
    };

    Ok((status, Json(outcome)))
}

/// GET /api/refunds/attempts/{transaction_id}
pub async fn list_attempts(
    State(state): State<RefundState>,
    Path(transaction_id): Path<Uuid>,
    headers: HeaderMap,
    Query(query): Query<AttemptsQuery>,
) -> Result<Json<Vec<RefundAttempt>>, (StatusCode, Json<ErrorResponse>)> {
    let request_id = get_request_id_from_headers(&headers);
    let repo = match state.attempts.as_ref() {
        Some(repo) => repo,
        None => {
            return Err(json_error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Database disabled by configuration",
                request_id,
            ))
        }
    };

    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    repo.find_by_transaction(transaction_id, limit)
        .await
        .map(Json)
        .map_err(|e| {
            json_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.to_string(),
                request_id,
            )
        })
}

/// Write the audit row for a finished attempt. Failures here are logged and
/// swallowed; the outcome already went through and must still reach the
/// caller.
async fn record_attempt(state: &RefundState, payload: &ExecuteRefundRequest, outcome: &RefundOutcome) {
    let Some(repo) = state.attempts.as_ref() else {
        return;
    };
    let Ok(requested_amount) = parse_amount(&payload.amount) else {
        return;
    };

    let result = repo
        .record_attempt(
            outcome.transaction_id,
            requested_amount,
            outcome.breakdown.map(|b| b.processing_fee),
            outcome.breakdown.map(|b| b.net_amount),
            &payload.reason,
            outcome.terminal_state.as_str(),
            outcome.failure_kind.as_deref(),
            outcome.failure_reason.as_deref(),
            outcome.gateway_reference.as_deref(),
            outcome.ledger_reference.as_deref(),
        )
        .await;

    if let Err(e) = result {
        warn!(
            transaction_id = %outcome.transaction_id,
            error = %e,
            "Failed to record refund attempt audit row"
        );
    }
}

/// Map the outcome's failure kind back onto an HTTP status. Mirrors
/// `RefundError::http_status_code`.
fn status_for_kind(kind: &str) -> StatusCode {
    match kind {
        "validation" => StatusCode::BAD_REQUEST,
        "eligibility" | "concurrent_refund" => StatusCode::CONFLICT,
        "provider_lookup" => StatusCode::NOT_FOUND,
        "gateway" => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kinds_map_to_expected_statuses() {
        assert_eq!(status_for_kind("validation"), StatusCode::BAD_REQUEST);
        assert_eq!(status_for_kind("eligibility"), StatusCode::CONFLICT);
        assert_eq!(status_for_kind("concurrent_refund"), StatusCode::CONFLICT);
        assert_eq!(status_for_kind("provider_lookup"), StatusCode::NOT_FOUND);
        assert_eq!(status_for_kind("gateway"), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for_kind("ledger"), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_for_kind("unknown"), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
