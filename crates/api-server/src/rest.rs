//! Shared REST plumbing: application state, the core-error-to-HTTP mapping,
//! and operational endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use blastline_campaigns::{CampaignStore, SuspiciousActivityLog};
use blastline_core::error::CoreError;
use blastline_core::types::Account;
use blastline_identity::AccountStore;
use blastline_ledger::CreditLedger;
use blastline_platform::auth::{AuthManager, AuthToken};
use blastline_reporting::ReportService;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountStore>,
    pub campaigns: Arc<CampaignStore>,
    pub suspicious: Arc<SuspiciousActivityLog>,
    pub ledger: Arc<CreditLedger>,
    pub reports: Arc<ReportService>,
    pub auth: Arc<AuthManager>,
    pub node_id: String,
    pub start_time: Instant,
}

/// Handler error type: HTTP status plus the wire error body.
pub type RestError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
}

#[derive(Serialize)]
pub struct AckResponse {
    pub message: String,
}

/// Map a core error onto the HTTP surface. Deny reasons are logged here and
/// never rendered into the body; internal errors are logged and replaced with
/// a generic message.
pub(crate) fn error_response(err: CoreError) -> RestError {
    if let CoreError::Denied { reason } = &err {
        warn!(reason, "Request denied");
        metrics::counter!("api.denied").increment(1);
    }
    let status = match &err {
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        CoreError::Denied { .. } => StatusCode::FORBIDDEN,
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::Conflict(_)
        | CoreError::InsufficientCredits(_)
        | CoreError::InvalidTransition(_)
        | CoreError::InvalidState(_) => StatusCode::CONFLICT,
        CoreError::Serialization(_) | CoreError::Io(_) | CoreError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = %err, "Internal processing error");
        metrics::counter!("api.errors").increment(1);
        "Internal processing error".to_string()
    } else {
        err.to_string()
    };
    (
        status,
        Json(ErrorResponse {
            error: err.kind().to_string(),
            message,
        }),
    )
}

/// Re-read the acting account from the store. Tokens outlive account
/// deletion, so a valid token with no backing record is treated as denied.
pub(crate) fn resolve_actor(state: &AppState, token: &AuthToken) -> Result<Account, RestError> {
    state
        .accounts
        .find_by_id(token.account_id)
        .map_err(|_| error_response(CoreError::denied("acting account no longer exists")))
}

/// GET /health — basic health report.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready — readiness probe for Kubernetes.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.start_time.elapsed().as_secs() > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /live — liveness probe for Kubernetes.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_error_taxonomy() {
        let cases = [
            (CoreError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (CoreError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (CoreError::denied("internal reason"), StatusCode::FORBIDDEN),
            (CoreError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (CoreError::Conflict("x".into()), StatusCode::CONFLICT),
            (CoreError::InsufficientCredits("x".into()), StatusCode::CONFLICT),
            (CoreError::InvalidTransition("x".into()), StatusCode::CONFLICT),
            (CoreError::InvalidState("x".into()), StatusCode::CONFLICT),
        ];
        for (err, expected) in cases {
            let (status, _) = error_response(err);
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn denied_body_never_carries_the_reason() {
        let (_, Json(body)) = error_response(CoreError::denied("belongs to another reseller"));
        assert_eq!(body.error, "denied");
        assert_eq!(body.message, "Access denied");
        assert!(!body.message.contains("reseller"));
    }

    #[test]
    fn internal_errors_are_masked() {
        let (status, Json(body)) =
            error_response(CoreError::Internal(anyhow::anyhow!("db exploded")));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Internal processing error");
    }
}
