//! Reporting endpoints: dashboard counters and the reseller credit summary.

use crate::rest::{error_response, resolve_actor, AppState, RestError};
use axum::extract::State;
use axum::{Extension, Json};
use blastline_platform::auth::AuthToken;
use blastline_reporting::{DashboardStats, ResellerSummary};

/// GET /api/v1/reports/dashboard — live platform counts. Available to any
/// authenticated account; the numbers carry no per-account detail.
pub async fn dashboard_stats(
    State(state): State<AppState>,
    Extension(token): Extension<AuthToken>,
) -> Result<Json<DashboardStats>, RestError> {
    resolve_actor(&state, &token)?;
    Ok(Json(state.reports.dashboard_stats()))
}

/// GET /api/v1/reports/reseller-summary — the caller's referral-tree totals.
pub async fn reseller_summary(
    State(state): State<AppState>,
    Extension(token): Extension<AuthToken>,
) -> Result<Json<ResellerSummary>, RestError> {
    let actor = resolve_actor(&state, &token)?;
    let summary = state.reports.reseller_summary(&actor).map_err(error_response)?;
    Ok(Json(summary))
}
