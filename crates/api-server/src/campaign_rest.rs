//! Campaign endpoints: creation, listing, lifecycle transitions, credit
//! deduction, and the suspicious-activity log.

use crate::rest::{error_response, resolve_actor, AppState, RestError};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use blastline_campaigns::{NewCampaign, SuspiciousObservation};
use blastline_core::error::CoreError;
use blastline_core::types::{
    AttachmentRef, ButtonMeta, Campaign, CampaignStatus, CampaignType, Role,
    SuspiciousActivityRecord,
};
use blastline_platform::auth::AuthToken;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub message: String,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
    pub campaign_type: CampaignType,
    #[serde(default)]
    pub button: Option<ButtonMeta>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: CampaignStatus,
}

#[derive(Debug, Deserialize)]
pub struct DeductRequest {
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct DeductResponse {
    pub owner_credits: i64,
    pub deducted_credits: i64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CampaignScope {
    #[default]
    Own,
    All,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListCampaignsQuery {
    #[serde(default)]
    pub scope: CampaignScope,
}

#[derive(Debug, Deserialize)]
pub struct SuspiciousActivityRequest {
    pub campaign_name: String,
    pub typed_numbers: String,
    pub pasted_numbers: String,
}

/// POST /api/v1/campaigns — create a campaign owned by the caller.
pub async fn create_campaign(
    State(state): State<AppState>,
    Extension(token): Extension<AuthToken>,
    Json(request): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Campaign>), RestError> {
    let actor = resolve_actor(&state, &token)?;
    let campaign = state
        .campaigns
        .create(
            &actor,
            NewCampaign {
                name: request.name,
                message: request.message,
                recipients: request.recipients,
                attachments: request.attachments,
                campaign_type: request.campaign_type,
                button: request.button,
            },
        )
        .map_err(error_response)?;
    metrics::counter!("api.campaigns.created").increment(1);
    Ok((StatusCode::CREATED, Json(campaign)))
}

/// GET /api/v1/campaigns?scope=own|all — list campaigns. `all` is admin-only.
pub async fn list_campaigns(
    State(state): State<AppState>,
    Extension(token): Extension<AuthToken>,
    Query(query): Query<ListCampaignsQuery>,
) -> Result<Json<Vec<Campaign>>, RestError> {
    let actor = resolve_actor(&state, &token)?;
    let campaigns = match query.scope {
        CampaignScope::Own => state.campaigns.list_owned(actor.id),
        CampaignScope::All => {
            if actor.role != Role::Admin {
                return Err(error_response(CoreError::denied(
                    "only admins may list all campaigns",
                )));
            }
            state.campaigns.list_all()
        }
    };
    Ok(Json(campaigns))
}

/// PUT /api/v1/campaigns/:id/status — drive the campaign lifecycle.
pub async fn set_campaign_status(
    State(state): State<AppState>,
    Extension(token): Extension<AuthToken>,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Campaign>, RestError> {
    let actor = resolve_actor(&state, &token)?;
    let campaign = state
        .campaigns
        .set_status(&actor, id, request.status)
        .map_err(error_response)?;
    metrics::counter!("api.campaigns.status_changes", "to" => request.status.as_str())
        .increment(1);
    Ok(Json(campaign))
}

/// PUT /api/v1/campaigns/:id/deduct — charge credits against a campaign.
pub async fn deduct_campaign_credits(
    State(state): State<AppState>,
    Extension(token): Extension<AuthToken>,
    Path(id): Path<Uuid>,
    Json(request): Json<DeductRequest>,
) -> Result<Json<DeductResponse>, RestError> {
    let outcome = state
        .ledger
        .deduct(token.account_id, id, request.amount)
        .map_err(error_response)?;
    metrics::counter!("api.campaigns.deductions").increment(1);
    Ok(Json(DeductResponse {
        owner_credits: outcome.owner_balance,
        deducted_credits: outcome.deducted_credits,
    }))
}

/// POST /api/v1/suspicious-activity — append an observation to the log.
pub async fn record_suspicious_activity(
    State(state): State<AppState>,
    Extension(token): Extension<AuthToken>,
    Json(request): Json<SuspiciousActivityRequest>,
) -> Result<(StatusCode, Json<SuspiciousActivityRecord>), RestError> {
    let actor = resolve_actor(&state, &token)?;
    let record = state.suspicious.record(
        &actor,
        SuspiciousObservation {
            campaign_name: request.campaign_name,
            typed_numbers: request.typed_numbers,
            pasted_numbers: request.pasted_numbers,
        },
    );
    metrics::counter!("api.suspicious.recorded").increment(1);
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/suspicious-activity — admin-only read of the full log.
pub async fn list_suspicious_activity(
    State(state): State<AppState>,
    Extension(token): Extension<AuthToken>,
) -> Result<Json<Vec<SuspiciousActivityRecord>>, RestError> {
    let actor = resolve_actor(&state, &token)?;
    let records = state.suspicious.list(&actor).map_err(error_response)?;
    Ok(Json(records))
}
