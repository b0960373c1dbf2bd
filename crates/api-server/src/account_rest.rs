//! Account endpoints: listing, profile, credits, transfers, and deletion.

use crate::rest::{error_response, resolve_actor, AckResponse, AppState, RestError};
use axum::extract::{Path, State};
use axum::{Extension, Json};
use blastline_core::error::{missing_account, CoreError};
use blastline_core::types::{Account, Role};
use blastline_platform::auth::AuthToken;
use blastline_platform::policy::{self, Action, Decision, Target};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account as rendered on the wire: no credential material, and the
/// referrer's username resolved for display.
#[derive(Debug, Serialize)]
pub struct AccountView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub mobile_number: String,
    pub role: Role,
    pub credits: i64,
    pub referrer_id: Option<Uuid>,
    pub referrer_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_changed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    pub credits: i64,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Positive grants actor -> target, negative reclaims target -> actor.
    pub credit_change: i64,
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub target_credits: i64,
    pub actor_credits: i64,
}

fn account_view(state: &AppState, account: Account) -> AccountView {
    // The referrer may have been deleted since; render what still resolves.
    let referrer_name = account
        .referrer_id
        .and_then(|id| state.accounts.find_by_id(id).ok())
        .map(|a| a.username);
    AccountView {
        id: account.id,
        username: account.username,
        email: account.email,
        mobile_number: account.mobile_number,
        role: account.role,
        credits: account.credits,
        referrer_id: account.referrer_id,
        referrer_name,
        created_at: account.created_at,
        last_changed_at: account.last_changed_at,
    }
}

/// GET /api/v1/accounts — accounts visible to the caller: all of them for
/// admins, direct referrals for resellers.
pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(token): Extension<AuthToken>,
) -> Result<Json<Vec<AccountView>>, RestError> {
    let actor = resolve_actor(&state, &token)?;
    let accounts = match actor.role {
        Role::Admin => state.accounts.list_all(),
        Role::Reseller => state.accounts.list_referred(actor.id),
        Role::User => {
            return Err(error_response(CoreError::denied(
                "users may not list accounts",
            )))
        }
    };
    Ok(Json(
        accounts
            .into_iter()
            .map(|a| account_view(&state, a))
            .collect(),
    ))
}

/// GET /api/v1/accounts/profile — the caller's own account.
pub async fn profile(
    State(state): State<AppState>,
    Extension(token): Extension<AuthToken>,
) -> Result<Json<AccountView>, RestError> {
    let actor = resolve_actor(&state, &token)?;
    Ok(Json(account_view(&state, actor)))
}

/// GET /api/v1/accounts/credits — the caller's live balance.
pub async fn credits(
    State(state): State<AppState>,
    Extension(token): Extension<AuthToken>,
) -> Result<Json<CreditsResponse>, RestError> {
    let actor = resolve_actor(&state, &token)?;
    Ok(Json(CreditsResponse {
        credits: actor.credits,
    }))
}

/// PUT /api/v1/accounts/:id/credits — move credits between the caller and a
/// target account. The ledger enforces authorization and balance bounds.
pub async fn transfer_credits(
    State(state): State<AppState>,
    Extension(token): Extension<AuthToken>,
    Path(id): Path<Uuid>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, RestError> {
    let outcome = state
        .ledger
        .transfer(token.account_id, id, request.credit_change)
        .map_err(error_response)?;
    metrics::counter!("api.credits.transfers").increment(1);
    Ok(Json(TransferResponse {
        target_credits: outcome.target_balance,
        actor_credits: outcome.actor_balance,
    }))
}

/// DELETE /api/v1/accounts/:id — delete an account the caller manages.
/// Self-deletion is rejected; the target's campaigns are retained.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(token): Extension<AuthToken>,
    Path(id): Path<Uuid>,
) -> Result<Json<AckResponse>, RestError> {
    let actor = resolve_actor(&state, &token)?;
    if actor.role == Role::User {
        return Err(error_response(CoreError::denied(
            "users may not delete accounts",
        )));
    }
    if id == actor.id {
        return Err(error_response(CoreError::Validation(
            "cannot delete your own account".to_string(),
        )));
    }
    let target = state
        .accounts
        .find_by_id(id)
        .map_err(|_| error_response(missing_account(&actor, id)))?;
    if let Decision::Deny(reason) =
        policy::authorize(&actor, Action::Modify, &Target::Account(&target))
    {
        return Err(error_response(CoreError::denied(reason)));
    }
    state.accounts.delete_account(id).map_err(error_response)?;
    metrics::counter!("api.accounts.deleted").increment(1);
    Ok(Json(AckResponse {
        message: "account deleted".to_string(),
    }))
}
