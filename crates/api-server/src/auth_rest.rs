//! Registration, login, logout, and password-change endpoints.

use crate::auth::bearer_token;
use crate::rest::{error_response, resolve_actor, AckResponse, AppState, RestError};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use blastline_core::error::CoreError;
use blastline_core::types::Role;
use blastline_identity::NewAccount;
use blastline_platform::auth::AuthToken;
use blastline_platform::policy::{self, Action, Decision, Target};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub mobile_number: String,
    pub role: Role,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub mobile_number: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChangeRequest {
    pub old_password: String,
    pub new_password: String,
}

/// POST /api/v1/auth/register — create an account.
///
/// With a valid bearer token the caller becomes the referrer and the policy
/// decides which roles it may create. Without one, only the very first admin
/// can be minted (the single-flight bootstrap path in the store); everything
/// else is denied.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), RestError> {
    let profile = NewAccount {
        username: request.username,
        email: request.email,
        mobile_number: request.mobile_number,
        role: request.role,
    };

    let account = match bearer_token(&headers) {
        Some(raw) => {
            let token = state
                .auth
                .validate(raw)
                .ok_or_else(|| error_response(CoreError::denied("invalid or expired token")))?;
            let actor = resolve_actor(&state, &token)?;
            if let Decision::Deny(reason) =
                policy::authorize(&actor, Action::Modify, &Target::NewAccount(profile.role))
            {
                return Err(error_response(CoreError::denied(reason)));
            }
            state
                .accounts
                .create_account(
                    profile,
                    &request.password,
                    &request.confirm_password,
                    Some(actor.id),
                )
                .map_err(error_response)?
        }
        None => state
            .accounts
            .create_bootstrap_admin(profile, &request.password, &request.confirm_password)
            .map_err(error_response)?,
    };

    metrics::counter!("api.accounts.created", "role" => account.role.as_str()).increment(1);
    let token = state
        .auth
        .issue(account.id, &account.mobile_number, account.role);
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            token: token.token,
            role: token.role,
            expires_at: token.expires_at,
        }),
    ))
}

fn authenticate(state: &AppState, request: &LoginRequest) -> Result<TokenResponse, RestError> {
    let account = state
        .accounts
        .find_by_mobile(&request.mobile_number)
        .map_err(error_response)?;
    let stored = state
        .accounts
        .password_hash(&request.mobile_number)
        .ok_or_else(|| error_response(CoreError::InvalidCredentials))?;
    if !blastline_platform::auth::verify_password(&request.password, &stored) {
        metrics::counter!("api.login_failures").increment(1);
        return Err(error_response(CoreError::InvalidCredentials));
    }

    let token = state
        .auth
        .issue(account.id, &account.mobile_number, account.role);
    info!(account_id = %account.id, role = account.role.as_str(), "Login succeeded");
    Ok(TokenResponse {
        token: token.token,
        role: token.role,
        expires_at: token.expires_at,
    })
}

/// POST /api/v1/auth/login — authenticate by mobile number and password.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, RestError> {
    authenticate(&state, &request).map(Json)
}

/// POST /api/v1/auth/admin/login — login restricted to admin accounts.
pub async fn admin_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, RestError> {
    let account = state
        .accounts
        .find_by_mobile(&request.mobile_number)
        .map_err(error_response)?;
    if account.role != Role::Admin {
        return Err(error_response(CoreError::denied(
            "admin login requires an admin account",
        )));
    }
    authenticate(&state, &request).map(Json)
}

/// POST /api/v1/auth/logout — revoke the presented session token.
pub async fn logout(
    State(state): State<AppState>,
    Extension(token): Extension<AuthToken>,
) -> Json<AckResponse> {
    state.auth.revoke(&token.token);
    Json(AckResponse {
        message: "logged out".to_string(),
    })
}

/// PUT /api/v1/accounts/password — change the caller's password.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(token): Extension<AuthToken>,
    Json(request): Json<PasswordChangeRequest>,
) -> Result<Json<AckResponse>, RestError> {
    let actor = resolve_actor(&state, &token)?;
    state
        .accounts
        .change_password(
            &actor.mobile_number,
            &request.old_password,
            &request.new_password,
        )
        .map_err(error_response)?;
    Ok(Json(AckResponse {
        message: "password changed".to_string(),
    }))
}
