//! Local authentication: salted SHA-256 password hashing and bearer-token
//! session management.
//!
//! Production: swap the hash for argon2/bcrypt and the session map for a
//! shared token store. The API surface stays the same.

use blastline_core::types::Role;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

const TOKEN_PREFIX: &str = "bl_";

/// Bearer token issued after authentication. Carries exactly the identity
/// triple the original token format exposed; handlers re-read the account
/// record on every call rather than trusting `role` beyond routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
    pub account_id: Uuid,
    pub mobile_number: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Session manager keyed by the opaque token string.
pub struct AuthManager {
    sessions: DashMap<String, AuthToken>,
    ttl: Duration,
}

impl Default for AuthManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthManager {
    /// Create a manager with the default 24h token lifetime.
    pub fn new() -> Self {
        Self::with_ttl(Duration::hours(24))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Mint a new bearer token for an authenticated account.
    pub fn issue(&self, account_id: Uuid, mobile_number: &str, role: Role) -> AuthToken {
        let now = Utc::now();
        let token = AuthToken {
            token: generate_token(),
            account_id,
            mobile_number: mobile_number.to_string(),
            role,
            issued_at: now,
            expires_at: now + self.ttl,
        };
        info!(account_id = %account_id, role = role.as_str(), "Session token issued");
        self.sessions.insert(token.token.clone(), token.clone());
        token
    }

    /// Validate a bearer token; returns `None` when unknown or expired.
    /// Expired sessions are dropped on sight.
    pub fn validate(&self, token: &str) -> Option<AuthToken> {
        let expired = match self.sessions.get(token) {
            Some(entry) => {
                if Utc::now() < entry.expires_at {
                    return Some(entry.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            self.sessions.remove(token);
        }
        None
    }

    /// Revoke a session. Returns `true` when the token existed.
    pub fn revoke(&self, token: &str) -> bool {
        let removed = self.sessions.remove(token).is_some();
        if removed {
            info!("Session revoked");
        }
        removed
    }
}

/// Generate a random opaque bearer token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    format!("{}{}", TOKEN_PREFIX, hex::encode(bytes))
}

/// Hash a password with a fresh random salt. Stored as `salt$digest`, both
/// hex-encoded.
pub fn hash_password(password: &str) -> String {
    let mut rng = rand::thread_rng();
    let salt: [u8; 16] = rng.gen();
    let digest = salted_digest(&salt, password);
    format!("{}${}", hex::encode(salt), hex::encode(digest))
}

/// Verify a password against a stored `salt$digest` hash.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    hex::encode(salted_digest(&salt, password)) == digest_hex
}

fn salted_digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}
