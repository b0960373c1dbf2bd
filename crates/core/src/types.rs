//! Shared domain types: accounts, credentials, campaigns, and the
//! suspicious-activity record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity tier. Admins sit at the top of the referral hierarchy, resellers
/// create and manage their own users, users run campaigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Reseller,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Reseller => "reseller",
            Role::User => "user",
        }
    }
}

/// An identity record with a role, credit balance, and optional referrer.
///
/// `referrer_id` points at the account that created this one and is immutable
/// after creation. Admins have no referrer. `credits` is never negative after
/// a committed operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub mobile_number: String,
    pub role: Role,
    pub credits: i64,
    pub referrer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub last_changed_at: DateTime<Utc>,
}

/// Credential row, 1:1 with an [`Account`] via the mobile number. Created and
/// deleted together with its account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub mobile_number: String,
    pub password_hash: String,
}

/// Campaign lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Pending,
    Running,
    Completed,
    Cancelled,
}

impl CampaignStatus {
    /// Strict transition table. Re-applying the current status is not a
    /// transition; terminal states admit nothing.
    pub fn can_transition(self, to: CampaignStatus) -> bool {
        use CampaignStatus::*;
        matches!(
            (self, to),
            (Pending, Running) | (Pending, Cancelled) | (Running, Completed) | (Running, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CampaignStatus::Completed | CampaignStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Pending => "pending",
            CampaignStatus::Running => "running",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Cancelled => "cancelled",
        }
    }
}

/// Whether the outgoing message carries an interactive button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignType {
    WithButton,
    WithoutButton,
}

/// Button metadata for `with_button` campaigns. At least one of `url` /
/// `phone_number` must be present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonMeta {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// Reference to an uploaded recipient/attachment file. Only metadata is kept
/// here; parsing and storage are the file service's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub file_name: String,
    pub url: String,
}

/// A unit of bulk-messaging work. Owned exclusively by its creator; never
/// hard-deleted (cancellation is a status transition, campaigns are retained
/// for audit).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub message: String,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
    pub campaign_type: CampaignType,
    #[serde(default)]
    pub button: Option<ButtonMeta>,
    pub status: CampaignStatus,
    /// Running total of credits deducted against this campaign.
    /// Monotonically non-decreasing.
    pub deducted_credits: i64,
    pub created_at: DateTime<Utc>,
    pub last_changed_at: DateTime<Utc>,
}

/// Append-only observation of suspicious recipient entry (e.g. bulk paste).
/// Write-once; read by admins only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspiciousActivityRecord {
    pub id: Uuid,
    pub sequence: u64,
    pub campaign_name: String,
    pub reporter_mobile: String,
    pub typed_numbers: String,
    pub pasted_numbers: String,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_is_strict() {
        use CampaignStatus::*;
        assert!(Pending.can_transition(Running));
        assert!(Pending.can_transition(Cancelled));
        assert!(Running.can_transition(Completed));
        assert!(Running.can_transition(Cancelled));

        // Same-status re-set is not a transition.
        assert!(!Pending.can_transition(Pending));
        assert!(!Running.can_transition(Running));

        // Terminal states admit nothing, including each other.
        for from in [Completed, Cancelled] {
            for to in [Pending, Running, Completed, Cancelled] {
                assert!(!from.can_transition(to));
            }
        }

        // No path back to pending.
        assert!(!Running.can_transition(Pending));
    }

    #[test]
    fn terminal_states() {
        assert!(CampaignStatus::Completed.is_terminal());
        assert!(CampaignStatus::Cancelled.is_terminal());
        assert!(!CampaignStatus::Pending.is_terminal());
        assert!(!CampaignStatus::Running.is_terminal());
    }

    #[test]
    fn role_wire_names_are_snake_case() {
        assert_eq!(serde_json::to_string(&Role::Reseller).unwrap(), "\"reseller\"");
        assert_eq!(
            serde_json::to_string(&CampaignType::WithButton).unwrap(),
            "\"with_button\""
        );
    }
}
