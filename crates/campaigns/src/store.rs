//! Campaign store: creation, strict lifecycle transitions, and listing.
//!
//! Campaigns are never hard-deleted; cancellation is a status transition and
//! the record is retained for audit.

use blastline_core::error::{CoreError, CoreResult};
use blastline_core::types::{Account, Campaign, CampaignStatus, CampaignType, Role};
use blastline_platform::policy::{self, Action, Decision, Target};
use chrono::Utc;
use dashmap::DashMap;
use tracing::{info, warn};
use uuid::Uuid;

use blastline_core::types::{AttachmentRef, ButtonMeta};

const MAX_NAME_LEN: usize = 128;
const MAX_MESSAGE_LEN: usize = 4096;

/// Campaign creation payload. The owner is the resolved actor, never
/// client-supplied.
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub name: String,
    pub message: String,
    pub recipients: Vec<String>,
    pub attachments: Vec<AttachmentRef>,
    pub campaign_type: CampaignType,
    pub button: Option<ButtonMeta>,
}

/// Thread-safe in-memory campaign store backed by DashMap.
pub struct CampaignStore {
    campaigns: DashMap<Uuid, Campaign>,
}

impl Default for CampaignStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CampaignStore {
    pub fn new() -> Self {
        Self {
            campaigns: DashMap::new(),
        }
    }

    // ─── Creation ──────────────────────────────────────────────────────────

    pub fn create(&self, owner: &Account, spec: NewCampaign) -> CoreResult<Campaign> {
        if let Err(msg) = validate_spec(&spec) {
            return Err(CoreError::Validation(msg.to_string()));
        }

        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            owner_id: owner.id,
            name: spec.name,
            message: spec.message,
            recipients: spec.recipients,
            attachments: spec.attachments,
            campaign_type: spec.campaign_type,
            button: spec.button,
            status: CampaignStatus::Pending,
            deducted_credits: 0,
            created_at: now,
            last_changed_at: now,
        };
        self.campaigns.insert(campaign.id, campaign.clone());
        info!(
            campaign_id = %campaign.id,
            owner_id = %owner.id,
            name = %campaign.name,
            "Campaign created"
        );
        Ok(campaign)
    }

    // ─── Lookups ───────────────────────────────────────────────────────────

    pub fn get(&self, id: Uuid) -> CoreResult<Campaign> {
        self.campaigns
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| CoreError::NotFound(format!("campaign {id}")))
    }

    pub fn list_owned(&self, owner_id: Uuid) -> Vec<Campaign> {
        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .iter()
            .filter(|r| r.value().owner_id == owner_id)
            .map(|r| r.value().clone())
            .collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        campaigns
    }

    pub fn list_all(&self) -> Vec<Campaign> {
        let mut campaigns: Vec<Campaign> =
            self.campaigns.iter().map(|r| r.value().clone()).collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        campaigns
    }

    pub fn count_by_status(&self, status: CampaignStatus) -> u64 {
        self.campaigns
            .iter()
            .filter(|r| r.value().status == status)
            .count() as u64
    }

    pub fn count_all(&self) -> u64 {
        self.campaigns.len() as u64
    }

    // ─── Lifecycle ─────────────────────────────────────────────────────────

    /// Change a campaign's status. Authorization (owner or admin) and the
    /// strict transition table are both enforced inside a single entry guard,
    /// so concurrent status changes serialize per campaign.
    pub fn set_status(
        &self,
        actor: &Account,
        id: Uuid,
        new_status: CampaignStatus,
    ) -> CoreResult<Campaign> {
        let Some(mut entry) = self.campaigns.get_mut(&id) else {
            return Err(missing_campaign(actor, id));
        };
        let campaign = entry.value_mut();

        if let Decision::Deny(reason) =
            policy::authorize(actor, Action::Modify, &Target::Campaign(campaign))
        {
            warn!(actor_id = %actor.id, campaign_id = %id, reason, "Status change denied");
            return Err(CoreError::denied(reason));
        }

        if !campaign.status.can_transition(new_status) {
            return Err(CoreError::InvalidTransition(format!(
                "{} -> {}",
                campaign.status.as_str(),
                new_status.as_str()
            )));
        }

        campaign.status = new_status;
        campaign.last_changed_at = Utc::now();
        info!(
            campaign_id = %id,
            actor_id = %actor.id,
            status = new_status.as_str(),
            "Campaign status changed"
        );
        Ok(campaign.clone())
    }

    /// Add to a campaign's deducted-credits running total. The terminal-state
    /// check happens inside the entry guard so a concurrent cancellation
    /// cannot slip between check and apply. Called by the credit ledger.
    pub fn add_deducted(&self, id: Uuid, amount: i64) -> CoreResult<i64> {
        let mut entry = self
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("campaign {id}")))?;
        let campaign = entry.value_mut();
        if campaign.status.is_terminal() {
            return Err(CoreError::InvalidState(format!(
                "campaign is {}",
                campaign.status.as_str()
            )));
        }
        campaign.deducted_credits = campaign.deducted_credits.checked_add(amount).ok_or_else(
            || CoreError::Validation("deduction overflows the campaign running total".to_string()),
        )?;
        campaign.last_changed_at = Utc::now();
        Ok(campaign.deducted_credits)
    }
}

/// Missing targets surface as `Denied` for non-admin actors so a caller
/// cannot probe which campaign ids exist.
fn missing_campaign(actor: &Account, id: Uuid) -> CoreError {
    if actor.role == Role::Admin {
        CoreError::NotFound(format!("campaign {id}"))
    } else {
        CoreError::denied("campaign does not exist or is not visible to this actor")
    }
}

// ─── Validation ────────────────────────────────────────────────────────────

fn validate_spec(spec: &NewCampaign) -> Result<(), &'static str> {
    if spec.name.is_empty() || spec.name.len() > MAX_NAME_LEN {
        return Err("campaign name is required");
    }
    if spec.message.is_empty() || spec.message.len() > MAX_MESSAGE_LEN {
        return Err("campaign message is required");
    }
    if spec.recipients.is_empty() && spec.attachments.is_empty() {
        return Err("campaign needs recipient numbers or a recipient file");
    }
    match spec.campaign_type {
        CampaignType::WithButton => {
            let Some(button) = &spec.button else {
                return Err("with_button campaigns require button metadata");
            };
            if button.title.is_empty() {
                return Err("button title is required");
            }
            if button.url.is_none() && button.phone_number.is_none() {
                return Err("button requires a url or a phone number");
            }
        }
        CampaignType::WithoutButton => {
            if spec.button.is_some() {
                return Err("button metadata is only valid for with_button campaigns");
            }
        }
    }
    Ok(())
}
