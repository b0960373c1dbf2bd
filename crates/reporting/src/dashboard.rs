//! Dashboard aggregation — always computed fresh from the live stores.
//!
//! No caching and no materialized views: every call iterates current state.
//! The counts are snapshot-at-read and are not required to be transactionally
//! consistent with in-flight mutations.

use blastline_campaigns::CampaignStore;
use blastline_core::error::{CoreError, CoreResult};
use blastline_core::types::{Account, CampaignStatus, Role};
use blastline_identity::AccountStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub running_campaigns: u64,
    pub pending_campaigns: u64,
    pub total_campaigns: u64,
    pub user_count: u64,
    pub reseller_count: u64,
    pub account_count: u64,
    pub generated_at: DateTime<Utc>,
}

/// A reseller's view of its own referral tree: credits held by direct
/// referrals plus their count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResellerSummary {
    pub total_credits: i64,
    pub referred_count: u64,
}

pub struct ReportService {
    accounts: Arc<AccountStore>,
    campaigns: Arc<CampaignStore>,
}

impl ReportService {
    pub fn new(accounts: Arc<AccountStore>, campaigns: Arc<CampaignStore>) -> Self {
        Self { accounts, campaigns }
    }

    pub fn dashboard_stats(&self) -> DashboardStats {
        DashboardStats {
            running_campaigns: self.campaigns.count_by_status(CampaignStatus::Running),
            pending_campaigns: self.campaigns.count_by_status(CampaignStatus::Pending),
            total_campaigns: self.campaigns.count_all(),
            user_count: self.accounts.count_by_role(Role::User),
            reseller_count: self.accounts.count_by_role(Role::Reseller),
            account_count: self.accounts.count_all(),
            generated_at: Utc::now(),
        }
    }

    /// Reseller only: sum of direct referrals' balances and their count.
    pub fn reseller_summary(&self, actor: &Account) -> CoreResult<ResellerSummary> {
        if actor.role != Role::Reseller {
            warn!(actor_id = %actor.id, role = actor.role.as_str(), "Reseller summary denied");
            return Err(CoreError::denied(
                "only resellers may view the reseller credit summary",
            ));
        }
        let referred = self.accounts.list_referred(actor.id);
        Ok(ResellerSummary {
            total_credits: referred.iter().map(|a| a.credits).sum(),
            referred_count: referred.len() as u64,
        })
    }
}
