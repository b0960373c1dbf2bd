//! The credit ledger: two-sided transfers between referrer and referred
//! accounts, and one-sided deductions charged against a campaign.
//!
//! All balance mutations run inside one ledger-wide critical section, so two
//! concurrent drains of the same account serialize and the classic
//! lost-update interleaving is impossible. Balance preconditions are
//! re-checked inside the section against freshly-read records. Display reads
//! go straight to the stores and need no lock.

use blastline_campaigns::CampaignStore;
use blastline_core::error::{missing_account, CoreError, CoreResult};
use blastline_core::types::{Account, Role};
use blastline_identity::AccountStore;
use blastline_platform::policy::{self, Action, Decision, Target};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Post-transfer balances of both parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOutcome {
    pub actor_balance: i64,
    pub target_balance: i64,
}

/// Post-deduction owner balance and campaign running total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeductOutcome {
    pub owner_balance: i64,
    pub deducted_credits: i64,
}

pub struct CreditLedger {
    accounts: Arc<AccountStore>,
    campaigns: Arc<CampaignStore>,
    /// Serializes every balance mutation. A single ledger-wide lock rather
    /// than per-account locks: two-sided transfers would need a consistent
    /// lock order anyway, and the account population is small.
    write_lock: Mutex<()>,
}

impl CreditLedger {
    pub fn new(accounts: Arc<AccountStore>, campaigns: Arc<CampaignStore>) -> Self {
        Self {
            accounts,
            campaigns,
            write_lock: Mutex::new(()),
        }
    }

    /// Move credits between the actor and a directly-referred target (or any
    /// target, for admins). Positive `amount` grants actor -> target,
    /// negative reclaims target -> actor. Both balances move together or not
    /// at all.
    pub fn transfer(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
        amount: i64,
    ) -> CoreResult<TransferOutcome> {
        if amount == 0 {
            return Err(CoreError::Validation(
                "a non-zero credit change is required".to_string(),
            ));
        }
        if actor_id == target_id {
            return Err(CoreError::Validation(
                "cannot transfer credits to the same account".to_string(),
            ));
        }
        // i64::MIN has no absolute value; reject it before any arithmetic.
        let Some(magnitude) = amount.checked_abs() else {
            return Err(CoreError::Validation(
                "credit change is out of range".to_string(),
            ));
        };

        let _guard = self.write_lock.lock();

        // Fresh reads inside the critical section: roles and referral links
        // may have changed since the token was issued.
        let actor = self.resolve_actor(actor_id)?;
        let target = match self.accounts.find_by_id(target_id) {
            Ok(target) => target,
            Err(_) => return Err(missing_account(&actor, target_id)),
        };

        if let Decision::Deny(reason) =
            policy::authorize(&actor, Action::Modify, &Target::Account(&target))
        {
            warn!(actor_id = %actor.id, target_id = %target.id, reason, "Transfer denied");
            return Err(CoreError::denied(reason));
        }

        let (debit_id, credit_id) = if amount > 0 {
            (actor.id, target.id)
        } else {
            (target.id, actor.id)
        };

        // The debit is the conditional side; it fails without touching
        // anything when the balance is short.
        let debit_balance = self.accounts.apply_balance_delta(debit_id, -magnitude)?;
        let credit_balance = match self.accounts.apply_balance_delta(credit_id, magnitude) {
            Ok(balance) => balance,
            Err(err) => {
                // The credited account vanished under us (concurrent delete).
                // Undo the debit so no credits are destroyed.
                let _ = self.accounts.apply_balance_delta(debit_id, magnitude);
                return Err(err);
            }
        };

        let outcome = if amount > 0 {
            TransferOutcome {
                actor_balance: debit_balance,
                target_balance: credit_balance,
            }
        } else {
            TransferOutcome {
                actor_balance: credit_balance,
                target_balance: debit_balance,
            }
        };
        info!(
            actor_id = %actor.id,
            target_id = %target.id,
            amount,
            actor_balance = outcome.actor_balance,
            target_balance = outcome.target_balance,
            "Credits transferred"
        );
        Ok(outcome)
    }

    /// Charge a positive amount against a campaign: the owner's balance and
    /// the campaign's deducted-credits total move together. Rejected with
    /// `InvalidState` once the campaign is terminal; never changes status.
    pub fn deduct(
        &self,
        actor_id: Uuid,
        campaign_id: Uuid,
        amount: i64,
    ) -> CoreResult<DeductOutcome> {
        if amount <= 0 {
            return Err(CoreError::Validation(
                "a positive deduction amount is required".to_string(),
            ));
        }

        let _guard = self.write_lock.lock();

        let actor = self.resolve_actor(actor_id)?;
        if actor.role == Role::User {
            return Err(CoreError::denied(
                "only administrators and resellers may deduct campaign credits",
            ));
        }

        let campaign = match self.campaigns.get(campaign_id) {
            Ok(campaign) => campaign,
            Err(_) if actor.role == Role::Admin => {
                return Err(CoreError::NotFound(format!("campaign {campaign_id}")))
            }
            Err(_) => {
                return Err(CoreError::denied(
                    "campaign does not exist or is not visible to this actor",
                ))
            }
        };
        if campaign.status.is_terminal() {
            return Err(CoreError::InvalidState(format!(
                "campaign is {}",
                campaign.status.as_str()
            )));
        }

        let owner = match self.accounts.find_by_id(campaign.owner_id) {
            Ok(owner) => owner,
            Err(_) => return Err(missing_account(&actor, campaign.owner_id)),
        };

        // Same gate as every other mutation: admin, or reseller with a
        // direct referral link to the campaign owner.
        if let Decision::Deny(reason) =
            policy::authorize(&actor, Action::Modify, &Target::Account(&owner))
        {
            warn!(actor_id = %actor.id, campaign_id = %campaign.id, reason, "Deduction denied");
            return Err(CoreError::denied(reason));
        }

        let owner_balance = self.accounts.apply_balance_delta(owner.id, -amount)?;
        let deducted_credits = match self.campaigns.add_deducted(campaign.id, amount) {
            Ok(total) => total,
            Err(err) => {
                // Cancelled between our status check and the increment;
                // restore the owner's balance.
                let _ = self.accounts.apply_balance_delta(owner.id, amount);
                return Err(err);
            }
        };

        info!(
            actor_id = %actor.id,
            campaign_id = %campaign.id,
            amount,
            owner_balance,
            deducted_credits,
            "Campaign credits deducted"
        );
        Ok(DeductOutcome {
            owner_balance,
            deducted_credits,
        })
    }

    /// The acting identity must still exist; a stale token for a deleted
    /// account gets an opaque denial.
    fn resolve_actor(&self, actor_id: Uuid) -> CoreResult<Account> {
        self.accounts
            .find_by_id(actor_id)
            .map_err(|_| CoreError::denied("acting account no longer exists"))
    }
}
