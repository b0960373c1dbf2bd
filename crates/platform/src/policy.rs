//! The authorization policy: one pure, order-sensitive decision function for
//! the admin > reseller > user hierarchy.
//!
//! Every mutation boundary calls [`authorize`] with a freshly-read actor
//! snapshot. There are no inline role checks anywhere else.

use blastline_core::types::{Account, Campaign, Role};

/// What the actor wants to do to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Modify,
}

/// The entity being acted upon. `NewAccount` covers creation, where no target
/// record exists yet.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Account(&'a Account),
    Campaign(&'a Campaign),
    NewAccount(Role),
}

/// Outcome of an authorization check. The deny reason is internal
/// diagnostics; callers convert it to an opaque `Denied` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Evaluate the hierarchy rules, in order:
///
/// 1. An admin may act on any target.
/// 2. A reseller may read/modify a user or reseller account it directly
///    referred (`target.referrer_id == actor.id`; not transitive).
/// 3. A reseller may create new user or reseller accounts.
/// 4. A user may act only on their own account and their own campaigns.
/// 5. Everything else is denied.
///
/// Rule 1 short-circuits the rest, so the ordering is load-bearing.
pub fn authorize(actor: &Account, action: Action, target: &Target) -> Decision {
    // Rule 1: admin override.
    if actor.role == Role::Admin {
        return Decision::Allow;
    }

    if actor.role == Role::Reseller {
        match target {
            // Rule 2: direct referrals only. Acting on itself is always in
            // scope (own profile, password, balance reads).
            Target::Account(acct) => {
                if acct.referrer_id == Some(actor.id) || acct.id == actor.id {
                    return Decision::Allow;
                }
                return Decision::Deny("target is not a direct referral of this reseller");
            }
            // Rule 3: resellers create users and resellers freely.
            Target::NewAccount(Role::User) | Target::NewAccount(Role::Reseller) => {
                return Decision::Allow;
            }
            Target::NewAccount(Role::Admin) => {
                return Decision::Deny("resellers cannot create admin accounts");
            }
            Target::Campaign(campaign) => {
                if campaign.owner_id == actor.id {
                    return Decision::Allow;
                }
                return Decision::Deny("campaign is not owned by this reseller");
            }
        }
    }

    // Rule 4: users touch only themselves and their own campaigns.
    if actor.role == Role::User {
        match target {
            Target::Account(acct) if acct.id == actor.id => return Decision::Allow,
            Target::Campaign(campaign) if campaign.owner_id == actor.id => {
                return Decision::Allow
            }
            _ => {
                return Decision::Deny(match action {
                    Action::Read => "users may only read their own records",
                    Action::Modify => "users may only modify their own records",
                })
            }
        }
    }

    // Rule 5: default deny.
    Decision::Deny("no rule permits this action")
}

#[cfg(test)]
mod tests {
    use super::*;
    use blastline_core::types::{CampaignStatus, CampaignType};
    use chrono::Utc;
    use uuid::Uuid;

    fn account(role: Role, referrer: Option<Uuid>) -> Account {
        let now = Utc::now();
        Account {
            id: Uuid::new_v4(),
            username: "test".into(),
            email: "test@example.com".into(),
            mobile_number: "9876543210".into(),
            role,
            credits: 0,
            referrer_id: referrer,
            created_at: now,
            last_changed_at: now,
        }
    }

    fn campaign(owner: Uuid) -> Campaign {
        let now = Utc::now();
        Campaign {
            id: Uuid::new_v4(),
            owner_id: owner,
            name: "launch".into(),
            message: "hello".into(),
            recipients: vec![],
            attachments: vec![],
            campaign_type: CampaignType::WithoutButton,
            button: None,
            status: CampaignStatus::Pending,
            deducted_credits: 0,
            created_at: now,
            last_changed_at: now,
        }
    }

    #[test]
    fn admin_short_circuits_everything() {
        let admin = account(Role::Admin, None);
        let stranger = account(Role::User, Some(Uuid::new_v4()));
        assert!(authorize(&admin, Action::Modify, &Target::Account(&stranger)).is_allowed());
        assert!(authorize(&admin, Action::Modify, &Target::Campaign(&campaign(stranger.id))).is_allowed());
        assert!(authorize(&admin, Action::Read, &Target::NewAccount(Role::Admin)).is_allowed());
    }

    #[test]
    fn reseller_sees_only_direct_referrals() {
        let reseller = account(Role::Reseller, None);
        let referred = account(Role::User, Some(reseller.id));
        let other_reseller = account(Role::Reseller, None);
        let foreign = account(Role::User, Some(other_reseller.id));

        assert!(authorize(&reseller, Action::Read, &Target::Account(&referred)).is_allowed());
        assert!(authorize(&reseller, Action::Modify, &Target::Account(&referred)).is_allowed());
        assert!(!authorize(&reseller, Action::Modify, &Target::Account(&foreign)).is_allowed());
        assert!(!authorize(&reseller, Action::Read, &Target::Account(&other_reseller)).is_allowed());
    }

    #[test]
    fn reseller_referral_is_not_transitive() {
        let top = account(Role::Reseller, None);
        let mid = account(Role::Reseller, Some(top.id));
        let leaf = account(Role::User, Some(mid.id));

        assert!(authorize(&top, Action::Modify, &Target::Account(&mid)).is_allowed());
        // leaf is referred by mid, not top: no transitive visibility.
        assert!(!authorize(&top, Action::Modify, &Target::Account(&leaf)).is_allowed());
    }

    #[test]
    fn reseller_creates_users_and_resellers_but_not_admins() {
        let reseller = account(Role::Reseller, None);
        assert!(authorize(&reseller, Action::Modify, &Target::NewAccount(Role::User)).is_allowed());
        assert!(authorize(&reseller, Action::Modify, &Target::NewAccount(Role::Reseller)).is_allowed());
        assert!(!authorize(&reseller, Action::Modify, &Target::NewAccount(Role::Admin)).is_allowed());
    }

    #[test]
    fn user_is_scoped_to_self() {
        let user = account(Role::User, None);
        let other = account(Role::User, None);
        let own_campaign = campaign(user.id);
        let foreign_campaign = campaign(other.id);

        assert!(authorize(&user, Action::Modify, &Target::Account(&user)).is_allowed());
        assert!(authorize(&user, Action::Modify, &Target::Campaign(&own_campaign)).is_allowed());
        assert!(!authorize(&user, Action::Read, &Target::Account(&other)).is_allowed());
        assert!(!authorize(&user, Action::Modify, &Target::Campaign(&foreign_campaign)).is_allowed());
        assert!(!authorize(&user, Action::Modify, &Target::NewAccount(Role::User)).is_allowed());
    }
}
