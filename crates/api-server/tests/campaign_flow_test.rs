//! Integration test for the full platform flow: onboarding down the
//! admin -> reseller -> user hierarchy, credit distribution, the campaign
//! lifecycle, and per-campaign deduction.

use blastline_campaigns::{CampaignStore, NewCampaign};
use blastline_core::error::CoreError;
use blastline_core::types::{CampaignStatus, CampaignType, Role};
use blastline_identity::{AccountStore, NewAccount};
use blastline_ledger::CreditLedger;
use blastline_platform::auth::{self, AuthManager};
use std::sync::Arc;

const PW: &str = "Str0ng!pass";

fn new_account(role: Role, mobile: &str) -> NewAccount {
    NewAccount {
        username: "flowtest".into(),
        email: "flow@example.com".into(),
        mobile_number: mobile.into(),
        role,
    }
}

#[test]
fn full_campaign_flow() {
    let accounts = Arc::new(AccountStore::new());
    let campaigns = Arc::new(CampaignStore::new());
    let ledger = CreditLedger::new(accounts.clone(), campaigns.clone());

    // Onboard the hierarchy: admin -> reseller -> user.
    let admin = accounts
        .create_account(new_account(Role::Admin, "9000000001"), PW, PW, None)
        .unwrap();
    let reseller = accounts
        .create_account(
            new_account(Role::Reseller, "9000000002"),
            PW,
            PW,
            Some(admin.id),
        )
        .unwrap();
    let user = accounts
        .create_account(
            new_account(Role::User, "9000000003"),
            PW,
            PW,
            Some(reseller.id),
        )
        .unwrap();

    // Seed the admin's float, then push credits down the chain.
    accounts.apply_balance_delta(admin.id, 1000).unwrap();
    let out = ledger.transfer(admin.id, reseller.id, 100).unwrap();
    assert_eq!(out.actor_balance, 900);
    assert_eq!(out.target_balance, 100);

    let out = ledger.transfer(reseller.id, user.id, 30).unwrap();
    assert_eq!(out.actor_balance, 70);
    assert_eq!(out.target_balance, 30);

    // The user launches a campaign.
    let campaign = campaigns
        .create(
            &user,
            NewCampaign {
                name: "spring sale".into(),
                message: "big discounts".into(),
                recipients: vec!["9111111111".into(), "9222222222".into()],
                attachments: vec![],
                campaign_type: CampaignType::WithoutButton,
                button: None,
            },
        )
        .unwrap();
    assert_eq!(campaign.status, CampaignStatus::Pending);

    let campaign = campaigns
        .set_status(&user, campaign.id, CampaignStatus::Running)
        .unwrap();
    assert_eq!(campaign.status, CampaignStatus::Running);

    // The managing reseller charges the send against the user's balance.
    let out = ledger.deduct(reseller.id, campaign.id, 10).unwrap();
    assert_eq!(out.owner_balance, 20);
    assert_eq!(out.deducted_credits, 10);

    let campaign = campaigns
        .set_status(&user, campaign.id, CampaignStatus::Completed)
        .unwrap();
    assert_eq!(campaign.status, CampaignStatus::Completed);

    // Terminal campaigns accept neither transitions nor further charges.
    assert!(matches!(
        campaigns.set_status(&user, campaign.id, CampaignStatus::Running),
        Err(CoreError::InvalidTransition(_))
    ));
    assert!(matches!(
        ledger.deduct(reseller.id, campaign.id, 1),
        Err(CoreError::InvalidState(_))
    ));

    // Reclaim flows back up and nothing is minted or destroyed.
    let out = ledger.transfer(reseller.id, user.id, -5).unwrap();
    assert_eq!(out.actor_balance, 75);
    assert_eq!(out.target_balance, 15);

    let total: i64 = [admin.id, reseller.id, user.id]
        .iter()
        .map(|id| accounts.credit_balance(*id).unwrap())
        .sum();
    assert_eq!(total, 1000 - 10);
}

#[test]
fn login_session_lifecycle() {
    let accounts = AccountStore::new();
    let sessions = AuthManager::new();

    let account = accounts
        .create_account(new_account(Role::Reseller, "9000000009"), PW, PW, None)
        .unwrap();

    // Password verification against the stored credential.
    let stored = accounts.password_hash("9000000009").unwrap();
    assert!(auth::verify_password(PW, &stored));
    assert!(!auth::verify_password("Wr0ng!pass", &stored));

    // Issue, validate, revoke.
    let token = sessions.issue(account.id, &account.mobile_number, account.role);
    let validated = sessions.validate(&token.token).unwrap();
    assert_eq!(validated.account_id, account.id);
    assert_eq!(validated.role, Role::Reseller);

    assert!(sessions.revoke(&token.token));
    assert!(sessions.validate(&token.token).is_none());

    // Deleting the account invalidates future fresh reads even if a token
    // were still live.
    accounts.delete_account(account.id).unwrap();
    assert!(accounts.find_by_id(account.id).is_err());
    assert!(accounts.find_by_mobile("9000000009").is_err());
}
