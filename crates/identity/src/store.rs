//! In-memory identity store backed by DashMap.
//!
//! Production: replace with PostgreSQL (sqlx) or similar ACID store.
//! This provides the same API surface for development and testing.

use blastline_core::error::{CoreError, CoreResult};
use blastline_core::types::{Account, Credential, Role};
use blastline_platform::auth;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

/// Maximum username/email field lengths accepted at the boundary.
const MAX_NAME_LEN: usize = 64;
const MAX_EMAIL_LEN: usize = 254;

/// Profile fields for account creation. The referrer is never part of this:
/// it is resolved from the caller's own identity.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub mobile_number: String,
    pub role: Role,
}

/// Thread-safe account + credential store with a unique mobile-number index.
///
/// The mobile index is claimed through the DashMap `entry` API so two
/// concurrent registrations of the same number cannot both succeed.
pub struct AccountStore {
    accounts: DashMap<Uuid, Account>,
    mobile_index: DashMap<String, Uuid>,
    credentials: DashMap<String, Credential>,
    /// Serializes first-admin bootstrap so the roster check and the creation
    /// happen as one step.
    bootstrap_lock: parking_lot::Mutex<()>,
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore {
    pub fn new() -> Self {
        info!("Account store initialized (in-memory, development mode)");
        Self {
            accounts: DashMap::new(),
            mobile_index: DashMap::new(),
            credentials: DashMap::new(),
            bootstrap_lock: parking_lot::Mutex::new(()),
        }
    }

    // ─── Creation ──────────────────────────────────────────────────────────

    /// Create an account together with its credential row. Credits start at
    /// zero. Fails with `Validation` on malformed fields, `Conflict` when the
    /// mobile number is already registered.
    pub fn create_account(
        &self,
        profile: NewAccount,
        password: &str,
        confirm_password: &str,
        referrer_id: Option<Uuid>,
    ) -> CoreResult<Account> {
        if let Err(msg) = validate_profile(&profile) {
            return Err(CoreError::Validation(msg.to_string()));
        }
        if let Err(msg) = validate_password(password) {
            return Err(CoreError::Validation(msg.to_string()));
        }
        if password != confirm_password {
            return Err(CoreError::Validation(
                "password confirmation does not match password".to_string(),
            ));
        }

        let id = Uuid::new_v4();

        // Claim the mobile number first; this is the uniqueness point under
        // concurrent registration.
        match self.mobile_index.entry(profile.mobile_number.clone()) {
            Entry::Occupied(_) => {
                return Err(CoreError::Conflict(format!(
                    "mobile number {} is already registered",
                    profile.mobile_number
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let now = Utc::now();
        let account = Account {
            id,
            username: profile.username,
            email: profile.email,
            mobile_number: profile.mobile_number.clone(),
            role: profile.role,
            credits: 0,
            referrer_id,
            created_at: now,
            last_changed_at: now,
        };
        self.credentials.insert(
            profile.mobile_number.clone(),
            Credential {
                mobile_number: profile.mobile_number,
                password_hash: auth::hash_password(password),
            },
        );
        self.accounts.insert(id, account.clone());

        info!(
            account_id = %account.id,
            role = account.role.as_str(),
            referrer = ?account.referrer_id,
            "Account created"
        );
        Ok(account)
    }

    /// Mint the very first admin account, with no referrer. The empty-roster
    /// check and the creation run under one lock, so two concurrent
    /// unauthenticated registrations cannot both succeed. Denied once any
    /// admin exists, or for a non-admin role.
    pub fn create_bootstrap_admin(
        &self,
        profile: NewAccount,
        password: &str,
        confirm_password: &str,
    ) -> CoreResult<Account> {
        let _guard = self.bootstrap_lock.lock();
        if profile.role != Role::Admin {
            return Err(CoreError::denied(
                "unauthenticated registration mints only an admin",
            ));
        }
        if self.count_by_role(Role::Admin) > 0 {
            return Err(CoreError::denied("an admin account already exists"));
        }
        self.create_account(profile, password, confirm_password, None)
    }

    // ─── Lookups ───────────────────────────────────────────────────────────

    pub fn find_by_id(&self, id: Uuid) -> CoreResult<Account> {
        self.accounts
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| CoreError::NotFound(format!("account {id}")))
    }

    pub fn find_by_mobile(&self, mobile_number: &str) -> CoreResult<Account> {
        let id = self
            .mobile_index
            .get(mobile_number)
            .map(|r| *r.value())
            .ok_or_else(|| CoreError::NotFound("account for mobile number".to_string()))?;
        self.find_by_id(id)
    }

    /// Stored password hash for a mobile number, for credential verification.
    pub fn password_hash(&self, mobile_number: &str) -> Option<String> {
        self.credentials
            .get(mobile_number)
            .map(|c| c.password_hash.clone())
    }

    // ─── Listing ───────────────────────────────────────────────────────────

    pub fn list_all(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.accounts.iter().map(|r| r.value().clone()).collect();
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        accounts
    }

    /// Accounts directly referred by the given account, newest first.
    pub fn list_referred(&self, referrer_id: Uuid) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .filter(|r| r.value().referrer_id == Some(referrer_id))
            .map(|r| r.value().clone())
            .collect();
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        accounts
    }

    pub fn count_by_role(&self, role: Role) -> u64 {
        self.accounts.iter().filter(|r| r.value().role == role).count() as u64
    }

    pub fn count_all(&self) -> u64 {
        self.accounts.len() as u64
    }

    // ─── Mutation ──────────────────────────────────────────────────────────

    /// Delete an account and its credential row together.
    pub fn delete_account(&self, id: Uuid) -> CoreResult<()> {
        let (_, account) = self
            .accounts
            .remove(&id)
            .ok_or_else(|| CoreError::NotFound(format!("account {id}")))?;
        self.mobile_index.remove(&account.mobile_number);
        self.credentials.remove(&account.mobile_number);
        info!(account_id = %id, "Account deleted");
        Ok(())
    }

    /// Verify the old password and store a hash of the new one.
    pub fn change_password(
        &self,
        mobile_number: &str,
        old_password: &str,
        new_password: &str,
    ) -> CoreResult<()> {
        let stored = self
            .password_hash(mobile_number)
            .ok_or_else(|| CoreError::NotFound("credentials for mobile number".to_string()))?;
        if !auth::verify_password(old_password, &stored) {
            return Err(CoreError::InvalidCredentials);
        }
        if let Err(msg) = validate_password(new_password) {
            return Err(CoreError::Validation(msg.to_string()));
        }

        if let Some(mut cred) = self.credentials.get_mut(mobile_number) {
            cred.password_hash = auth::hash_password(new_password);
        }
        if let Some(id) = self.mobile_index.get(mobile_number).map(|r| *r.value()) {
            if let Some(mut account) = self.accounts.get_mut(&id) {
                account.last_changed_at = Utc::now();
            }
        }
        info!(mobile = mobile_number, "Password changed");
        Ok(())
    }

    /// Apply a signed delta to an account balance as a single conditional
    /// update inside the entry guard: the balance never goes negative and a
    /// concurrent writer cannot see a partial state.
    pub fn apply_balance_delta(&self, id: Uuid, delta: i64) -> CoreResult<i64> {
        let mut entry = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("account {id}")))?;
        let account = entry.value_mut();
        let new_balance = account.credits.checked_add(delta).ok_or_else(|| {
            CoreError::Validation("credit change overflows the balance".to_string())
        })?;
        if new_balance < 0 {
            return Err(CoreError::InsufficientCredits(format!(
                "balance is {} but {} was requested",
                account.credits, -delta
            )));
        }
        account.credits = new_balance;
        account.last_changed_at = Utc::now();
        Ok(new_balance)
    }

    pub fn credit_balance(&self, id: Uuid) -> CoreResult<i64> {
        self.find_by_id(id).map(|a| a.credits)
    }
}

// ─── Validation ────────────────────────────────────────────────────────────

fn validate_profile(profile: &NewAccount) -> Result<(), &'static str> {
    if profile.username.is_empty() || profile.username.len() > MAX_NAME_LEN {
        return Err("username is required");
    }
    if !profile.username.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err("username must contain only letters");
    }
    validate_email(&profile.email)?;
    validate_mobile(&profile.mobile_number)?;
    Ok(())
}

fn validate_mobile(mobile: &str) -> Result<(), &'static str> {
    if mobile.len() != 10 || !mobile.chars().all(|c| c.is_ascii_digit()) {
        return Err("mobile number must be exactly 10 digits");
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.is_empty() || email.len() > MAX_EMAIL_LEN {
        return Err("invalid email address");
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err("invalid email address");
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.ends_with('.') {
        return Err("invalid email address");
    }
    Ok(())
}

/// Password policy: at least 8 characters with upper, lower, digit, and
/// symbol.
fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("password must be at least 8 characters long");
    }
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_ascii_alphanumeric());
    if !(has_lower && has_upper && has_digit && has_symbol) {
        return Err("password must contain upper and lower case letters, a digit, and a symbol");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(mobile: &str) -> NewAccount {
        NewAccount {
            username: "alice".into(),
            email: "alice@example.com".into(),
            mobile_number: mobile.into(),
            role: Role::User,
        }
    }

    const GOOD_PW: &str = "Str0ng!pass";

    #[test]
    fn create_account_starts_with_zero_credits() {
        let store = AccountStore::new();
        let account = store
            .create_account(profile("9876543210"), GOOD_PW, GOOD_PW, None)
            .unwrap();
        assert_eq!(account.credits, 0);
        assert_eq!(account.role, Role::User);
        assert!(account.referrer_id.is_none());

        let found = store.find_by_mobile("9876543210").unwrap();
        assert_eq!(found.id, account.id);
    }

    #[test]
    fn duplicate_mobile_is_a_conflict() {
        let store = AccountStore::new();
        store
            .create_account(profile("9876543210"), GOOD_PW, GOOD_PW, None)
            .unwrap();
        let err = store
            .create_account(profile("9876543210"), GOOD_PW, GOOD_PW, None)
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn bootstrap_admin_requires_admin_role_and_an_empty_roster() {
        let store = AccountStore::new();

        // Role must be admin.
        let err = store
            .create_bootstrap_admin(profile("9000000001"), GOOD_PW, GOOD_PW)
            .unwrap_err();
        assert!(matches!(err, CoreError::Denied { .. }));

        let mut admin = profile("9000000001");
        admin.role = Role::Admin;
        store
            .create_bootstrap_admin(admin, GOOD_PW, GOOD_PW)
            .unwrap();

        // Once an admin exists the path is closed for good.
        let mut second = profile("9000000002");
        second.role = Role::Admin;
        let err = store
            .create_bootstrap_admin(second, GOOD_PW, GOOD_PW)
            .unwrap_err();
        assert!(matches!(err, CoreError::Denied { .. }));
        assert_eq!(store.count_by_role(Role::Admin), 1);
    }

    #[test]
    fn concurrent_bootstrap_mints_exactly_one_admin() {
        let store = std::sync::Arc::new(AccountStore::new());
        let mut p1 = profile("9000000001");
        p1.role = Role::Admin;
        let mut p2 = profile("9000000002");
        p2.role = Role::Admin;

        let (s1, s2) = (store.clone(), store.clone());
        let t1 = std::thread::spawn(move || s1.create_bootstrap_admin(p1, GOOD_PW, GOOD_PW));
        let t2 = std::thread::spawn(move || s2.create_bootstrap_admin(p2, GOOD_PW, GOOD_PW));
        let results = [t1.join().unwrap(), t2.join().unwrap()];

        let minted = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(minted, 1, "exactly one bootstrap admin may be minted");
        assert_eq!(store.count_by_role(Role::Admin), 1);
        for result in &results {
            if let Err(err) = result {
                assert!(matches!(err, CoreError::Denied { .. }));
            }
        }
    }

    #[test]
    fn balance_delta_overflow_is_rejected() {
        let store = AccountStore::new();
        let account = store
            .create_account(profile("9876543210"), GOOD_PW, GOOD_PW, None)
            .unwrap();
        store.apply_balance_delta(account.id, i64::MAX).unwrap();

        let err = store.apply_balance_delta(account.id, 1).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(store.credit_balance(account.id).unwrap(), i64::MAX);
    }

    #[test]
    fn field_validation_failures() {
        let store = AccountStore::new();

        let mut bad = profile("98765");
        assert!(matches!(
            store.create_account(bad.clone(), GOOD_PW, GOOD_PW, None),
            Err(CoreError::Validation(_))
        ));

        bad = profile("9876543210");
        bad.email = "not-an-email".into();
        assert!(matches!(
            store.create_account(bad, GOOD_PW, GOOD_PW, None),
            Err(CoreError::Validation(_))
        ));

        let mut bad = profile("9876543210");
        bad.username = "alice99".into();
        assert!(matches!(
            store.create_account(bad, GOOD_PW, GOOD_PW, None),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn password_policy_is_enforced() {
        let store = AccountStore::new();
        for weak in ["Sh0rt!a", "alllowercase1!", "NOLOWERCASE1!", "NoDigits!!", "NoSymbol11"] {
            let err = store.create_account(profile("9876543210"), weak, weak, None);
            assert!(matches!(err, Err(CoreError::Validation(_))), "{weak}");
        }

        let err = store
            .create_account(profile("9876543211"), GOOD_PW, "Different1!", None)
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn delete_removes_credential_and_index() {
        let store = AccountStore::new();
        let account = store
            .create_account(profile("9876543210"), GOOD_PW, GOOD_PW, None)
            .unwrap();
        store.delete_account(account.id).unwrap();

        assert!(matches!(store.find_by_id(account.id), Err(CoreError::NotFound(_))));
        assert!(store.password_hash("9876543210").is_none());
        // Number is free to register again.
        assert!(store
            .create_account(profile("9876543210"), GOOD_PW, GOOD_PW, None)
            .is_ok());
    }

    #[test]
    fn balance_delta_is_conditional() {
        let store = AccountStore::new();
        let account = store
            .create_account(profile("9876543210"), GOOD_PW, GOOD_PW, None)
            .unwrap();

        assert_eq!(store.apply_balance_delta(account.id, 50).unwrap(), 50);
        let err = store.apply_balance_delta(account.id, -60).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientCredits(_)));
        // Rejected delta leaves the balance untouched.
        assert_eq!(store.credit_balance(account.id).unwrap(), 50);
        assert_eq!(store.apply_balance_delta(account.id, -50).unwrap(), 0);
    }

    #[test]
    fn change_password_verifies_the_old_one() {
        let store = AccountStore::new();
        store
            .create_account(profile("9876543210"), GOOD_PW, GOOD_PW, None)
            .unwrap();

        let err = store
            .change_password("9876543210", "Wrong1!pw", "NewStr0ng!pw")
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidCredentials));

        store
            .change_password("9876543210", GOOD_PW, "NewStr0ng!pw")
            .unwrap();
        let hash = store.password_hash("9876543210").unwrap();
        assert!(blastline_platform::auth::verify_password("NewStr0ng!pw", &hash));
    }

    #[test]
    fn referred_listing_is_scoped_and_newest_first() {
        let store = AccountStore::new();
        let reseller = store
            .create_account(
                NewAccount {
                    username: "res".into(),
                    email: "res@example.com".into(),
                    mobile_number: "9000000001".into(),
                    role: Role::Reseller,
                },
                GOOD_PW,
                GOOD_PW,
                None,
            )
            .unwrap();
        let u1 = store
            .create_account(profile("9000000002"), GOOD_PW, GOOD_PW, Some(reseller.id))
            .unwrap();
        let _other = store
            .create_account(profile("9000000003"), GOOD_PW, GOOD_PW, None)
            .unwrap();

        let referred = store.list_referred(reseller.id);
        assert_eq!(referred.len(), 1);
        assert_eq!(referred[0].id, u1.id);
    }
}
