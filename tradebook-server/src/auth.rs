//! Basic-auth gating for the trading and admin realms.
//!
//! The trading realm checks credentials against the `Users` sheet and then
//! runs every accepted credential pair through a per-pair login record that
//! alternates between granting and denying. The first request with a pair is
//! always granted, the next one is denied, the one after that granted, and
//! so on for the life of the process.
//!
//! The admin realm is a fixed credential check with no state.

use std::sync::Arc;

use axum::http::request::Parts;
use axum::extract::FromRequestParts;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use headers::authorization::Basic;
use headers::{Authorization, HeaderMapExt};
use scc::hash_map::Entry;
use tracing::info;
use tradebook_sheets::{SheetsError, User};

use crate::AppState;
use crate::error::AppError;
use crate::helpers::eq_ignore_case;
use crate::store::CredentialStore;

pub const TRADING_REALM: &str = "Trading Auth";
pub const ADMIN_REALM: &str = "Admin Auth";

const ADMIN_USERNAME: &str = "admin";
const ADMIN_PASSWORD: &str = "admin";

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// What a login attempt did to its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// First attempt with this pair; granted.
    Created,
    Granted,
    Denied,
}

struct LoginRecord {
    #[cfg_attr(not(test), allow(dead_code))]
    user: User,
    /// Deny the next attempt with this pair.
    blocked: bool,
}

/// Map key for a credential pair. Matching is case-insensitive, so the
/// pair is lowercased before encoding and differently-cased submissions of
/// the same credentials share one record.
pub fn credential_key(name: &str, password: &str) -> String {
    STANDARD.encode(format!("{}:{}", name.to_lowercase(), password.to_lowercase()))
}

/// Per-credential login records, kept for the life of the process.
pub struct LoginTracker {
    records: scc::HashMap<String, LoginRecord>,
}

impl LoginTracker {
    pub fn new() -> Self {
        Self {
            records: scc::HashMap::new(),
        }
    }

    /// Advance the record for `key` by one attempt. The entry stays locked
    /// for the whole read-modify-write.
    pub async fn attempt(&self, key: String, user: &User) -> LoginOutcome {
        match self.records.entry_async(key).await {
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                record.user = user.clone();
                if record.blocked {
                    record.blocked = false;
                    LoginOutcome::Denied
                } else {
                    record.blocked = true;
                    LoginOutcome::Granted
                }
            }
            Entry::Vacant(entry) => {
                entry.insert_entry(LoginRecord {
                    user: user.clone(),
                    blocked: true,
                });
                LoginOutcome::Created
            }
        }
    }

    /// Whether the next attempt for `key` will be denied, if a record exists.
    #[cfg(test)]
    pub(crate) async fn is_blocked(&self, key: &str) -> Option<bool> {
        self.records.read_async(key, |_, record| record.blocked).await
    }

    /// Username stored with the record for `key`.
    #[cfg(test)]
    pub(crate) async fn user_for(&self, key: &str) -> Option<String> {
        self.records
            .read_async(key, |_, record| record.user.username.clone())
            .await
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for LoginTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Credential check for the trading realm.
pub struct AuthGate {
    store: Arc<dyn CredentialStore>,
    logins: LoginTracker,
}

impl AuthGate {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            logins: LoginTracker::new(),
        }
    }

    /// `Ok(None)` is a normal denial; errors only come from loading users.
    pub async fn authenticate(
        &self,
        name: &str,
        password: &str,
    ) -> Result<Option<Principal>, SheetsError> {
        let Some(user) = self.store.find_user(name).await? else {
            return Ok(None);
        };
        if !self.store.password_matches(&user, password) {
            return Ok(None);
        }

        let key = credential_key(name, password);
        let principal = match self.logins.attempt(key, &user).await {
            LoginOutcome::Created => {
                info!("Created login for {}", user.username);
                Some(Principal::new(&user.username))
            }
            LoginOutcome::Granted => {
                info!("Granted login for {}", user.username);
                Some(Principal::new(&user.username))
            }
            LoginOutcome::Denied => {
                info!("Denied login for {}", user.username);
                None
            }
        };
        Ok(principal)
    }

    #[cfg(test)]
    pub(crate) fn logins(&self) -> &LoginTracker {
        &self.logins
    }
}

/// Fixed credential check for the admin realm.
pub fn admin_auth(name: &str, password: &str) -> Option<Principal> {
    (eq_ignore_case(name, ADMIN_USERNAME) && eq_ignore_case(password, ADMIN_PASSWORD))
        .then(|| Principal::new(name))
}

fn basic_credentials(parts: &Parts) -> Option<(String, String)> {
    let auth = parts.headers.typed_get::<Authorization<Basic>>()?;
    Some((auth.username().to_string(), auth.password().to_string()))
}

/// Caller authenticated against the trading realm.
pub struct TradingUser(pub Principal);

impl FromRequestParts<Arc<AppState>> for TradingUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let (name, password) =
            basic_credentials(parts).ok_or(AppError::Unauthorized(TRADING_REALM))?;
        state
            .gate
            .authenticate(&name, &password)
            .await?
            .map(TradingUser)
            .ok_or(AppError::Unauthorized(TRADING_REALM))
    }
}

/// Caller authenticated against the admin realm.
pub struct AdminUser(pub Principal);

impl<S: Send + Sync> FromRequestParts<S> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        basic_credentials(parts)
            .and_then(|(name, password)| admin_auth(&name, &password))
            .map(AdminUser)
            .ok_or(AppError::Unauthorized(ADMIN_REALM))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedUsers(Vec<User>);

    #[async_trait]
    impl CredentialStore for FixedUsers {
        async fn find_user(&self, name: &str) -> Result<Option<User>, SheetsError> {
            Ok(self
                .0
                .iter()
                .find(|u| eq_ignore_case(&u.username, name))
                .cloned())
        }

        fn password_matches(&self, user: &User, presented: &str) -> bool {
            eq_ignore_case(&user.password, presented)
        }
    }

    fn gate() -> AuthGate {
        AuthGate::new(Arc::new(FixedUsers(vec![
            User::new("alice", "secret"),
            User::new("bob", "hunter2"),
            User::new("Alice", "other"),
        ])))
    }

    async fn granted(gate: &AuthGate, name: &str, password: &str) -> bool {
        gate.authenticate(name, password).await.unwrap().is_some()
    }

    #[tokio::test]
    async fn test_alternates_grant_and_deny() {
        let gate = gate();
        let pattern: Vec<bool> = {
            let mut out = Vec::new();
            for _ in 0..6 {
                out.push(granted(&gate, "alice", "secret").await);
            }
            out
        };
        assert_eq!(pattern, vec![true, false, true, false, true, false]);
    }

    #[tokio::test]
    async fn test_case_insensitive_pair_shares_record() {
        let gate = gate();
        let principal = gate.authenticate("ALICE", "SECRET").await.unwrap();
        assert_eq!(principal, Some(Principal::new("alice")));

        assert!(!granted(&gate, "alice", "secret").await);
        assert!(granted(&gate, "alice", "secret").await);
        assert_eq!(gate.logins().len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_password_leaves_no_record() {
        let gate = gate();
        assert!(!granted(&gate, "alice", "wrong").await);
        assert!(gate.logins().is_empty());

        // First attempt with the right pair is still a fresh grant
        assert!(granted(&gate, "alice", "secret").await);
    }

    #[tokio::test]
    async fn test_unknown_user_denied() {
        let gate = gate();
        assert!(!granted(&gate, "mallory", "secret").await);
        assert!(!granted(&gate, "mallory", "secret").await);
        assert!(gate.logins().is_empty());
    }

    #[tokio::test]
    async fn test_first_matching_username_wins() {
        let gate = gate();
        // "Alice"/"other" is shadowed by the earlier "alice" row
        assert!(!granted(&gate, "Alice", "other").await);
    }

    #[tokio::test]
    async fn test_records_are_per_pair() {
        let gate = gate();
        assert!(granted(&gate, "alice", "secret").await);
        assert!(granted(&gate, "bob", "hunter2").await);
        assert!(!granted(&gate, "alice", "secret").await);
        assert!(!granted(&gate, "bob", "hunter2").await);
        assert_eq!(gate.logins().len(), 2);
    }

    #[tokio::test]
    async fn test_tracker_state_transitions() {
        let tracker = LoginTracker::new();
        let user = User::new("alice", "secret");
        let key = credential_key("alice", "secret");

        assert_eq!(tracker.is_blocked(&key).await, None);
        assert_eq!(tracker.attempt(key.clone(), &user).await, LoginOutcome::Created);
        assert_eq!(tracker.is_blocked(&key).await, Some(true));
        assert_eq!(tracker.attempt(key.clone(), &user).await, LoginOutcome::Denied);
        assert_eq!(tracker.is_blocked(&key).await, Some(false));
        assert_eq!(tracker.attempt(key.clone(), &user).await, LoginOutcome::Granted);
        assert_eq!(tracker.is_blocked(&key).await, Some(true));
        assert_eq!(tracker.user_for(&key).await.as_deref(), Some("alice"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_attempts_split_evenly() {
        let gate = Arc::new(gate());
        let mut handles = Vec::new();
        for _ in 0..21 {
            let gate = Arc::clone(&gate);
            handles.push(tokio::spawn(async move {
                gate.authenticate("alice", "secret").await.unwrap().is_some()
            }));
        }

        let mut grants = 0;
        for handle in handles {
            if handle.await.unwrap() {
                grants += 1;
            }
        }
        assert_eq!(grants, 11);
    }

    #[test]
    fn test_credential_key_is_base64_of_pair() {
        assert_eq!(credential_key("alice", "secret"), "YWxpY2U6c2VjcmV0");
        assert_eq!(credential_key("ALICE", "Secret"), credential_key("alice", "secret"));
        assert_ne!(credential_key("alice", "secret"), credential_key("alice", "wrong"));
    }

    #[test]
    fn test_admin_auth() {
        for _ in 0..3 {
            assert_eq!(admin_auth("admin", "admin"), Some(Principal::new("admin")));
            assert!(admin_auth("ADMIN", "Admin").is_some());
            assert!(admin_auth("Admin", "WRONG").is_none());
        }
        assert!(admin_auth("root", "admin").is_none());
    }
}
