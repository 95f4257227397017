//! Credential lookup for the trading realm.
//!
//! The login gate only needs two things from a backing store: find a user by
//! name and decide whether a presented password matches the stored one.
//! How passwords are stored is a [`PasswordScheme`] choice and never leaks
//! into the gate's state machine.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tradebook_sheets::{SheetsError, User};

use crate::helpers::eq_ignore_case;
use crate::sheet::TradingSheet;

/// How passwords in the `Users` dataset are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordScheme {
    /// Plaintext, compared case-insensitively.
    #[default]
    Plaintext,
    /// Hex SHA-256 of the lowercased password.
    Sha256,
}

impl PasswordScheme {
    pub fn matches(self, presented: &str, stored: &str) -> bool {
        match self {
            PasswordScheme::Plaintext => eq_ignore_case(presented, stored),
            PasswordScheme::Sha256 => hash_password(presented).eq_ignore_ascii_case(stored.trim()),
        }
    }
}

impl FromStr for PasswordScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plaintext" | "plain" => Ok(PasswordScheme::Plaintext),
            "sha256" => Ok(PasswordScheme::Sha256),
            other => Err(format!("unknown password scheme {other}")),
        }
    }
}

/// Digest stored in the sheet when the `sha256` scheme is in use.
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.to_lowercase().as_bytes()))
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// First user whose name matches `name` case-insensitively.
    async fn find_user(&self, name: &str) -> Result<Option<User>, SheetsError>;

    fn password_matches(&self, user: &User, presented: &str) -> bool;
}

/// Credentials read from the cached `Users` sheet.
pub struct SheetCredentialStore {
    sheet: Arc<TradingSheet>,
    scheme: PasswordScheme,
}

impl SheetCredentialStore {
    pub fn new(sheet: Arc<TradingSheet>, scheme: PasswordScheme) -> Self {
        Self { sheet, scheme }
    }
}

#[async_trait]
impl CredentialStore for SheetCredentialStore {
    async fn find_user(&self, name: &str) -> Result<Option<User>, SheetsError> {
        let users = self.sheet.users().await?;
        Ok(users
            .iter()
            .find(|user| eq_ignore_case(&user.username, name))
            .cloned())
    }

    fn password_matches(&self, user: &User, presented: &str) -> bool {
        self.scheme.matches(presented, &user.password)
    }
}
