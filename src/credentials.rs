//! Credentials injected into the components that talk to external services.
//!
//! Values are read from the process environment exactly once, in
//! [`Credentials::from_env`], and then passed around explicitly. Every value is
//! held as a [`SecretString`] so it never shows up in `Debug` output or logs.

use crate::error::{ReleaseError, Result};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;

pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const SIGN_ALIAS: &str = "SIGN_ALIAS";
pub const SIGN_PASSWORD: &str = "SIGN_PASSWORD";
pub const STORAGE_TOKEN: &str = "ALIST_TOKEN";
pub const MESSAGING_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const FORUM_TOKEN: &str = "FORUMS_API_TOKEN";

/// Every credential a release may need. Absent values stay `None` until a
/// component calls [`Credentials::require`].
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    values: HashMap<&'static str, SecretString>,
}

impl Credentials {
    /// Read all known credential variables from the environment.
    ///
    /// Empty values are treated as absent.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build credentials from an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut credentials = Credentials::default();
        for name in [
            GITHUB_TOKEN,
            SIGN_ALIAS,
            SIGN_PASSWORD,
            STORAGE_TOKEN,
            MESSAGING_TOKEN,
            FORUM_TOKEN,
        ] {
            if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                credentials.values.insert(name, SecretString::from(value));
            }
        }
        credentials
    }

    /// Set one credential, replacing any existing value.
    pub fn with(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.values.insert(name, SecretString::from(value.into()));
        self
    }

    /// Get a credential or fail with a precondition error naming it.
    pub fn require(&self, name: &str) -> Result<SecretString> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| ReleaseError::credential(name))
    }

    /// A credential, or an empty secret when absent.
    ///
    /// For wiring clients up front; check presence with [`Credentials::require`]
    /// before the client is used.
    pub fn secret_or_empty(&self, name: &str) -> SecretString {
        self.values
            .get(name)
            .cloned()
            .unwrap_or_else(|| SecretString::from(String::new()))
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Signing credentials, failing if either part is missing.
    pub fn signing(&self) -> Result<SigningCredentials> {
        Ok(SigningCredentials {
            key_alias: self.require(SIGN_ALIAS)?,
            key_password: self.require(SIGN_PASSWORD)?,
        })
    }
}

/// Key alias and password for the signing keystore.
#[derive(Debug, Clone)]
pub struct SigningCredentials {
    pub key_alias: SecretString,
    pub key_password: SecretString,
}

impl SigningCredentials {
    pub fn new(alias: impl Into<String>, password: impl Into<String>) -> Self {
        SigningCredentials {
            key_alias: SecretString::from(alias.into()),
            key_password: SecretString::from(password.into()),
        }
    }

    pub fn alias(&self) -> &str {
        self.key_alias.expose_secret()
    }

    pub fn password(&self) -> &str {
        self.key_password.expose_secret()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_require_missing_names_variable() {
        let credentials = Credentials::default();
        let err = credentials.require(GITHUB_TOKEN).unwrap_err();
        assert_eq!(err.to_string(), "Missing credential: GITHUB_TOKEN");
    }

    #[test]
    fn test_empty_values_are_absent() {
        let credentials = Credentials::from_lookup(|name| {
            if name == SIGN_ALIAS {
                Some(String::new())
            } else {
                None
            }
        });
        assert!(!credentials.is_present(SIGN_ALIAS));
    }

    #[test]
    fn test_signing_requires_both_parts() {
        let credentials = Credentials::default().with(SIGN_ALIAS, "release");
        let err = credentials.signing().unwrap_err();
        assert!(err.to_string().contains(SIGN_PASSWORD));

        let credentials = credentials.with(SIGN_PASSWORD, "hunter2");
        let signing = credentials.signing().unwrap();
        assert_eq!(signing.alias(), "release");
        assert_eq!(signing.password(), "hunter2");
    }

    #[test]
    fn test_debug_output_is_redacted() {
        let credentials = Credentials::default().with(GITHUB_TOKEN, "ghp_secretvalue");
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("ghp_secretvalue"));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        std::env::set_var(MESSAGING_TOKEN, "bot-token");
        std::env::remove_var(FORUM_TOKEN);
        let credentials = Credentials::from_env();
        std::env::remove_var(MESSAGING_TOKEN);

        assert!(credentials.is_present(MESSAGING_TOKEN));
        assert!(!credentials.is_present(FORUM_TOKEN));
    }
}
