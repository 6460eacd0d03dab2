//! Configuration for the dirsync adapters.
//!
//! `SyncConfig` is an immutable value handed to the client constructors. There
//! is no process-wide configuration state; operators produce the values from a
//! file shaped like `config.sample.json` at the workspace root (the loading
//! itself is left to the orchestration layer).

use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// Default connection timeout (seconds).
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 10;
/// Default operation timeout (seconds).
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the IPA directory and the Flowdock contact list.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SyncConfig {
    /// IPA server hostname (e.g. `ipa01.company.com`). The directory search
    /// bases are derived from its domain suffix.
    #[validate(length(min = 1))]
    pub ipa_server: String,

    /// Distinguished name used for the directory bind.
    #[validate(length(min = 1))]
    pub bind_dn: String,

    /// Password for the directory bind.
    #[serde(skip_serializing)]
    pub bind_password: SecretString,

    /// Flowdock API key (used as the basic-auth username).
    #[serde(skip_serializing)]
    pub api_key: SecretString,

    /// Whether to verify TLS certificates.
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to a custom CA certificate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<PathBuf>,

    /// Connection timeout in seconds.
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,

    /// Per-operation timeout in seconds.
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_connection_timeout_secs() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT_SECS
}

const fn default_operation_timeout_secs() -> u64 {
    DEFAULT_OPERATION_TIMEOUT_SECS
}

impl SyncConfig {
    /// Creates a configuration with the required parameters and default
    /// TLS/timeout settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] when a required field is empty.
    pub fn new(
        ipa_server: impl Into<String>,
        bind_dn: impl Into<String>,
        bind_password: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let config = Self {
            ipa_server: ipa_server.into(),
            bind_dn: bind_dn.into(),
            bind_password: SecretString::from(bind_password.into()),
            api_key: SecretString::from(api_key.into()),
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            connection_timeout_secs: default_connection_timeout_secs(),
            operation_timeout_secs: default_operation_timeout_secs(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Returns the bind password in the clear.
    #[must_use]
    pub fn bind_password(&self) -> &str {
        self.bind_password.expose_secret()
    }

    /// Returns the Flowdock API key in the clear.
    #[must_use]
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Returns the domain suffix of the server hostname, if it has one.
    ///
    /// `ipa01.company.com` yields `company.com`; a bare hostname yields
    /// `None`.
    #[must_use]
    pub fn server_domain(&self) -> Option<&str> {
        self.ipa_server
            .split_once('.')
            .map(|(_, domain)| domain)
            .filter(|domain| !domain.is_empty())
    }

    /// Returns the connection timeout duration.
    #[must_use]
    pub const fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Returns the operation timeout duration.
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Enables or disables TLS certificate verification.
    #[must_use]
    pub const fn with_tls_verification(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Sets a custom CA certificate path.
    #[must_use]
    pub fn with_tls_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Overrides the connection timeout in seconds.
    #[must_use]
    pub const fn with_connection_timeout_secs(mut self, seconds: u64) -> Self {
        self.connection_timeout_secs = seconds;
        self
    }

    /// Overrides the operation timeout in seconds.
    #[must_use]
    pub const fn with_operation_timeout_secs(mut self, seconds: u64) -> Self {
        self.operation_timeout_secs = seconds;
        self
    }

    /// Validates the configuration, returning a typed error on failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] listing the failing fields.
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SyncConfig {
        SyncConfig::new(
            "ipa01.company.com",
            "cn=Directory Manager",
            "secret",
            "api-key",
        )
        .unwrap()
    }

    #[test]
    fn defaults_applied() {
        let config = sample();
        assert!(config.tls_verify);
        assert_eq!(
            config.connection_timeout(),
            Duration::from_secs(DEFAULT_CONNECTION_TIMEOUT_SECS)
        );
        assert_eq!(
            config.operation_timeout(),
            Duration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS)
        );
    }

    #[test]
    fn builder_overrides() {
        let config = sample()
            .with_tls_verification(false)
            .with_connection_timeout_secs(5)
            .with_operation_timeout_secs(60);
        assert!(!config.tls_verify);
        assert_eq!(config.connection_timeout(), Duration::from_secs(5));
        assert_eq!(config.operation_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn server_domain_extraction() {
        assert_eq!(sample().server_domain(), Some("company.com"));

        let bare = SyncConfig::new("ipa01", "cn=Directory Manager", "x", "y").unwrap();
        assert_eq!(bare.server_domain(), None);
    }

    #[test]
    fn empty_hostname_rejected() {
        let err = SyncConfig::new("", "cn=Directory Manager", "x", "y").unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
    }

    #[test]
    fn secrets_skipped_on_serialize() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("api-key"));
        assert!(json.contains("ipa01.company.com"));
    }

    #[test]
    fn deserializes_operator_file() {
        let config: SyncConfig = serde_json::from_str(
            r#"{
                "ipa_server": "ipa01.company.com",
                "bind_dn": "cn=Directory Manager",
                "bind_password": "secret",
                "api_key": "key"
            }"#,
        )
        .unwrap();
        assert_eq!(config.bind_password(), "secret");
        assert!(config.tls_verify);
    }
}
