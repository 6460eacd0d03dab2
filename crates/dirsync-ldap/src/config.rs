//! LDAP connection settings derived from the shared [`SyncConfig`].

use crate::dn::DistinguishedName;
use crate::user::UserCategory;
use crate::Result;
use dirsync_core::{Error, SyncConfig};
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use std::time::Duration;

const ACTIVE_USER_CONTAINER: &str = "cn=users,cn=accounts";
const STAGE_USER_CONTAINER: &str = "cn=staged users,cn=accounts,cn=provisioning";
const PRESERVED_USER_CONTAINER: &str = "cn=deleted users,cn=accounts,cn=provisioning";

/// Resolved connection settings for one IPA server.
///
/// The base DN and the three user containers are computed from the server
/// hostname's domain suffix: `ipa01.company.com` gives the base
/// `dc=company,dc=com` and the active-user base
/// `cn=users,cn=accounts,dc=company,dc=com`.
#[derive(Debug, Clone)]
pub struct LdapConfig {
    url: String,
    bind_dn: String,
    bind_password: SecretString,
    base_dn: DistinguishedName,
    active_user_base: DistinguishedName,
    stage_user_base: DistinguishedName,
    preserved_user_base: DistinguishedName,
    tls_verify: bool,
    tls_ca_cert: Option<PathBuf>,
    connection_timeout: Duration,
    operation_timeout: Duration,
}

impl LdapConfig {
    /// Derives the LDAP settings from the shared configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the server hostname carries no
    /// domain suffix to derive the base DN from.
    pub fn from_sync(config: &SyncConfig) -> Result<Self> {
        let domain = config.server_domain().ok_or_else(|| {
            Error::ConfigError(format!(
                "cannot derive base DN: server `{}` has no domain suffix",
                config.ipa_server
            ))
        })?;
        let base_dn = DistinguishedName::from_domain(domain).map_err(|err| {
            Error::ConfigError(format!("invalid domain `{domain}`: {err}"))
        })?;

        Ok(Self {
            url: format!("ldaps://{}", config.ipa_server),
            bind_dn: config.bind_dn.clone(),
            bind_password: config.bind_password.clone(),
            active_user_base: container(ACTIVE_USER_CONTAINER, &base_dn),
            stage_user_base: container(STAGE_USER_CONTAINER, &base_dn),
            preserved_user_base: container(PRESERVED_USER_CONTAINER, &base_dn),
            base_dn,
            tls_verify: config.tls_verify,
            tls_ca_cert: config.tls_ca_cert.clone(),
            connection_timeout: config.connection_timeout(),
            operation_timeout: config.operation_timeout(),
        })
    }

    /// LDAP endpoint URL (`ldaps://<host>`).
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Distinguished name used for the bind.
    #[must_use]
    pub fn bind_dn(&self) -> &str {
        &self.bind_dn
    }

    /// Bind password in the clear.
    #[must_use]
    pub fn bind_password(&self) -> &str {
        self.bind_password.expose_secret()
    }

    /// Base DN derived from the server domain.
    #[must_use]
    pub const fn base_dn(&self) -> &DistinguishedName {
        &self.base_dn
    }

    /// Search base for the given user category.
    #[must_use]
    pub const fn user_base(&self, category: UserCategory) -> &DistinguishedName {
        match category {
            UserCategory::Active => &self.active_user_base,
            UserCategory::Stage => &self.stage_user_base,
            UserCategory::Preserved => &self.preserved_user_base,
        }
    }

    /// Whether TLS certificate verification is enabled.
    #[must_use]
    pub const fn tls_verify(&self) -> bool {
        self.tls_verify
    }

    /// Optional custom CA certificate path.
    #[must_use]
    pub fn tls_ca_cert(&self) -> Option<&PathBuf> {
        self.tls_ca_cert.as_ref()
    }

    /// Connection establishment timeout.
    #[must_use]
    pub const fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    /// Per-operation timeout.
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }
}

fn container(relative: &str, base: &DistinguishedName) -> DistinguishedName {
    // The container paths are compile-time constants; parsing cannot fail.
    DistinguishedName::parse(relative)
        .expect("container path is a valid DN")
        .join(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LdapConfig {
        let sync = SyncConfig::new(
            "ipa01.company.com",
            "cn=Directory Manager",
            "secret",
            "key",
        )
        .unwrap();
        LdapConfig::from_sync(&sync).unwrap()
    }

    #[test]
    fn derives_bases_from_hostname() {
        let config = config();
        assert_eq!(config.url(), "ldaps://ipa01.company.com");
        assert_eq!(config.base_dn().as_str(), "dc=company,dc=com");
        assert_eq!(
            config.user_base(UserCategory::Active).as_str(),
            "cn=users,cn=accounts,dc=company,dc=com"
        );
        assert_eq!(
            config.user_base(UserCategory::Stage).as_str(),
            "cn=staged users,cn=accounts,cn=provisioning,dc=company,dc=com"
        );
        assert_eq!(
            config.user_base(UserCategory::Preserved).as_str(),
            "cn=deleted users,cn=accounts,cn=provisioning,dc=company,dc=com"
        );
    }

    #[test]
    fn bare_hostname_is_config_error() {
        let sync = SyncConfig::new("ipa01", "cn=Directory Manager", "secret", "key").unwrap();
        let err = LdapConfig::from_sync(&sync).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn timeouts_carried_over() {
        let sync = SyncConfig::new("ipa01.company.com", "cn=dm", "secret", "key")
            .unwrap()
            .with_connection_timeout_secs(7)
            .with_operation_timeout_secs(21);
        let config = LdapConfig::from_sync(&sync).unwrap();
        assert_eq!(config.connection_timeout(), Duration::from_secs(7));
        assert_eq!(config.operation_timeout(), Duration::from_secs(21));
    }
}
