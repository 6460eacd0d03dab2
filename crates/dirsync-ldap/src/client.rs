//! IPA directory client implementation.

use crate::{
    config::LdapConfig,
    entry::{AttrValue, DirectoryEntry, DirectorySnapshot},
    report,
    user::{NewUser, UserCategory},
    Result,
};
use async_trait::async_trait;
use dirsync_core::Error;
use ldap3::{LdapConnAsync, LdapConnSettings, Mod, Scope};
use native_tls::{Certificate, TlsConnector};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

const SERVICE: &str = "ipa-directory";
const ALL_USERS_FILTER: &str = "(uid=*)";
const ALL_ATTRIBUTES: &[&str] = &["*"];
const UID_ATTRIBUTE: &[&str] = &["uid"];

/// Search scope for directory queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Base object only.
    Base,
    /// One level below the base.
    OneLevel,
    /// Entire subtree.
    Subtree,
}

impl From<SearchScope> for Scope {
    fn from(scope: SearchScope) -> Self {
        match scope {
            SearchScope::Base => Scope::Base,
            SearchScope::OneLevel => Scope::OneLevel,
            SearchScope::Subtree => Scope::Subtree,
        }
    }
}

/// Wire-level entry as returned by the directory, before DN parsing.
#[derive(Debug, Clone)]
pub struct RawEntry {
    /// Distinguished name string.
    pub dn: String,
    /// Attribute values in server order.
    pub attributes: HashMap<String, Vec<String>>,
}

impl RawEntry {
    fn into_entry(self) -> Result<DirectoryEntry> {
        let dn = crate::dn::DistinguishedName::parse(&self.dn)
            .map_err(|err| Error::ParseError(format!("entry DN `{}`: {err}", self.dn)))?;
        let attributes = self
            .attributes
            .into_iter()
            .map(|(name, values)| (name, AttrValue::from(values)))
            .collect();
        Ok(DirectoryEntry::new(dn, attributes))
    }
}

/// A single modification applied to one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryModification {
    /// Add attribute values.
    Add {
        /// Attribute to modify.
        attribute: String,
        /// Values to add.
        values: Vec<String>,
    },
    /// Delete attribute values (empty removes the attribute).
    Delete {
        /// Attribute to modify.
        attribute: String,
        /// Values to delete.
        values: Vec<String>,
    },
    /// Replace attribute values (empty removes the attribute).
    Replace {
        /// Attribute to modify.
        attribute: String,
        /// Replacement values.
        values: Vec<String>,
    },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub(crate) trait LdapSession: Send {
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()>;
    async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[&'static str],
    ) -> Result<Vec<RawEntry>>;
    async fn add(&mut self, dn: &str, attributes: &[(String, Vec<String>)]) -> Result<()>;
    async fn modify(&mut self, dn: &str, modifications: &[DirectoryModification]) -> Result<()>;
    async fn unbind(&mut self) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub(crate) trait LdapConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn LdapSession>>;
}

/// Client for a FreeIPA-style user directory.
///
/// Construction binds, fetches the active-user subtree into an in-memory
/// snapshot and disconnects; every live operation afterwards opens its own
/// short-lived bound session, so no connection outlives the call that needed
/// it. The snapshot is never refreshed implicitly: after a successful
/// [`add_user`](Self::add_user) or [`modify`](Self::modify) the cache is
/// stale until [`refresh`](Self::refresh) is called.
pub struct DirectoryClient {
    config: Arc<LdapConfig>,
    connector: Box<dyn LdapConnector>,
    snapshot: DirectorySnapshot,
}

impl DirectoryClient {
    /// Connects to the directory, binds and fetches the active-user snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] when the bind is rejected,
    /// [`Error::ServiceUnavailable`] when the server cannot be reached, and
    /// [`Error::Timeout`] when the initial fetch exceeds the configured
    /// operation timeout.
    pub async fn connect(config: LdapConfig) -> Result<Self> {
        let config = Arc::new(config);
        let connector: Box<dyn LdapConnector> = Box::new(TlsLdapConnector::new(config.clone()));
        Self::bootstrap(config, connector).await
    }

    #[cfg(test)]
    pub(crate) async fn with_connector(
        config: LdapConfig,
        connector: Box<dyn LdapConnector>,
    ) -> Result<Self> {
        Self::bootstrap(Arc::new(config), connector).await
    }

    async fn bootstrap(
        config: Arc<LdapConfig>,
        connector: Box<dyn LdapConnector>,
    ) -> Result<Self> {
        let mut client = Self {
            config,
            connector,
            snapshot: DirectorySnapshot::new(),
        };
        client.refresh().await?;
        Ok(client)
    }

    /// Re-fetches the active-user subtree, replacing the cached snapshot.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`connect`](Self::connect); on error the previous
    /// snapshot is left untouched.
    pub async fn refresh(&mut self) -> Result<()> {
        let mut session = self.bound_session().await?;
        let result = session
            .search(
                self.config.user_base(UserCategory::Active).as_str(),
                SearchScope::Subtree,
                ALL_USERS_FILTER,
                ALL_ATTRIBUTES,
            )
            .await;
        unbind_quietly(session.as_mut()).await;

        let mut snapshot = DirectorySnapshot::new();
        for raw in result? {
            let entry = raw.into_entry()?;
            snapshot.insert(entry.dn.as_str().to_string(), entry);
        }
        debug!(entries = snapshot.len(), "fetched active-user snapshot");
        self.snapshot = snapshot;
        Ok(())
    }

    /// The cached active-user snapshot.
    #[must_use]
    pub const fn directory(&self) -> &DirectorySnapshot {
        &self.snapshot
    }

    /// Renders the snapshot as a surname-sorted table.
    #[must_use]
    pub fn render_report(&self) -> String {
        report::render(&self.snapshot)
    }

    /// Prints the tabular report to stdout.
    pub fn display_data(&self) {
        println!("{}", self.render_report());
    }

    /// All cached entries whose `mail` attribute matches, case-insensitively.
    ///
    /// Directories do not enforce email uniqueness, so zero, one or several
    /// entries may come back.
    #[must_use]
    pub fn mail_exists(&self, mail: &str) -> DirectorySnapshot {
        self.snapshot
            .iter()
            .filter(|(_, entry)| {
                entry
                    .get("mail")
                    .is_some_and(|value| value.contains_ignore_case(mail))
            })
            .map(|(dn, entry)| (dn.clone(), entry.clone()))
            .collect()
    }

    /// Checks live (not against the cache) whether exactly one entry with the
    /// given uid exists under the category's subtree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] when two or more entries match: uid
    /// uniqueness is a directory invariant and a violation is surfaced, not
    /// swallowed.
    pub async fn user_exists(&self, uid: &str, category: UserCategory) -> Result<bool> {
        let filter = format!("(uid={})", escape_filter_value(uid));
        let mut session = self.bound_session().await?;
        let result = session
            .search(
                self.config.user_base(category).as_str(),
                SearchScope::Subtree,
                &filter,
                UID_ATTRIBUTE,
            )
            .await;
        unbind_quietly(session.as_mut()).await;

        match result?.len() {
            0 => Ok(false),
            1 => Ok(true),
            n => Err(Error::Conflict(format!(
                "uid `{uid}` matched {n} entries under the {} base",
                category.as_str()
            ))),
        }
    }

    /// Creates a staged user entry.
    ///
    /// The entry lands under the staged-users base with a placeholder uid
    /// number; IPA's provisioning takes it from there. The cached snapshot is
    /// not touched (staged entries are outside the active subtree anyway).
    ///
    /// # Errors
    ///
    /// Directory rejections are classified: [`Error::Conflict`] when the
    /// entry already exists, [`Error::ValidationError`] for schema or
    /// constraint violations, [`Error::PermissionDenied`] when the bound
    /// identity may not write.
    pub async fn add_user(&self, user: &NewUser) -> Result<()> {
        let dn = user.dn(self.config.user_base(UserCategory::Stage));
        let attributes = user.attributes();

        let mut session = self.bound_session().await?;
        let result = session.add(dn.as_str(), &attributes).await;
        unbind_quietly(session.as_mut()).await;
        result?;

        debug!(uid = user.uid(), dn = dn.as_str(), "staged user created");
        Ok(())
    }

    /// Replaces a single attribute's value on an existing entry.
    ///
    /// `None` for either value is treated as the empty string; replacing with
    /// an empty value removes the attribute. The cached snapshot is not
    /// updated and becomes stale on success.
    ///
    /// # Errors
    ///
    /// Same classification as [`add_user`](Self::add_user), plus
    /// [`Error::NotFound`] when the entry does not exist.
    pub async fn modify(
        &self,
        dn: &str,
        attribute: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
    ) -> Result<()> {
        let old_value = old_value.unwrap_or("");
        let new_value = new_value.unwrap_or("");
        if old_value == new_value {
            return Ok(());
        }

        let values = if new_value.is_empty() {
            Vec::new()
        } else {
            vec![new_value.to_string()]
        };
        let modification = DirectoryModification::Replace {
            attribute: attribute.to_string(),
            values,
        };

        let mut session = self.bound_session().await?;
        let result = session.modify(dn, std::slice::from_ref(&modification)).await;
        unbind_quietly(session.as_mut()).await;
        result
    }

    async fn bound_session(&self) -> Result<Box<dyn LdapSession>> {
        let mut session = self.connector.connect().await?;
        session
            .simple_bind(self.config.bind_dn(), self.config.bind_password())
            .await?;
        Ok(session)
    }
}

/// Closes a session without letting a teardown failure shadow the error of
/// the operation that just ran on it.
async fn unbind_quietly(session: &mut dyn LdapSession) {
    if let Err(err) = session.unbind().await {
        warn!(error = %err, "directory unbind failed");
    }
}

/// Directory connector backed by `ldap3` over TLS.
struct TlsLdapConnector {
    config: Arc<LdapConfig>,
}

impl TlsLdapConnector {
    fn new(config: Arc<LdapConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LdapConnector for TlsLdapConnector {
    async fn connect(&self) -> Result<Box<dyn LdapSession>> {
        let settings = build_ldap_settings(&self.config)?;
        let (conn, ldap) = LdapConnAsync::with_settings(settings, self.config.url())
            .await
            .map_err(map_ldap_error)?;
        ldap3::drive!(conn);
        Ok(Box::new(TlsLdapSession {
            inner: ldap,
            operation_timeout: self.config.operation_timeout(),
        }))
    }
}

struct TlsLdapSession {
    inner: ldap3::Ldap,
    operation_timeout: Duration,
}

#[async_trait]
impl LdapSession for TlsLdapSession {
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()> {
        let result = timeout(self.operation_timeout, self.inner.simple_bind(dn, password))
            .await
            .map_err(|_| Error::Timeout("directory bind timed out".to_string()))?
            .map_err(map_ldap_error)?;
        ensure_success("bind", &result)
    }

    async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[&'static str],
    ) -> Result<Vec<RawEntry>> {
        let result = timeout(
            self.operation_timeout,
            self.inner
                .search(base_dn, scope.into(), filter, attributes.to_vec()),
        )
        .await
        .map_err(|_| Error::Timeout("directory search timed out".to_string()))?
        .map_err(map_ldap_error)?;
        let (entries, _) = result.success().map_err(map_ldap_error)?;
        Ok(entries
            .into_iter()
            .map(ldap3::SearchEntry::construct)
            .map(|entry| RawEntry {
                dn: entry.dn,
                attributes: entry.attrs,
            })
            .collect())
    }

    async fn add(&mut self, dn: &str, attributes: &[(String, Vec<String>)]) -> Result<()> {
        let attrs = attributes
            .iter()
            .map(|(attribute, values)| {
                (
                    attribute.clone(),
                    values.iter().cloned().collect::<HashSet<_>>(),
                )
            })
            .collect::<Vec<_>>();
        let result = timeout(self.operation_timeout, self.inner.add(dn, attrs))
            .await
            .map_err(|_| Error::Timeout("directory add timed out".to_string()))?
            .map_err(map_ldap_error)?;
        ensure_success("add", &result)
    }

    async fn modify(&mut self, dn: &str, modifications: &[DirectoryModification]) -> Result<()> {
        let mods = modifications
            .iter()
            .map(|modification| match modification {
                DirectoryModification::Add { attribute, values } => Mod::Add(
                    attribute.clone(),
                    values.iter().cloned().collect::<HashSet<_>>(),
                ),
                DirectoryModification::Delete { attribute, values } => Mod::Delete(
                    attribute.clone(),
                    values.iter().cloned().collect::<HashSet<_>>(),
                ),
                DirectoryModification::Replace { attribute, values } => Mod::Replace(
                    attribute.clone(),
                    values.iter().cloned().collect::<HashSet<_>>(),
                ),
            })
            .collect::<Vec<_>>();

        let result = timeout(self.operation_timeout, self.inner.modify(dn, mods))
            .await
            .map_err(|_| Error::Timeout("directory modify timed out".to_string()))?
            .map_err(map_ldap_error)?;
        ensure_success("modify", &result)
    }

    async fn unbind(&mut self) -> Result<()> {
        timeout(self.operation_timeout, self.inner.unbind())
            .await
            .map_err(|_| Error::Timeout("directory unbind timed out".to_string()))?
            .map_err(map_ldap_error)?;
        Ok(())
    }
}

fn build_ldap_settings(config: &LdapConfig) -> Result<LdapConnSettings> {
    let mut settings = LdapConnSettings::new().set_conn_timeout(config.connection_timeout());

    if !config.tls_verify() {
        warn!("TLS verification disabled for directory connection");
        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|err| {
                Error::ConfigError(format!("failed to construct TLS connector: {err}"))
            })?;
        settings = settings.set_connector(connector).set_no_tls_verify(true);
    } else if let Some(cert_path) = config.tls_ca_cert() {
        let pem = fs::read(cert_path).map_err(|err| {
            Error::ConfigError(format!(
                "failed to read CA certificate {}: {err}",
                cert_path.display()
            ))
        })?;
        let certificate = Certificate::from_pem(&pem)
            .map_err(|err| Error::ConfigError(format!("invalid CA certificate: {err}")))?;
        let connector = TlsConnector::builder()
            .add_root_certificate(certificate)
            .build()
            .map_err(|err| Error::ConfigError(format!("failed to load CA certificate: {err}")))?;
        settings = settings.set_connector(connector);
    }

    Ok(settings)
}

fn ensure_success(operation: &str, result: &ldap3::LdapResult) -> Result<()> {
    if result.rc == 0 {
        Ok(())
    } else {
        Err(directory_error(operation, result.rc, &result.text))
    }
}

/// Maps LDAP result codes onto the error taxonomy so write failures keep
/// their cause instead of collapsing to a boolean.
fn directory_error(operation: &str, rc: u32, text: &str) -> Error {
    let message = format!("directory {operation} failed (rc {rc}): {text}");
    match rc {
        32 => Error::NotFound(message),
        49 => Error::InvalidCredentials(message),
        50 => Error::PermissionDenied(message),
        // undefinedAttributeType, constraintViolation, invalidAttributeSyntax,
        // invalidDNSyntax, namingViolation, objectClassViolation, notAllowedOnRDN
        17 | 19 | 21 | 34 | 64 | 65 | 67 => Error::ValidationError(message),
        68 => Error::Conflict(message),
        51 | 52 | 53 => Error::ServiceUnavailable(message),
        _ => Error::ExternalServiceError {
            service: SERVICE.to_string(),
            message,
        },
    }
}

fn map_ldap_error(err: ldap3::LdapError) -> Error {
    match err {
        ldap3::LdapError::LdapResult { result } => {
            directory_error("operation", result.rc, &result.text)
        }
        other => Error::ExternalServiceError {
            service: SERVICE.to_string(),
            message: other.to_string(),
        },
    }
}

fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\\' => escaped.push_str("\\5c"),
            '\0' => escaped.push_str("\\00"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
