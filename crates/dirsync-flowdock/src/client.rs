//! Asynchronous Flowdock REST client.

use crate::models::{Contact, ContactRecord, ContactSnapshot};
use crate::Result;
use dirsync_core::Error;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = concat!("dirsync-flowdock/", env!("CARGO_PKG_VERSION"));

/// Production Flowdock API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.flowdock.com";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Builder for [`FlowdockClient`].
#[derive(Debug)]
pub struct FlowdockClientBuilder {
    base_url: String,
    api_key: SecretString,
    timeout: Duration,
}

impl FlowdockClientBuilder {
    /// Creates a builder for the given API key against the production
    /// endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: SecretString::from(api_key.into()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Overrides the API base URL (used by tests against a local server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the base URL is invalid or the
    /// HTTP client cannot be constructed.
    pub fn build(self) -> Result<FlowdockClient> {
        let base_url = Url::parse(&self.base_url)?;
        let http = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .build()
            .map_err(|err| {
                Error::ConfigError(format!("failed to build Flowdock HTTP client: {err}"))
            })?;

        Ok(FlowdockClient {
            http,
            base_url,
            api_key: self.api_key,
        })
    }
}

/// Client for the Flowdock users listing.
///
/// Authentication is HTTP basic with the API key as username and an empty
/// password.
#[derive(Debug, Clone)]
pub struct FlowdockClient {
    http: Client,
    base_url: Url,
    api_key: SecretString,
}

impl FlowdockClient {
    /// Constructs a client for the production endpoint.
    ///
    /// # Errors
    ///
    /// See [`FlowdockClientBuilder::build`].
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        FlowdockClientBuilder::new(api_key).build()
    }

    /// Returns the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches the full user listing and caches it keyed by email.
    ///
    /// One unpaged GET; no retries. Records without an email address are
    /// skipped, and a duplicated address keeps the last record in response
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] on 401/403,
    /// [`Error::ServiceUnavailable`] on 5xx or connection failure and
    /// [`Error::ParseError`] when the body is not the expected JSON array.
    pub async fn fetch_users(&self) -> Result<ContactDirectory> {
        let url = self.base_url.join("users/")?;
        let response = self
            .http
            .get(url)
            .basic_auth(self.api_key.expose_secret(), Some(""))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_status_to_error(status, text));
        }

        let records = response.json::<Vec<ContactRecord>>().await.map_err(|err| {
            Error::ParseError(format!("failed to parse Flowdock user listing: {err}"))
        })?;

        let mut users = ContactSnapshot::new();
        for record in records {
            let Some(email) = record.email.clone() else {
                warn!(id = record.id, "skipping contact without an email address");
                continue;
            };
            users.insert(email, Contact::from(record));
        }
        debug!(users = users.len(), "fetched Flowdock contact listing");

        Ok(ContactDirectory { users })
    }
}

/// Immutable snapshot of the Flowdock contact list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDirectory {
    users: ContactSnapshot,
}

impl ContactDirectory {
    /// Number of cached contacts.
    #[must_use]
    pub fn count_users(&self) -> usize {
        self.users.len()
    }

    /// Read-only view of the cached mapping.
    #[must_use]
    pub const fn users(&self) -> &ContactSnapshot {
        &self.users
    }

    /// Looks up a contact by email address.
    #[must_use]
    pub fn get(&self, email: &str) -> Option<&Contact> {
        self.users.get(email)
    }
}

fn map_status_to_error(status: StatusCode, text: String) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::InvalidCredentials(format!("Flowdock authentication failed: {text}"))
        }
        StatusCode::NOT_FOUND => Error::NotFound(text),
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            Error::ServiceUnavailable(format!("Flowdock temporarily unavailable: {text}"))
        }
        status if status.is_server_error() => {
            Error::ServiceUnavailable(format!("Flowdock server error {status}: {text}"))
        }
        _ => Error::HttpError(format!("Flowdock error {status}: {text}")),
    }
}
