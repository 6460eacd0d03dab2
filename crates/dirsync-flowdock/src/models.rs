//! Flowdock user listing models.

use serde::Deserialize;
use std::collections::HashMap;

/// A user record as returned by the listing endpoint.
///
/// Only the fields the snapshot needs are kept; the API returns more.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactRecord {
    /// Remote user id.
    pub id: i64,
    /// Email address; occasionally absent on service accounts.
    #[serde(default)]
    pub email: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Nickname shown in flows.
    #[serde(default)]
    pub nick: String,
}

/// Cached contact data for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    /// Remote user id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Nickname shown in flows.
    pub nick: String,
}

impl From<ContactRecord> for Contact {
    fn from(record: ContactRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            nick: record.nick,
        }
    }
}

/// Snapshot of the contact list keyed by email address.
///
/// Email uniqueness is by construction: when the listing contains the same
/// address twice, the last record wins.
pub type ContactSnapshot = HashMap<String, Contact>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_deserializes_with_missing_optionals() {
        let record: ContactRecord =
            serde_json::from_str(r#"{"id": 42, "email": "a@x.com"}"#).unwrap();
        assert_eq!(record.id, 42);
        assert_eq!(record.email.as_deref(), Some("a@x.com"));
        assert_eq!(record.name, "");
        assert_eq!(record.nick, "");
    }

    #[test]
    fn record_without_email() {
        let record: ContactRecord =
            serde_json::from_str(r#"{"id": 7, "name": "Bot", "nick": "bot"}"#).unwrap();
        assert!(record.email.is_none());
    }
}
