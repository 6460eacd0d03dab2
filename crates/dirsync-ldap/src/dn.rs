//! Structured distinguished-name handling.
//!
//! Entry identities and search bases are manipulated as parsed component
//! lists rather than by string surgery, so a DN that does not carry an
//! expected attribute (say `uid`) surfaces as `None` instead of a panic.

use dirsync_core::Error as CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while parsing a distinguished name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistinguishedNameError {
    /// The input was empty.
    #[error("distinguished name cannot be empty")]
    Empty,
    /// A component was not of the form `attribute=value`.
    #[error("invalid distinguished name component: {0}")]
    InvalidComponent(String),
    /// The input ended in the middle of an escape sequence.
    #[error("distinguished name contains an unterminated escape sequence")]
    UnterminatedEscape,
}

impl From<DistinguishedNameError> for CoreError {
    fn from(err: DistinguishedNameError) -> Self {
        CoreError::ParseError(err.to_string())
    }
}

/// A single relative distinguished name: one `attribute=value` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rdn {
    attribute: String,
    value: String,
}

impl Rdn {
    /// Creates an RDN from an attribute name and value.
    #[must_use]
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Attribute name (e.g. `uid`).
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Attribute value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Case-insensitive attribute name comparison.
    #[must_use]
    pub fn is(&self, attribute: &str) -> bool {
        self.attribute.eq_ignore_ascii_case(attribute)
    }
}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.attribute, escape_value(&self.value))
    }
}

/// A parsed distinguished name.
///
/// Keeps both the ordered component list and a canonical string form. The
/// parser handles backslash escapes but is deliberately limited to the
/// single-valued RDNs FreeIPA produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistinguishedName {
    raw: String,
    components: Vec<Rdn>,
}

impl DistinguishedName {
    /// Parses a distinguished name.
    ///
    /// # Errors
    ///
    /// Returns [`DistinguishedNameError`] when the input is empty, a
    /// component lacks an `=`, or an escape sequence is unterminated.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, DistinguishedNameError> {
        let raw = input.as_ref().trim();
        if raw.is_empty() {
            return Err(DistinguishedNameError::Empty);
        }

        let mut components = Vec::new();
        for part in split_unescaped(raw, ',')? {
            if part.is_empty() {
                return Err(DistinguishedNameError::InvalidComponent(raw.to_string()));
            }
            components.push(parse_component(&part)?);
        }

        Ok(Self::from_components(components))
    }

    /// Builds the `dc=` chain for a dot-separated domain.
    ///
    /// `company.com` becomes `dc=company,dc=com`. An empty domain or empty
    /// label is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`DistinguishedNameError::InvalidComponent`] for empty labels.
    pub fn from_domain(domain: &str) -> Result<Self, DistinguishedNameError> {
        if domain.is_empty() {
            return Err(DistinguishedNameError::Empty);
        }

        let mut components = Vec::new();
        for label in domain.split('.') {
            if label.is_empty() {
                return Err(DistinguishedNameError::InvalidComponent(
                    domain.to_string(),
                ));
            }
            components.push(Rdn::new("dc", label));
        }

        Ok(Self::from_components(components))
    }

    fn from_components(components: Vec<Rdn>) -> Self {
        let raw = components
            .iter()
            .map(Rdn::to_string)
            .collect::<Vec<_>>()
            .join(",");
        Self { raw, components }
    }

    /// Canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Ordered components, leaf first.
    #[must_use]
    pub fn components(&self) -> &[Rdn] {
        &self.components
    }

    /// Value of the first component matching `attribute`, case-insensitively.
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.components
            .iter()
            .find(|rdn| rdn.is(attribute))
            .map(Rdn::value)
    }

    /// Returns true if any component matches the attribute/value pair
    /// (both compared case-insensitively).
    #[must_use]
    pub fn contains(&self, attribute: &str, value: &str) -> bool {
        self.components
            .iter()
            .any(|rdn| rdn.is(attribute) && rdn.value.eq_ignore_ascii_case(value))
    }

    /// Prepends an RDN, producing the DN of an entry under this base.
    #[must_use]
    pub fn with_prefix(mut self, rdn: Rdn) -> Self {
        self.components.insert(0, rdn);
        Self::from_components(self.components)
    }

    /// Appends a base DN to this one.
    #[must_use]
    pub fn join(mut self, base: &DistinguishedName) -> Self {
        self.components.extend(base.components.iter().cloned());
        Self::from_components(self.components)
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for DistinguishedName {
    type Err = DistinguishedNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for DistinguishedName {
    type Error = DistinguishedNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<DistinguishedName> for String {
    fn from(value: DistinguishedName) -> Self {
        value.raw
    }
}

fn split_unescaped(input: &str, delimiter: char) -> Result<Vec<String>, DistinguishedNameError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for ch in input.chars() {
        if escaped {
            current.push('\\');
            current.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == delimiter {
            parts.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(ch);
        }
    }

    if escaped {
        return Err(DistinguishedNameError::UnterminatedEscape);
    }

    parts.push(current.trim().to_string());
    Ok(parts)
}

fn parse_component(component: &str) -> Result<Rdn, DistinguishedNameError> {
    let mut escaped = false;
    let mut split_at = None;
    for (idx, ch) in component.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '=' {
            split_at = Some(idx);
            break;
        }
    }

    let idx = split_at
        .ok_or_else(|| DistinguishedNameError::InvalidComponent(component.to_string()))?;
    let attribute = component[..idx].trim();
    let value = component[idx + 1..].trim_start();

    if attribute.is_empty() || value.is_empty() {
        return Err(DistinguishedNameError::InvalidComponent(
            component.to_string(),
        ));
    }

    Ok(Rdn::new(attribute, unescape_value(value)?))
}

fn unescape_value(value: &str) -> Result<String, DistinguishedNameError> {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            let next = chars
                .next()
                .ok_or(DistinguishedNameError::UnterminatedEscape)?;
            result.push(next);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn escape_value(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut escaped = String::with_capacity(value.len());

    for (idx, ch) in chars.iter().enumerate() {
        let at_edge = (idx == 0 && (*ch == ' ' || *ch == '#'))
            || (idx == chars.len() - 1 && *ch == ' ');
        if at_edge || matches!(ch, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=') {
            escaped.push('\\');
        }
        escaped.push(*ch);
    }

    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_user_dn() {
        let dn =
            DistinguishedName::parse("uid=jdoe,cn=users,cn=accounts,dc=company,dc=com").unwrap();
        assert_eq!(dn.get("uid"), Some("jdoe"));
        assert_eq!(dn.get("UID"), Some("jdoe"));
        assert!(dn.contains("dc", "company"));
        assert_eq!(
            dn.to_string(),
            "uid=jdoe,cn=users,cn=accounts,dc=company,dc=com"
        );
    }

    #[test]
    fn missing_attribute_is_none() {
        let dn = DistinguishedName::parse("cn=users,dc=company,dc=com").unwrap();
        assert_eq!(dn.get("uid"), None);
    }

    #[test]
    fn escaped_comma_in_value() {
        let dn = DistinguishedName::parse("cn=Doe\\, Jane,dc=company,dc=com").unwrap();
        assert_eq!(dn.get("cn"), Some("Doe, Jane"));
        assert!(dn.to_string().starts_with("cn=Doe\\, Jane,"));
    }

    #[test]
    fn rejects_empty_and_malformed() {
        assert!(matches!(
            DistinguishedName::parse("  "),
            Err(DistinguishedNameError::Empty)
        ));
        assert!(matches!(
            DistinguishedName::parse("uid=jdoe,"),
            Err(DistinguishedNameError::InvalidComponent(_))
        ));
        assert!(matches!(
            DistinguishedName::parse("no-equals-here,dc=com"),
            Err(DistinguishedNameError::InvalidComponent(_))
        ));
    }

    #[test]
    fn from_domain_builds_dc_chain() {
        let dn = DistinguishedName::from_domain("company.com").unwrap();
        assert_eq!(dn.as_str(), "dc=company,dc=com");

        assert!(DistinguishedName::from_domain("").is_err());
        assert!(DistinguishedName::from_domain("company..com").is_err());
    }

    #[test]
    fn prefix_and_join() {
        let base = DistinguishedName::parse("cn=users,dc=company,dc=com").unwrap();
        let user = base.clone().with_prefix(Rdn::new("uid", "jdoe"));
        assert_eq!(user.as_str(), "uid=jdoe,cn=users,dc=company,dc=com");

        let joined = DistinguishedName::parse("cn=staged users,cn=accounts")
            .unwrap()
            .join(&DistinguishedName::from_domain("company.com").unwrap());
        assert_eq!(
            joined.as_str(),
            "cn=staged users,cn=accounts,dc=company,dc=com"
        );
    }
}
