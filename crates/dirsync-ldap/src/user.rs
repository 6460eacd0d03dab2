//! New-user request shape and the user lifecycle categories.

use crate::dn::{DistinguishedName, Rdn};

/// Lifecycle category a user entry lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCategory {
    /// Regular active accounts.
    Active,
    /// Staged accounts awaiting provisioning.
    Stage,
    /// Preserved (deleted) accounts.
    Preserved,
}

impl UserCategory {
    /// Short name used in log messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Stage => "stage",
            Self::Preserved => "preserved",
        }
    }
}

/// Group id assigned to every staged account.
const STAGED_GID_NUMBER: &str = "707";
/// Placeholder uid number; IPA assigns the real one on activation.
const STAGED_UID_NUMBER: &str = "-1";
const LOGIN_SHELL: &str = "/usr/sbin/nologin";

const OBJECT_CLASSES: &[&str] = &[
    "top",
    "posixaccount",
    "person",
    "inetorgperson",
    "organizationalperson",
];

/// Parameters for creating a staged user entry.
///
/// Only uid and the two name parts are required; absent optional fields are
/// left off the entry entirely (directory string syntax forbids empty
/// values, so they must not reach the wire).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    uid: String,
    first_name: String,
    last_name: String,
    employee_number: Option<String>,
    department: Option<String>,
    title: Option<String>,
    mobile: Option<String>,
    mail: Option<String>,
    division: Option<String>,
}

impl NewUser {
    /// Creates a request for the given uid and name.
    #[must_use]
    pub fn new(
        uid: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            employee_number: None,
            department: None,
            title: None,
            mobile: None,
            mail: None,
            division: None,
        }
    }

    /// Sets the HR system employee number.
    #[must_use]
    pub fn employee_number(mut self, value: impl Into<String>) -> Self {
        self.employee_number = Some(value.into());
        self
    }

    /// Sets the department number.
    #[must_use]
    pub fn department(mut self, value: impl Into<String>) -> Self {
        self.department = Some(value.into());
        self
    }

    /// Sets the job title.
    #[must_use]
    pub fn title(mut self, value: impl Into<String>) -> Self {
        self.title = Some(value.into());
        self
    }

    /// Sets the mobile number (also mirrored into `telephoneNumber`).
    #[must_use]
    pub fn mobile(mut self, value: impl Into<String>) -> Self {
        self.mobile = Some(value.into());
        self
    }

    /// Sets the email address.
    #[must_use]
    pub fn mail(mut self, value: impl Into<String>) -> Self {
        self.mail = Some(value.into());
        self
    }

    /// Sets the division (`ou` attribute).
    #[must_use]
    pub fn division(mut self, value: impl Into<String>) -> Self {
        self.division = Some(value.into());
        self
    }

    /// The requested uid.
    #[must_use]
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// DN of the entry to create under the given staged-user base.
    #[must_use]
    pub fn dn(&self, stage_base: &DistinguishedName) -> DistinguishedName {
        stage_base.clone().with_prefix(Rdn::new("uid", &self.uid))
    }

    /// Attribute list for the directory add operation.
    ///
    /// Unset or empty optional fields are omitted: an empty DirectoryString
    /// value is a syntax violation the server would reject.
    #[must_use]
    pub fn attributes(&self) -> Vec<(String, Vec<String>)> {
        let first = capitalize(&self.first_name);
        let last = capitalize(&self.last_name);
        let mobile = self.mobile.clone().unwrap_or_default();

        let mut attributes = vec![
            (
                "objectclass".to_string(),
                OBJECT_CLASSES.iter().map(|&c| c.to_string()).collect(),
            ),
            ("cn".to_string(), vec![format!("{first} {last}")]),
            ("givenName".to_string(), vec![first]),
            ("sn".to_string(), vec![last]),
            ("uid".to_string(), vec![self.uid.clone()]),
            ("uidNumber".to_string(), vec![STAGED_UID_NUMBER.to_string()]),
            ("gidNumber".to_string(), vec![STAGED_GID_NUMBER.to_string()]),
            (
                "title".to_string(),
                vec![self.title.clone().unwrap_or_default()],
            ),
            ("mobile".to_string(), vec![mobile.clone()]),
            ("telephoneNumber".to_string(), vec![mobile]),
            (
                "mail".to_string(),
                vec![self.mail.clone().unwrap_or_default()],
            ),
            (
                "homeDirectory".to_string(),
                vec![format!("/home/{}", self.uid)],
            ),
            ("loginShell".to_string(), vec![LOGIN_SHELL.to_string()]),
            (
                "employeeNumber".to_string(),
                vec![self.employee_number.clone().unwrap_or_default()],
            ),
            (
                "departmentNumber".to_string(),
                vec![self.department.clone().unwrap_or_default()],
            ),
            (
                "ou".to_string(),
                vec![self.division.clone().unwrap_or_default()],
            ),
        ];
        attributes.retain(|(_, values)| values.iter().all(|value| !value.is_empty()));
        attributes
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(user: &NewUser, name: &str) -> Vec<String> {
        user.attributes()
            .into_iter()
            .find(|(attribute, _)| attribute == name)
            .map(|(_, values)| values)
            .unwrap()
    }

    #[test]
    fn names_are_capitalized() {
        let user = NewUser::new("jdoe", "jOHN", "dOE");
        assert_eq!(attr(&user, "givenName"), vec!["John"]);
        assert_eq!(attr(&user, "sn"), vec!["Doe"]);
        assert_eq!(attr(&user, "cn"), vec!["John Doe"]);
    }

    #[test]
    fn staged_account_defaults() {
        let user = NewUser::new("jdoe", "John", "Doe");
        assert_eq!(attr(&user, "uidNumber"), vec!["-1"]);
        assert_eq!(attr(&user, "gidNumber"), vec!["707"]);
        assert_eq!(attr(&user, "homeDirectory"), vec!["/home/jdoe"]);
        assert_eq!(attr(&user, "loginShell"), vec!["/usr/sbin/nologin"]);
        assert_eq!(
            attr(&user, "objectclass"),
            vec![
                "top",
                "posixaccount",
                "person",
                "inetorgperson",
                "organizationalperson"
            ]
        );
    }

    #[test]
    fn unset_optional_fields_are_omitted() {
        let user = NewUser::new("jdoe", "John", "Doe");
        let attributes = user.attributes();
        for name in [
            "title",
            "mobile",
            "telephoneNumber",
            "mail",
            "employeeNumber",
            "departmentNumber",
            "ou",
        ] {
            assert!(
                !attributes.iter().any(|(attribute, _)| attribute == name),
                "{name} should not be present"
            );
        }
        assert!(attributes
            .iter()
            .all(|(_, values)| values.iter().all(|value| !value.is_empty())));
    }

    #[test]
    fn set_optional_fields_are_present() {
        let user = NewUser::new("jdoe", "John", "Doe")
            .title("Engineer")
            .mail("jdoe@company.com")
            .division("Platform");
        assert_eq!(attr(&user, "title"), vec!["Engineer"]);
        assert_eq!(attr(&user, "mail"), vec!["jdoe@company.com"]);
        assert_eq!(attr(&user, "ou"), vec!["Platform"]);
    }

    #[test]
    fn mobile_mirrored_to_telephone() {
        let user = NewUser::new("jdoe", "John", "Doe").mobile("+44 7700 900000");
        assert_eq!(attr(&user, "mobile"), vec!["+44 7700 900000"]);
        assert_eq!(attr(&user, "telephoneNumber"), vec!["+44 7700 900000"]);
    }

    #[test]
    fn dn_under_stage_base() {
        let base = DistinguishedName::parse(
            "cn=staged users,cn=accounts,cn=provisioning,dc=company,dc=com",
        )
        .unwrap();
        let user = NewUser::new("jdoe", "John", "Doe");
        assert_eq!(
            user.dn(&base).as_str(),
            "uid=jdoe,cn=staged users,cn=accounts,cn=provisioning,dc=company,dc=com"
        );
    }
}
