//! Service metadata used to enrich output and lint rule references
//!
//! Metadata never influences matching.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Who owns a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOwner", rename_all = "lowercase")]
pub enum OwnerRef {
    Team(String),
    User(String),
    Email(String),
}

impl OwnerRef {
    /// Interpret a bare owner string: `@org/team` is a team, something that
    /// looks like an address is an e-mail, anything else a user.
    pub fn from_handle(handle: &str) -> Self {
        let handle = handle.trim();
        if handle.starts_with('@') {
            OwnerRef::Team(handle.to_string())
        } else if handle.contains('@') && handle.contains('.') && !handle.contains(' ') {
            OwnerRef::Email(handle.to_string())
        } else {
            OwnerRef::User(handle.to_string())
        }
    }

    pub fn display(&self) -> &str {
        match self {
            OwnerRef::Team(s) | OwnerRef::User(s) | OwnerRef::Email(s) => s.as_str(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOwner {
    Handle(String),
    Table {
        team: Option<String>,
        user: Option<String>,
        email: Option<String>,
    },
}

impl TryFrom<RawOwner> for OwnerRef {
    type Error = String;

    fn try_from(raw: RawOwner) -> Result<Self, Self::Error> {
        match raw {
            RawOwner::Handle(h) if h.trim().is_empty() => Err("owner must not be empty".to_string()),
            RawOwner::Handle(h) => Ok(OwnerRef::from_handle(&h)),
            RawOwner::Table { team: Some(t), .. } => Ok(OwnerRef::Team(t)),
            RawOwner::Table { user: Some(u), .. } => Ok(OwnerRef::User(u)),
            RawOwner::Table { email: Some(e), .. } => Ok(OwnerRef::Email(e)),
            RawOwner::Table { .. } => Err("owner entry must include one of: team, user, email".to_string()),
        }
    }
}

/// How to reach a service's owners
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Contact {
    pub fn is_empty(&self) -> bool {
        self.slack.is_none() && self.email.is_none()
    }
}

/// Metadata for one service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<OwnerRef>,

    #[serde(default, skip_serializing_if = "Contact::is_empty")]
    pub contact: Contact,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runbook: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oncall: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dashboards: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Service {
    /// Comma-separated owner handles, empty when there are none
    pub fn owners_line(&self) -> String {
        self.owners
            .iter()
            .map(OwnerRef::display)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether anyone can be reached about this service
    pub fn has_contact(&self) -> bool {
        !self.owners.is_empty() || !self.contact.is_empty()
    }
}

/// Service name -> metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceCatalog {
    services: BTreeMap<String, Service>,
}

impl ServiceCatalog {
    pub fn new(services: BTreeMap<String, Service>) -> Self {
        Self { services }
    }

    pub fn get(&self, name: &str) -> Option<&Service> {
        self.services.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Service)> {
        self.services.iter()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn insert(&mut self, name: &str, service: Service) {
        self.services.insert(name.to_string(), service);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_from_handle() {
        assert_eq!(OwnerRef::from_handle("@org/api"), OwnerRef::Team("@org/api".to_string()));
        assert_eq!(
            OwnerRef::from_handle("dev@example.com"),
            OwnerRef::Email("dev@example.com".to_string())
        );
        assert_eq!(OwnerRef::from_handle("alice"), OwnerRef::User("alice".to_string()));
    }

    #[test]
    fn test_owner_deserialize_forms() {
        let owners: Vec<OwnerRef> =
            serde_json::from_str(r#"["@org/web", {"user": "bob"}, {"email": "x@y.io"}]"#).unwrap();
        assert_eq!(
            owners,
            vec![
                OwnerRef::Team("@org/web".to_string()),
                OwnerRef::User("bob".to_string()),
                OwnerRef::Email("x@y.io".to_string()),
            ]
        );
    }

    #[test]
    fn test_owner_table_requires_a_field() {
        let result: Result<OwnerRef, _> = serde_json::from_str(r##"{"slack": "#x"}"##);
        assert!(result.is_err());
    }

    #[test]
    fn test_service_contact_and_owners_line() {
        let mut service = Service::default();
        assert!(!service.has_contact());

        service.owners = vec![OwnerRef::Team("@org/a".to_string()), OwnerRef::User("b".to_string())];
        assert!(service.has_contact());
        assert_eq!(service.owners_line(), "@org/a, b");

        let slack_only = Service {
            contact: Contact {
                slack: Some("#api".to_string()),
                email: None,
            },
            ..Service::default()
        };
        assert!(slack_only.has_contact());
    }
}
