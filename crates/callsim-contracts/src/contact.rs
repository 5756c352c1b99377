//! Directory contacts and the filter used by speed dial.

use serde::{Deserialize, Serialize};

/// Kind of directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactType {
    #[serde(rename = "PHONEBOOK")]
    PhoneBook,
    Queue,
    #[serde(rename = "PHONENUMBER")]
    PhoneNumber,
    Agent,
}

/// A remote party: either a directory entry or a free-form number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, alias = "phone_number", skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub contact_type: Option<ContactType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

impl Contact {
    /// A free-form number with no directory metadata.
    pub fn with_number(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: Some(phone_number.into()),
            ..Self::default()
        }
    }
}

/// Narrowing applied by `getPhoneContacts`. Both fields must hold when both
/// are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFilter {
    /// Substring matched against the contact's phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
    /// Exact contact type.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub contact_type: Option<ContactType>,
}

impl ContactFilter {
    pub fn matches(&self, contact: &Contact) -> bool {
        let number_matches = match &self.contains {
            Some(needle) => contact
                .phone_number
                .as_deref()
                .is_some_and(|number| number.contains(needle.as_str())),
            None => true,
        };
        let type_matches = match self.contact_type {
            Some(wanted) => contact.contact_type == Some(wanted),
            None => true,
        };
        number_matches && type_matches
    }
}
