//! Account level listings: tags, groups, organizations, roles, locales,
//! voice lines, SMS history and views.
//!
//! These are read-only shapes; unnamed attributes land in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tag and its usage count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name.
    pub name: String,
    /// Number of uses.
    #[serde(default)]
    pub count: Option<u64>,
}

/// An agent group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Group id.
    #[serde(default)]
    pub id: Option<u64>,
    /// Group name.
    pub name: String,
    /// Remaining attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    /// Organization id.
    #[serde(default)]
    pub id: Option<u64>,
    /// Organization name.
    pub name: String,
    /// Remaining attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A custom agent role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRole {
    /// Role id.
    #[serde(default)]
    pub id: Option<u64>,
    /// Role name.
    pub name: String,
    /// Remaining attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A locale available on the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locale {
    /// Locale id.
    #[serde(default)]
    pub id: Option<u64>,
    /// Locale code, e.g. `en-US`.
    pub locale: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// A Talk voice line. Only the common fields are named.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceLine {
    #[serde(default)]
    #[allow(missing_docs)]
    pub id: Option<u64>,
    #[serde(default)]
    #[allow(missing_docs)]
    pub name: Option<String>,
    #[serde(default)]
    #[allow(missing_docs)]
    pub nickname: Option<String>,
    #[serde(default)]
    #[allow(missing_docs)]
    pub display_number: Option<String>,
    /// Remaining attributes (capabilities, greetings, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Entry of the SMS message history; kept as raw JSON.
pub type SmsMessage = Value;

/// A ticket view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    /// View id.
    #[serde(default)]
    pub id: Option<u64>,
    /// View title.
    #[serde(default)]
    pub title: Option<String>,
    /// Whether the view is active.
    #[serde(default)]
    pub active: Option<bool>,
    /// Remaining attributes (conditions, execution, restriction, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Optional filters for view search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewSearchFilter {
    /// `personal`, `shared` or `account`.
    pub access: Option<String>,
    /// Only active or inactive views.
    pub active: Option<bool>,
    /// Restrict to a group.
    pub group_id: Option<u64>,
    /// Sideloads.
    pub include: Option<String>,
    /// `alphabetical`, `created_at`, `updated_at`, ...
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    pub sort_order: Option<String>,
}
