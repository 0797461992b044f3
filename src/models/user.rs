//! User and user field models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A Support user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User id.
    pub id: u64,

    /// Display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Primary email.
    #[serde(default)]
    pub email: Option<String>,

    /// Primary phone number.
    #[serde(default)]
    pub phone: Option<String>,

    /// Role (`end-user`, `agent`, `admin`).
    #[serde(default)]
    pub role: Option<String>,

    /// Values of the account's user fields, keyed by field key.
    #[serde(default)]
    pub user_fields: Map<String, Value>,

    /// Remaining attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A user field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserField {
    /// Field id.
    #[serde(default)]
    pub id: Option<u64>,

    /// Field key used in `user_fields`.
    pub key: String,

    /// Display title.
    #[serde(default)]
    pub title: Option<String>,

    /// Field type.
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,

    /// Remaining attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// User field values keyed by field key, as sent to `update_many`.
pub type UserFieldValues = Map<String, Value>;
