//! Integration services (ZIS) registry models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A registered integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZisIntegration {
    /// Integration name; absent from creation responses.
    #[serde(default)]
    pub name: String,

    /// Description.
    #[serde(default)]
    pub description: Option<String>,

    /// Public key used to verify integration JWTs.
    #[serde(default)]
    pub jwt_public_key: Option<String>,

    /// OAuth client created with the integration.
    #[serde(default)]
    pub zendesk_oauth_client: Option<Value>,
}

/// A job spec of an integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Job spec name.
    pub name: String,

    /// Description.
    #[serde(default)]
    pub description: Option<String>,

    /// Triggering event source.
    #[serde(default)]
    pub event_source: Option<String>,

    /// Triggering event type.
    #[serde(default)]
    pub event_type: Option<String>,

    /// Flow run by the job.
    #[serde(default)]
    pub flow_name: Option<String>,

    /// Whether the job spec is installed.
    #[serde(default)]
    pub installed: Option<bool>,

    /// Owning integration.
    #[serde(default)]
    pub integration: Option<String>,

    /// Job spec uuid.
    #[serde(default)]
    pub uuid: Option<String>,
}

/// An OAuth access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    /// Token id.
    #[serde(default)]
    pub id: Option<u64>,

    /// Token value, only present right after creation.
    #[serde(default)]
    pub full_token: Option<String>,

    /// Granted scopes.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Remaining attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
