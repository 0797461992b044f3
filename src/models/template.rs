//! WhatsApp message templates.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::sunshine::Content;

/// Review status of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TemplateStatus {
    /// Approved by WhatsApp.
    Approved,
    /// Rejected by WhatsApp.
    Rejected,
    /// Waiting for review.
    Pending,
    /// Any other status.
    #[serde(other)]
    Unknown,
}

/// A WhatsApp template as listed by the messaging API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Template id.
    #[serde(default)]
    pub id: Option<String>,

    /// Template name.
    pub name: String,

    /// Header, body, footer and button components.
    #[serde(default)]
    pub components: Vec<Value>,

    /// Rendered message, when provided.
    #[serde(default)]
    pub message: Option<Value>,

    /// Language code, e.g. `en_US`.
    pub language: String,

    /// Review status.
    #[serde(default = "unknown_status")]
    pub status: TemplateStatus,

    /// Category, e.g. `UTILITY`.
    #[serde(default)]
    pub category: Option<String>,
}

fn unknown_status() -> TemplateStatus {
    TemplateStatus::Unknown
}

impl Template {
    /// Builds template message content for this template.
    ///
    /// `components` carries the parameter values of each component.
    pub fn to_content(&self, namespace: &str, components: Vec<Value>) -> Content {
        json!({
            "type": "template",
            "template": {
                "namespace": namespace,
                "name": self.name,
                "language": {
                    "policy": "deterministic",
                    "code": self.language
                },
                "components": components
            }
        })
    }
}

/// Payload for template creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTemplate {
    /// Template name.
    pub name: String,
    /// Language code.
    pub language: String,
    /// Category.
    pub category: String,
    /// Components.
    pub components: Vec<Value>,
}

/// Id and status assigned to a created template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTemplateRef {
    /// Review status.
    pub status: TemplateStatus,
    /// Template id.
    pub id: String,
}

/// Response of template creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateResponse {
    /// The created template.
    pub message_template: MessageTemplateRef,

    /// Echoed creation payload.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of the template listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatesPage {
    /// Templates; absent means none.
    #[serde(default)]
    pub message_templates: Option<Vec<Template>>,
    /// Cursor of the previous page.
    #[serde(default)]
    pub before: Option<String>,
    /// Cursor of the next page.
    #[serde(default)]
    pub after: Option<String>,
}
