//! Messaging (Sunshine Conversations) models.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message content posted to a conversation.
///
/// Content is passed through untouched; [`Template::to_content`] builds the
/// template variant.
///
/// [`Template::to_content`]: super::template::Template::to_content
pub type Content = Value;

/// Flat custom properties attached to a notification.
pub type MessageMetadata = Map<String, Value>;

/// Channel of a messaging integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    /// Web messenger.
    Web,
    /// WhatsApp.
    #[serde(rename = "whatsapp")]
    WhatsApp,
    /// Instagram.
    Instagram,
    /// iOS SDK.
    Ios,
    /// Twitter.
    Twitter,
    /// Facebook Messenger.
    Messenger,
    /// Twilio SMS.
    Twilio,
    /// MessageBird SMS.
    #[serde(rename = "messagebird")]
    MessageBird,
    /// Telegram.
    Telegram,
    /// Android SDK.
    Android,
    /// Any channel this crate doesn't name.
    #[serde(untagged)]
    Other(String),
}

impl ChannelType {
    /// Wire name of the channel.
    pub fn as_str(&self) -> &str {
        match self {
            ChannelType::Web => "web",
            ChannelType::WhatsApp => "whatsapp",
            ChannelType::Instagram => "instagram",
            ChannelType::Ios => "ios",
            ChannelType::Twitter => "twitter",
            ChannelType::Messenger => "messenger",
            ChannelType::Twilio => "twilio",
            ChannelType::MessageBird => "messagebird",
            ChannelType::Telegram => "telegram",
            ChannelType::Android => "android",
            ChannelType::Other(name) => name,
        }
    }

    /// Returns true for channels that can deliver notifications to a phone number.
    pub fn supports_notifications(&self) -> bool {
        matches!(
            self,
            ChannelType::MessageBird | ChannelType::Twilio | ChannelType::WhatsApp
        )
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An integration installed in the messaging app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    /// Integration id.
    pub id: String,

    /// Channel.
    #[serde(rename = "type")]
    pub channel: ChannelType,

    /// Integration status.
    #[serde(default)]
    pub status: Option<String>,

    /// Human-friendly name.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Channel specific attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Paging flag of an integrations listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationsMeta {
    /// Whether another page exists.
    #[serde(default)]
    pub has_more: bool,
}

/// Response of the integrations listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationsResponse {
    /// Integrations on this page.
    #[serde(default)]
    pub integrations: Vec<Integration>,
    /// Paging metadata.
    #[serde(default)]
    pub meta: IntegrationsMeta,
}

/// Filter of the integrations listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegrationsFilter {
    /// Comma separated channel types.
    pub types: String,
}

/// Cursor paging parameters of the messaging API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageParameters {
    /// Return records after this id.
    pub after: Option<String>,
    /// Return records before this id.
    pub before: Option<String>,
    /// Number of records, default 25.
    pub size: Option<u32>,
}

/// Kind of message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorType {
    /// An end user.
    User,
    /// The business.
    Business,
}

/// Author of posted messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    /// Author kind.
    #[serde(rename = "type")]
    pub author_type: AuthorType,

    /// User id, only for user authors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// External user id, only for user authors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_external_id: Option<String>,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Avatar image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Author {
    /// A business author with optional display name and avatar.
    pub fn business(display_name: Option<String>, avatar_url: Option<String>) -> Self {
        Self {
            author_type: AuthorType::Business,
            user_id: None,
            user_external_id: None,
            display_name,
            avatar_url,
        }
    }
}

/// Reference to a created notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRef {
    /// Notification id.
    #[serde(rename = "_id")]
    pub id: String,
}

/// Response of a notification send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendNotificationResponse {
    /// The created notification.
    pub notification: NotificationRef,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integration_known_and_unknown_channels() {
        let known: Integration = serde_json::from_value(json!({
            "id": "int-1", "type": "messagebird", "status": "active", "displayName": null,
            "originator": "+33600000000"
        }))
        .unwrap();
        assert_eq!(known.channel, ChannelType::MessageBird);
        assert!(known.channel.supports_notifications());
        assert_eq!(known.extra.get("originator"), Some(&json!("+33600000000")));

        let other: Integration =
            serde_json::from_value(json!({"id": "int-2", "type": "line"})).unwrap();
        assert_eq!(other.channel, ChannelType::Other("line".to_string()));
        assert_eq!(other.channel.to_string(), "line");
        assert!(!other.channel.supports_notifications());
    }

    #[test]
    fn test_business_author_serialization() {
        let author = Author::business(Some("Bot".to_string()), None);
        assert_eq!(
            serde_json::to_value(&author).unwrap(),
            json!({"type": "business", "displayName": "Bot"})
        );
    }

    #[test]
    fn test_notification_response() {
        let response: SendNotificationResponse =
            serde_json::from_value(json!({"notification": {"_id": "n-1"}})).unwrap();
        assert_eq!(response.notification.id, "n-1");
    }
}
