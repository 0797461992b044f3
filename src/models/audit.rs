//! Ticket audit models.

use serde::Deserialize;
use serde_json::Value;

/// Event type marking the start of a messaging conversation.
pub const CHAT_STARTED_EVENT: &str = "ChatStartedEvent";

/// One event of a ticket audit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuditEvent {
    /// Event id.
    pub id: u64,

    /// Event type.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Event payload; for chat started events it carries
    /// `conversation_id` and `channel`.
    #[serde(default)]
    pub value: Option<Value>,
}

impl AuditEvent {
    /// Returns the conversation id of a chat started event.
    pub fn conversation_id(&self) -> Option<&str> {
        self.value.as_ref()?.get("conversation_id")?.as_str()
    }

    /// Returns the channel of a chat started event.
    pub fn channel(&self) -> Option<&str> {
        self.value.as_ref()?.get("channel")?.as_str()
    }
}

/// A ticket audit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Audit {
    /// Audit id.
    pub id: u64,

    /// Audited ticket.
    #[serde(default)]
    pub ticket_id: Option<u64>,

    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,

    /// Author of the change.
    #[serde(default)]
    pub author_id: Option<u64>,

    /// Events recorded in this audit.
    #[serde(default)]
    pub events: Vec<AuditEvent>,
}
