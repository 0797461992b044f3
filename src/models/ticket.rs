//! Ticket and ticket field models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::string_or_int;

/// A ticket field definition from `/api/v2/ticket_fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketField {
    /// Numeric field id.
    pub id: u64,

    /// Tag used to match logical field identifiers.
    #[serde(default)]
    pub tag: Option<String>,

    /// Display title.
    #[serde(default)]
    pub title: Option<String>,

    /// Field type (`text`, `tagger`, ...).
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,

    /// Whether the field is active.
    #[serde(default)]
    pub active: Option<bool>,

    /// Remaining attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A custom field id/value pair as sent in `ticket.fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketCustomField {
    /// Platform field id.
    pub id: String,

    /// Current value.
    pub value: Value,
}

impl TicketCustomField {
    /// Creates a field entry.
    pub fn new(id: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }
}

/// Logical field identifier mapped to its platform id and current value.
pub type CustomFields = BTreeMap<String, TicketCustomField>;

/// A requirement provisioned with the app, read from the host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Requirement {
    /// Id of the provisioned resource.
    #[serde(deserialize_with = "string_or_int")]
    pub requirement_id: String,

    /// Kind of the provisioned resource.
    #[serde(default)]
    pub requirement_type: Option<String>,
}

/// A ticket as returned by the Support API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket id.
    pub id: u64,

    /// Subject line.
    #[serde(default)]
    pub subject: Option<String>,

    /// Status (`new`, `open`, `pending`, ...).
    #[serde(default)]
    pub status: Option<String>,

    /// Priority.
    #[serde(default)]
    pub priority: Option<String>,

    /// API URL of the ticket.
    #[serde(default)]
    pub url: Option<String>,

    /// Whether the ticket has public comments.
    #[serde(default)]
    pub is_public: Option<bool>,

    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,

    /// Last update timestamp.
    #[serde(default)]
    pub updated_at: Option<String>,

    /// Remaining attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Comment attached to a new ticket.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TicketComment {
    /// Plain text body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// HTML body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_body: Option<String>,

    /// Whether the comment is public.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

/// Payload for ticket creation.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NewTicket {
    /// Subject line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Requester user id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_id: Option<u64>,

    /// Ticket type (`problem`, `incident`, `question`, `task`).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ticket_type: Option<String>,

    /// First comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<TicketComment>,

    /// Custom field values.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<TicketCustomField>,

    /// Any other ticket attribute.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewTicket {
    /// Creates a ticket with a subject and a plain text comment.
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            comment: Some(TicketComment {
                body: Some(body.into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Sets the requester.
    pub fn with_requester(mut self, requester_id: u64) -> Self {
        self.requester_id = Some(requester_id);
        self
    }

    /// Sets the ticket type.
    pub fn with_type(mut self, ticket_type: impl Into<String>) -> Self {
        self.ticket_type = Some(ticket_type.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_ticket_serialization_order_and_omissions() {
        let ticket = NewTicket::new("test", "Super important issue")
            .with_requester(123)
            .with_type("problem");
        assert_eq!(
            serde_json::to_string(&ticket).unwrap(),
            r#"{"subject":"test","requester_id":123,"type":"problem","comment":{"body":"Super important issue"}}"#
        );
    }

    #[test]
    fn test_requirement_numeric_id() {
        let requirement: Requirement =
            serde_json::from_value(json!({"requirement_id": 12334, "requirement_type": "number"}))
                .unwrap();
        assert_eq!(requirement.requirement_id, "12334");
    }

    #[test]
    fn test_ticket_field_keeps_extra() {
        let field: TicketField =
            serde_json::from_value(json!({"id": 1, "tag": "order", "position": 3})).unwrap();
        assert_eq!(field.tag.as_deref(), Some("order"));
        assert_eq!(field.extra.get("position"), Some(&json!(3)));
    }
}
