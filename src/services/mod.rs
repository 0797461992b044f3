//! Typed services over the injected [`Transport`].
//!
//! Each service wraps one shared transport handle and holds no other state.
//! Operations build a [`RequestOptions`], issue it (following pages where the
//! endpoint paginates) and unwrap the relevant field of the response envelope.
//!
//! [`Transport`]: crate::transport::Transport
//! [`RequestOptions`]: crate::transport::RequestOptions

mod custom_objects;
mod sunshine;
mod zendesk;

pub use custom_objects::CustomObjectService;
pub use sunshine::{ApiVersion, SunshineConversationApiService};
pub use zendesk::{ZendeskApiService, GET_TICKETS_MAX, UPDATE_USER_FIELD_MAX_USERS};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ToolboxError;

/// Decodes the value stored under `key` of a response envelope.
pub(crate) fn unwrap_envelope<T: DeserializeOwned>(
    mut body: Value,
    key: &str,
) -> Result<T, ToolboxError> {
    let value = body.get_mut(key).map(Value::take).unwrap_or(Value::Null);
    Ok(serde_json::from_value(value)?)
}

/// Strips the `{responseJSON, status}` wrapper of complete responses.
pub(crate) fn response_json(mut body: Value) -> Value {
    match body.get_mut("responseJSON") {
        Some(inner) => inner.take(),
        None => body,
    }
}

/// Turns a not-found failure into `None`; other failures propagate.
pub(crate) fn absent_if_not_found<T>(
    result: Result<T, ToolboxError>,
) -> Result<Option<T>, ToolboxError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_envelope() {
        let user: Value = unwrap_envelope(json!({"user": {"id": 1}}), "user").unwrap();
        assert_eq!(user, json!({"id": 1}));

        let missing: Option<u64> = unwrap_envelope(json!({}), "count").unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn test_response_json() {
        assert_eq!(
            response_json(json!({"responseJSON": {"a": 1}, "status": 201})),
            json!({"a": 1})
        );
        assert_eq!(response_json(json!({"a": 1})), json!({"a": 1}));
    }

    #[test]
    fn test_absent_if_not_found() {
        let not_found: Result<u8, _> = Err(ToolboxError::HttpStatus {
            status: 404,
            body: String::new(),
        });
        assert_eq!(absent_if_not_found(not_found).unwrap(), None);

        let forbidden: Result<u8, _> = Err(ToolboxError::HttpStatus {
            status: 403,
            body: String::new(),
        });
        assert!(absent_if_not_found(forbidden).is_err());
    }
}
