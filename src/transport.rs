//! The injected transport contract.
//!
//! Services never talk to the network themselves. They describe each call as
//! [`RequestOptions`] and hand it to a [`Transport`], which the host application
//! provides (the embedded app framework client, or [`HttpTransport`] outside it).
//!
//! [`HttpTransport`]: crate::http_transport::HttpTransport

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ToolboxError;
use crate::params::ParamMap;

/// JSON content type used by every JSON-encoded request body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP methods accepted by the remote APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Returns the method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body attached to a request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Pre-encoded JSON text, sent as is.
    Json(String),
    /// Structured parameters; the transport puts them in the query string for
    /// GET requests and encodes them otherwise.
    Params(ParamMap),
    /// Raw JSON object handed to the transport for encoding.
    Value(Value),
}

impl RequestBody {
    /// Encodes a serializable value as a [`RequestBody::Json`] body.
    pub fn json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Self, ToolboxError> {
        Ok(RequestBody::Json(serde_json::to_string(value)?))
    }
}

/// Description of one outgoing request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestOptions {
    /// Absolute URL or path relative to the host instance.
    pub url: String,
    /// HTTP method; `None` lets the transport default to GET.
    pub method: Option<HttpMethod>,
    /// Value of the `Content-Type` header.
    pub content_type: Option<String>,
    /// Request body.
    pub body: Option<RequestBody>,
    /// Extra headers.
    pub headers: BTreeMap<String, String>,
    /// Whether the host should substitute secure settings into the request.
    pub secure: Option<bool>,
    /// Whether the request targets another domain through the host proxy.
    pub cross_domain: Option<bool>,
    /// Whether the host should resolve with the complete HTTP response.
    pub http_complete_response: Option<bool>,
}

impl RequestOptions {
    /// Creates options for `url` with no method set.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Creates options for a request with an explicit method.
    pub fn with_method(url: impl Into<String>, method: HttpMethod) -> Self {
        Self::new(url).method(method)
    }

    /// Sets the HTTP method.
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the JSON content type.
    pub fn json_content(mut self) -> Self {
        self.content_type = Some(JSON_CONTENT_TYPE.to_string());
        self
    }

    /// Attaches a body.
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the `secure` flag.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    /// Sets the `cross_domain` flag.
    pub fn cross_domain(mut self, cross_domain: bool) -> Self {
        self.cross_domain = Some(cross_domain);
        self
    }

    /// Sets the `http_complete_response` flag.
    pub fn http_complete_response(mut self, complete: bool) -> Self {
        self.http_complete_response = Some(complete);
        self
    }

    /// Returns the effective method.
    pub fn effective_method(&self) -> HttpMethod {
        self.method.unwrap_or(HttpMethod::Get)
    }

    /// Returns the structured parameters of the body, if any.
    pub fn params(&self) -> Option<&ParamMap> {
        match &self.body {
            Some(RequestBody::Params(params)) => Some(params),
            _ => None,
        }
    }
}

/// Installation metadata exposed by the host.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AppMetadata {
    /// Installation id of the app; numeric in production, textual under local tooling.
    #[serde(
        rename = "installationId",
        default,
        deserialize_with = "crate::models::common::string_or_int"
    )]
    pub installation_id: String,
    /// Installation settings.
    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl AppMetadata {
    /// Returns the setting value as text, whatever its JSON type.
    pub fn setting_str(&self, name: &str) -> Option<String> {
        self.settings.get(name).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Client supplied by the host application.
///
/// Authentication, request dispatch, timeouts and transport-level retries are
/// the implementor's concern. Every call is awaited before the next is issued.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs a request and returns the decoded JSON body.
    async fn request(&self, options: RequestOptions) -> Result<Value, ToolboxError>;

    /// Reads host-provided values for each path.
    ///
    /// The returned map is keyed by path.
    async fn get(&self, paths: &[String]) -> Result<Map<String, Value>, ToolboxError>;

    /// Returns installation metadata.
    async fn metadata(&self) -> Result<AppMetadata, ToolboxError>;
}

/// Reads one host value.
///
/// A missing key is reported as `NotFound`.
pub async fn get_from_client(transport: &dyn Transport, path: &str) -> Result<Value, ToolboxError> {
    let mut values = transport.get(&[path.to_string()]).await?;
    values
        .remove(path)
        .ok_or_else(|| ToolboxError::not_found(path))
}


#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_options_builder() {
        let options = RequestOptions::with_method("/api/v2/tickets/1", HttpMethod::Put)
            .json_content()
            .header("Authorization", "Basic abc");
        assert_eq!(options.effective_method(), HttpMethod::Put);
        assert_eq!(options.content_type.as_deref(), Some(JSON_CONTENT_TYPE));
        assert_eq!(options.headers.get("Authorization").unwrap(), "Basic abc");
    }

    #[test]
    fn test_default_method_is_get() {
        assert_eq!(RequestOptions::new("/x").effective_method(), HttpMethod::Get);
    }

    #[test]
    fn test_json_body_encoding() {
        let body = RequestBody::json(&json!({"ticket": {"fields": []}})).unwrap();
        assert_eq!(body, RequestBody::Json(r#"{"ticket":{"fields":[]}}"#.to_string()));
    }

    #[test]
    fn test_metadata_setting_str() {
        let metadata: AppMetadata = serde_json::from_value(json!({
            "installationId": 12,
            "settings": {"done": "true", "flag": false}
        }))
        .unwrap();
        assert_eq!(metadata.installation_id, "12");
        assert_eq!(metadata.setting_str("done").as_deref(), Some("true"));
        assert_eq!(metadata.setting_str("flag").as_deref(), Some("false"));
        assert_eq!(metadata.setting_str("missing"), None);
    }

    #[test]
    fn test_mock_metadata_defaults_to_empty() {
        let transport = MockTransport::new();
        let metadata = tokio_test::block_on(transport.metadata()).unwrap();
        assert_eq!(metadata, AppMetadata::default());
        assert_eq!(metadata.setting_str("anything"), None);
    }

    #[tokio::test]
    async fn test_get_from_client_single_value() {
        let transport = MockTransport::new();
        transport.respond_get(json!({"currentUser.role": "admin"}));

        let value = get_from_client(&transport, "currentUser.role").await.unwrap();
        assert_eq!(value, json!("admin"));
        assert_eq!(transport.gets(), vec![vec!["currentUser.role".to_string()]]);
    }

    #[tokio::test]
    async fn test_get_from_client_missing_key() {
        let transport = MockTransport::new();
        transport.respond_get(json!({}));

        let err = get_from_client(&transport, "requirement:x").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
