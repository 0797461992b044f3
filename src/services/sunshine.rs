//! Sunshine Conversations (messaging) API service.
//!
//! Requests go cross-domain through the host proxy with the app's basic
//! authorization token. Integrations and messages use the v2 API; WhatsApp
//! templates and notifications only exist on v1.1.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::{json, Map, Value};

use crate::config::SunshineConfig;
use crate::error::ToolboxError;
use crate::models::{
    ChannelType, Content, CreateTemplate, CreateTemplateResponse, Integration, IntegrationsFilter,
    IntegrationsResponse, MessageMetadata, PageParameters, SendNotificationResponse, Template,
    TemplatesPage,
};
use crate::pagination::{collect_pages, top_level_cursor_envelope, PageStrategy};
use crate::params::{build_url_params, ParamMap};
use crate::transport::{HttpMethod, RequestBody, RequestOptions, Transport};

use super::response_json;

/// E.164 phone number: `+`, a non-zero digit, then 6 to 14 digits.
static INTERNATIONAL_PHONE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+[1-9][0-9]{6,14}$").expect("Failed to compile phone number regex")
});

/// Page size of the template listing.
const TEMPLATES_PAGE_LIMIT: u32 = 100;

/// Version of the messaging API a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    /// `https://api.smooch.io/v1.1`
    V1,
    /// `https://api.smooch.io/v2`
    V2,
}

impl ApiVersion {
    /// Base URL of this version.
    pub fn base_url(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "https://api.smooch.io/v1.1",
            ApiVersion::V2 => "https://api.smooch.io/v2",
        }
    }
}

/// Client for the messaging app configured in [`SunshineConfig`].
#[derive(Clone)]
pub struct SunshineConversationApiService {
    config: SunshineConfig,
    transport: Arc<dyn Transport>,
}

impl SunshineConversationApiService {
    /// Creates a service over `transport`.
    pub fn new(config: SunshineConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Builds the options of a messaging API call.
    ///
    /// A body is sent as JSON and the complete response is requested.
    fn options(
        &self,
        version: ApiVersion,
        path: &str,
        method: HttpMethod,
        data: Option<&Value>,
    ) -> Result<RequestOptions, ToolboxError> {
        let options = RequestOptions::with_method(format!("{}{}", version.base_url(), path), method)
            .secure(self.config.use_secure)
            .cross_domain(true)
            .header(
                "Authorization",
                format!("Basic {}", self.config.authorization_token),
            );

        Ok(match data {
            Some(data) => options
                .body(RequestBody::json(data)?)
                .json_content()
                .http_complete_response(true),
            None => options,
        })
    }

    fn app_path(&self, rest: &str) -> String {
        format!("/apps/{}{}", self.config.app_id, rest)
    }

    fn templates_path(&self, integration_id: &str) -> String {
        self.app_path(&format!("/integrations/{}/messageTemplates", integration_id))
    }

    /// Lists the integrations of the app.
    pub async fn get_integrations(
        &self,
        filter: Option<&IntegrationsFilter>,
        page: Option<&PageParameters>,
    ) -> Result<IntegrationsResponse, ToolboxError> {
        let mut path = self.app_path("/integrations");

        if filter.is_some() || page.is_some() {
            let mut params = ParamMap::new();
            if let Some(filter) = filter {
                params.insert("filter", ParamMap::new().with("types", filter.types.as_str()));
            }
            if let Some(page) = page {
                params.insert(
                    "page",
                    ParamMap::new()
                        .with("after", page.after.clone())
                        .with("before", page.before.clone())
                        .with("size", page.size),
                );
            }
            path = format!("{}?{}", path, build_url_params(&params));
        }

        let body = self
            .transport
            .request(self.options(ApiVersion::V2, &path, HttpMethod::Get, None)?)
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Posts a message to a conversation as the configured author.
    pub async fn post_message(&self, conversation_id: &str, content: &Content) -> Result<(), ToolboxError> {
        let data = json!({ "author": self.config.author, "content": content });
        let options = self.options(
            ApiVersion::V2,
            &self.app_path(&format!("/conversations/{}/messages", conversation_id)),
            HttpMethod::Post,
            Some(&data),
        )?;

        self.transport.request(options).await?;
        Ok(())
    }

    /// Lists every WhatsApp template of an integration.
    ///
    /// # Errors
    ///
    /// `NotFound` naming the integration when any page fails.
    pub async fn get_whatsapp_templates(&self, integration_id: &str) -> Result<Vec<Template>, ToolboxError> {
        let path = format!(
            "{}?limit={}",
            self.templates_path(integration_id),
            TEMPLATES_PAGE_LIMIT
        );
        let seed = self.options(ApiVersion::V1, &path, HttpMethod::Get, None)?;

        collect_pages(
            self.transport.as_ref(),
            seed,
            PageStrategy::QueryCursor { param: "after" },
            true,
            top_level_cursor_envelope("messageTemplates", "after"),
        )
        .await
        .map_err(|e| {
            tracing::debug!(integration = integration_id, error = %e, "Template listing failed");
            ToolboxError::not_found(integration_id)
        })
    }

    /// Reads one WhatsApp template by name; `None` when it doesn't exist.
    pub async fn get_whatsapp_template(
        &self,
        integration_id: &str,
        name: &str,
    ) -> Result<Option<Template>, ToolboxError> {
        let path = format!(
            "{}?name={}",
            self.templates_path(integration_id),
            urlencoding::encode(name)
        );
        let body = self
            .transport
            .request(self.options(ApiVersion::V1, &path, HttpMethod::Get, None)?)
            .await?;

        let page: TemplatesPage = serde_json::from_value(body)?;
        Ok(page.message_templates.unwrap_or_default().into_iter().next())
    }

    /// Submits a WhatsApp template for approval.
    pub async fn create_whatsapp_template(
        &self,
        integration_id: &str,
        template: &CreateTemplate,
    ) -> Result<CreateTemplateResponse, ToolboxError> {
        let data = serde_json::to_value(template)?;
        let options = self.options(
            ApiVersion::V1,
            &self.templates_path(integration_id),
            HttpMethod::Post,
            Some(&data),
        )?;

        let body = self.transport.request(options).await?;
        Ok(serde_json::from_value(response_json(body))?)
    }

    /// Deletes a WhatsApp template.
    pub async fn delete_whatsapp_template(&self, integration_id: &str, name: &str) -> Result<(), ToolboxError> {
        let path = format!(
            "{}/{}",
            self.templates_path(integration_id),
            urlencoding::encode(name)
        );
        self.transport
            .request(self.options(ApiVersion::V1, &path, HttpMethod::Delete, None)?)
            .await?;
        Ok(())
    }

    /// Sends a notification to a phone number through an SMS or WhatsApp integration.
    ///
    /// # Errors
    ///
    /// `Validation` when the phone number isn't in international format and
    /// `Unsupported` for channels that can't notify. Nothing is sent in either case.
    pub async fn send_notification(
        &self,
        integration: &Integration,
        phone_number: &str,
        message: &Content,
        metadata: Option<&MessageMetadata>,
    ) -> Result<SendNotificationResponse, ToolboxError> {
        if !INTERNATIONAL_PHONE_NUMBER.is_match(phone_number) {
            return Err(ToolboxError::validation(
                "Phone number should follow this format: +<dial_code><number>",
            ));
        }

        if !integration.channel.supports_notifications() {
            return Err(ToolboxError::unsupported(integration.channel.as_str()));
        }

        let mut payload = Map::new();
        payload.insert(
            "destination".to_string(),
            json!({ "integrationId": integration.id, "destinationId": phone_number }),
        );
        payload.insert("author".to_string(), json!({ "role": "appMaker" }));
        payload.insert("message".to_string(), message.clone());
        if integration.channel == ChannelType::WhatsApp {
            payload.insert(
                "messageSchema".to_string(),
                Value::from(ChannelType::WhatsApp.as_str()),
            );
        }
        if let Some(metadata) = metadata {
            payload.insert("metadata".to_string(), Value::Object(metadata.clone()));
        }

        tracing::debug!(
            integration = %integration.id,
            channel = %integration.channel,
            "Sending notification"
        );

        let options = self.options(
            ApiVersion::V1,
            &self.app_path("/notifications"),
            HttpMethod::Post,
            Some(&Value::Object(payload)),
        )?;

        let body = self.transport.request(options).await?;
        Ok(serde_json::from_value(response_json(body))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Author, TemplateStatus};
    use crate::transport::mock::{body_json, MockTransport};
    use pretty_assertions::assert_eq;

    fn service() -> (Arc<MockTransport>, SunshineConversationApiService) {
        let transport = Arc::new(MockTransport::new());
        let config = SunshineConfig::new(
            "suncoAppId",
            "suncoApiToken",
            false,
            Author::business(Some("name".to_string()), Some("avatarUrl".to_string())),
        );
        (
            transport.clone(),
            SunshineConversationApiService::new(config, transport),
        )
    }

    fn base_options(url: &str, method: HttpMethod) -> RequestOptions {
        RequestOptions::with_method(url, method)
            .secure(false)
            .cross_domain(true)
            .header("Authorization", "Basic suncoApiToken")
    }

    fn whatsapp_integration() -> Integration {
        serde_json::from_value(json!({
            "id": "id",
            "type": "whatsapp",
            "status": "active",
            "displayName": "WhatsApp",
            "phoneNumber": "+12345678900"
        }))
        .unwrap()
    }

    fn template_json() -> Value {
        json!({
            "id": "id",
            "name": "name",
            "components": [],
            "message": "message",
            "language": "fr",
            "status": "APPROVED",
            "category": "category"
        })
    }

    // ── Integrations ────────────────────────────────────────────

    #[tokio::test]
    async fn test_get_integrations_without_params() {
        let (transport, service) = service();
        transport.respond(json!({"integrations": [{"id": "id", "type": "whatsapp"}]}));

        let response = service.get_integrations(None, None).await.unwrap();

        assert_eq!(response.integrations.len(), 1);
        assert_eq!(
            transport.requests()[0],
            base_options(
                "https://api.smooch.io/v2/apps/suncoAppId/integrations",
                HttpMethod::Get
            )
        );
    }

    #[tokio::test]
    async fn test_get_integrations_with_filter_and_page() {
        let (transport, service) = service();
        transport
            .respond(json!({"integrations": []}))
            .respond(json!({"integrations": []}));

        let page = PageParameters {
            size: Some(10),
            ..Default::default()
        };
        let filter = IntegrationsFilter {
            types: "whatsapp,messenger".to_string(),
        };
        service.get_integrations(None, Some(&page)).await.unwrap();
        service.get_integrations(Some(&filter), Some(&page)).await.unwrap();

        let requests = transport.requests();
        assert_eq!(
            requests[0].url,
            "https://api.smooch.io/v2/apps/suncoAppId/integrations?page[size]=10"
        );
        assert_eq!(
            requests[1].url,
            "https://api.smooch.io/v2/apps/suncoAppId/integrations?filter[types]=whatsapp,messenger&page[size]=10"
        );
    }

    // ── Messages ────────────────────────────────────────────────

    #[tokio::test]
    async fn test_post_message() {
        let (transport, service) = service();
        let content = json!({"type": "text", "text": "Your cart contains 3 items"});

        service.post_message("conversationId", &content).await.unwrap();

        let request = &transport.requests()[0];
        assert_eq!(
            request.url,
            "https://api.smooch.io/v2/apps/suncoAppId/conversations/conversationId/messages"
        );
        assert_eq!(request.method, Some(HttpMethod::Post));
        assert_eq!(request.http_complete_response, Some(true));
        assert_eq!(request.content_type.as_deref(), Some("application/json"));
        assert_eq!(
            body_json(request),
            json!({
                "author": {"type": "business", "displayName": "name", "avatarUrl": "avatarUrl"},
                "content": {"type": "text", "text": "Your cart contains 3 items"}
            })
        );
    }

    // ── Templates ───────────────────────────────────────────────

    #[tokio::test]
    async fn test_get_whatsapp_templates_follows_after() {
        let (transport, service) = service();
        transport
            .respond(json!({"messageTemplates": [template_json()], "after": "after"}))
            .respond(json!({"messageTemplates": []}));

        let templates = service.get_whatsapp_templates("integrationId").await.unwrap();

        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].status, TemplateStatus::Approved);
        let base = "https://api.smooch.io/v1.1/apps/suncoAppId/integrations/integrationId/messageTemplates?limit=100";
        let requests = transport.requests();
        assert_eq!(requests[0], base_options(base, HttpMethod::Get));
        assert_eq!(
            requests[1],
            base_options(&format!("{}&after=after", base), HttpMethod::Get)
        );
    }

    #[tokio::test]
    async fn test_get_whatsapp_templates_empty_response() {
        let (transport, service) = service();
        transport.respond(json!({}));

        let templates = service.get_whatsapp_templates("integrationId").await.unwrap();

        assert!(templates.is_empty());
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_get_whatsapp_templates_failure_is_not_found() {
        let (transport, service) = service();
        transport.fail(ToolboxError::HttpStatus {
            status: 400,
            body: "Integration not found".to_string(),
        });

        let err = service.get_whatsapp_templates("integrationId").await.unwrap_err();

        assert!(matches!(err, ToolboxError::NotFound { ref what } if what == "integrationId"));
    }

    #[tokio::test]
    async fn test_get_whatsapp_template() {
        let (transport, service) = service();
        transport
            .respond(json!({"messageTemplates": []}))
            .respond(json!({"messageTemplates": [template_json()]}));

        assert_eq!(
            service.get_whatsapp_template("integrationId", "name").await.unwrap(),
            None
        );
        let template = service
            .get_whatsapp_template("integrationId", "name")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(template.name, "name");
        assert_eq!(
            transport.requests()[0].url,
            "https://api.smooch.io/v1.1/apps/suncoAppId/integrations/integrationId/messageTemplates?name=name"
        );
    }

    #[tokio::test]
    async fn test_create_whatsapp_template() {
        let (transport, service) = service();
        transport.respond(json!({
            "responseJSON": {
                "name": "name",
                "messageTemplate": {"status": "APPROVED", "id": "id"}
            },
            "status": 201
        }));

        let payload = CreateTemplate {
            name: "name".to_string(),
            language: "fr".to_string(),
            category: "category".to_string(),
            components: Vec::new(),
        };
        let created = service
            .create_whatsapp_template("integrationId", &payload)
            .await
            .unwrap();

        assert_eq!(created.message_template.id, "id");
        let request = &transport.requests()[0];
        assert_eq!(request.method, Some(HttpMethod::Post));
        assert_eq!(
            body_json(request),
            json!({"name": "name", "language": "fr", "category": "category", "components": []})
        );
    }

    #[tokio::test]
    async fn test_delete_whatsapp_template() {
        let (transport, service) = service();

        service
            .delete_whatsapp_template("integrationId", "templateName")
            .await
            .unwrap();

        assert_eq!(
            transport.requests()[0],
            base_options(
                "https://api.smooch.io/v1.1/apps/suncoAppId/integrations/integrationId/messageTemplates/templateName",
                HttpMethod::Delete
            )
        );
    }

    #[tokio::test]
    async fn test_delete_whatsapp_template_encodes_name() {
        let (transport, service) = service();

        service
            .delete_whatsapp_template("integrationId", "order shipped/v2")
            .await
            .unwrap();

        assert_eq!(
            transport.requests()[0].url,
            "https://api.smooch.io/v1.1/apps/suncoAppId/integrations/integrationId/messageTemplates/order%20shipped%2Fv2"
        );
    }

    // ── Notifications ───────────────────────────────────────────

    #[tokio::test]
    async fn test_send_notification_rejects_bad_phone_numbers() {
        let (transport, service) = service();
        let message = json!({"type": "text", "text": "Some message"});

        for phone in [
            "11231231234",
            "+0123123123",
            "+12345",
            "+1234567890123456",
            "+1٢٣٤٥٦٧٨",
            "+1２３４５６７",
        ] {
            let err = service
                .send_notification(&whatsapp_integration(), phone, &message, None)
                .await
                .unwrap_err();
            assert!(matches!(err, ToolboxError::Validation(_)), "{}", phone);
        }
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_send_notification_rejects_unsupported_channel() {
        let (transport, service) = service();
        let mut integration = whatsapp_integration();
        integration.channel = ChannelType::Messenger;

        let err = service
            .send_notification(&integration, "+11231231234", &json!({}), None)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "messenger isn't supported.");
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_send_notification_whatsapp() {
        let (transport, service) = service();
        transport.respond(json!({
            "responseJSON": {"notification": {"_id": "notification-id"}},
            "status": 201
        }));
        let message = json!({"type": "text", "text": "Some message"});

        let response = service
            .send_notification(&whatsapp_integration(), "+11231231234", &message, None)
            .await
            .unwrap();

        assert_eq!(response.notification.id, "notification-id");
        let request = &transport.requests()[0];
        assert_eq!(
            request.url,
            "https://api.smooch.io/v1.1/apps/suncoAppId/notifications"
        );
        assert_eq!(
            body_json(request),
            json!({
                "destination": {"integrationId": "id", "destinationId": "+11231231234"},
                "author": {"role": "appMaker"},
                "message": {"type": "text", "text": "Some message"},
                "messageSchema": "whatsapp"
            })
        );
    }

    #[tokio::test]
    async fn test_send_notification_twilio_with_metadata() {
        let (transport, service) = service();
        transport.respond(json!({"notification": {"_id": "n"}}));
        let mut integration = whatsapp_integration();
        integration.channel = ChannelType::Twilio;
        let mut metadata = MessageMetadata::new();
        metadata.insert("ticket_id".to_string(), json!(42));

        service
            .send_notification(&integration, "+11231231234", &json!({"type": "text"}), Some(&metadata))
            .await
            .unwrap();

        let body = body_json(&transport.requests()[0]);
        assert_eq!(body.get("messageSchema"), None);
        assert_eq!(body["metadata"], json!({"ticket_id": 42}));
    }
}
