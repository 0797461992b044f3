//! Zendesk Support API service.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::error::ToolboxError;
use crate::models::{
    AccessToken, Audit, AuditEvent, CustomRole, Group, JobSpec, JobStatus, Locale, NewTicket,
    Organization, Requirement, SmsMessage, Tag, Ticket, TicketCustomField, TicketField, User,
    UserField, UserFieldValues, View, ViewSearchFilter, VoiceLine, ZisIntegration,
    CHAT_STARTED_EVENT,
};
use crate::pagination::{collect_pages, cursor_envelope, next_page_envelope, PageStrategy};
use crate::params::{build_url_params, encode_uri, ParamMap};
use crate::transport::{get_from_client, HttpMethod, RequestBody, RequestOptions, Transport};

use super::{absent_if_not_found, unwrap_envelope};

/// Maximum number of users updated by one `update_many` call.
pub const UPDATE_USER_FIELD_MAX_USERS: usize = 90;

/// Maximum number of tickets read by one `show_many` call.
pub const GET_TICKETS_MAX: usize = 100;

/// Default page size of integration-services listings.
const ZIS_PAGE_SIZE: &str = "100";

/// Client for the Support REST API (`/api/v2`) and the integration services
/// registry (`/api/services/zis`).
///
/// # Example
///
/// ```ignore
/// let service = ZendeskApiService::new(transport.clone());
/// let tags = service.get_tags(true).await?;
/// ```
#[derive(Clone)]
pub struct ZendeskApiService {
    transport: Arc<dyn Transport>,
}

impl ZendeskApiService {
    /// Creates a service over `transport`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    async fn send<T: DeserializeOwned>(
        &self,
        options: RequestOptions,
        key: &str,
    ) -> Result<T, ToolboxError> {
        unwrap_envelope(self.transport.request(options).await?, key)
    }

    async fn list_pages<T: DeserializeOwned>(
        &self,
        url: impl Into<String>,
        key: &'static str,
        fetch_all: bool,
    ) -> Result<Vec<T>, ToolboxError> {
        collect_pages(
            self.transport.as_ref(),
            RequestOptions::new(url),
            PageStrategy::NextPageUrl,
            fetch_all,
            next_page_envelope(key),
        )
        .await
    }

    // ── Requirements and ticket fields ──────────────────────────

    /// Returns the id of the resource provisioned for `identifier`.
    ///
    /// # Errors
    ///
    /// `NotFound` naming the identifier when the host has no such requirement.
    pub async fn get_requirement_id(&self, identifier: &str) -> Result<String, ToolboxError> {
        let path = format!("requirement:{}", identifier);
        let requirement = match get_from_client(self.transport(), &path).await {
            Ok(value) => serde_json::from_value::<Requirement>(value).ok(),
            Err(e) => {
                tracing::debug!(identifier = identifier, error = %e, "Requirement lookup failed");
                None
            }
        };

        requirement
            .map(|r| r.requirement_id)
            .ok_or_else(|| ToolboxError::not_found(identifier))
    }

    /// Lists every ticket field.
    pub async fn get_ticket_fields(&self) -> Result<Vec<TicketField>, ToolboxError> {
        self.send(
            RequestOptions::with_method("/api/v2/ticket_fields", HttpMethod::Get).json_content(),
            "ticket_fields",
        )
        .await
    }

    // ── Tickets ─────────────────────────────────────────────────

    /// Sets custom field values on a ticket.
    pub async fn update_custom_field_ticket(
        &self,
        ticket_id: u64,
        fields: &[TicketCustomField],
    ) -> Result<(), ToolboxError> {
        let body = RequestBody::json(&json!({ "ticket": { "fields": fields } }))?;
        self.transport
            .request(
                RequestOptions::with_method(format!("/api/v2/tickets/{}", ticket_id), HttpMethod::Put)
                    .json_content()
                    .body(body),
            )
            .await?;
        Ok(())
    }

    /// Adds a comment to a ticket.
    ///
    /// `html` sends the text as `html_body`; a non-public comment is an internal note.
    pub async fn add_ticket_comment(
        &self,
        ticket_id: u64,
        body: &str,
        public: bool,
        html: bool,
    ) -> Result<(), ToolboxError> {
        let body_key = if html { "html_body" } else { "body" };
        let mut comment = Map::new();
        comment.insert(body_key.to_string(), Value::from(body));
        comment.insert("public".to_string(), Value::Bool(public));

        self.transport
            .request(
                RequestOptions::with_method(format!("/api/v2/tickets/{}", ticket_id), HttpMethod::Put)
                    .body(RequestBody::Value(json!({ "ticket": { "comment": comment } }))),
            )
            .await?;
        Ok(())
    }

    /// Reads up to [`GET_TICKETS_MAX`] tickets in one request.
    ///
    /// # Errors
    ///
    /// `Range` when more ids are given; nothing is sent in that case.
    pub async fn get_tickets(&self, ids: &[u64]) -> Result<Vec<Ticket>, ToolboxError> {
        if ids.len() > GET_TICKETS_MAX {
            return Err(ToolboxError::range(format!(
                "A limit of {} tickets can be retrieved at a time.",
                GET_TICKETS_MAX
            )));
        }

        let url = format!("/api/v2/tickets/show_many?ids={}", join_ids(ids));
        self.send(
            RequestOptions::with_method(url, HttpMethod::Get).json_content(),
            "tickets",
        )
        .await
    }

    /// Creates a ticket.
    pub async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket, ToolboxError> {
        let body = RequestBody::json(&json!({ "ticket": ticket }))?;
        self.send(
            RequestOptions::with_method("/api/v2/tickets", HttpMethod::Post)
                .json_content()
                .body(body),
            "ticket",
        )
        .await
    }

    /// Queues the creation of several tickets.
    pub async fn create_many_tickets(&self, tickets: &[NewTicket]) -> Result<JobStatus, ToolboxError> {
        let body = RequestBody::json(&json!({ "tickets": tickets }))?;
        self.send(
            RequestOptions::with_method("/api/v2/create_many", HttpMethod::Post)
                .json_content()
                .body(body),
            "job_status",
        )
        .await
    }

    /// Lists the audits of a ticket.
    pub async fn get_ticket_audits(&self, ticket_id: u64) -> Result<Vec<Audit>, ToolboxError> {
        let body = self
            .transport
            .request(RequestOptions::with_method(
                format!("/api/v2/tickets/{}/audits.json", ticket_id),
                HttpMethod::Get,
            ))
            .await?;

        unwrap_envelope::<Option<Vec<Audit>>>(body, "audits")?
            .ok_or_else(|| ToolboxError::not_found(format!("audits of ticket {}", ticket_id)))
    }

    /// Returns the first chat started event carrying a value.
    ///
    /// # Errors
    ///
    /// `NotFound` when the ticket has no such event.
    pub async fn get_started_chat_event(&self, ticket_id: u64) -> Result<AuditEvent, ToolboxError> {
        self.get_ticket_audits(ticket_id)
            .await?
            .into_iter()
            .flat_map(|audit| audit.events)
            .find(|event| event.event_type == CHAT_STARTED_EVENT && event.value.is_some())
            .ok_or_else(|| {
                ToolboxError::not_found(format!("chat started event of ticket {}", ticket_id))
            })
    }

    // ── Users ───────────────────────────────────────────────────

    /// Adds a verified email identity to a user.
    pub async fn add_email_to_requester(
        &self,
        requester_id: u64,
        email: &str,
    ) -> Result<(), ToolboxError> {
        self.transport
            .request(
                RequestOptions::with_method(
                    format!("/api/v2/users/{}/identities", requester_id),
                    HttpMethod::Post,
                )
                .body(RequestBody::Value(json!({
                    "identity": { "type": "email", "value": email, "verified": true }
                }))),
            )
            .await?;
        Ok(())
    }

    /// Reads a user; `None` when it doesn't exist.
    pub async fn get_user(&self, user_id: u64) -> Result<Option<User>, ToolboxError> {
        absent_if_not_found(
            self.send(RequestOptions::new(format!("/api/v2/users/{}", user_id)), "user")
                .await,
        )
    }

    /// Searches users.
    pub async fn search_users(&self, query: &str, fetch_all: bool) -> Result<Vec<User>, ToolboxError> {
        let url = format!("/api/v2/users/search?query={}", urlencoding::encode(query));
        self.list_pages(url, "users", fetch_all).await
    }

    /// Lists user field definitions.
    pub async fn get_user_fields(&self, fetch_all: bool) -> Result<Vec<UserField>, ToolboxError> {
        self.list_pages("/api/v2/user_fields", "user_fields", fetch_all)
            .await
    }

    /// Sets the same user field values on several users.
    ///
    /// # Errors
    ///
    /// `Range` above [`UPDATE_USER_FIELD_MAX_USERS`] users; nothing is sent in that case.
    pub async fn update_user_fields_value(
        &self,
        user_ids: &[u64],
        fields: &UserFieldValues,
    ) -> Result<(), ToolboxError> {
        if user_ids.len() > UPDATE_USER_FIELD_MAX_USERS {
            return Err(ToolboxError::range(format!(
                "Cannot update more than {} users at the time",
                UPDATE_USER_FIELD_MAX_USERS
            )));
        }

        let body = RequestBody::json(&json!({ "user": { "user_fields": fields } }))?;
        self.transport
            .request(
                RequestOptions::with_method(
                    format!("/api/v2/users/update_many?ids={}", encode_uri(&join_ids(user_ids))),
                    HttpMethod::Put,
                )
                .json_content()
                .body(body)
                .http_complete_response(true),
            )
            .await?;
        Ok(())
    }

    // ── Account listings ────────────────────────────────────────

    /// Lists tags.
    pub async fn get_tags(&self, fetch_all: bool) -> Result<Vec<Tag>, ToolboxError> {
        self.list_pages("/api/v2/tags", "tags", fetch_all).await
    }

    /// Lists groups.
    pub async fn get_groups(&self, fetch_all: bool) -> Result<Vec<Group>, ToolboxError> {
        self.list_pages("/api/v2/groups", "groups", fetch_all).await
    }

    /// Lists organizations.
    pub async fn get_organizations(&self, fetch_all: bool) -> Result<Vec<Organization>, ToolboxError> {
        self.list_pages("/api/v2/organizations", "organizations", fetch_all)
            .await
    }

    /// Lists custom agent roles.
    pub async fn get_roles(&self, fetch_all: bool) -> Result<Vec<CustomRole>, ToolboxError> {
        self.list_pages("/api/v2/custom_roles", "custom_roles", fetch_all)
            .await
    }

    /// Lists voice lines.
    pub async fn get_voice_lines(&self, fetch_all: bool) -> Result<Vec<VoiceLine>, ToolboxError> {
        self.list_pages("/api/v2/channels/voice/lines", "lines", fetch_all)
            .await
    }

    /// Lists the SMS message history.
    pub async fn get_message_history(&self, fetch_all: bool) -> Result<Vec<SmsMessage>, ToolboxError> {
        self.list_pages("/api/v2/channels/sms/message_history.json", "messages", fetch_all)
            .await
    }

    /// Lists the account locales.
    pub async fn get_locales(&self) -> Result<Vec<Locale>, ToolboxError> {
        self.send(RequestOptions::new("/api/v2/locales"), "locales")
            .await
    }

    // ── Views ───────────────────────────────────────────────────

    /// Lists views.
    pub async fn get_views(&self) -> Result<Vec<View>, ToolboxError> {
        self.send(RequestOptions::new("/api/v2/views"), "views").await
    }

    /// Lists active views.
    pub async fn get_active_views(&self) -> Result<Vec<View>, ToolboxError> {
        self.send(RequestOptions::new("/api/v2/views/active"), "views")
            .await
    }

    /// Searches views; unset filter options are left out of the query.
    pub async fn search_views(
        &self,
        query: &str,
        filter: &ViewSearchFilter,
        fetch_all: bool,
    ) -> Result<Vec<View>, ToolboxError> {
        let params = ParamMap::new()
            .with("query", query)
            .with("access", filter.access.clone())
            .with("active", filter.active)
            .with("group_id", filter.group_id)
            .with("include", filter.include.clone())
            .with("sort_by", filter.sort_by.clone())
            .with("sort_order", filter.sort_order.clone());

        let url = format!("/api/v2/views/search?{}", build_url_params(&params));
        self.list_pages(url, "views", fetch_all).await
    }

    // ── Integration services ────────────────────────────────────

    /// Lists the integrations of the registry.
    pub async fn fetch_zis_integrations(&self) -> Result<Vec<ZisIntegration>, ToolboxError> {
        self.send(
            RequestOptions::with_method("/api/services/zis/registry/integrations", HttpMethod::Get)
                .json_content(),
            "integrations",
        )
        .await
    }

    /// Registers a new integration.
    pub async fn create_zis_integration(
        &self,
        name: &str,
        description: &str,
    ) -> Result<ZisIntegration, ToolboxError> {
        let body = RequestBody::json(&json!({ "description": description }))?;
        let response = self
            .transport
            .request(
                RequestOptions::with_method(
                    format!("/api/services/zis/registry/{}", name),
                    HttpMethod::Post,
                )
                .json_content()
                .body(body),
            )
            .await?;
        Ok(serde_json::from_value(response)?)
    }

    /// Lists every job spec of an integration.
    ///
    /// `params` replaces the default `page[size]=100`.
    pub async fn fetch_zis_job_specs(
        &self,
        integration: &str,
        params: Option<ParamMap>,
    ) -> Result<Vec<JobSpec>, ToolboxError> {
        let params = params.unwrap_or_else(|| {
            let mut params = ParamMap::new();
            params.merge_nested("page", "size", ZIS_PAGE_SIZE);
            params
        });

        let seed = RequestOptions::with_method(
            format!("/api/services/zis/registry/{}/job_specs", integration),
            HttpMethod::Get,
        )
        .body(RequestBody::Params(params));

        collect_pages(
            self.transport(),
            seed,
            PageStrategy::BodyCursor,
            true,
            cursor_envelope("job_specs", "after"),
        )
        .await
    }

    /// Installs a job spec.
    pub async fn install_zis_job_spec(&self, job_spec_name: &str) -> Result<(), ToolboxError> {
        self.job_spec_install(job_spec_name, HttpMethod::Post).await
    }

    /// Uninstalls a job spec.
    pub async fn uninstall_zis_job_spec(&self, job_spec_name: &str) -> Result<(), ToolboxError> {
        self.job_spec_install(job_spec_name, HttpMethod::Delete).await
    }

    async fn job_spec_install(&self, job_spec_name: &str, method: HttpMethod) -> Result<(), ToolboxError> {
        let url = format!(
            "/api/services/zis/registry/job_specs/install?job_spec_name={}",
            urlencoding::encode(job_spec_name)
        );
        self.transport
            .request(RequestOptions::with_method(url, method).json_content())
            .await?;
        Ok(())
    }

    /// Creates an OAuth access token for a client.
    pub async fn create_access_token(
        &self,
        client_id: u64,
        scopes: &[&str],
    ) -> Result<AccessToken, ToolboxError> {
        let body = RequestBody::json(&json!({
            "token": { "client_id": client_id, "scopes": scopes }
        }))?;
        self.send(
            RequestOptions::with_method("/api/v2/oauth/tokens.json", HttpMethod::Post)
                .json_content()
                .body(body),
            "token",
        )
        .await
    }

    /// Creates a bearer token connection for an integration.
    pub async fn create_zis_bearer_token_connection(
        &self,
        integration: &str,
        token: &str,
        name: &str,
        allowed_domain: &str,
    ) -> Result<Value, ToolboxError> {
        let body = RequestBody::json(&json!({
            "name": name,
            "token": token,
            "allowed_domain": allowed_domain
        }))?;
        self.transport
            .request(
                RequestOptions::with_method(
                    format!("/api/services/zis/integrations/{}/connections/bearer_token", integration),
                    HttpMethod::Post,
                )
                .json_content()
                .header("Authorization", format!("Bearer {}", token))
                .body(body),
            )
            .await
    }

    /// Creates a generic inbound webhook for an integration.
    pub async fn create_zis_inbound_webhook(
        &self,
        integration: &str,
        token: &str,
        source_system: &str,
        event_type: &str,
    ) -> Result<Value, ToolboxError> {
        let body = RequestBody::json(&json!({
            "source_system": source_system,
            "event_type": event_type
        }))?;
        self.transport
            .request(
                RequestOptions::with_method(
                    format!("/api/services/zis/inbound_webhooks/generic/{}", integration),
                    HttpMethod::Post,
                )
                .json_content()
                .header("Authorization", format!("Bearer {}", token))
                .body(body),
            )
            .await
    }

    /// Uploads a bundle to an integration.
    pub async fn upload_zis_bundle(&self, integration: &str, bundle: &Value) -> Result<(), ToolboxError> {
        self.transport
            .request(
                RequestOptions::with_method(
                    format!("/api/services/zis/registry/{}/bundles", integration),
                    HttpMethod::Post,
                )
                .json_content()
                .body(RequestBody::json(bundle)?),
            )
            .await?;
        Ok(())
    }

    // ── App installation ────────────────────────────────────────

    /// Updates the settings of an app installation.
    pub async fn update_installation_settings(
        &self,
        installation_id: &str,
        settings: Map<String, Value>,
    ) -> Result<(), ToolboxError> {
        self.transport
            .request(
                RequestOptions::with_method(
                    format!("/api/v2/apps/installations/{}", installation_id),
                    HttpMethod::Put,
                )
                .body(RequestBody::Value(json!({ "settings": settings }))),
            )
            .await?;
        Ok(())
    }
}

fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
