//! HTTP implementation of [`Transport`] for use outside the host panel.
//!
//! Inside the Zendesk app framework the host client authenticates and proxies
//! every request. `HttpTransport` stands in for it from scripts, jobs and
//! tests: requests go straight to the Support instance with API token basic
//! authentication, and host values (`get`, `metadata`) come from a static
//! context supplied at construction.
//!
//! # Retry Logic
//!
//! Transient failures are retried up to three attempts:
//! - HTTP 429 (rate limit): `Retry-After` when present, exponential backoff otherwise
//! - HTTP 502/503/504: fixed 500ms delay
//! - Timeouts: short fixed delay
//!
//! Other client errors are returned as `HttpStatus` without retry.
//!
//! # Security
//!
//! The API token is never logged and is stripped from error bodies.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Map, Value};
use url::Url;

use crate::config::ZendeskConfig;
use crate::error::ToolboxError;
use crate::params::build_url_params;
use crate::transport::{
    AppMetadata, HttpMethod, RequestBody, RequestOptions, Transport, JSON_CONTENT_TYPE,
};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of attempts for transient failures.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Initial delay for exponential backoff (milliseconds).
const INITIAL_BACKOFF_MS: u64 = 100;

/// Delay before retrying after a server error (milliseconds).
const SERVER_ERROR_DELAY_MS: u64 = 500;

/// Maximum length kept from error response bodies.
const MAX_ERROR_BODY_LEN: usize = 500;

/// reqwest-backed transport talking directly to a Support instance.
///
/// # Example
///
/// ```ignore
/// let transport = HttpTransport::new(&ZendeskConfig::from_env()?)?
///     .with_context("currentUser.role", "admin");
/// let service = ZendeskApiService::new(Arc::new(transport));
/// ```
#[derive(Clone)]
pub struct HttpTransport {
    /// The underlying HTTP client (cloning is cheap).
    http: Client,

    /// Base URL relative paths are joined onto, always ending with `/`.
    base_url: Url,

    /// Basic auth user, `{email}/token`.
    auth_user: String,

    /// SECURITY: Never log this value!
    api_token: String,

    /// Values answered by `get`.
    context: Map<String, Value>,

    /// Value answered by `metadata`.
    metadata: AppMetadata,
}

impl HttpTransport {
    /// Creates a transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ToolboxError::Config` for an unparsable base URL and
    /// `ToolboxError::HttpClient` if the HTTP client fails to initialize.
    pub fn new(config: &ZendeskConfig) -> Result<Self, ToolboxError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(ToolboxError::HttpClient)?;

        let base_url = Url::parse(&format!("{}/", config.base_url.trim_end_matches('/')))
            .map_err(|e| ToolboxError::invalid_config(format!("invalid ZENDESK_BASE_URL: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            auth_user: config.basic_auth_user(),
            api_token: config.api_token.clone(),
            context: Map::new(),
            metadata: AppMetadata::default(),
        })
    }

    /// Registers a value returned by `get` for `path`.
    pub fn with_context(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(path.into(), value.into());
        self
    }

    /// Sets the installation metadata returned by `metadata`.
    pub fn with_metadata(mut self, metadata: AppMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Absolute URLs are used verbatim; anything else is joined onto the base URL.
    fn resolve_url(&self, url: &str) -> Result<Url, ToolboxError> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .base_url
                .join(url.trim_start_matches('/'))
                .map_err(|e| ToolboxError::validation(format!("invalid request URL: {}", e))),
            Err(e) => Err(ToolboxError::validation(format!("invalid request URL: {}", e))),
        }
    }

    fn is_instance_url(&self, url: &Url) -> bool {
        url.origin() == self.base_url.origin()
    }

    /// Executes an operation with retry logic for transient failures.
    async fn with_retry<T, F, Fut>(&self, operation: &str, f: F) -> Result<T, ToolboxError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ToolboxError>>,
    {
        let mut delay = Duration::from_millis(INITIAL_BACKOFF_MS);
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match f().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempts < MAX_RETRY_ATTEMPTS => {
                    let actual_delay = if e.is_rate_limit() {
                        e.retry_after().unwrap_or(delay)
                    } else if matches!(e, ToolboxError::ServiceUnavailable { .. }) {
                        Duration::from_millis(SERVER_ERROR_DELAY_MS)
                    } else {
                        delay
                    };

                    tracing::debug!(
                        operation = operation,
                        attempt = attempts,
                        max_attempts = MAX_RETRY_ATTEMPTS,
                        delay_ms = actual_delay.as_millis() as u64,
                        error = %ToolboxError::sanitize_message(&e.to_string(), &self.api_token),
                        "Retrying after transient error"
                    );

                    tokio::time::sleep(actual_delay).await;

                    if e.is_rate_limit() {
                        delay *= 2;
                    }
                }
                Err(e) => {
                    if attempts > 1 {
                        tracing::debug!(
                            operation = operation,
                            attempts = attempts,
                            "All retry attempts exhausted"
                        );
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Sends one request without retry.
    async fn request_inner(&self, options: &RequestOptions) -> Result<Value, ToolboxError> {
        let method = options.effective_method();
        let mut target = options.url.clone();
        let mut payload: Option<String> = None;

        match &options.body {
            None => {}
            Some(RequestBody::Params(params)) if method == HttpMethod::Get => {
                let query = build_url_params(params);
                if !query.is_empty() {
                    let separator = if target.contains('?') { '&' } else { '?' };
                    target = format!("{}{}{}", target, separator, query);
                }
            }
            Some(RequestBody::Params(params)) => payload = Some(params.to_json().to_string()),
            Some(RequestBody::Value(value)) => payload = Some(value.to_string()),
            Some(RequestBody::Json(text)) => payload = Some(text.clone()),
        }

        let url = self.resolve_url(&target)?;

        tracing::debug!(
            method = %method,
            path = %url.path(),
            "Sending request"
        );

        let mut req = self
            .http
            .request(reqwest_method(method), url.clone())
            .header(ACCEPT, JSON_CONTENT_TYPE);

        let has_authorization = options
            .headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case(AUTHORIZATION.as_str()));
        if !has_authorization && self.is_instance_url(&url) {
            req = req.basic_auth(&self.auth_user, Some(&self.api_token));
        }

        for (name, value) in &options.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        match payload {
            Some(body) => {
                let content_type = options.content_type.as_deref().unwrap_or(JSON_CONTENT_TYPE);
                req = req.header(CONTENT_TYPE, content_type).body(body);
            }
            None => {
                if let Some(content_type) = &options.content_type {
                    req = req.header(CONTENT_TYPE, content_type.as_str());
                }
            }
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                return ToolboxError::timeout(
                    Duration::from_secs(DEFAULT_TIMEOUT_SECS),
                    format!("{} {}", method, url.path()),
                );
            }
            ToolboxError::Http(e)
        })?;
        let status = response.status();

        if !status.is_success() {
            return Err(self.handle_http_error(status, response).await);
        }

        let text = response.text().await.map_err(ToolboxError::Http)?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };

        if options.http_complete_response == Some(true) {
            return Ok(json!({
                "responseJSON": body,
                "status": status.as_u16()
            }));
        }

        Ok(body)
    }

    /// Classifies a non-success response.
    async fn handle_http_error(&self, status: StatusCode, response: reqwest::Response) -> ToolboxError {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let body = response.text().await.unwrap_or_default();
        let body = truncate_body(ToolboxError::sanitize_message(&body, &self.api_token));

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                tracing::warn!("Rate limited by server");
                ToolboxError::RateLimited { retry_after }
            }
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
                tracing::warn!(status = %status, "Server temporarily unavailable");
                ToolboxError::ServiceUnavailable {
                    status: status.as_u16(),
                }
            }
            _ => ToolboxError::HttpStatus {
                status: status.as_u16(),
                body,
            },
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, options: RequestOptions) -> Result<Value, ToolboxError> {
        let operation = format!("{} {}", options.effective_method(), options.url);
        self.with_retry(&operation, || self.request_inner(&options))
            .await
    }

    async fn get(&self, paths: &[String]) -> Result<Map<String, Value>, ToolboxError> {
        paths
            .iter()
            .map(|path| {
                self.context
                    .get(path)
                    .cloned()
                    .map(|value| (path.clone(), value))
                    .ok_or_else(|| ToolboxError::not_found(path.as_str()))
            })
            .collect()
    }

    async fn metadata(&self) -> Result<AppMetadata, ToolboxError> {
        Ok(self.metadata.clone())
    }
}

fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Cuts long bodies on a character boundary.
fn truncate_body(body: String) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_LEN) {
        Some((index, _)) => format!("{}...[truncated]", &body[..index]),
        None => body,
    }
}
