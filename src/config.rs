//! Configuration loaded from environment variables.
//!
//! `ZendeskConfig` drives [`HttpTransport`] when the services run outside the
//! host panel; `SunshineConfig` carries the messaging app credentials.
//! Secrets are stored but never logged or exposed in error messages.
//!
//! [`HttpTransport`]: crate::http_transport::HttpTransport

use std::env;

use crate::error::ToolboxError;
use crate::models::Author;

/// Connection settings for a Zendesk Support instance.
#[derive(Clone)]
pub struct ZendeskConfig {
    /// Base URL of the instance (e.g., `https://acme.zendesk.com`).
    pub base_url: String,

    /// Email of the agent the API token belongs to.
    pub email: String,

    /// API token. Must never be logged.
    pub api_token: String,
}

impl std::fmt::Debug for ZendeskConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZendeskConfig")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

impl ZendeskConfig {
    /// Builds a validated configuration.
    pub fn new(
        base_url: impl Into<String>,
        email: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Result<Self, ToolboxError> {
        let base_url = validate_base_url("ZENDESK_BASE_URL", base_url.into())?;
        let api_token = api_token.into();
        validate_secret("ZENDESK_API_TOKEN", &api_token)?;

        Ok(Self {
            base_url,
            email: email.into().trim().to_string(),
            api_token,
        })
    }

    /// Loads configuration from environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `ZENDESK_BASE_URL`: base URL of the Support instance
    /// - `ZENDESK_EMAIL`: agent email
    /// - `ZENDESK_API_TOKEN`: API token of that agent
    ///
    /// A `.env` file in the working directory is loaded first when present.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let config = ZendeskConfig::from_env()?;
    /// let transport = HttpTransport::new(&config)?;
    /// ```
    pub fn from_env() -> Result<Self, ToolboxError> {
        load_dotenv();
        Self::new(
            required_env("ZENDESK_BASE_URL")?,
            required_env("ZENDESK_EMAIL")?,
            required_env("ZENDESK_API_TOKEN")?,
        )
    }

    /// User name for basic authentication with an API token.
    pub fn basic_auth_user(&self) -> String {
        format!("{}/token", self.email)
    }
}

/// Settings of the messaging (Sunshine Conversations) app.
#[derive(Clone)]
pub struct SunshineConfig {
    /// Messaging app id.
    pub app_id: String,

    /// Basic authorization token, already base64 encoded. Must never be logged.
    pub authorization_token: String,

    /// Whether the host substitutes secure settings into requests.
    pub use_secure: bool,

    /// Author of posted messages.
    pub author: Author,
}

impl std::fmt::Debug for SunshineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SunshineConfig")
            .field("app_id", &self.app_id)
            .field("authorization_token", &"[REDACTED]")
            .field("use_secure", &self.use_secure)
            .field("author", &self.author)
            .finish()
    }
}

impl SunshineConfig {
    /// Builds a configuration posting messages as `author`.
    pub fn new(
        app_id: impl Into<String>,
        authorization_token: impl Into<String>,
        use_secure: bool,
        author: Author,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            authorization_token: authorization_token.into(),
            use_secure,
            author,
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// `SUNSHINE_APP_ID` and `SUNSHINE_AUTHORIZATION_TOKEN` are required.
    /// `SUNSHINE_USE_SECURE` defaults to `false`; `SUNSHINE_AUTHOR_NAME` and
    /// `SUNSHINE_AUTHOR_AVATAR_URL` describe the business author.
    pub fn from_env() -> Result<Self, ToolboxError> {
        load_dotenv();
        let app_id = required_env("SUNSHINE_APP_ID")?;
        let authorization_token = required_env("SUNSHINE_AUTHORIZATION_TOKEN")?;
        validate_secret("SUNSHINE_AUTHORIZATION_TOKEN", &authorization_token)?;

        let use_secure = match optional_env("SUNSHINE_USE_SECURE") {
            Some(raw) => parse_bool("SUNSHINE_USE_SECURE", &raw)?,
            None => false,
        };

        let author = Author::business(
            optional_env("SUNSHINE_AUTHOR_NAME"),
            optional_env("SUNSHINE_AUTHOR_AVATAR_URL"),
        );

        Ok(Self::new(app_id, authorization_token, use_secure, author))
    }
}

/// Loads `.env` into the process environment; variables already set win.
fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }
}

/// Gets a required environment variable, returning an error if missing or empty.
fn required_env(name: &str) -> Result<String, ToolboxError> {
    optional_env(name).ok_or_else(|| ToolboxError::missing_env(name))
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Validates and normalizes a base URL.
fn validate_base_url(name: &str, url: String) -> Result<String, ToolboxError> {
    let url = url.trim().trim_end_matches('/').to_string();

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ToolboxError::invalid_config(format!(
            "{} must start with http:// or https://",
            name
        )));
    }

    Ok(url)
}

/// Rejects empty and placeholder secrets.
fn validate_secret(name: &str, secret: &str) -> Result<(), ToolboxError> {
    if secret.trim().is_empty() {
        return Err(ToolboxError::missing_env(name));
    }

    let lower = secret.to_lowercase();
    let placeholder_patterns = ["your_api_token", "your_token", "placeholder", "xxx", "changeme"];

    if placeholder_patterns.iter().any(|p| lower.contains(p)) {
        return Err(ToolboxError::invalid_config(format!(
            "{} appears to be a placeholder value",
            name
        )));
    }

    Ok(())
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, ToolboxError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ToolboxError::invalid_config(format!(
            "{} must be true or false",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tests avoid mutating the process environment; `from_env` is a thin
    // wrapper over the validators below.

    #[test]
    fn test_base_url_trailing_slash_removed() {
        let config = ZendeskConfig::new("https://acme.zendesk.com/", "a@b.c", "abc123").unwrap();
        assert_eq!(config.base_url, "https://acme.zendesk.com");
        assert_eq!(config.basic_auth_user(), "a@b.c/token");
    }

    #[test]
    fn test_base_url_requires_scheme() {
        let err = ZendeskConfig::new("acme.zendesk.com", "a@b.c", "abc123").unwrap_err();
        assert!(err.to_string().contains("ZENDESK_BASE_URL"));
    }

    #[test]
    fn test_placeholder_token_rejected() {
        assert!(ZendeskConfig::new("https://x.io", "a@b.c", "CHANGEME").is_err());
        assert!(validate_secret("T", "your_token_here").is_err());
        assert!(validate_secret("T", "  ").is_err());
        assert!(validate_secret("T", "s3cr3t").is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ZendeskConfig::new("https://x.io", "a@b.c", "s3cr3t").unwrap();
        assert!(!format!("{:?}", config).contains("s3cr3t"));

        let sunshine = SunshineConfig::new("app", "tok3n", true, Author::business(None, None));
        assert!(!format!("{:?}", sunshine).contains("tok3n"));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "TRUE").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }

    #[test]
    fn test_missing_required_env() {
        let err = required_env("ZAF_TOOLBOX_TEST_UNSET_VARIABLE").unwrap_err();
        assert!(matches!(err, ToolboxError::Config(_)));
    }
}
