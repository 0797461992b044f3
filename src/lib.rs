//! # zaf-toolbox
//!
//! Typed services for apps embedded in Zendesk Support: the Support REST API,
//! custom objects and Sunshine Conversations messaging.
//!
//! The services never open connections themselves. Every call is described as
//! a [`RequestOptions`](transport::RequestOptions) and handed to an injected
//! [`Transport`](transport::Transport): the host panel's client when running
//! inside Zendesk, or [`HttpTransport`](http_transport::HttpTransport) when
//! running standalone.
//!
//! ## Features
//!
//! - **Tickets and users**: fields, comments, batch reads, user search and bulk updates
//! - **Account listings**: tags, groups, organizations, roles, views, voice lines
//! - **Custom objects**: definitions, fields, records, search and bulk jobs
//! - **Messaging**: integrations, messages, WhatsApp templates and notifications
//! - **Integration services**: registry, job specs, connections and bundles
//! - **Pagination**: `next_page` URLs and cursors are followed transparently
//! - **Custom fields**: logical identifiers resolved to ticket field ids and values
//!
//! ## Architecture
//!
//! - [`config`] - Configuration loading from environment variables
//! - [`error`] - The [`ToolboxError`] type
//! - [`transport`] - The injected transport contract
//! - [`http_transport`] - reqwest implementation of the transport
//! - [`params`] - Bracket-notation query string serialization
//! - [`pagination`] - Page-following aggregation
//! - [`services`] - One service per remote API
//! - [`custom_fields`] - Custom field resolution
//! - [`setup`] - One-time custom object installation
//! - [`models`] - Request and response shapes
//!
//! ## Configuration
//!
//! [`HttpTransport`](http_transport::HttpTransport) reads:
//!
//! - `ZENDESK_BASE_URL`: Base URL of the Support instance
//! - `ZENDESK_EMAIL`: Agent email the token belongs to
//! - `ZENDESK_API_TOKEN`: API token
//!
//! The messaging service reads `SUNSHINE_APP_ID` and
//! `SUNSHINE_AUTHORIZATION_TOKEN`, see [`config::SunshineConfig`].
//!
//! ## Security Considerations
//!
//! Tokens are never logged and are stripped from error messages built from
//! HTTP responses.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use zaf_toolbox::config::ZendeskConfig;
//! use zaf_toolbox::http_transport::HttpTransport;
//! use zaf_toolbox::services::ZendeskApiService;
//!
//! async fn example() -> Result<(), zaf_toolbox::ToolboxError> {
//!     let config = ZendeskConfig::from_env()?;
//!     let transport = Arc::new(HttpTransport::new(&config)?);
//!     let service = ZendeskApiService::new(transport);
//!
//!     for group in service.get_groups(true).await? {
//!         println!("{}", group.name);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod custom_fields;
pub mod error;
pub mod http_transport;
pub mod models;
pub mod pagination;
pub mod params;
pub mod services;
pub mod setup;
pub mod transport;

pub use custom_fields::{CustomFieldsResolver, FieldSource, ResolverState};
pub use error::{SetupFailure, ToolboxError};
pub use services::{CustomObjectService, SunshineConversationApiService, ZendeskApiService};
pub use transport::{RequestOptions, Transport};
