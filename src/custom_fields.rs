//! Custom ticket field resolution.
//!
//! Maps logical field identifiers (application-defined names) to the
//! platform's numeric field ids, then reads every current value from the host
//! in a single batched `get`.
//!
//! # Example
//!
//! ```ignore
//! let mut resolver = CustomFieldsResolver::new(
//!     service,
//!     vec!["order_number".to_string()],
//!     FieldSource::Requirements,
//! );
//! let fields = resolver.resolve().await?;
//! let order = &fields["order_number"];
//! ```

use serde_json::Value;

use crate::error::ToolboxError;
use crate::models::{CustomFields, TicketCustomField};
use crate::services::ZendeskApiService;

/// Where field ids come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// Match identifiers against the tags of the ticket fields listing.
    /// Useful during development, before requirements are provisioned.
    TicketFieldsApi,
    /// Read the ids of the requirements provisioned with the app.
    Requirements,
}

/// Lifecycle of one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    /// Nothing resolved yet.
    Unresolved,
    /// A resolution is in progress.
    Resolving,
    /// Every identifier was resolved.
    Resolved,
    /// The last resolution failed.
    Failed,
}

/// Resolves logical identifiers to ticket custom fields.
pub struct CustomFieldsResolver {
    service: ZendeskApiService,
    identifiers: Vec<String>,
    source: FieldSource,
    state: ResolverState,
    fields: CustomFields,
}

fn value_path(field_id: &str) -> String {
    format!("ticket.customField:custom_field_{}", field_id)
}

impl CustomFieldsResolver {
    /// Creates a resolver for `identifiers`.
    pub fn new(service: ZendeskApiService, identifiers: Vec<String>, source: FieldSource) -> Self {
        Self {
            service,
            identifiers,
            source,
            state: ResolverState::Unresolved,
            fields: CustomFields::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> ResolverState {
        self.state
    }

    /// Resolves every identifier and reads its current value.
    ///
    /// Each call starts from scratch.
    ///
    /// # Errors
    ///
    /// - `NotFound` when a requirement lookup fails
    /// - `MissingCustomFields`, listing every requested identifier, when some
    ///   identifier has no matching ticket field
    pub async fn resolve(&mut self) -> Result<CustomFields, ToolboxError> {
        self.fields.clear();
        self.state = ResolverState::Resolving;

        match self.run().await {
            Ok(()) => {
                self.state = ResolverState::Resolved;
                Ok(self.fields.clone())
            }
            Err(e) => {
                self.state = ResolverState::Failed;
                self.fields.clear();
                Err(e)
            }
        }
    }

    async fn run(&mut self) -> Result<(), ToolboxError> {
        match self.source {
            FieldSource::TicketFieldsApi => self.resolve_from_ticket_fields().await?,
            FieldSource::Requirements => self.resolve_from_requirements().await?,
        }

        self.fetch_values().await?;

        if self.fields.len() != self.identifiers.len() {
            tracing::debug!(
                requested = self.identifiers.len(),
                resolved = self.fields.len(),
                "Some custom fields could not be resolved"
            );
            return Err(ToolboxError::missing_custom_fields(&self.identifiers));
        }

        Ok(())
    }

    async fn resolve_from_ticket_fields(&mut self) -> Result<(), ToolboxError> {
        let ticket_fields = self.service.get_ticket_fields().await?;

        for identifier in &self.identifiers {
            let Some(field) = ticket_fields
                .iter()
                .find(|field| field.tag.as_deref() == Some(identifier.as_str()))
            else {
                continue;
            };

            self.fields.insert(
                identifier.clone(),
                TicketCustomField::new(field.id.to_string(), ""),
            );
        }

        Ok(())
    }

    async fn resolve_from_requirements(&mut self) -> Result<(), ToolboxError> {
        for identifier in &self.identifiers {
            let id = self.service.get_requirement_id(identifier).await?;
            self.fields
                .insert(identifier.clone(), TicketCustomField::new(id, ""));
        }

        Ok(())
    }

    async fn fetch_values(&mut self) -> Result<(), ToolboxError> {
        if self.fields.is_empty() {
            return Ok(());
        }

        let paths: Vec<String> = self
            .identifiers
            .iter()
            .filter_map(|identifier| self.fields.get(identifier))
            .map(|field| value_path(&field.id))
            .collect();
        let values = self.service.transport().get(&paths).await?;

        for field in self.fields.values_mut() {
            field.value = values
                .get(&value_path(&field.id))
                .cloned()
                .unwrap_or(Value::Null);
        }

        Ok(())
    }
}
