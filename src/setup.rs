//! One-time custom object installation.
//!
//! Apps that store data in a custom object create it on first launch. The
//! routine is idempotent: a boolean installation setting records completion
//! and an already existing object is adopted instead of recreated.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{SetupFailure, ToolboxError};
use crate::models::CustomObjectDefinition;
use crate::services::{CustomObjectService, ZendeskApiService};
use crate::transport::{get_from_client, Transport};

const ADMIN_ROLE: &str = "admin";

/// Host path of the current user's role.
const CURRENT_USER_ROLE: &str = "currentUser.role";

/// Creates the custom object described by `definition` unless the
/// installation setting `settings_name` is already `"true"`.
///
/// # Errors
///
/// - `Setup(NoAdmin)` when the current user isn't an administrator
/// - `Setup(CustomObjectNotEnabled)` when the object can't be probed or created
/// - `Setup(CustomObjectCreation)` when one of its fields can't be created
///
/// Failures reading metadata, the user role or saving the setting propagate as is.
pub async fn ensure_custom_object(
    transport: Arc<dyn Transport>,
    settings_name: &str,
    definition: &CustomObjectDefinition,
) -> Result<(), ToolboxError> {
    let metadata = transport.metadata().await?;

    if metadata.setting_str(settings_name).as_deref() == Some("true") {
        tracing::debug!(setting = settings_name, "Custom object already set up");
        return Ok(());
    }

    let role = get_from_client(transport.as_ref(), CURRENT_USER_ROLE).await?;
    if role.as_str() != Some(ADMIN_ROLE) {
        return Err(ToolboxError::Setup(SetupFailure::NoAdmin));
    }

    let custom_objects = CustomObjectService::new(transport.clone());
    let zendesk = ZendeskApiService::new(transport);
    let key = definition.object.key.as_str();

    let existing = custom_objects.get_custom_object(key).await.map_err(|e| {
        tracing::warn!(custom_object = key, error = %e, "Custom object probe failed");
        ToolboxError::Setup(SetupFailure::CustomObjectNotEnabled)
    })?;

    if existing.is_none() {
        custom_objects
            .create_custom_object(&definition.object)
            .await
            .map_err(|e| {
                tracing::warn!(custom_object = key, error = %e, "Custom object creation failed");
                ToolboxError::Setup(SetupFailure::CustomObjectNotEnabled)
            })?;

        for field in &definition.fields {
            custom_objects
                .create_custom_object_field(key, field)
                .await
                .map_err(|e| {
                    tracing::warn!(
                        custom_object = key,
                        field = %field.key,
                        error = %e,
                        "Custom object field creation failed"
                    );
                    ToolboxError::Setup(SetupFailure::CustomObjectCreation)
                })?;
        }

        tracing::info!(
            custom_object = key,
            fields = definition.fields.len(),
            "Custom object created"
        );
    }

    let mut settings = Map::new();
    settings.insert(settings_name.to_string(), Value::from("true"));
    zendesk
        .update_installation_settings(&metadata.installation_id, settings)
        .await
}
