//! Custom objects API service.
//!
//! Covers object definitions, their fields, records, record search and bulk
//! jobs. Record payloads are generic over the shape of `custom_object_fields`
//! so callers can decode straight into their own structs.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::error::ToolboxError;
use crate::models::{
    BulkJob, CustomObject, CustomObjectField, CustomObjectRecord, JobStatus, NewCustomObject,
    NewCustomObjectField, NewCustomObjectRecord, RecordSearch, RecordSearchResults, RecordSort,
    RecordsFilter,
};
use crate::pagination::{collect_pages, cursor_envelope, PageStrategy};
use crate::params::{build_url_params, ParamMap};
use crate::transport::{HttpMethod, RequestBody, RequestOptions, Transport};

use super::{absent_if_not_found, unwrap_envelope};

const CUSTOM_OBJECTS_PATH: &str = "/api/v2/custom_objects";

/// Client for `/api/v2/custom_objects`.
#[derive(Clone)]
pub struct CustomObjectService {
    transport: Arc<dyn Transport>,
}

impl CustomObjectService {
    /// Creates a service over `transport`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    fn options(url: impl Into<String>, method: HttpMethod) -> RequestOptions {
        RequestOptions::with_method(url, method).json_content()
    }

    async fn send<T: DeserializeOwned>(
        &self,
        options: RequestOptions,
        key: &str,
    ) -> Result<T, ToolboxError> {
        unwrap_envelope(self.transport.request(options).await?, key)
    }

    async fn send_discarding(&self, options: RequestOptions) -> Result<(), ToolboxError> {
        self.transport.request(options).await?;
        Ok(())
    }

    // ── Objects ─────────────────────────────────────────────────

    /// Creates a custom object.
    pub async fn create_custom_object(
        &self,
        object: &NewCustomObject,
    ) -> Result<CustomObject, ToolboxError> {
        let body = RequestBody::json(&json!({ "custom_object": object }))?;
        self.send(
            Self::options(CUSTOM_OBJECTS_PATH, HttpMethod::Post).body(body),
            "custom_object",
        )
        .await
    }

    /// Lists custom objects.
    pub async fn list_custom_objects(&self) -> Result<Vec<CustomObject>, ToolboxError> {
        self.send(
            Self::options(CUSTOM_OBJECTS_PATH, HttpMethod::Get),
            "custom_objects",
        )
        .await
    }

    /// Reads a custom object; `None` when it doesn't exist.
    pub async fn get_custom_object(&self, key: &str) -> Result<Option<CustomObject>, ToolboxError> {
        absent_if_not_found(
            self.send(
                Self::options(format!("{}/{}", CUSTOM_OBJECTS_PATH, key), HttpMethod::Get),
                "custom_object",
            )
            .await,
        )
    }

    /// Deletes a custom object.
    pub async fn delete_custom_object(&self, key: &str) -> Result<(), ToolboxError> {
        self.send_discarding(Self::options(
            format!("{}/{}", CUSTOM_OBJECTS_PATH, key),
            HttpMethod::Delete,
        ))
        .await
    }

    // ── Fields ──────────────────────────────────────────────────

    /// Lists the fields of a custom object.
    pub async fn list_custom_object_fields(
        &self,
        key: &str,
        include_standard_fields: bool,
    ) -> Result<Vec<CustomObjectField>, ToolboxError> {
        let params = ParamMap::new().with("include_standard_fields", include_standard_fields);
        self.send(
            Self::options(format!("{}/{}/fields", CUSTOM_OBJECTS_PATH, key), HttpMethod::Get)
                .body(RequestBody::Params(params)),
            "custom_object_fields",
        )
        .await
    }

    /// Adds a field to a custom object.
    pub async fn create_custom_object_field(
        &self,
        key: &str,
        field: &NewCustomObjectField,
    ) -> Result<CustomObjectField, ToolboxError> {
        let body = RequestBody::json(&json!({ "custom_object_field": field }))?;
        self.send(
            Self::options(format!("{}/{}/fields", CUSTOM_OBJECTS_PATH, key), HttpMethod::Post)
                .body(body),
            "custom_object_field",
        )
        .await
    }

    /// Removes a field from a custom object.
    pub async fn delete_custom_object_field(
        &self,
        key: &str,
        field_key: &str,
    ) -> Result<(), ToolboxError> {
        self.send_discarding(Self::options(
            format!("{}/{}/fields/{}", CUSTOM_OBJECTS_PATH, key, field_key),
            HttpMethod::Delete,
        ))
        .await
    }

    // ── Records ─────────────────────────────────────────────────

    fn records_path(key: &str) -> String {
        format!("{}/{}/records", CUSTOM_OBJECTS_PATH, key)
    }

    /// Lists one page of records.
    pub async fn list_custom_object_records<F: DeserializeOwned>(
        &self,
        key: &str,
        filter: Option<&RecordsFilter>,
    ) -> Result<Vec<CustomObjectRecord<F>>, ToolboxError> {
        let mut options = Self::options(Self::records_path(key), HttpMethod::Get);
        if let Some(filter) = filter {
            options = options.body(RequestBody::Params(filter.to_params()));
        }

        let records: Option<Vec<CustomObjectRecord<F>>> =
            self.send(options, "custom_object_records").await?;
        Ok(records.unwrap_or_default())
    }

    /// Lists every record, following `meta.after_cursor`.
    ///
    /// The sort order applies to every page.
    pub async fn retrieve_all_records<F: DeserializeOwned>(
        &self,
        key: &str,
        sort: Option<RecordSort>,
    ) -> Result<Vec<CustomObjectRecord<F>>, ToolboxError> {
        let params = RecordsFilter {
            sort,
            ..Default::default()
        }
        .to_params();

        collect_pages(
            self.transport.as_ref(),
            Self::options(Self::records_path(key), HttpMethod::Get)
                .body(RequestBody::Params(params)),
            PageStrategy::BodyCursor,
            true,
            cursor_envelope("custom_object_records", "after_cursor"),
        )
        .await
    }

    /// Reads a record; `None` when it doesn't exist.
    pub async fn get_custom_object_record<F: DeserializeOwned>(
        &self,
        key: &str,
        id: &str,
    ) -> Result<Option<CustomObjectRecord<F>>, ToolboxError> {
        absent_if_not_found(
            self.send(
                Self::options(format!("{}/{}", Self::records_path(key), id), HttpMethod::Get),
                "custom_object_record",
            )
            .await,
        )
    }

    /// Creates a record.
    pub async fn create_custom_object_record<F: Serialize + DeserializeOwned>(
        &self,
        key: &str,
        record: &NewCustomObjectRecord<F>,
    ) -> Result<CustomObjectRecord<F>, ToolboxError> {
        let body = RequestBody::json(&json!({ "custom_object_record": record }))?;
        self.send(
            Self::options(Self::records_path(key), HttpMethod::Post).body(body),
            "custom_object_record",
        )
        .await
    }

    /// Replaces the name and field values of a record.
    pub async fn update_custom_object_record<F: Serialize + DeserializeOwned>(
        &self,
        key: &str,
        id: &str,
        record: &NewCustomObjectRecord<F>,
    ) -> Result<CustomObjectRecord<F>, ToolboxError> {
        let body = RequestBody::json(&json!({
            "custom_object_record": {
                "name": record.name,
                "custom_object_fields": record.custom_object_fields
            }
        }))?;
        self.send(
            Self::options(format!("{}/{}", Self::records_path(key), id), HttpMethod::Patch)
                .body(body),
            "custom_object_record",
        )
        .await
    }

    /// Deletes a record.
    pub async fn delete_custom_object_record(&self, key: &str, id: &str) -> Result<(), ToolboxError> {
        self.send_discarding(Self::options(
            format!("{}/{}", Self::records_path(key), id),
            HttpMethod::Delete,
        ))
        .await
    }

    /// Searches records.
    ///
    /// A text query is sent as GET parameters; a filter is POSTed as
    /// `{filter}` with the remaining options in the query string.
    pub async fn search_records<F: DeserializeOwned>(
        &self,
        key: &str,
        search: &RecordSearch,
    ) -> Result<RecordSearchResults<F>, ToolboxError> {
        let path = format!("{}/search", Self::records_path(key));
        let params = search.query_params();

        let options = match search {
            RecordSearch::Query { .. } => {
                Self::options(path, HttpMethod::Get).body(RequestBody::Params(params))
            }
            RecordSearch::Filter { filter, .. } => {
                let query = build_url_params(&params);
                let url = if query.is_empty() {
                    path
                } else {
                    format!("{}?{}", path, query)
                };
                Self::options(url, HttpMethod::Post)
                    .body(RequestBody::json(&json!({ "filter": filter }))?)
            }
        };

        let body = self.transport.request(options).await?;
        Ok(serde_json::from_value(body)?)
    }

    // ── Bulk jobs ───────────────────────────────────────────────

    /// Submits a bulk job over records.
    ///
    /// # Errors
    ///
    /// `Range` for an empty job or more than 100 items, `Validation` when an
    /// item lacks the key its action matches on. Nothing is sent in either case.
    pub async fn create_bulk_job<F: Serialize>(
        &self,
        key: &str,
        job: &BulkJob<F>,
    ) -> Result<JobStatus, ToolboxError> {
        job.validate()?;

        tracing::debug!(
            custom_object = key,
            action = job.action(),
            items = job.len(),
            "Submitting bulk job"
        );

        let body = RequestBody::json(&job.to_payload()?)?;
        self.send(
            Self::options(format!("{}/{}/jobs", CUSTOM_OBJECTS_PATH, key), HttpMethod::Post)
                .body(body),
            "job_status",
        )
        .await
    }
}
