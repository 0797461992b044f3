//! Custom object models: objects, fields, records, searches and bulk jobs.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::ToolboxError;
use crate::params::{ParamMap, ParamValue};

use super::common::CursorMeta;

/// Maximum number of items accepted in one bulk job.
pub const MAX_BULK_JOB_ITEMS: usize = 100;

/// Type of a custom object field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomObjectFieldType {
    /// Single line text.
    Text,
    /// Multi line text.
    Textarea,
    /// Checkbox.
    Checkbox,
    /// Date.
    Date,
    /// Integer.
    Integer,
    /// Decimal.
    Decimal,
    /// Text validated by a regular expression.
    Regexp,
    /// Dropdown.
    Dropdown,
    /// Lookup relationship.
    Lookup,
}

/// A custom object definition as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomObject {
    /// Object key.
    pub key: String,

    /// Singular title.
    #[serde(default)]
    pub title: Option<String>,

    /// Plural title.
    #[serde(default)]
    pub title_pluralized: Option<String>,

    /// Description.
    #[serde(default)]
    pub description: Option<String>,

    /// Remaining attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A field of a custom object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomObjectField {
    /// Field id.
    #[serde(default)]
    pub id: Option<u64>,

    /// Field key.
    pub key: String,

    /// Display title.
    #[serde(default)]
    pub title: Option<String>,

    /// Field type.
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,

    /// Whether the field is a system field.
    #[serde(default)]
    pub system: Option<bool>,

    /// Remaining attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload for custom object creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomObject {
    /// Object key.
    pub key: String,
    /// Singular title.
    pub title: String,
    /// Plural title.
    pub title_pluralized: String,
}

/// Payload for custom object field creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomObjectField {
    /// Field key.
    pub key: String,
    /// Display title.
    pub title: String,
    /// Field type.
    #[serde(rename = "type")]
    pub field_type: CustomObjectFieldType,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Target of a lookup field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_target_type: Option<String>,
}

/// Object plus fields, as provisioned by the installer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomObjectDefinition {
    /// The object to create.
    pub object: NewCustomObject,
    /// Fields created on the object, in order.
    pub fields: Vec<NewCustomObjectField>,
}

/// A record of a custom object.
///
/// `F` is the shape of `custom_object_fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomObjectRecord<F = Map<String, Value>> {
    /// Record id.
    pub id: String,

    /// Record name.
    #[serde(default)]
    pub name: Option<String>,

    /// Owning object key.
    #[serde(default)]
    pub custom_object_key: Option<String>,

    /// Field values.
    pub custom_object_fields: F,

    /// External id.
    #[serde(default)]
    pub external_id: Option<String>,

    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,

    /// Last update timestamp.
    #[serde(default)]
    pub updated_at: Option<String>,

    /// Remaining attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Record payload for creation, update and upserts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomObjectRecord<F = Map<String, Value>> {
    /// Record name.
    pub name: String,
    /// Field values.
    pub custom_object_fields: F,
    /// External id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

impl<F> NewCustomObjectRecord<F> {
    /// Creates a record payload.
    pub fn new(name: impl Into<String>, custom_object_fields: F) -> Self {
        Self {
            name: name.into(),
            custom_object_fields,
            external_id: None,
        }
    }

    /// Sets the external id.
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }
}

/// Item of an `update` bulk job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordUpdate<F = Map<String, Value>> {
    /// Record id.
    pub id: String,
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Field values to change.
    pub custom_object_fields: F,
}

/// Item of a `create_or_update_by_external_id` bulk job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExternalRecordUpsert<F = Map<String, Value>> {
    /// External id used as the match key.
    pub external_id: String,
    /// Name, required when the record gets created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Field values.
    pub custom_object_fields: F,
}

/// Sort order for record listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSort {
    /// Ascending id.
    Id,
    /// Ascending update time.
    UpdatedAt,
    /// Descending id.
    IdDesc,
    /// Descending update time.
    UpdatedAtDesc,
}

impl RecordSort {
    /// Wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordSort::Id => "id",
            RecordSort::UpdatedAt => "updated_at",
            RecordSort::IdDesc => "-id",
            RecordSort::UpdatedAtDesc => "-updated_at",
        }
    }
}

impl fmt::Display for RecordSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter and paging options of a record listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordsFilter {
    /// Comma separated external ids.
    pub external_ids: Option<String>,
    /// Comma separated record ids.
    pub ids: Option<String>,
    /// Cursor of the page to start after.
    pub after: Option<String>,
    /// Cursor of the page to start before.
    pub before: Option<String>,
    /// Page size, up to 100.
    pub size: Option<u32>,
    /// Sort order.
    pub sort: Option<RecordSort>,
}

impl RecordsFilter {
    /// Builds the nested parameter map; unset options are absent.
    pub fn to_params(&self) -> ParamMap {
        let mut params = ParamMap::new();
        if self.external_ids.is_some() || self.ids.is_some() {
            params.insert(
                "filter",
                ParamMap::new()
                    .with("external_ids", self.external_ids.clone())
                    .with("ids", self.ids.clone()),
            );
        }
        if self.after.is_some() || self.before.is_some() || self.size.is_some() {
            params.insert(
                "page",
                ParamMap::new()
                    .with("after", self.after.clone())
                    .with("before", self.before.clone())
                    .with("size", self.size.map(|s| s.to_string())),
            );
        }
        params.insert("sort", self.sort.map(|s| ParamValue::from(s.as_str())));
        params
    }
}

/// How records are searched; decides GET or POST.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordSearch {
    /// Full text query, sent as GET parameters.
    Query {
        /// Search text.
        query: String,
        /// Sort order.
        sort: Option<RecordSort>,
        /// Page size.
        size: Option<u32>,
        /// Cursor to continue from.
        after: Option<String>,
    },
    /// Structured filter, sent as a POST body.
    Filter {
        /// Filter expression, e.g. `{"$and": [...]}`.
        filter: Value,
        /// Optional search text.
        query: Option<String>,
        /// Sort order.
        sort: Option<RecordSort>,
        /// Page size.
        size: Option<u32>,
        /// Cursor to continue from.
        after: Option<String>,
    },
}

impl RecordSearch {
    /// Creates a text query search.
    pub fn query(query: impl Into<String>) -> Self {
        RecordSearch::Query {
            query: query.into(),
            sort: None,
            size: None,
            after: None,
        }
    }

    /// Creates a filter search.
    pub fn filter(filter: Value) -> Self {
        RecordSearch::Filter {
            filter,
            query: None,
            sort: None,
            size: None,
            after: None,
        }
    }

    /// Parameters carried in the query string for both shapes.
    pub(crate) fn query_params(&self) -> ParamMap {
        let (query, sort, size, after) = match self {
            RecordSearch::Query {
                query,
                sort,
                size,
                after,
            } => (Some(query.clone()), sort, size, after),
            RecordSearch::Filter {
                query,
                sort,
                size,
                after,
                ..
            } => (query.clone(), sort, size, after),
        };

        let mut params = ParamMap::new()
            .with("query", query)
            .with("sort", sort.map(|s| ParamValue::from(s.as_str())));
        if size.is_some() || after.is_some() {
            params.insert(
                "page",
                ParamMap::new()
                    .with("size", size.map(|s| s.to_string()))
                    .with("after", after.clone()),
            );
        }
        params
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecordSearchResults<F = Map<String, Value>> {
    /// Matching records.
    #[serde(default = "Vec::new")]
    pub custom_object_records: Vec<CustomObjectRecord<F>>,
    /// Cursor metadata.
    #[serde(default)]
    pub meta: CursorMeta,
    /// Total number of matches.
    #[serde(default)]
    pub count: Option<u64>,
}

/// A bulk job over custom object records.
///
/// Each action carries the only item shape it accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkJob<F = Map<String, Value>> {
    /// Create records.
    Create(Vec<NewCustomObjectRecord<F>>),
    /// Update records by id.
    Update(Vec<RecordUpdate<F>>),
    /// Delete records by id.
    Delete(Vec<String>),
    /// Delete records by external id.
    DeleteByExternalId(Vec<String>),
    /// Create or update records matched by name.
    CreateOrUpdateByName(Vec<NewCustomObjectRecord<F>>),
    /// Create or update records matched by external id.
    CreateOrUpdateByExternalId(Vec<ExternalRecordUpsert<F>>),
}

impl<F: Serialize> BulkJob<F> {
    /// Wire name of the action.
    pub fn action(&self) -> &'static str {
        match self {
            BulkJob::Create(_) => "create",
            BulkJob::Update(_) => "update",
            BulkJob::Delete(_) => "delete",
            BulkJob::DeleteByExternalId(_) => "delete_by_external_id",
            BulkJob::CreateOrUpdateByName(_) => "create_or_update_by_name",
            BulkJob::CreateOrUpdateByExternalId(_) => "create_or_update_by_external_id",
        }
    }

    /// Number of items in the job.
    pub fn len(&self) -> usize {
        match self {
            BulkJob::Create(items) | BulkJob::CreateOrUpdateByName(items) => items.len(),
            BulkJob::Update(items) => items.len(),
            BulkJob::Delete(ids) | BulkJob::DeleteByExternalId(ids) => ids.len(),
            BulkJob::CreateOrUpdateByExternalId(items) => items.len(),
        }
    }

    /// Returns true if the job has no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks item count and the keys each action matches on.
    pub fn validate(&self) -> Result<(), ToolboxError> {
        let count = self.len();
        if count == 0 {
            return Err(ToolboxError::range(format!(
                "A {} job needs at least one item.",
                self.action()
            )));
        }
        if count > MAX_BULK_JOB_ITEMS {
            return Err(ToolboxError::range(format!(
                "A limit of {} items can be sent in one job.",
                MAX_BULK_JOB_ITEMS
            )));
        }

        let blank = |s: &str| s.trim().is_empty();
        let offending = match self {
            BulkJob::Create(items) | BulkJob::CreateOrUpdateByName(items) => {
                items.iter().position(|item| blank(&item.name))
            }
            BulkJob::Update(items) => items.iter().position(|item| blank(&item.id)),
            BulkJob::Delete(ids) | BulkJob::DeleteByExternalId(ids) => {
                ids.iter().position(|id| blank(id))
            }
            BulkJob::CreateOrUpdateByExternalId(items) => {
                items.iter().position(|item| blank(&item.external_id))
            }
        };

        match offending {
            Some(index) => Err(ToolboxError::validation(format!(
                "item {} of the {} job is missing its {}",
                index,
                self.action(),
                self.match_key()
            ))),
            None => Ok(()),
        }
    }

    fn match_key(&self) -> &'static str {
        match self {
            BulkJob::Create(_) | BulkJob::CreateOrUpdateByName(_) => "name",
            BulkJob::Update(_) | BulkJob::Delete(_) => "id",
            BulkJob::DeleteByExternalId(_) | BulkJob::CreateOrUpdateByExternalId(_) => {
                "external_id"
            }
        }
    }

    /// Builds the `{job: {action, items}}` envelope.
    pub fn to_payload(&self) -> Result<Value, ToolboxError> {
        let items = match self {
            BulkJob::Create(items) | BulkJob::CreateOrUpdateByName(items) => {
                serde_json::to_value(items)?
            }
            BulkJob::Update(items) => serde_json::to_value(items)?,
            BulkJob::Delete(ids) | BulkJob::DeleteByExternalId(ids) => serde_json::to_value(ids)?,
            BulkJob::CreateOrUpdateByExternalId(items) => serde_json::to_value(items)?,
        };

        Ok(json!({
            "job": {
                "action": self.action(),
                "items": items
            }
        }))
    }
}

/// Status of an asynchronous job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Job id.
    pub id: String,
    /// `queued`, `working`, `completed`, `failed` or `killed`.
    #[serde(default)]
    pub status: Option<String>,
    /// Poll URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Total items.
    #[serde(default)]
    pub total: Option<u64>,
    /// Processed items.
    #[serde(default)]
    pub progress: Option<u64>,
    /// Per item results once completed.
    #[serde(default)]
    pub results: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::build_url_params;
    use pretty_assertions::assert_eq;

    fn fields(value: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("status".to_string(), json!(value));
        map
    }

    #[test]
    fn test_records_filter_params() {
        let filter = RecordsFilter {
            ids: Some("1,2".to_string()),
            size: Some(50),
            sort: Some(RecordSort::UpdatedAtDesc),
            ..Default::default()
        };
        assert_eq!(
            build_url_params(&filter.to_params()),
            "filter[ids]=1,2&page[size]=50&sort=-updated_at"
        );
        assert!(RecordsFilter::default().to_params().is_empty());
    }

    #[test]
    fn test_bulk_job_payload_delete() {
        let job: BulkJob = BulkJob::Delete(vec!["01A".to_string(), "01B".to_string()]);
        assert_eq!(
            job.to_payload().unwrap(),
            json!({"job": {"action": "delete", "items": ["01A", "01B"]}})
        );
    }

    #[test]
    fn test_bulk_job_payload_upsert_by_external_id() {
        let job = BulkJob::CreateOrUpdateByExternalId(vec![ExternalRecordUpsert {
            external_id: "ext-1".to_string(),
            name: None,
            custom_object_fields: fields("open"),
        }]);
        assert_eq!(
            job.to_payload().unwrap(),
            json!({"job": {
                "action": "create_or_update_by_external_id",
                "items": [{"external_id": "ext-1", "custom_object_fields": {"status": "open"}}]
            }})
        );
    }

    #[test]
    fn test_bulk_job_rejects_empty_and_oversized() {
        let empty: BulkJob = BulkJob::Delete(vec![]);
        assert!(matches!(empty.validate(), Err(ToolboxError::Range(_))));

        let too_many: BulkJob = BulkJob::DeleteByExternalId(
            (0..=MAX_BULK_JOB_ITEMS).map(|i| i.to_string()).collect(),
        );
        assert!(matches!(too_many.validate(), Err(ToolboxError::Range(_))));

        let full: BulkJob =
            BulkJob::Delete((0..MAX_BULK_JOB_ITEMS).map(|i| i.to_string()).collect());
        assert!(full.validate().is_ok());
    }

    #[test]
    fn test_bulk_job_rejects_blank_match_key() {
        let job = BulkJob::Update(vec![RecordUpdate {
            id: " ".to_string(),
            name: None,
            custom_object_fields: fields("x"),
        }]);
        let err = job.validate().unwrap_err();
        assert!(err.to_string().contains("update"));
        assert!(err.to_string().contains("id"));

        let job = BulkJob::CreateOrUpdateByName(vec![NewCustomObjectRecord::new("", fields("x"))]);
        assert!(matches!(job.validate(), Err(ToolboxError::Validation(_))));
    }

    #[test]
    fn test_search_query_params() {
        let search = RecordSearch::Query {
            query: "foo bar".to_string(),
            sort: Some(RecordSort::Id),
            size: Some(10),
            after: None,
        };
        assert_eq!(
            build_url_params(&search.query_params()),
            "query=foo%20bar&sort=id&page[size]=10"
        );
        assert_eq!(
            build_url_params(&RecordSearch::filter(json!({})).query_params()),
            ""
        );
    }

    #[test]
    fn test_field_type_wire_names() {
        assert_eq!(
            serde_json::to_value(CustomObjectFieldType::Textarea).unwrap(),
            json!("textarea")
        );
    }
}
