//! Page-following aggregation.
//!
//! Two continuation styles exist across the APIs:
//!
//! - the Support API returns a full `next_page` URL which is requested verbatim;
//! - cursor endpoints return `meta.has_more` plus a cursor that has to be merged
//!   back into the original request's `page` parameters.
//!
//! The messaging v1 API uses a third variant where the cursor is appended to
//! the seed URL as a query parameter. The strategy is picked once per endpoint
//! and pages are always fetched one after the other: the next cursor is only
//! known once the previous page has arrived.
//!
//! If any page fails, the items accumulated so far are dropped and the error is
//! returned.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ToolboxError;
use crate::transport::{RequestBody, RequestOptions, Transport};

/// How the follow-up request is derived from a continuation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStrategy {
    /// The token is a complete URL, requested as a bare GET.
    NextPageUrl,
    /// The token is a cursor written to `page[after]` of the seed's parameters.
    BodyCursor,
    /// The token is appended to the seed URL as `&<param>=<cursor>`.
    QueryCursor {
        /// Query parameter carrying the cursor.
        param: &'static str,
    },
}

impl PageStrategy {
    /// Builds the request for the page following `token`.
    pub fn next_request(
        &self,
        seed: &RequestOptions,
        token: String,
    ) -> Result<RequestOptions, ToolboxError> {
        match self {
            PageStrategy::NextPageUrl => Ok(RequestOptions::new(token)),
            PageStrategy::QueryCursor { param } => {
                let separator = if seed.url.contains('?') { '&' } else { '?' };
                let mut next = seed.clone();
                next.url = format!(
                    "{}{}{}={}",
                    seed.url,
                    separator,
                    param,
                    urlencoding::encode(&token)
                );
                Ok(next)
            }
            PageStrategy::BodyCursor => {
                let mut next = seed.clone();
                next.body = Some(match seed.body.clone() {
                    None => {
                        let mut params = crate::params::ParamMap::new();
                        params.merge_nested("page", "after", token);
                        RequestBody::Params(params)
                    }
                    Some(RequestBody::Params(mut params)) => {
                        params.merge_nested("page", "after", token);
                        RequestBody::Params(params)
                    }
                    Some(RequestBody::Value(Value::Object(mut object))) => {
                        let page = object
                            .entry("page")
                            .or_insert_with(|| Value::Object(Default::default()));
                        if !page.is_object() {
                            *page = Value::Object(Default::default());
                        }
                        if let Value::Object(page) = page {
                            page.insert("after".to_string(), Value::String(token));
                        }
                        RequestBody::Value(Value::Object(object))
                    }
                    Some(_) => {
                        return Err(ToolboxError::validation(
                            "cursor pagination requires a structured request body",
                        ))
                    }
                });
                Ok(next)
            }
        }
    }
}

/// One decoded page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items of this page, in server order.
    pub items: Vec<T>,
    /// Continuation token; `None` on the last page.
    pub next: Option<String>,
    /// Total number of items, when the server reports it.
    pub total: Option<u64>,
}

/// Follows continuation tokens and concatenates every page's items.
///
/// With `fetch_all == false` exactly one request is issued and the first
/// page's items are returned, whether or not more pages exist.
pub async fn collect_pages<T, F>(
    transport: &dyn Transport,
    seed: RequestOptions,
    strategy: PageStrategy,
    fetch_all: bool,
    extract: F,
) -> Result<Vec<T>, ToolboxError>
where
    F: Fn(Value) -> Result<Page<T>, ToolboxError>,
{
    let mut items = Vec::new();
    let mut request = seed.clone();
    let mut page_number = 1u32;

    loop {
        tracing::debug!(
            url = %request.url,
            page = page_number,
            "Fetching page"
        );

        let page = extract(transport.request(request).await?)?;

        tracing::debug!(
            page = page_number,
            items = page.items.len(),
            has_next = page.next.is_some(),
            "Page received"
        );

        items.extend(page.items);

        let next = match page.next {
            Some(next) if fetch_all => next,
            _ => break,
        };

        request = strategy.next_request(&seed, next)?;
        page_number += 1;
    }

    Ok(items)
}

/// Decodes the array stored under `key`; a missing or null key is an empty page.
pub fn items_at<T: DeserializeOwned>(body: &mut Value, key: &str) -> Result<Vec<T>, ToolboxError> {
    match body.get_mut(key).map(Value::take) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(items) => Ok(serde_json::from_value(items)?),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Extractor for Support API envelopes: `{<key>: [...], next_page, count}`.
pub fn next_page_envelope<T: DeserializeOwned>(
    key: &'static str,
) -> impl Fn(Value) -> Result<Page<T>, ToolboxError> {
    move |mut body| {
        Ok(Page {
            items: items_at(&mut body, key)?,
            next: non_empty_str(body.get("next_page")),
            total: body.get("count").and_then(Value::as_u64),
        })
    }
}

/// Extractor for cursor envelopes: `{<key>: [...], meta: {has_more, <cursor_key>}}`.
pub fn cursor_envelope<T: DeserializeOwned>(
    key: &'static str,
    cursor_key: &'static str,
) -> impl Fn(Value) -> Result<Page<T>, ToolboxError> {
    move |mut body| {
        let meta = body.get("meta");
        let has_more = meta
            .and_then(|m| m.get("has_more"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let next = if has_more {
            non_empty_str(meta.and_then(|m| m.get(cursor_key)))
        } else {
            None
        };
        let total = meta
            .and_then(|m| m.get("total"))
            .and_then(Value::as_u64);

        Ok(Page {
            items: items_at(&mut body, key)?,
            next,
            total,
        })
    }
}

/// Extractor for envelopes carrying a top-level cursor: `{<key>: [...], <cursor_key>}`.
pub fn top_level_cursor_envelope<T: DeserializeOwned>(
    key: &'static str,
    cursor_key: &'static str,
) -> impl Fn(Value) -> Result<Page<T>, ToolboxError> {
    move |mut body| {
        Ok(Page {
            next: non_empty_str(body.get(cursor_key)),
            items: items_at(&mut body, key)?,
            total: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamMap;
    use crate::transport::mock::MockTransport;
    use crate::transport::HttpMethod;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn records_seed() -> RequestOptions {
        RequestOptions::with_method("/api/v2/custom_objects/foo/records", HttpMethod::Get)
            .json_content()
            .body(RequestBody::Params(ParamMap::new().with("sort", "id")))
    }

    #[tokio::test]
    async fn test_next_page_url_followed_until_absent() {
        let transport = MockTransport::new();
        transport
            .respond(json!({"users": [1], "next_page": "https://x/api/v2/users?page=2"}))
            .respond(json!({"users": [2, 3], "next_page": "https://x/api/v2/users?page=3"}))
            .respond(json!({"users": [], "next_page": null}));

        let users: Vec<u32> = collect_pages(
            &transport,
            RequestOptions::new("/api/v2/users"),
            PageStrategy::NextPageUrl,
            true,
            next_page_envelope("users"),
        )
        .await
        .unwrap();

        assert_eq!(users, vec![1, 2, 3]);
        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1], RequestOptions::new("https://x/api/v2/users?page=2"));
        assert_eq!(requests[2], RequestOptions::new("https://x/api/v2/users?page=3"));
    }

    #[tokio::test]
    async fn test_first_page_only_issues_one_request() {
        let transport = MockTransport::new();
        transport.respond(json!({"tags": ["a"], "next_page": "next_page"}));

        let tags: Vec<String> = collect_pages(
            &transport,
            RequestOptions::new("/api/v2/tags"),
            PageStrategy::NextPageUrl,
            false,
            next_page_envelope("tags"),
        )
        .await
        .unwrap();

        assert_eq!(tags, vec!["a".to_string()]);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_body_cursor_merges_after_and_keeps_sort() {
        let transport = MockTransport::new();
        transport
            .respond(json!({"items": ["a"], "meta": {"has_more": true, "after_cursor": "1"}}))
            .respond(json!({"items": ["b"], "meta": {"has_more": false}}));

        let items: Vec<String> = collect_pages(
            &transport,
            records_seed(),
            PageStrategy::BodyCursor,
            true,
            cursor_envelope("items", "after_cursor"),
        )
        .await
        .unwrap();

        assert_eq!(items, vec!["a".to_string(), "b".to_string()]);
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], records_seed());

        let second = requests[1].params().unwrap();
        assert_eq!(second.get("sort"), Some(&"id".into()));
        assert_eq!(
            second.get("page"),
            Some(&ParamMap::new().with("after", "1").into())
        );
        assert_eq!(requests[1].url, records_seed().url);
    }

    #[tokio::test]
    async fn test_body_cursor_stops_when_cursor_missing() {
        let transport = MockTransport::new();
        transport.respond(json!({"items": ["a"], "meta": {"has_more": true}}));

        let items: Vec<String> = collect_pages(
            &transport,
            records_seed(),
            PageStrategy::BodyCursor,
            true,
            cursor_envelope("items", "after_cursor"),
        )
        .await
        .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_query_cursor_appends_parameter() {
        let transport = MockTransport::new();
        transport
            .respond(json!({"messageTemplates": ["t1"], "after": "after"}))
            .respond(json!({"messageTemplates": []}));

        let seed = RequestOptions::new("https://api/messageTemplates?limit=100")
            .header("Authorization", "Basic x");
        let templates: Vec<String> = collect_pages(
            &transport,
            seed.clone(),
            PageStrategy::QueryCursor { param: "after" },
            true,
            top_level_cursor_envelope("messageTemplates", "after"),
        )
        .await
        .unwrap();

        assert_eq!(templates, vec!["t1".to_string()]);
        let requests = transport.requests();
        let mut expected = seed;
        expected.url = "https://api/messageTemplates?limit=100&after=after".to_string();
        assert_eq!(requests[1], expected);
    }

    #[tokio::test]
    async fn test_failure_mid_way_discards_items() {
        let transport = MockTransport::new();
        transport
            .respond(json!({"groups": [1], "next_page": "p2"}))
            .fail(ToolboxError::HttpStatus {
                status: 500,
                body: "boom".to_string(),
            });

        let result: Result<Vec<u32>, _> = collect_pages(
            &transport,
            RequestOptions::new("/api/v2/groups"),
            PageStrategy::NextPageUrl,
            true,
            next_page_envelope("groups"),
        )
        .await;

        assert!(matches!(
            result,
            Err(ToolboxError::HttpStatus { status: 500, .. })
        ));
        assert_eq!(transport.request_count(), 2);
    }

    #[test]
    fn test_body_cursor_on_json_value_body() {
        let seed = RequestOptions::new("/x").body(RequestBody::Value(json!({"page": {"size": "5"}})));
        let next = PageStrategy::BodyCursor
            .next_request(&seed, "c1".to_string())
            .unwrap();
        assert_eq!(
            next.body,
            Some(RequestBody::Value(json!({"page": {"size": "5", "after": "c1"}})))
        );
    }

    #[test]
    fn test_body_cursor_rejects_encoded_body() {
        let seed = RequestOptions::new("/x").body(RequestBody::Json("{}".to_string()));
        assert!(PageStrategy::BodyCursor
            .next_request(&seed, "c1".to_string())
            .is_err());
    }

    #[test]
    fn test_next_page_envelope_reads_count() {
        let page: Page<u32> = next_page_envelope("views")(json!({"views": [1, 2], "count": 2}))
            .unwrap();
        assert_eq!(page.total, Some(2));
        assert_eq!(page.next, None);
    }
}
