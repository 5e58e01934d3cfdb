//! Strapi REST client
//!
//! Collection pages come from `GET {api_root}/{plural}`; attribute
//! descriptors from the content-type builder plugin.

use super::client::{HttpClient, HttpClientConfig};
use super::query::{encode_query, pagination_query};
use crate::error::{Error, Result};
use crate::pagination::{pagination_info, PaginationInfo};
use crate::types::{JsonObject, JsonValue};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// One page of a collection
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionPage {
    /// Items in `data`
    pub items: Vec<JsonValue>,
    /// Counters from `meta.pagination`
    pub pagination: PaginationInfo,
}

/// Client bound to one Strapi REST root
#[derive(Debug)]
pub struct StrapiClient {
    http: HttpClient,
    api_root: Url,
}

impl StrapiClient {
    /// Create a client for `api_root` (e.g. `http://localhost:1337/api/`)
    pub fn new(api_root: Url, api_token: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = HttpClientConfig::builder()
            .base_url(api_root.as_str())
            .header("Accept", "application/json");
        if let Some(token) = api_token {
            builder = builder.bearer_token(token);
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: HttpClient::with_config(builder.build())?,
            api_root,
        })
    }

    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    /// Fetch one page of `plural`, merging pagination over `params`
    pub async fn find_page(
        &self,
        plural: &str,
        params: &JsonObject,
        page: u32,
        page_size: u32,
    ) -> Result<CollectionPage> {
        let mut query = encode_query(params);
        query.retain(|(key, _)| !key.starts_with("pagination["));
        query.extend(pagination_query(page, page_size));

        let endpoint = format!("{}{plural}", self.api_root);
        let body = self.http.get_json(plural, &query).await?;

        let items = match body.get("data") {
            Some(JsonValue::Array(items)) => items.clone(),
            Some(other) => {
                return Err(Error::shape(
                    &endpoint,
                    format!("expected `data` to be an array, got {}", kind_of(other)),
                ))
            }
            None => return Err(Error::shape(&endpoint, "response has no `data` field")),
        };

        debug!("{} page {}: {} items", endpoint, page, items.len());

        Ok(CollectionPage {
            items,
            pagination: pagination_info(&body),
        })
    }

    /// Attribute descriptors for `content_type`
    ///
    /// Accepts both `{data: {schema: {attributes}}}` and a bare `{attributes}`.
    pub async fn attributes(&self, content_type: &str) -> Result<JsonObject> {
        let path = format!("content-type-builder/content-types/api::{content_type}.{content_type}");
        let endpoint = format!("{}{path}", self.api_root);
        let body = self.http.get_json(&path, &[]).await?;

        let attributes = body
            .pointer("/data/schema/attributes")
            .or_else(|| body.get("attributes"));

        match attributes {
            Some(JsonValue::Object(map)) => Ok(map.clone()),
            Some(other) => Err(Error::shape(
                endpoint,
                format!("expected `attributes` to be an object, got {}", kind_of(other)),
            )),
            None => Err(Error::shape(endpoint, "response has no `attributes`")),
        }
    }
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
