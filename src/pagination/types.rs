//! Pagination request types

use crate::error::{Error, Result};
use crate::types::JsonObject;
use serde_json::Value;

/// One paginated list call
#[derive(Debug, Clone)]
pub struct ListRequest {
    /// Endpoint URL (absolute or relative to the client base URL)
    pub endpoint: String,
    /// Body fields sent with every page
    pub template: JsonObject,
    /// Response keys that may hold the item list, first match wins
    pub item_keys: Vec<String>,
    /// Items requested per page
    pub page_size: u32,
    /// Stop after this many items, truncating the last page
    pub limit: Option<usize>,
    /// Stop after this many pages
    pub max_pages: Option<u32>,
    /// File name prefix for raw page dumps
    pub dump_prefix: String,
    /// Used in error messages
    pub context: String,
}

impl ListRequest {
    /// Create a request for `endpoint`
    pub fn new(endpoint: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            template: JsonObject::new(),
            item_keys: vec!["items".to_string()],
            page_size: 50,
            limit: None,
            max_pages: None,
            dump_prefix: "page".to_string(),
            context: context.into(),
        }
    }

    /// Add a body field sent with every page
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.template.insert(key.into(), value.into());
        self
    }

    /// Set the keys searched for the item list
    #[must_use]
    pub fn item_keys(mut self, keys: &[&str]) -> Self {
        self.item_keys = keys.iter().map(|k| (*k).to_string()).collect();
        self
    }

    /// Set the page size
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Cap the number of items
    #[must_use]
    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Cap the number of pages
    #[must_use]
    pub fn max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Set the raw dump file prefix
    #[must_use]
    pub fn dump_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.dump_prefix = prefix.into();
        self
    }

    /// Body for `page`; paging fields override the template
    pub fn body_for(&self, page: u32) -> Value {
        let mut body = self.template.clone();
        body.insert("page".to_string(), Value::from(page));
        body.insert("pageSize".to_string(), Value::from(self.page_size));
        Value::Object(body)
    }
}

/// Pull the item list out of a page response.
///
/// A bare array is the item list itself. For objects, the first key holding a
/// non-empty array wins; no match means an empty page.
pub fn extract_items(data: Value, keys: &[String], context: &str) -> Result<Vec<Value>> {
    match data {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            for key in keys {
                if let Some(Value::Array(items)) = map.remove(key) {
                    if !items.is_empty() {
                        return Ok(items);
                    }
                }
            }
            Ok(Vec::new())
        }
        other => Err(Error::parse(
            format!("{context} (unexpected payload type)"),
            &other.to_string(),
        )),
    }
}
