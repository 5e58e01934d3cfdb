//! Query-string encoding in the bracket style Strapi parses
//!
//! `{"filters": {"slug": {"$eq": "about"}}, "populate": ["cover"]}` becomes
//! `filters[slug][$eq]=about&populate[0]=cover`.

use serde_json::{Map, Value};

/// Flatten a JSON object into `(key, value)` query pairs
pub fn encode_query(params: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        encode_value(key, value, &mut pairs);
    }
    pairs
}

fn encode_value(prefix: &str, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                encode_value(&format!("{prefix}[{key}]"), nested, pairs);
            }
        }
        Value::Array(items) => {
            for (index, nested) in items.iter().enumerate() {
                encode_value(&format!("{prefix}[{index}]"), nested, pairs);
            }
        }
        Value::String(s) => pairs.push((prefix.to_string(), s.clone())),
        Value::Number(n) => pairs.push((prefix.to_string(), n.to_string())),
        Value::Bool(b) => pairs.push((prefix.to_string(), b.to_string())),
        Value::Null => pairs.push((prefix.to_string(), String::new())),
    }
}

/// Pagination pairs the loader appends to every collection request
pub fn pagination_query(page: u32, page_size: u32) -> Vec<(String, String)> {
    vec![
        ("pagination[page]".to_string(), page.to_string()),
        ("pagination[pageSize]".to_string(), page_size.to_string()),
    ]
}
