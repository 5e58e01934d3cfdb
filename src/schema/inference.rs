//! Schema inference from a single sample item
//!
//! Best effort only: one sample cannot describe a whole collection. Every
//! guess is reported as an [`InferenceNote`] on the result.

use super::types::{InferenceNote, InferredSchema, Schema, StringFormat};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Discriminator Strapi puts on dynamic-zone entries
pub const COMPONENT_DISCRIMINATOR: &str = "__component";

static DATETIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}").expect("valid regex"));
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://").expect("valid regex"));
pub(crate) static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

/// Naming conventions used to type empty arrays, checked in order
static EMPTY_ARRAY_PATTERNS: Lazy<Vec<(Regex, fn() -> Schema)>> = Lazy::new(|| {
    let pattern = |re: &str| Regex::new(&format!("(?i){re}")).expect("valid regex");
    vec![
        (
            pattern("image|media|photo|picture|avatar|thumbnail"),
            media_items as fn() -> Schema,
        ),
        (pattern("tag|category|label|topic"), tag_items as fn() -> Schema),
        (pattern("ids|references|keys"), reference_items as fn() -> Schema),
        (pattern("comment|review|feedback"), comment_items as fn() -> Schema),
        (pattern("related|linked|similar"), related_items as fn() -> Schema),
    ]
});

fn media_items() -> Schema {
    Schema::array(Schema::object([
        ("id", Schema::Number),
        ("url", Schema::string()),
    ]))
}

fn tag_items() -> Schema {
    Schema::array(Schema::union(vec![
        Schema::string(),
        Schema::object([("id", Schema::Number), ("name", Schema::string())]),
    ]))
}

fn reference_items() -> Schema {
    Schema::array(Schema::union(vec![Schema::string(), Schema::Number]))
}

fn comment_items() -> Schema {
    Schema::array(Schema::object([
        ("id", Schema::Number),
        ("content", Schema::string()),
    ]))
}

fn related_items() -> Schema {
    Schema::array(Schema::object([("id", Schema::Number)]))
}

/// Schema inferrer with configuration options
#[derive(Debug, Clone)]
pub struct SchemaInferrer {
    /// Field that splits arrays into tagged variants
    discriminator: String,
    /// Detect date-time, URL, and email strings
    detect_formats: bool,
    /// Use field names to type empty arrays
    name_heuristics: bool,
    /// Maximum nesting depth
    max_depth: usize,
}

impl Default for SchemaInferrer {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaInferrer {
    /// Create an inferrer with default settings
    pub fn new() -> Self {
        Self {
            discriminator: COMPONENT_DISCRIMINATOR.to_string(),
            detect_formats: true,
            name_heuristics: true,
            max_depth: 32,
        }
    }

    /// Use a different discriminator field
    #[must_use]
    pub fn with_discriminator(mut self, field: impl Into<String>) -> Self {
        self.discriminator = field.into();
        self
    }

    /// Enable/disable string format detection
    #[must_use]
    pub fn with_format_detection(mut self, enabled: bool) -> Self {
        self.detect_formats = enabled;
        self
    }

    /// Enable/disable field-name heuristics for empty arrays
    #[must_use]
    pub fn with_name_heuristics(mut self, enabled: bool) -> Self {
        self.name_heuristics = enabled;
        self
    }

    /// Set maximum nesting depth
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Infer a schema from one sample value
    pub fn infer(&self, sample: &Value) -> InferredSchema {
        self.infer_field(Some(sample), None)
    }

    /// Infer a schema for a possibly-missing value named `field`
    pub fn infer_field(&self, value: Option<&Value>, field: Option<&str>) -> InferredSchema {
        let mut notes = Vec::new();
        let schema = self.infer_value(value, field, "$", 0, &mut notes);
        InferredSchema::sampled(schema, notes)
    }

    fn infer_value(
        &self,
        value: Option<&Value>,
        field: Option<&str>,
        path: &str,
        depth: usize,
        notes: &mut Vec<InferenceNote>,
    ) -> Schema {
        let Some(value) = value else {
            return Schema::Undefined;
        };
        if depth > self.max_depth {
            notes.push(InferenceNote::DepthLimit {
                path: path.to_string(),
            });
            return Schema::Any;
        }

        match value {
            Value::Null => Schema::Null,
            Value::Bool(_) => Schema::Boolean,
            Value::Number(_) => Schema::Number,
            Value::String(s) => self.infer_string(s),
            Value::Array(items) => self.infer_array(items, field, path, depth, notes),
            Value::Object(map) => self.infer_object(map, path, depth, notes),
        }
    }

    fn infer_string(&self, s: &str) -> Schema {
        if !self.detect_formats {
            return Schema::string();
        }
        Schema::string_with(classify_string(s))
    }

    fn infer_array(
        &self,
        items: &[Value],
        field: Option<&str>,
        path: &str,
        depth: usize,
        notes: &mut Vec<InferenceNote>,
    ) -> Schema {
        let Some(first) = items.first() else {
            return self.infer_empty_array(field, path, notes);
        };

        if items.iter().any(|item| self.has_discriminator(item)) {
            return self.infer_tagged_array(items, path, depth, notes);
        }

        if items.len() > 1 {
            notes.push(InferenceNote::FirstElementSampled {
                path: path.to_string(),
                elements: items.len(),
            });
        }
        let item_path = format!("{path}[0]");
        Schema::array(self.infer_value(Some(first), None, &item_path, depth + 1, notes))
    }

    fn infer_empty_array(
        &self,
        field: Option<&str>,
        path: &str,
        notes: &mut Vec<InferenceNote>,
    ) -> Schema {
        if self.name_heuristics {
            if let Some(name) = field {
                for (re, build) in EMPTY_ARRAY_PATTERNS.iter() {
                    if re.is_match(name) {
                        notes.push(InferenceNote::EmptyArrayFromName {
                            path: path.to_string(),
                            pattern: re.as_str().trim_start_matches("(?i)").to_string(),
                        });
                        return build();
                    }
                }
            }
        }
        notes.push(InferenceNote::EmptyArrayUntyped {
            path: path.to_string(),
        });
        Schema::array(Schema::Any)
    }

    fn has_discriminator(&self, item: &Value) -> bool {
        item.as_object()
            .is_some_and(|obj| obj.contains_key(&self.discriminator))
    }

    fn infer_tagged_array(
        &self,
        items: &[Value],
        path: &str,
        depth: usize,
        notes: &mut Vec<InferenceNote>,
    ) -> Schema {
        let mut variants: BTreeMap<String, Schema> = BTreeMap::new();
        let mut untagged = 0;

        for (index, item) in items.iter().enumerate() {
            let tag = item
                .get(&self.discriminator)
                .and_then(Value::as_str)
                .map(ToString::to_string);
            let Some(tag) = tag else {
                untagged += 1;
                continue;
            };
            if variants.contains_key(&tag) {
                continue;
            }
            let item_path = format!("{path}[{index}]");
            let variant = self.infer_value(Some(item), None, &item_path, depth + 1, notes);
            variants.insert(tag, variant);
        }

        if untagged > 0 {
            notes.push(InferenceNote::UntaggedElements {
                path: path.to_string(),
                count: untagged,
            });
        }

        Schema::array(Schema::TaggedUnion {
            discriminator: self.discriminator.clone(),
            variants,
        })
    }

    fn infer_object(
        &self,
        map: &Map<String, Value>,
        path: &str,
        depth: usize,
        notes: &mut Vec<InferenceNote>,
    ) -> Schema {
        let fields = map
            .iter()
            .map(|(key, val)| {
                let field_path = format!("{path}.{key}");
                let schema = self.infer_value(Some(val), Some(key), &field_path, depth + 1, notes);
                (key.clone(), schema)
            })
            .collect();

        Schema::Object {
            fields,
            passthrough: true,
        }
    }
}

/// Classify a string sample as date-time, URL, email, or plain text
pub fn classify_string(s: &str) -> StringFormat {
    if DATETIME_RE.is_match(s) {
        StringFormat::DateTime
    } else if URL_RE.is_match(s) {
        StringFormat::Url
    } else if EMAIL_RE.is_match(s) {
        StringFormat::Email
    } else {
        StringFormat::Plain
    }
}

/// Infer a schema from one sample value (convenience function)
pub fn infer_schema(sample: &Value) -> InferredSchema {
    SchemaInferrer::new().infer(sample)
}
