//! Schema types

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Format refinement for string schemas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StringFormat {
    #[default]
    Plain,
    DateTime,
    Date,
    Url,
    Email,
}

impl StringFormat {
    /// JSON Schema `format` keyword, if any
    pub fn json_schema_format(self) -> Option<&'static str> {
        match self {
            StringFormat::Plain => None,
            StringFormat::DateTime => Some("date-time"),
            StringFormat::Date => Some("date"),
            StringFormat::Url => Some("uri"),
            StringFormat::Email => Some("email"),
        }
    }
}

/// A permissive structural schema for CMS content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schema {
    /// Anything, including a missing value
    Any,
    /// Only `null`
    Null,
    /// Only a missing value
    Undefined,
    Boolean,
    Number,
    String {
        #[serde(default)]
        format: StringFormat,
    },
    Array {
        items: Box<Schema>,
    },
    /// Object with known fields; `passthrough` objects accept unknown keys
    Object {
        #[serde(default)]
        fields: BTreeMap<String, Schema>,
        #[serde(default = "default_true")]
        passthrough: bool,
    },
    /// Matches if any variant matches
    Union {
        variants: Vec<Schema>,
    },
    /// Object variants selected by the string value of `discriminator`
    TaggedUnion {
        discriminator: String,
        variants: BTreeMap<String, Schema>,
    },
    /// The inner schema, `null`, or missing
    Optional {
        inner: Box<Schema>,
    },
}

fn default_true() -> bool {
    true
}

impl Schema {
    /// Plain string
    pub fn string() -> Self {
        Schema::String {
            format: StringFormat::Plain,
        }
    }

    /// String with a format refinement
    pub fn string_with(format: StringFormat) -> Self {
        Schema::String { format }
    }

    /// Array of `items`
    pub fn array(items: Schema) -> Self {
        Schema::Array {
            items: Box::new(items),
        }
    }

    /// Passthrough object from `(name, schema)` pairs
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Schema::Object {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            passthrough: true,
        }
    }

    /// Object that rejects unknown keys
    pub fn strict_object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Schema::Object {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            passthrough: false,
        }
    }

    /// Union of variants
    pub fn union(variants: Vec<Schema>) -> Self {
        Schema::Union { variants }
    }

    /// Optional wrapper
    pub fn optional(inner: Schema) -> Self {
        Schema::Optional {
            inner: Box::new(inner),
        }
    }

    /// Whether a missing field satisfies this schema
    pub fn accepts_missing(&self) -> bool {
        matches!(
            self,
            Schema::Any | Schema::Undefined | Schema::Optional { .. }
        )
    }

    /// Look up a direct field of an object schema
    pub fn field(&self, name: &str) -> Option<&Schema> {
        match self {
            Schema::Object { fields, .. } => fields.get(name),
            _ => None,
        }
    }

    /// Item schema of an array schema
    pub fn items(&self) -> Option<&Schema> {
        match self {
            Schema::Array { items } => Some(items),
            _ => None,
        }
    }

    /// Render as a JSON Schema fragment
    pub fn to_json_schema(&self) -> Value {
        match self {
            Schema::Any => json!({}),
            Schema::Null => json!({"type": "null"}),
            Schema::Undefined => json!({"not": {}}),
            Schema::Boolean => json!({"type": "boolean"}),
            Schema::Number => json!({"type": "number"}),
            Schema::String { format } => {
                let mut out = json!({"type": "string"});
                if let Some(f) = format.json_schema_format() {
                    out["format"] = json!(f);
                }
                out
            }
            Schema::Array { items } => json!({"type": "array", "items": items.to_json_schema()}),
            Schema::Object {
                fields,
                passthrough,
            } => object_json_schema(fields, *passthrough),
            Schema::Union { variants } => {
                json!({"anyOf": variants.iter().map(Schema::to_json_schema).collect::<Vec<_>>()})
            }
            Schema::TaggedUnion {
                discriminator,
                variants,
            } => {
                let one_of: Vec<Value> = variants
                    .iter()
                    .map(|(tag, variant)| {
                        let mut rendered = variant.to_json_schema();
                        if let Some(obj) = rendered.as_object_mut() {
                            let props = obj
                                .entry("properties")
                                .or_insert_with(|| Value::Object(Map::new()));
                            props[discriminator.as_str()] = json!({"const": tag});
                            let required = obj
                                .entry("required")
                                .or_insert_with(|| Value::Array(Vec::new()));
                            if let Some(list) = required.as_array_mut() {
                                if !list.iter().any(|r| r == discriminator.as_str()) {
                                    list.push(json!(discriminator));
                                }
                            }
                        }
                        rendered
                    })
                    .collect();
                json!({"oneOf": one_of})
            }
            Schema::Optional { inner } => {
                json!({"anyOf": [inner.to_json_schema(), {"type": "null"}]})
            }
        }
    }

    /// Render as a standalone draft-07 document
    pub fn to_json_schema_document(&self, title: &str) -> Value {
        let mut doc = self.to_json_schema();
        if let Some(obj) = doc.as_object_mut() {
            obj.insert(
                "$schema".to_string(),
                json!("http://json-schema.org/draft-07/schema#"),
            );
            obj.insert("title".to_string(), json!(title));
        }
        doc
    }
}

fn object_json_schema(fields: &BTreeMap<String, Schema>, passthrough: bool) -> Value {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json_schema()))
        .collect();
    let required: Vec<&String> = fields
        .iter()
        .filter(|(_, v)| !v.accepts_missing())
        .map(|(k, _)| k)
        .collect();
    let mut out = json!({
        "type": "object",
        "properties": properties,
        "additionalProperties": passthrough,
    });
    if !required.is_empty() {
        out["required"] = json!(required);
    }
    out
}

// ============================================================================
// Inference Result
// ============================================================================

/// How much a schema can be trusted, from most to least
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Declared by the caller or by the CMS itself
    Declared,
    /// Derived purely from the shape of the sample
    Structural,
    /// Parts were guessed from field names
    Heuristic,
    /// Parts could not be typed at all
    Weak,
}

/// A heuristic decision taken while inferring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InferenceNote {
    /// Empty array typed from its field name
    EmptyArrayFromName { path: String, pattern: String },
    /// Empty array with no usable name; items are untyped
    EmptyArrayUntyped { path: String },
    /// Only the first element of a longer array was sampled
    FirstElementSampled { path: String, elements: usize },
    /// Elements of a tagged array that lack the discriminator were ignored
    UntaggedElements { path: String, count: usize },
    /// Nesting too deep; the rest is untyped
    DepthLimit { path: String },
}

impl InferenceNote {
    /// Path of the value the note is about
    pub fn path(&self) -> &str {
        match self {
            InferenceNote::EmptyArrayFromName { path, .. }
            | InferenceNote::EmptyArrayUntyped { path }
            | InferenceNote::FirstElementSampled { path, .. }
            | InferenceNote::UntaggedElements { path, .. }
            | InferenceNote::DepthLimit { path } => path,
        }
    }

    /// The confidence level this note caps a schema at
    pub fn confidence(&self) -> Confidence {
        match self {
            InferenceNote::FirstElementSampled { .. } => Confidence::Structural,
            InferenceNote::EmptyArrayFromName { .. } | InferenceNote::UntaggedElements { .. } => {
                Confidence::Heuristic
            }
            InferenceNote::EmptyArrayUntyped { .. } | InferenceNote::DepthLimit { .. } => {
                Confidence::Weak
            }
        }
    }
}

impl std::fmt::Display for InferenceNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceNote::EmptyArrayFromName { path, pattern } => {
                write!(f, "{path}: empty array typed from field name (/{pattern}/)")
            }
            InferenceNote::EmptyArrayUntyped { path } => {
                write!(f, "{path}: empty array, item type unknown")
            }
            InferenceNote::FirstElementSampled { path, elements } => {
                write!(f, "{path}: typed from first of {elements} elements")
            }
            InferenceNote::UntaggedElements { path, count } => {
                write!(f, "{path}: {count} element(s) without discriminator ignored")
            }
            InferenceNote::DepthLimit { path } => write!(f, "{path}: nesting limit reached"),
        }
    }
}

/// A schema together with how it was obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferredSchema {
    pub schema: Schema,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<InferenceNote>,
}

impl InferredSchema {
    /// A schema supplied rather than guessed
    pub fn declared(schema: Schema) -> Self {
        Self {
            schema,
            confidence: Confidence::Declared,
            notes: Vec::new(),
        }
    }

    /// A sampled schema; confidence is the weakest level any note allows
    pub fn sampled(schema: Schema, notes: Vec<InferenceNote>) -> Self {
        let confidence = notes
            .iter()
            .map(InferenceNote::confidence)
            .max()
            .unwrap_or(Confidence::Structural);
        Self {
            schema,
            confidence,
            notes,
        }
    }

    /// Whether any part of the schema was guessed
    pub fn is_best_effort(&self) -> bool {
        self.confidence >= Confidence::Heuristic
    }
}
