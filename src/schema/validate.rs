//! Structural validation against a [`Schema`]

use super::inference::EMAIL_RE;
use super::types::{Schema, StringFormat};
use crate::error::{Error, Result};
use crate::store::DataParser;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One place where a value does not match its schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// JSON path of the offending value (`$` is the root)
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl Schema {
    /// Check `value` against this schema, collecting every violation
    pub fn validate(&self, value: &Value) -> std::result::Result<(), Vec<Violation>> {
        let mut violations = Vec::new();
        self.check(Some(value), "$", &mut violations);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    fn check(&self, value: Option<&Value>, path: &str, out: &mut Vec<Violation>) {
        let violation = |out: &mut Vec<Violation>, message: String| {
            out.push(Violation {
                path: path.to_string(),
                message,
            });
        };

        match (self, value) {
            (Schema::Any, _) | (Schema::Undefined, None) => {}
            (Schema::Undefined, Some(v)) => {
                violation(out, format!("expected no value, got {}", kind(v)));
            }
            (Schema::Optional { .. }, None | Some(Value::Null)) => {}
            (Schema::Optional { inner }, Some(v)) => inner.check(Some(v), path, out),
            (_, None) => violation(out, "required".to_string()),
            (Schema::Null, Some(Value::Null))
            | (Schema::Boolean, Some(Value::Bool(_)))
            | (Schema::Number, Some(Value::Number(_))) => {}
            (Schema::String { format }, Some(Value::String(s))) => {
                if !matches_format(*format, s) {
                    let name = format.json_schema_format().unwrap_or("string");
                    violation(out, format!("invalid {name}: {s:?}"));
                }
            }
            (Schema::Array { items }, Some(Value::Array(values))) => {
                for (index, item) in values.iter().enumerate() {
                    items.check(Some(item), &format!("{path}[{index}]"), out);
                }
            }
            (
                Schema::Object {
                    fields,
                    passthrough,
                },
                Some(Value::Object(map)),
            ) => {
                for (name, field) in fields {
                    field.check(map.get(name), &format!("{path}.{name}"), out);
                }
                if !passthrough {
                    for key in map.keys().filter(|k| !fields.contains_key(*k)) {
                        out.push(Violation {
                            path: format!("{path}.{key}"),
                            message: "unexpected field".to_string(),
                        });
                    }
                }
            }
            (Schema::Union { variants }, Some(v)) => {
                let matched = variants.iter().any(|variant| variant.validate(v).is_ok());
                if !matched {
                    violation(
                        out,
                        format!("{} matches none of {} variants", kind(v), variants.len()),
                    );
                }
            }
            (
                Schema::TaggedUnion {
                    discriminator,
                    variants,
                },
                Some(v),
            ) => match v.get(discriminator).and_then(Value::as_str) {
                Some(tag) => match variants.get(tag) {
                    Some(variant) => variant.check(Some(v), path, out),
                    None => violation(out, format!("unknown {discriminator} {tag:?}")),
                },
                None => violation(out, format!("missing string field {discriminator}")),
            },
            (expected, Some(v)) => {
                violation(out, format!("expected {}, got {}", expected_name(expected), kind(v)));
            }
        }
    }
}

fn matches_format(format: StringFormat, s: &str) -> bool {
    match format {
        StringFormat::Plain => true,
        StringFormat::DateTime => chrono::DateTime::parse_from_rfc3339(s).is_ok(),
        StringFormat::Date => chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok(),
        StringFormat::Url => url::Url::parse(s).is_ok(),
        StringFormat::Email => EMAIL_RE.is_match(s),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expected_name(schema: &Schema) -> &'static str {
    match schema {
        Schema::Null => "null",
        Schema::Boolean => "boolean",
        Schema::Number => "number",
        Schema::String { .. } => "string",
        Schema::Array { .. } => "array",
        Schema::Object { .. } | Schema::TaggedUnion { .. } => "object",
        Schema::Any | Schema::Undefined | Schema::Union { .. } | Schema::Optional { .. } => "value",
    }
}

/// Uses a schema as the loader's parse step
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    schema: Schema,
}

impl SchemaValidator {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl DataParser for SchemaValidator {
    fn parse(&self, id: &str, data: Value) -> Result<Value> {
        match self.schema.validate(&data) {
            Ok(()) => Ok(data),
            Err(violations) => {
                let message = violations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(Error::validation(id, message))
            }
        }
    }
}
