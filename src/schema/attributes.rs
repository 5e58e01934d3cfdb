//! Schemas from Strapi attribute descriptors
//!
//! The content-type builder describes each field as
//! `{ "type": "...", "required": bool, ... }`. Converting that descriptor is
//! more reliable than sampling because it covers fields a sample may omit.

use super::inference::COMPONENT_DISCRIMINATOR;
use super::types::{InferredSchema, Schema, StringFormat};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Convert an attribute map into an object schema
pub fn schema_from_attributes(attributes: &Map<String, Value>) -> InferredSchema {
    let mut fields: BTreeMap<String, Schema> = attributes
        .iter()
        .map(|(name, descriptor)| (name.clone(), attribute_schema(descriptor)))
        .collect();

    // Every entry carries an id even though the descriptor never lists it
    fields
        .entry("id".to_string())
        .or_insert_with(|| Schema::union(vec![Schema::Number, Schema::string()]));

    InferredSchema::declared(Schema::Object {
        fields,
        passthrough: true,
    })
}

/// Schema for one attribute descriptor, wrapped in `Optional` unless required
pub fn attribute_schema(descriptor: &Value) -> Schema {
    let schema = base_schema(descriptor);
    let required = descriptor
        .get("required")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if required {
        schema
    } else {
        Schema::optional(schema)
    }
}

fn base_schema(descriptor: &Value) -> Schema {
    let kind = descriptor.get("type").and_then(Value::as_str).unwrap_or("");
    let flag = |key: &str| descriptor.get(key).and_then(Value::as_bool).unwrap_or(false);

    match kind {
        "string" | "text" | "richtext" | "uid" | "password" | "enumeration" | "time" => {
            Schema::string()
        }
        "email" => Schema::string_with(StringFormat::Email),
        "date" => Schema::string_with(StringFormat::Date),
        "datetime" | "timestamp" => Schema::string_with(StringFormat::DateTime),
        "integer" | "float" | "decimal" => Schema::Number,
        // serialized as a string to keep precision
        "biginteger" => Schema::union(vec![Schema::string(), Schema::Number]),
        "boolean" => Schema::Boolean,
        "media" => {
            let file = Schema::object([("id", Schema::Number), ("url", Schema::string())]);
            if flag("multiple") {
                Schema::array(file)
            } else {
                file
            }
        }
        "relation" => {
            let target = Schema::object([("id", Schema::Number)]);
            let relation = descriptor
                .get("relation")
                .and_then(Value::as_str)
                .unwrap_or("");
            if relation.ends_with("ToMany") {
                Schema::array(target)
            } else {
                target
            }
        }
        "component" => {
            let component = Schema::object(Vec::<(String, Schema)>::new());
            if flag("repeatable") {
                Schema::array(component)
            } else {
                component
            }
        }
        "dynamiczone" => {
            let variants = descriptor
                .get("components")
                .and_then(Value::as_array)
                .map(|names| {
                    names
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|name| {
                            (
                                name.to_string(),
                                Schema::object([(COMPONENT_DISCRIMINATOR, Schema::string())]),
                            )
                        })
                        .collect()
                })
                .unwrap_or_default();
            Schema::array(Schema::TaggedUnion {
                discriminator: COMPONENT_DISCRIMINATOR.to_string(),
                variants,
            })
        }
        _ => Schema::Any,
    }
}
