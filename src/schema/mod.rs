//! Schema module
//!
//! Builds validation schemas for CMS content.
//!
//! # Features
//!
//! - **Sample Inference**: Best-effort schema from one item, with notes on every guess
//! - **Name Heuristics**: Empty arrays typed from their field names
//! - **Dynamic Zones**: Arrays of `__component` entries become tagged unions
//! - **Attribute Descriptors**: Schemas from the content-type builder
//! - **Validation**: Structural checks with per-path violations
//! - **JSON Schema Output**: Draft-07 rendering

mod attributes;
mod inference;
mod types;
mod validate;

pub use attributes::{attribute_schema, schema_from_attributes};
pub use inference::{classify_string, infer_schema, SchemaInferrer, COMPONENT_DISCRIMINATOR};
pub use types::{Confidence, InferenceNote, InferredSchema, Schema, StringFormat};
pub use validate::{SchemaValidator, Violation};
