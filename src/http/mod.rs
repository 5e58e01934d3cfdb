//! HTTP module
//!
//! Talks to the Strapi REST API.
//!
//! # Features
//!
//! - **JSON Client**: GET with bearer auth, default headers, and optional timeout
//! - **Error Classification**: Connection, status, and body failures map to distinct errors
//! - **Query Encoding**: Nested params flattened in bracket notation
//! - **Strapi Endpoints**: Collection pages and content-type attributes

mod client;
mod query;
mod strapi;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use query::{encode_query, pagination_query};
pub use strapi::{CollectionPage, StrapiClient};
