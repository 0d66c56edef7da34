//! Vebra Branch Feed Library
//!
//! This library reads estate-agency branches and their property listings from
//! the Vebra export feed. Records keep whatever fields the feed sends in a
//! schema-free attribute mapping, so new feed fields need no code changes.
//!
//! # Modules
//!
//! - `core`: Record types and attribute handling.
//! - `integrations`: Feed client and XML parsing.
//! - `api_client`: `ApiClient` trait and the HTTP `VebraClient`.
//! - `attributes`: Attribute mapping, merge and address consolidation.
//! - `branch`: Branch records, enrichment and listing retrieval.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `property`: Property records.
//! - `xml`: XML to attribute-mapping conversion.

pub mod core;
pub mod integrations;

// Re-export primary modules for shared use in tests and the binary
pub mod api_client;
pub mod attributes;
pub mod branch;
pub mod config;
pub mod errors;
pub mod property;
pub mod xml;
