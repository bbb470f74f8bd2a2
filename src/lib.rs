//! Client SDK for CRUD-style REST controllers.
//!
//! Two cooperating pieces:
//!
//! - the query option codec ([`options`], [`decode`]): a structured
//!   description of filters, sort order, pagination, field selection,
//!   population and sampling, flattened into a deterministic bracket-notation
//!   query string and restorable from a shareable URL;
//! - the request pipeline ([`client`]): builds the transport request, picks
//!   query-string or header delivery for the options, decodes response
//!   bodies without ever failing on malformed text, and classifies failures
//!   before routing them through the caller's failure hook.
//!
//! [`crud::CrudService`] is the thin per-verb wrapper binding a controller
//! URL to the pipeline. Operator names inside filters (`$eq`, `$in`, ...)
//! are opaque strings; the codec carries them losslessly and never
//! interprets them.

pub mod client;
pub mod config;
pub mod crud;
pub mod decode;
pub mod error;
pub mod hooks;
pub mod options;
pub mod response;
pub mod url;

pub use client::{HttpClient, RequestBody, RequestDescriptor, Verb, OPTIONS_HEADER};
pub use config::{HttpApiConfig, TransportMode};
pub use crud::CrudService;
pub use decode::{options_from_query, record_from_params, record_from_query};
pub use error::HttpApiError;
pub use hooks::{NoopHooks, RequestHooks};
pub use options::{escape_regex_symbols, Populate, PopulateOptions, QueryOptions};
pub use response::{ResponseData, ResponseEnvelope};
