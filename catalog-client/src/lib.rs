//! # Catalog Client
//!
//! Async REST client for the model catalog BFF. Responses are decoded from
//! their `{ "data": ... }` envelope into typed `Result`s.

pub mod client;
pub mod error;

pub use client::{CatalogApi, CatalogClient, api_error, decode_envelope};
pub use error::{ClientError, Result};
