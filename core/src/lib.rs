//! Synchronous client SDK for the opsgate API.
//!
//! # Overview
//! Typed services for remote caches, stored scripts, health checks and SQL
//! execution, all sharing one request dispatcher:
//!
//! ```no_run
//! use opsgate_core::{Client, ClientConfig};
//! use serde_json::json;
//!
//! # fn main() -> opsgate_core::Result<()> {
//! let client = Client::new(ClientConfig::new("http://localhost:3000").with_api_key("k"))?;
//!
//! let entry = client
//!     .cache()
//!     .set_entry("ai-cache", "dialog:1", json!({"hello": "world"}), Some(90))?;
//! println!("stored {} in {}", entry.key, entry.cache);
//!
//! let rows = client.sql().execute("SELECT 1")?;
//! println!("{:?}", rows.columns);
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - `Client` is stateless apart from its config and transport handle, so
//!   calls may be issued concurrently from any thread.
//! - The dispatcher splits each call into `build_request` and
//!   `parse_response`. The [`Transport`] trait is the only I/O seam, so
//!   tests and hosts can substitute their own.
//! - Argument validation runs before any request is built. Retries,
//!   pooling and caching are left to the caller or the transport.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod query;
pub mod services;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::{decode, Client, RequestOptions};
pub use config::ClientConfig;
pub use error::{Result, SdkError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use query::Query;
pub use services::{CacheService, CallOptions, HealthService, ScriptService, SqlService};
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{
    CacheDescriptor, CacheEntry, CreateCache, CreateScript, HealthStatus, ItemList, Script,
    ScriptExecution, SqlResult, UpdateScript,
};
