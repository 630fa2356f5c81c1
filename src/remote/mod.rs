//! Talking to the orchestrator's admin API.
//!
//! Resolution and upload are written against the [`AdminApi`] trait. The
//! `reqwest`-backed [`AdminClient`] is available with the `remote` feature.

#[cfg(feature = "remote")]
pub mod client;
pub mod resolver;
pub mod upload;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

#[cfg(feature = "remote")]
pub use client::AdminClient;

/// A decoded admin API response. Bodies that are not JSON are kept as a string.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `error` field the admin API sets on failures, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error").map(|e| e.as_str().unwrap_or("unknown error"))
    }
}

/// The two calls the compiler makes against the admin API. Paths are
/// relative to the endpoint, e.g. `api/v1/tasks`.
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<ApiResponse>;

    async fn submit(&self, path: &str, body: &Value) -> Result<ApiResponse>;
}
