//! Service health probe.

use super::{call_options_builders, CallOptions};
use crate::client::Client;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::types::HealthStatus;

#[derive(Debug, Clone)]
pub struct HealthService<'a> {
    client: &'a Client,
    options: CallOptions,
}

call_options_builders!(HealthService);

impl<'a> HealthService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self {
            client,
            options: CallOptions::default(),
        }
    }

    /// `GET /api/health`.
    pub fn check(&self) -> Result<HealthStatus> {
        let request = self.options.to_request(HttpMethod::Get, None);
        self.client.send_json("/api/health", request, "health status")
    }

    /// A degraded status is `Ok(false)`. A failed request stays an error.
    pub fn is_healthy(&self) -> Result<bool> {
        Ok(self.check()?.is_healthy())
    }
}
