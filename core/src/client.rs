//! The shared request dispatcher used by every service.
//!
//! # Design
//! `Client` holds only immutable configuration and a transport handle, so
//! clones are cheap and calls may run concurrently without coordination.
//! Every call goes through the same three steps:
//!
//! 1. [`Client::build_request`] turns a path plus [`RequestOptions`] into an
//!    `HttpRequest` (URL join, query encoding, header merge, JSON body);
//! 2. the [`Transport`] executes it;
//! 3. [`Client::parse_response`] maps non-2xx statuses to `SdkError::Api`
//!    and decodes the body as JSON (`None` for empty/204 responses).
//!
//! Steps 1 and 3 are public so a host can do its own I/O in between.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{Result, SdkError};
use crate::http::{set_header, HttpMethod, HttpRequest, HttpResponse};
use crate::query::Query;
use crate::services::{CacheService, HealthService, ScriptService, SqlService};
use crate::transport::Transport;
use crate::types::ItemList;

/// One logical request before it is turned into an `HttpRequest`.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Defaults to `GET`.
    pub method: Option<HttpMethod>,
    /// Serialized as JSON when present and not `null`.
    pub body: Option<Value>,
    pub query: Query,
    /// Merged over the client's default headers by case-insensitive name.
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method: Some(method),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Client for the opsgate API.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client that talks HTTP through [`UreqTransport`](crate::UreqTransport).
    #[cfg(feature = "ureq")]
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = crate::transport::UreqTransport::new(config.timeout);
        Self::with_transport(config, transport)
    }

    /// Create a client from `OPSGATE_*` environment variables.
    #[cfg(feature = "ureq")]
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Create a client over any transport, e.g. a test double.
    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> CacheService<'_> {
        CacheService::new(self)
    }

    pub fn scripts(&self) -> ScriptService<'_> {
        ScriptService::new(self)
    }

    pub fn health(&self) -> HealthService<'_> {
        HealthService::new(self)
    }

    pub fn sql(&self) -> SqlService<'_> {
        SqlService::new(self)
    }

    /// Build the full URL for `path`, with one `/` between base and path.
    fn url(&self, path: &str, query: &Query) -> String {
        let path = path.trim_start_matches('/');
        let mut url = format!("{}/{}", self.config.base_url, path);
        let encoded = query.encode();
        if !encoded.is_empty() {
            url.push('?');
            url.push_str(&encoded);
        }
        url
    }

    fn default_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            ("accept".to_string(), "application/json".to_string()),
            ("user-agent".to_string(), self.config.user_agent.clone()),
        ];
        for (name, value) in &self.config.default_headers {
            set_header(&mut headers, name, value);
        }
        if let Some(key) = &self.config.api_key {
            set_header(&mut headers, "authorization", &format!("Bearer {key}"));
        }
        headers
    }

    pub fn build_request(&self, path: &str, options: &RequestOptions) -> Result<HttpRequest> {
        let mut headers = self.default_headers();

        let body = match &options.body {
            Some(value) if !value.is_null() => {
                set_header(&mut headers, "content-type", "application/json");
                Some(serde_json::to_string(value)?)
            }
            _ => None,
        };

        for (name, value) in &options.headers {
            set_header(&mut headers, name, value);
        }

        Ok(HttpRequest {
            method: options.method.unwrap_or(HttpMethod::Get),
            url: self.url(path, &options.query),
            headers,
            body,
        })
    }

    pub fn parse_response(&self, response: HttpResponse) -> Result<Option<Value>> {
        check_status(&response)?;
        if response.status == 204 || response.body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&response.body)
            .map(Some)
            .map_err(|source| SdkError::Decode {
                context: "response body",
                source,
            })
    }

    /// Build, execute and parse one request.
    pub fn send(&self, path: &str, options: RequestOptions) -> Result<Option<Value>> {
        let request = self.build_request(path, &options)?;
        debug!(method = %request.method, url = %request.url, "sending request");

        let response = self.transport.execute(&request)?;
        debug!(
            method = %request.method,
            url = %request.url,
            status = response.status,
            "received response"
        );

        self.parse_response(response)
    }

    /// Send and decode the body into `T`. An empty body decodes as `null`.
    pub fn send_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
        context: &'static str,
    ) -> Result<T> {
        let value = self.send(path, options)?.unwrap_or(Value::Null);
        decode(value, context)
    }

    /// Send to a list endpoint and return its `items`. An empty body is
    /// treated as an empty envelope.
    pub fn send_list<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
        context: &'static str,
    ) -> Result<Vec<T>> {
        let value = self
            .send(path, options)?
            .unwrap_or_else(|| Value::Object(Map::new()));
        let list: ItemList<T> = decode(value, context)?;
        Ok(list.items)
    }

    /// Send and discard any success body.
    pub fn send_empty(&self, path: &str, options: RequestOptions) -> Result<()> {
        self.send(path, options).map(|_| ())
    }
}

/// Decode a JSON value into a record, tagging failures with `context`.
pub fn decode<T: DeserializeOwned>(value: Value, context: &'static str) -> Result<T> {
    serde_json::from_value(value).map_err(|source| SdkError::Decode { context, source })
}

/// Map non-success status codes to `SdkError::Api`.
fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }

    let body: Option<Value> = serde_json::from_str(&response.body).ok();
    let message = body
        .as_ref()
        .and_then(|json| {
            json.get("error")
                .and_then(Value::as_str)
                .or_else(|| json.get("message").and_then(Value::as_str))
        })
        .map(str::to_string)
        .or_else(|| {
            let text = response.body.trim();
            (!text.is_empty()).then(|| text.to_string())
        })
        .unwrap_or_else(|| reason_phrase(response.status).to_string());

    warn!(status = response.status, %message, "API request failed");
    Err(SdkError::Api {
        status: response.status,
        message,
        body,
    })
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unexpected Status",
    }
}
