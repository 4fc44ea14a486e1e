//! Typed wrappers over each resource family of the API.
//!
//! # Design
//! Services borrow the [`Client`](crate::Client) and carry only per-call
//! [`CallOptions`]. Every method follows the same shape: validate arguments,
//! build a [`RequestOptions`], dispatch, decode. Validation always runs
//! before the dispatcher is touched, so a bad argument never reaches the
//! transport.

mod cache;
mod health;
mod scripts;
mod sql;

pub use cache::CacheService;
pub use health::HealthService;
pub use scripts::ScriptService;
pub use sql::SqlService;

use serde_json::{Map, Value};

use crate::client::RequestOptions;
use crate::error::{Result, SdkError};
use crate::http::HttpMethod;
use crate::query::Query;

/// Extra query parameters, headers and body fields applied to every call
/// made through one service handle.
///
/// Body fields are merged under the fields a method sets itself, so they
/// can add to a payload but never replace `name`, `content`, `query`,
/// `command`, `value` or `ttlSeconds`.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub query: Query,
    pub headers: Vec<(String, String)>,
    pub body: Map<String, Value>,
}

impl CallOptions {
    /// Build dispatcher options for `method`. `fields` are the
    /// method-owned body fields; `None` means the endpoint takes no body.
    pub(crate) fn to_request(
        &self,
        method: HttpMethod,
        fields: Option<Map<String, Value>>,
    ) -> RequestOptions {
        let body = match fields {
            Some(fields) => {
                let mut body = self.body.clone();
                body.extend(fields);
                Some(Value::Object(body))
            }
            None if matches!(method, HttpMethod::Get | HttpMethod::Delete) => None,
            None if self.body.is_empty() => None,
            None => Some(Value::Object(self.body.clone())),
        };

        RequestOptions {
            method: Some(method),
            body,
            query: self.query.clone(),
            headers: self.headers.clone(),
        }
    }
}

/// Builder methods shared by every service handle.
macro_rules! call_options_builders {
    ($service:ident) => {
        impl<'a> $service<'a> {
            /// Replace the per-call options.
            #[must_use]
            pub fn with_options(mut self, options: $crate::services::CallOptions) -> Self {
                self.options = options;
                self
            }

            #[must_use]
            pub fn with_query(
                mut self,
                key: impl Into<String>,
                value: impl Into<serde_json::Value>,
            ) -> Self {
                self.options.query.push(key, value);
                self
            }

            #[must_use]
            pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
                self.options.headers.push((name.into(), value.into()));
                self
            }

            #[must_use]
            pub fn with_body_field(
                mut self,
                key: impl Into<String>,
                value: impl Into<serde_json::Value>,
            ) -> Self {
                self.options.body.insert(key.into(), value.into());
                self
            }
        }
    };
}
pub(crate) use call_options_builders;

/// Trim `value` and reject it if nothing is left.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SdkError::validation(field, "must not be empty or whitespace"));
    }
    Ok(trimmed.to_string())
}

/// Percent-encode one path segment.
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Serialize an input payload into its JSON object fields.
pub(crate) fn object_fields<T: serde::Serialize>(input: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(input)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}
