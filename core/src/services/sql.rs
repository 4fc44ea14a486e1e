//! SQL statement execution.

use serde_json::{Map, Value};

use super::{call_options_builders, require_text, CallOptions};
use crate::client::Client;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::types::SqlResult;

#[derive(Debug, Clone)]
pub struct SqlService<'a> {
    client: &'a Client,
    options: CallOptions,
}

call_options_builders!(SqlService);

impl<'a> SqlService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self {
            client,
            options: CallOptions::default(),
        }
    }

    /// Run one statement. Surrounding whitespace is trimmed before sending.
    pub fn execute(&self, query: &str) -> Result<SqlResult> {
        self.run(query, None)
    }

    /// Run one statement with positional parameters.
    pub fn execute_with_params(&self, query: &str, params: Vec<Value>) -> Result<SqlResult> {
        self.run(query, Some(params))
    }

    fn run(&self, query: &str, params: Option<Vec<Value>>) -> Result<SqlResult> {
        let query = require_text("query", query)?;

        let mut fields = Map::new();
        fields.insert("query".to_string(), Value::String(query));
        if let Some(params) = params {
            fields.insert("params".to_string(), Value::Array(params));
        }

        let request = self.options.to_request(HttpMethod::Post, Some(fields));
        self.client.send_json("/api/sql/execute", request, "sql result")
    }
}
