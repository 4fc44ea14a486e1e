//! Stored scripts: CRUD plus execution.

use serde_json::{Map, Value};

use super::{call_options_builders, object_fields, require_text, segment, CallOptions};
use crate::client::Client;
use crate::error::{Result, SdkError};
use crate::http::HttpMethod;
use crate::types::{CreateScript, Script, ScriptExecution, UpdateScript};

/// Operations under `/api/scripts`.
#[derive(Debug, Clone)]
pub struct ScriptService<'a> {
    client: &'a Client,
    options: CallOptions,
}

call_options_builders!(ScriptService);

/// Script bodies are sent verbatim, but a blank body is never valid.
fn require_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(SdkError::validation("content", "must not be empty or whitespace"));
    }
    Ok(())
}

impl<'a> ScriptService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self {
            client,
            options: CallOptions::default(),
        }
    }

    fn script_path(name: &str) -> String {
        format!("/api/scripts/{}", segment(name))
    }

    pub fn create(&self, input: &CreateScript) -> Result<Script> {
        let name = require_text("name", &input.name)?;
        require_content(&input.content)?;

        let mut fields = object_fields(input)?;
        fields.insert("name".to_string(), Value::String(name));

        let request = self.options.to_request(HttpMethod::Post, Some(fields));
        self.client.send_json("/api/scripts", request, "script")
    }

    pub fn list(&self) -> Result<Vec<Script>> {
        let request = self.options.to_request(HttpMethod::Get, None);
        self.client.send_list("/api/scripts", request, "script list")
    }

    pub fn get(&self, name: &str) -> Result<Script> {
        let name = require_text("name", name)?;
        let request = self.options.to_request(HttpMethod::Get, None);
        self.client.send_json(&Self::script_path(&name), request, "script")
    }

    /// Patch the fields set in `input`; the rest stay as they are.
    pub fn update(&self, name: &str, input: &UpdateScript) -> Result<Script> {
        let name = require_text("name", name)?;
        if let Some(content) = &input.content {
            require_content(content)?;
        }

        let fields = object_fields(input)?;
        let request = self.options.to_request(HttpMethod::Patch, Some(fields));
        self.client.send_json(&Self::script_path(&name), request, "script")
    }

    /// Run a stored script. `args` is forwarded as-is when present.
    pub fn execute(&self, name: &str, args: Option<Value>) -> Result<ScriptExecution> {
        let name = require_text("name", name)?;

        let mut fields = Map::new();
        if let Some(args) = args {
            fields.insert("args".to_string(), args);
        }

        let request = self.options.to_request(HttpMethod::Post, Some(fields));
        let path = format!("{}/execute", Self::script_path(&name));
        self.client.send_json(&path, request, "script execution")
    }

    /// Run a named server command that is not stored as a script.
    pub fn command(&self, command: &str, args: Option<Value>) -> Result<ScriptExecution> {
        let command = require_text("command", command)?;

        let mut fields = Map::new();
        fields.insert("command".to_string(), Value::String(command));
        if let Some(args) = args {
            fields.insert("args".to_string(), args);
        }

        let request = self.options.to_request(HttpMethod::Post, Some(fields));
        self.client
            .send_json("/api/scripts/command", request, "command execution")
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let name = require_text("name", name)?;
        let request = self.options.to_request(HttpMethod::Delete, None);
        self.client.send_empty(&Self::script_path(&name), request)
    }
}
