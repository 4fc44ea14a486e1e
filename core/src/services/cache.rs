//! Remote cache management and entry access.

use serde_json::{json, Map, Value};

use super::{call_options_builders, object_fields, require_text, segment, CallOptions};
use crate::client::Client;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::types::{CacheDescriptor, CacheEntry, CreateCache};

/// Operations under `/api/cache`.
#[derive(Debug, Clone)]
pub struct CacheService<'a> {
    client: &'a Client,
    options: CallOptions,
}

call_options_builders!(CacheService);

impl<'a> CacheService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self {
            client,
            options: CallOptions::default(),
        }
    }

    fn cache_path(cache: &str) -> String {
        format!("/api/cache/{}", segment(cache))
    }

    fn entry_path(cache: &str, key: &str) -> String {
        format!("/api/cache/{}/entries/{}", segment(cache), segment(key))
    }

    /// List all caches. Use [`with_query`](Self::with_query) for server-side filters.
    pub fn list(&self) -> Result<Vec<CacheDescriptor>> {
        let request = self.options.to_request(HttpMethod::Get, None);
        self.client.send_list("/api/cache", request, "cache list")
    }

    pub fn create(&self, input: &CreateCache) -> Result<CacheDescriptor> {
        let name = require_text("name", &input.name)?;
        let mut fields = object_fields(input)?;
        fields.insert("name".to_string(), Value::String(name));

        let request = self.options.to_request(HttpMethod::Post, Some(fields));
        self.client.send_json("/api/cache", request, "cache")
    }

    pub fn get(&self, cache: &str) -> Result<CacheDescriptor> {
        let cache = require_text("cache", cache)?;
        let request = self.options.to_request(HttpMethod::Get, None);
        self.client.send_json(&Self::cache_path(&cache), request, "cache")
    }

    pub fn delete(&self, cache: &str) -> Result<()> {
        let cache = require_text("cache", cache)?;
        let request = self.options.to_request(HttpMethod::Delete, None);
        self.client.send_empty(&Self::cache_path(&cache), request)
    }

    /// Drop every entry but keep the cache itself.
    pub fn clear(&self, cache: &str) -> Result<()> {
        let cache = require_text("cache", cache)?;
        let request = self.options.to_request(HttpMethod::Post, None);
        let path = format!("{}/clear", Self::cache_path(&cache));
        self.client.send_empty(&path, request)
    }

    pub fn list_entries(&self, cache: &str) -> Result<Vec<CacheEntry>> {
        let cache = require_text("cache", cache)?;
        let request = self.options.to_request(HttpMethod::Get, None);
        let path = format!("{}/entries", Self::cache_path(&cache));
        self.client.send_list(&path, request, "cache entry list")
    }

    pub fn get_entry(&self, cache: &str, key: &str) -> Result<CacheEntry> {
        let cache = require_text("cache", cache)?;
        let key = require_text("key", key)?;
        let request = self.options.to_request(HttpMethod::Get, None);
        self.client
            .send_json(&Self::entry_path(&cache, &key), request, "cache entry")
    }

    /// Store `value` under `key`. `ttl_seconds` overrides the cache's
    /// default time-to-live for this entry.
    pub fn set_entry(
        &self,
        cache: &str,
        key: &str,
        value: Value,
        ttl_seconds: Option<u64>,
    ) -> Result<CacheEntry> {
        let cache = require_text("cache", cache)?;
        let key = require_text("key", key)?;

        let mut fields = Map::new();
        fields.insert("value".to_string(), value);
        if let Some(ttl) = ttl_seconds {
            fields.insert("ttlSeconds".to_string(), json!(ttl));
        }

        let request = self.options.to_request(HttpMethod::Put, Some(fields));
        self.client
            .send_json(&Self::entry_path(&cache, &key), request, "cache entry")
    }

    pub fn delete_entry(&self, cache: &str, key: &str) -> Result<()> {
        let cache = require_text("cache", cache)?;
        let key = require_text("key", key)?;
        let request = self.options.to_request(HttpMethod::Delete, None);
        self.client.send_empty(&Self::entry_path(&cache, &key), request)
    }
}
