use std::{
    collections::BTreeMap,
    sync::Arc,
    time::Instant,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEFAULT_SIZE_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheDescriptor {
    pub name: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_ttl_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_timeout_ms: Option<u64>,
    pub entry_count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub cache: String,
    pub key: String,
    pub value: Value,
    pub origin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub name: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCache {
    pub name: String,
    pub size_bytes: Option<u64>,
    pub default_ttl_seconds: Option<u64>,
    pub read_timeout_ms: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetEntry {
    #[serde(default)]
    pub value: Value,
    pub ttl_seconds: Option<u64>,
}

#[derive(Deserialize)]
pub struct CreateScript {
    pub name: String,
    pub content: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateScript {
    pub content: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct ExecuteScript {
    #[serde(default)]
    pub args: Option<Value>,
}

#[derive(Deserialize)]
pub struct RunCommand {
    pub command: String,
    pub args: Option<Value>,
}

#[derive(Deserialize)]
pub struct SqlRequest {
    pub query: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

#[derive(Deserialize)]
pub struct ListFilter {
    pub prefix: Option<String>,
}

struct StoredEntry {
    value: Value,
    ttl_seconds: Option<u64>,
}

struct CacheState {
    descriptor: CacheDescriptor,
    entries: BTreeMap<String, StoredEntry>,
}

#[derive(Default)]
pub struct Store {
    caches: BTreeMap<String, CacheState>,
    scripts: BTreeMap<String, Script>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/api/health", get(health))
        .route("/api/cache", get(list_caches).post(create_cache))
        .route("/api/cache/{cache}", get(get_cache).delete(delete_cache))
        .route("/api/cache/{cache}/clear", post(clear_cache))
        .route("/api/cache/{cache}/entries", get(list_entries))
        .route(
            "/api/cache/{cache}/entries/{key}",
            put(set_entry).get(get_entry).delete(delete_entry),
        )
        .route("/api/scripts", get(list_scripts).post(create_script))
        .route("/api/scripts/command", post(run_command))
        .route(
            "/api/scripts/{name}",
            get(get_script).patch(update_script).delete(delete_script),
        )
        .route("/api/scripts/{name}/execute", post(execute_script))
        .route("/api/sql/execute", post(execute_sql))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// JSON error body in the `{"error": ...}` shape clients parse.
#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl ApiError {
    fn not_found(what: &str, name: &str) -> Self {
        Self(StatusCode::NOT_FOUND, format!("{what} '{name}' not found"))
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self(StatusCode::BAD_REQUEST, message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::debug!(status = %self.0, error = %self.1, "rejecting request");
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}


fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

// --- health ---

async fn health(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    Json(json!({
        "status": "ok",
        "message": "mock server is healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "caches": store.caches.len().to_string(),
            "scripts": store.scripts.len().to_string(),
        }
    }))
}

// --- caches ---

async fn list_caches(State(db): State<Db>, Query(filter): Query<ListFilter>) -> Json<Value> {
    let store = db.read().await;
    let items: Vec<&CacheDescriptor> = store
        .caches
        .values()
        .map(|c| &c.descriptor)
        .filter(|d| filter.prefix.as_deref().map_or(true, |p| d.name.starts_with(p)))
        .collect();
    Json(json!({ "items": items }))
}

async fn create_cache(
    State(db): State<Db>,
    Json(input): Json<CreateCache>,
) -> Result<(StatusCode, Json<CacheDescriptor>), ApiError> {
    let name = required("name", &input.name)?;
    let mut store = db.write().await;
    if store.caches.contains_key(&name) {
        return Err(ApiError(StatusCode::CONFLICT, format!("cache '{name}' already exists")));
    }
    let descriptor = CacheDescriptor {
        name: name.clone(),
        size_bytes: input.size_bytes.unwrap_or(DEFAULT_SIZE_BYTES),
        default_ttl_seconds: input.default_ttl_seconds,
        read_timeout_ms: input.read_timeout_ms,
        entry_count: 0,
    };
    store.caches.insert(
        name,
        CacheState {
            descriptor: descriptor.clone(),
            entries: BTreeMap::new(),
        },
    );
    Ok((StatusCode::CREATED, Json(descriptor)))
}

async fn get_cache(
    State(db): State<Db>,
    Path(cache): Path<String>,
) -> Result<Json<CacheDescriptor>, ApiError> {
    let store = db.read().await;
    store
        .caches
        .get(&cache)
        .map(|c| Json(c.descriptor.clone()))
        .ok_or_else(|| ApiError::not_found("cache", &cache))
}

async fn delete_cache(
    State(db): State<Db>,
    Path(cache): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut store = db.write().await;
    store
        .caches
        .remove(&cache)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| ApiError::not_found("cache", &cache))
}

async fn clear_cache(
    State(db): State<Db>,
    Path(cache): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut store = db.write().await;
    let state = store
        .caches
        .get_mut(&cache)
        .ok_or_else(|| ApiError::not_found("cache", &cache))?;
    state.entries.clear();
    state.descriptor.entry_count = 0;
    Ok(StatusCode::NO_CONTENT)
}

fn entry_view(cache: &str, key: &str, entry: &StoredEntry, origin: &str) -> CacheEntry {
    CacheEntry {
        cache: cache.to_string(),
        key: key.to_string(),
        value: entry.value.clone(),
        origin: origin.to_string(),
        ttl_seconds: entry.ttl_seconds,
    }
}

async fn list_entries(
    State(db): State<Db>,
    Path(cache): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let store = db.read().await;
    let state = store
        .caches
        .get(&cache)
        .ok_or_else(|| ApiError::not_found("cache", &cache))?;
    let items: Vec<CacheEntry> = state
        .entries
        .iter()
        .map(|(key, entry)| entry_view(&cache, key, entry, "memory"))
        .collect();
    Ok(Json(json!({ "items": items })))
}

async fn get_entry(
    State(db): State<Db>,
    Path((cache, key)): Path<(String, String)>,
) -> Result<Json<CacheEntry>, ApiError> {
    let store = db.read().await;
    let state = store
        .caches
        .get(&cache)
        .ok_or_else(|| ApiError::not_found("cache", &cache))?;
    state
        .entries
        .get(&key)
        .map(|entry| Json(entry_view(&cache, &key, entry, "memory")))
        .ok_or_else(|| ApiError::not_found("entry", &key))
}

async fn set_entry(
    State(db): State<Db>,
    Path((cache, key)): Path<(String, String)>,
    Json(input): Json<SetEntry>,
) -> Result<Json<CacheEntry>, ApiError> {
    let mut store = db.write().await;
    let state = store
        .caches
        .get_mut(&cache)
        .ok_or_else(|| ApiError::not_found("cache", &cache))?;
    let entry = StoredEntry {
        value: input.value,
        ttl_seconds: input.ttl_seconds.or(state.descriptor.default_ttl_seconds),
    };
    let view = entry_view(&cache, &key, &entry, "write");
    state.entries.insert(key, entry);
    state.descriptor.entry_count = state.entries.len() as u64;
    Ok(Json(view))
}

async fn delete_entry(
    State(db): State<Db>,
    Path((cache, key)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let mut store = db.write().await;
    let state = store
        .caches
        .get_mut(&cache)
        .ok_or_else(|| ApiError::not_found("cache", &cache))?;
    state
        .entries
        .remove(&key)
        .ok_or_else(|| ApiError::not_found("entry", &key))?;
    state.descriptor.entry_count = state.entries.len() as u64;
    Ok(StatusCode::NO_CONTENT)
}

// --- scripts ---

async fn list_scripts(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    let items: Vec<&Script> = store.scripts.values().collect();
    Json(json!({ "items": items }))
}

async fn create_script(
    State(db): State<Db>,
    Json(input): Json<CreateScript>,
) -> Result<(StatusCode, Json<Script>), ApiError> {
    let name = required("name", &input.name)?;
    required("content", &input.content)?;
    let mut store = db.write().await;
    if store.scripts.contains_key(&name) {
        return Err(ApiError(StatusCode::CONFLICT, format!("script '{name}' already exists")));
    }
    let stamp = Utc::now();
    let script = Script {
        name: name.clone(),
        content: input.content,
        description: input.description,
        created_at: stamp,
        updated_at: stamp,
    };
    store.scripts.insert(name, script.clone());
    Ok((StatusCode::CREATED, Json(script)))
}

async fn get_script(
    State(db): State<Db>,
    Path(name): Path<String>,
) -> Result<Json<Script>, ApiError> {
    let store = db.read().await;
    store
        .scripts
        .get(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("script", &name))
}

async fn update_script(
    State(db): State<Db>,
    Path(name): Path<String>,
    Json(input): Json<UpdateScript>,
) -> Result<Json<Script>, ApiError> {
    let mut store = db.write().await;
    let script = store
        .scripts
        .get_mut(&name)
        .ok_or_else(|| ApiError::not_found("script", &name))?;
    if let Some(content) = input.content {
        script.content = content;
    }
    if let Some(description) = input.description {
        script.description = Some(description);
    }
    script.updated_at = Utc::now();
    Ok(Json(script.clone()))
}

async fn delete_script(
    State(db): State<Db>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut store = db.write().await;
    store
        .scripts
        .remove(&name)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| ApiError::not_found("script", &name))
}

/// Scripts are not interpreted; execution echoes what would have run.
async fn execute_script(
    State(db): State<Db>,
    Path(name): Path<String>,
    Json(input): Json<ExecuteScript>,
) -> Result<Json<Value>, ApiError> {
    let started = Instant::now();
    let store = db.read().await;
    let script = store
        .scripts
        .get(&name)
        .ok_or_else(|| ApiError::not_found("script", &name))?;
    let args = input.args.unwrap_or(Value::Null);
    Ok(Json(json!({
        "status": "completed",
        "output": { "script": script.name, "lines": script.content.lines().count(), "args": args },
        "executionId": Uuid::new_v4(),
        "durationMs": started.elapsed().as_millis() as u64,
    })))
}

async fn run_command(Json(input): Json<RunCommand>) -> Result<Json<Value>, ApiError> {
    let command = required("command", &input.command)?;
    let output = match command.as_str() {
        "ping" => json!("pong"),
        "echo" => input.args.unwrap_or(Value::Null),
        other => {
            return Err(ApiError::bad_request(format!("unknown command '{other}'")));
        }
    };
    Ok(Json(json!({
        "status": "completed",
        "output": output,
        "executionId": Uuid::new_v4(),
    })))
}

// --- sql ---

/// Understands `SELECT <literal>, ...` only; any other statement reports
/// one affected row.
async fn execute_sql(Json(input): Json<SqlRequest>) -> Result<Json<Value>, ApiError> {
    let query = required("query", &input.query)?;
    if query.to_ascii_uppercase().starts_with("SELECT ") {
        let rest = &query["SELECT ".len()..];
        let mut params = input.params.into_iter();
        let mut columns = Vec::new();
        let mut row = Vec::new();
        for literal in rest.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            columns.push(literal.to_string());
            let value = if literal == "?" {
                params.next().unwrap_or(Value::Null)
            } else {
                serde_json::from_str(literal)
                    .unwrap_or_else(|_| Value::String(literal.trim_matches('\'').to_string()))
            };
            row.push(value);
        }
        return Ok(Json(json!({ "columns": columns, "rows": [row], "affectedRows": 0 })));
    }
    Ok(Json(json!({ "columns": [], "rows": [], "affectedRows": 1 })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_descriptor_serializes_camel_case() {
        let descriptor = CacheDescriptor {
            name: "primary".to_string(),
            size_bytes: 10,
            default_ttl_seconds: Some(60),
            read_timeout_ms: None,
            entry_count: 0,
        };
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["sizeBytes"], 10);
        assert_eq!(json["defaultTtlSeconds"], 60);
        assert!(json.get("readTimeoutMs").is_none());
    }

    #[test]
    fn create_cache_only_requires_name() {
        let input: CreateCache = serde_json::from_str(r#"{"name":"primary"}"#).unwrap();
        assert_eq!(input.name, "primary");
        assert!(input.size_bytes.is_none());
    }

    #[test]
    fn set_entry_value_defaults_to_null() {
        let input: SetEntry = serde_json::from_str(r#"{"ttlSeconds":5}"#).unwrap();
        assert_eq!(input.value, Value::Null);
        assert_eq!(input.ttl_seconds, Some(5));
    }

    #[test]
    fn update_script_all_fields_optional() {
        let input: UpdateScript = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.content.is_none());
        assert!(input.description.is_none());
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("name", " a ").unwrap(), "a");
        assert!(required("name", "  ").is_err());
    }
}
