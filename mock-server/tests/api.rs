use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, CacheDescriptor, CacheEntry, Script};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

/// Send one request through a long-lived router so state persists.
async fn call(app: &mut axum::routing::RouterIntoService<String>, req: Request<String>) -> axum::response::Response {
    use tower::Service;
    ServiceExt::ready(app).await.unwrap().call(req).await.unwrap()
}

// --- health ---

#[tokio::test]
async fn health_reports_ok() {
    let resp = app().oneshot(empty_request("GET", "/api/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["status"], "ok");
}

// --- caches ---

#[tokio::test]
async fn list_caches_empty() {
    let resp = app().oneshot(empty_request("GET", "/api/cache")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["items"], serde_json::json!([]));
}

#[tokio::test]
async fn create_cache_returns_201_with_defaults() {
    let resp = app()
        .oneshot(json_request("POST", "/api/cache", r#"{"name":"primary"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let cache: CacheDescriptor = body_json(resp).await;
    assert_eq!(cache.name, "primary");
    assert_eq!(cache.size_bytes, mock_server::DEFAULT_SIZE_BYTES);
}

#[tokio::test]
async fn create_cache_blank_name_returns_400() {
    let resp = app()
        .oneshot(json_request("POST", "/api/cache", r#"{"name":"  "}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "name is required");
}

#[tokio::test]
async fn create_cache_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/api/cache", r#"{"not_name":1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_cache_not_found() {
    let resp = app().oneshot(empty_request("GET", "/api/cache/missing")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "cache 'missing' not found");
}

#[tokio::test]
async fn set_entry_on_missing_cache_returns_404() {
    let resp = app()
        .oneshot(json_request("PUT", "/api/cache/missing/entries/k", r#"{"value":1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cache_lifecycle() {
    let mut app = app().into_service();

    let resp = call(
        &mut app,
        json_request("POST", "/api/cache", r#"{"name":"ai-cache","defaultTtlSeconds":30}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // duplicate create conflicts
    let resp = call(&mut app, json_request("POST", "/api/cache", r#"{"name":"ai-cache"}"#)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // percent-encoded key is decoded by the router
    let resp = call(
        &mut app,
        json_request(
            "PUT",
            "/api/cache/ai-cache/entries/dialog%3A1",
            r#"{"value":{"hello":"world"},"ttlSeconds":90}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let entry: CacheEntry = body_json(resp).await;
    assert_eq!(entry.key, "dialog:1");
    assert_eq!(entry.value["hello"], "world");
    assert_eq!(entry.ttl_seconds, Some(90));

    // entry without ttl inherits the cache default
    let resp = call(
        &mut app,
        json_request("PUT", "/api/cache/ai-cache/entries/other", r#"{"value":2}"#),
    )
    .await;
    let entry: CacheEntry = body_json(resp).await;
    assert_eq!(entry.ttl_seconds, Some(30));

    let resp = call(&mut app, empty_request("GET", "/api/cache/ai-cache/entries/dialog:1")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let entry: CacheEntry = body_json(resp).await;
    assert_eq!(entry.origin, "memory");

    let resp = call(&mut app, empty_request("GET", "/api/cache/ai-cache")).await;
    let cache: CacheDescriptor = body_json(resp).await;
    assert_eq!(cache.entry_count, 2);

    let resp = call(&mut app, empty_request("DELETE", "/api/cache/ai-cache/entries/other")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = call(&mut app, empty_request("POST", "/api/cache/ai-cache/clear")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = call(&mut app, empty_request("GET", "/api/cache/ai-cache/entries")).await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["items"], serde_json::json!([]));

    let resp = call(&mut app, empty_request("DELETE", "/api/cache/ai-cache")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = call(&mut app, empty_request("GET", "/api/cache/ai-cache")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_caches_filters_by_prefix() {
    let mut app = app().into_service();
    for name in ["ai-one", "ai-two", "other"] {
        let body = format!(r#"{{"name":"{name}"}}"#);
        call(&mut app, json_request("POST", "/api/cache", &body)).await;
    }
    let resp = call(&mut app, empty_request("GET", "/api/cache?prefix=ai-")).await;
    let body: Value = body_json(resp).await;
    let names: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["ai-one", "ai-two"]);
}

// --- scripts ---

#[tokio::test]
async fn script_lifecycle() {
    let mut app = app().into_service();

    let resp = call(
        &mut app,
        json_request("POST", "/api/scripts", r#"{"name":"warmup","content":"a\nb"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Script = body_json(resp).await;
    assert_eq!(created.name, "warmup");

    let resp = call(
        &mut app,
        json_request("PATCH", "/api/scripts/warmup", r#"{"description":"prime"}"#),
    )
    .await;
    let updated: Script = body_json(resp).await;
    assert_eq!(updated.content, "a\nb"); // unchanged
    assert_eq!(updated.description.as_deref(), Some("prime"));

    let resp = call(
        &mut app,
        json_request("POST", "/api/scripts/warmup/execute", r#"{"args":{"n":1}}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let run: Value = body_json(resp).await;
    assert_eq!(run["status"], "completed");
    assert_eq!(run["output"]["lines"], 2);
    assert_eq!(run["output"]["args"]["n"], 1);

    let resp = call(&mut app, empty_request("GET", "/api/scripts")).await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let resp = call(&mut app, empty_request("DELETE", "/api/scripts/warmup")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = call(
        &mut app,
        json_request("POST", "/api/scripts/warmup/execute", "{}"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn script_timestamps_are_rfc3339() {
    let resp = app()
        .oneshot(json_request("POST", "/api/scripts", r#"{"name":"s","content":"x"}"#))
        .await
        .unwrap();
    let body: Value = body_json(resp).await;
    for field in ["createdAt", "updatedAt"] {
        let stamp = body[field].as_str().unwrap();
        assert!(
            chrono::DateTime::parse_from_rfc3339(stamp).is_ok(),
            "{field} = {stamp:?}"
        );
    }
    assert_eq!(body["createdAt"], body["updatedAt"]);
}

#[tokio::test]
async fn command_ping_and_unknown() {
    let mut app = app().into_service();

    let resp = call(&mut app, json_request("POST", "/api/scripts/command", r#"{"command":"ping"}"#)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let run: Value = body_json(resp).await;
    assert_eq!(run["output"], "pong");

    let resp = call(&mut app, json_request("POST", "/api/scripts/command", r#"{"command":"reboot"}"#)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- sql ---

#[tokio::test]
async fn sql_select_literals() {
    let resp = app()
        .oneshot(json_request("POST", "/api/sql/execute", r#"{"query":"SELECT 1, 'a', ?","params":[true]}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["columns"], serde_json::json!(["1", "'a'", "?"]));
    assert_eq!(body["rows"], serde_json::json!([[1, "a", true]]));
}

#[tokio::test]
async fn sql_statement_reports_affected_rows() {
    let resp = app()
        .oneshot(json_request("POST", "/api/sql/execute", r#"{"query":"DELETE FROM t"}"#))
        .await
        .unwrap();
    let body: Value = body_json(resp).await;
    assert_eq!(body["affectedRows"], 1);
    assert_eq!(body["rows"], serde_json::json!([]));
}
