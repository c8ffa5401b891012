//! Gateway router tests

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use greater::config::{Config, DEFAULT_USER_AGENT};
use greater::http_server::build_router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header as header_eq, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(google: &MockServer) -> Config {
    let mut config = Config::default();
    config.google.sheets_base_url = google.uri();
    config.google.language_base_url = google.uri();
    config
}

fn router(config: &Config) -> Router {
    build_router(config).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Bearer ya29.test")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

fn header_value<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_preflight_on_any_path() {
    let app = router(&Config::default());

    for uri in ["/api/sheets/create", "/index.html"] {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = send(app.clone(), request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_value(&response, "access-control-allow-origin"), Some("*"));
        assert_eq!(
            header_value(&response, "access-control-allow-methods"),
            Some("GET, POST, OPTIONS")
        );
        assert_eq!(
            header_value(&response, "access-control-allow-headers"),
            Some("Content-Type, Authorization, Origin")
        );
        assert_eq!(header_value(&response, "access-control-max-age"), Some("86400"));
        assert!(body_text(response).await.is_empty());
    }
}

#[tokio::test]
async fn test_config_without_client_id_returns_null() {
    let app = router(&Config::default());
    let request = Request::builder().uri("/api/config").body(Body::empty()).unwrap();

    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_value(&response, "access-control-allow-methods"),
        Some("GET, OPTIONS")
    );
    assert_eq!(body_json(response).await, json!({ "clientId": null }));
}

#[tokio::test]
async fn test_config_returns_client_id() {
    let mut config = Config::default();
    config.google.client_id = Some("1234.apps.googleusercontent.com".into());

    let request = Request::builder().uri("/api/config").body(Body::empty()).unwrap();
    let response = send(router(&config), request).await;

    assert_eq!(
        body_json(response).await,
        json!({ "clientId": "1234.apps.googleusercontent.com" })
    );
}

#[tokio::test]
async fn test_required_client_id_fails_startup() {
    let mut config = Config::default();
    config.google.require_client_id = true;
    assert!(build_router(&config).is_err());
}

#[tokio::test]
async fn test_proxy_returns_page_text() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/episode"))
        .and(header_eq("user-agent", DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>Hosted by Ada Lovelace</p>"))
        .expect(1)
        .mount(&site)
        .await;

    let request = post_json("/api/proxy", json!({ "url": format!("{}/episode", site.uri()) }));
    let response = send(router(&Config::default()), request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_value(&response, "access-control-allow-headers"),
        Some("Content-Type")
    );
    assert_eq!(
        body_json(response).await,
        json!({ "content": "<p>Hosted by Ada Lovelace</p>" })
    );
}

#[tokio::test]
async fn test_proxy_passes_error_pages_through() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&site)
        .await;

    let request = post_json("/api/proxy", json!({ "url": site.uri() }));
    let response = send(router(&Config::default()), request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["content"], "gone");
}

#[tokio::test]
async fn test_proxy_unreachable_host() {
    let request = post_json("/api/proxy", json!({ "url": "http://127.0.0.1:1/" }));
    let response = send(router(&Config::default()), request).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Failed to fetch URL");
    assert!(body["details"].as_str().is_some_and(|d| !d.is_empty()));
}

#[tokio::test]
async fn test_proxy_rejects_bad_input() {
    let app = router(&Config::default());

    for body in [json!({}), json!({ "url": "not a url" }), json!({ "url": "file:///etc/passwd" })] {
        let response = send(app.clone(), post_json("/api/proxy", body)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Failed to fetch URL");
    }
}

#[tokio::test]
async fn test_proxy_allow_list() {
    let mut config = Config::default();
    config.proxy.allowed_hosts = vec!["example.com".into()];

    let request = post_json("/api/proxy", json!({ "url": "http://127.0.0.1:1/" }));
    let response = send(router(&config), request).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let details = body_json(response).await["details"].as_str().unwrap().to_string();
    assert!(details.contains("127.0.0.1"));
}

#[tokio::test]
async fn test_sheets_create_relays_token_and_body() {
    let google = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets"))
        .and(header_eq("authorization", "Bearer ya29.test"))
        .and(body_partial_json(json!({
            "properties": { "title": "Jo Lead List & Bookings" },
            "sheets": [{ "properties": { "title": "Bookings" } }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "spreadsheetId": "sheet-1",
            "spreadsheetUrl": "https://docs.google.com/spreadsheets/d/sheet-1"
        })))
        .expect(1)
        .mount(&google)
        .await;

    let request = post_json(
        "/api/sheets/create",
        json!({
            "title": "Jo Lead List & Bookings",
            "headers": [{ "properties": { "title": "Bookings" } }]
        }),
    );
    let response = send(router(&config_for(&google)), request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_value(&response, "access-control-allow-headers"),
        Some("Content-Type, Authorization, Origin")
    );
    assert!(header_value(&response, "access-control-allow-methods").is_none());
    assert_eq!(body_json(response).await["spreadsheetId"], "sheet-1");
}

#[tokio::test]
async fn test_upstream_status_is_relayed() {
    let google = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v4/spreadsheets/sheet-1/values/Logs!A1:B1"))
        .and(query_param("valueInputOption", "RAW"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "The caller does not have permission" }
        })))
        .mount(&google)
        .await;

    let request = post_json(
        "/api/sheets/update",
        json!({
            "spreadsheetId": "sheet-1",
            "range": "Logs!A1:B1",
            "values": [["Date/Time", "Event"]]
        }),
    );
    let response = send(router(&config_for(&google)), request).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await["error"]["message"],
        "The caller does not have permission"
    );
}

#[tokio::test]
async fn test_append_and_clear() {
    let google = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-1/values/Logs!A:B:append"))
        .and(query_param("insertDataOption", "INSERT_ROWS"))
        .and(body_partial_json(json!({ "values": [["now", "URL analyzed"]] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "updates": {} })))
        .expect(1)
        .mount(&google)
        .await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-1/values/Keywords!A2:C:clear"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "clearedRange": "Keywords!A2:C1000" })))
        .expect(1)
        .mount(&google)
        .await;

    let app = router(&config_for(&google));
    let append = post_json(
        "/api/sheets/append",
        json!({ "spreadsheetId": "sheet-1", "range": "Logs!A:B", "values": [["now", "URL analyzed"]] }),
    );
    assert_eq!(send(app.clone(), append).await.status(), StatusCode::OK);

    let clear = post_json(
        "/api/sheets/clear",
        json!({ "spreadsheetId": "sheet-1", "range": "Keywords!A2:C" }),
    );
    let response = send(app, clear).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["clearedRange"], "Keywords!A2:C1000");
}

#[tokio::test]
async fn test_language_analyze() {
    let google = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/documents:analyzeEntities"))
        .and(body_partial_json(json!({
            "document": { "type": "PLAIN_TEXT", "content": "Ada Lovelace wrote notes" },
            "encodingType": "UTF8"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entities": [{ "name": "Ada Lovelace", "type": "PERSON", "salience": 0.9 }]
        })))
        .expect(1)
        .mount(&google)
        .await;

    let request = post_json(
        "/api/language/analyze",
        json!({ "content": "Ada Lovelace wrote notes" }),
    );
    let response = send(router(&config_for(&google)), request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["entities"][0]["type"], "PERSON");
}

#[tokio::test]
async fn test_missing_authorization_is_not_invented() {
    let google = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/documents:analyzeEntities"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": { "code": 401 } })))
        .mount(&google)
        .await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/language/analyze")
        .body(Body::from(r#"{"content":"text"}"#))
        .unwrap();
    let response = send(router(&config_for(&google)), request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let received = google.received_requests().await.unwrap();
    assert!(received[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_malformed_relay_body_is_500() {
    let response = send(
        router(&Config::default()),
        post_json("/api/sheets/update", json!({ "range": "A1" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error = body_json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("invalid request: missing field `spreadsheetId`"));
}

#[tokio::test]
async fn test_relay_timeout_is_500() {
    let google = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/documents:analyzeEntities"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "entities": [] }))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&google)
        .await;

    let mut config = config_for(&google);
    config.google.timeout_secs = 1;
    let request = post_json("/api/language/analyze", json!({ "content": "slow" }));
    let response = send(router(&config), request).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["error"],
        "upstream timed out after 1000ms"
    );
}

#[tokio::test]
async fn test_unknown_api_paths() {
    let app = router(&Config::default());

    let unknown = post_json("/api/sheets/delete", json!({}));
    let response = send(app.clone(), unknown).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "API endpoint not found");

    let wrong_method = Request::builder().uri("/api/proxy").body(Body::empty()).unwrap();
    let response = send(app, wrong_method).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "API endpoint not found");
}

#[tokio::test]
async fn test_static_assets() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.html"), "<greater-app></greater-app>").unwrap();
    std::fs::create_dir(dir.path().join("scripts")).unwrap();
    std::fs::write(dir.path().join("scripts/app.js"), "console.log(1)").unwrap();

    let mut config = Config::default();
    config.assets.dir = dir.path().to_string_lossy().to_string();
    let app = router(&config);

    let response = send(app.clone(), Request::builder().uri("/").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_value(&response, "access-control-allow-origin"), Some("*"));
    assert_eq!(body_text(response).await, "<greater-app></greater-app>");

    let response = send(
        app.clone(),
        Request::builder().uri("/scripts/app.js").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(app, Request::builder().uri("/missing.js").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Not Found");
}
