use crate::http_server::server::AppState;
use crate::relay::{FetchError, UpstreamResponse};
use crate::utils::errors::{GatewayError, GatewayResult};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Body of `GET /api/config`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfigResponse {
    pub client_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyRequest {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyResponse {
    pub content: String,
}

/// `headers` is the Sheets API `sheets` array, passed through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSheetRequest {
    pub title: String,
    #[serde(default)]
    pub headers: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuesRequest {
    pub spreadsheet_id: String,
    pub range: String,
    #[serde(default)]
    pub values: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearRequest {
    pub spreadsheet_id: String,
    pub range: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub content: String,
}

/// OAuth client id for the browser token flow
pub async fn config(State(state): State<Arc<AppState>>) -> Json<ClientConfigResponse> {
    info!(
        client_id = if state.client_id.is_some() { "present" } else { "missing" },
        "Config request received"
    );

    Json(ClientConfigResponse {
        client_id: state.client_id.clone(),
    })
}

/// Fetch a third-party URL on behalf of the browser
pub async fn proxy(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ProxyResponse>, FetchError> {
    let request: ProxyRequest =
        parse_body(&body).map_err(|e| FetchError::InvalidBody(e.to_string()))?;

    let content = state.fetcher.fetch(&request.url).await?;
    Ok(Json(ProxyResponse { content }))
}

pub async fn sheets_create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> GatewayResult<Response> {
    let request: CreateSheetRequest = relay_body(&body)?;
    let upstream = state
        .google
        .create_spreadsheet(
            authorization(&headers),
            &request.title,
            request.headers.as_ref(),
        )
        .await?;

    Ok(relay_response("sheets/create", upstream))
}

pub async fn sheets_update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> GatewayResult<Response> {
    let request: ValuesRequest = relay_body(&body)?;
    let upstream = state
        .google
        .update_values(
            authorization(&headers),
            &request.spreadsheet_id,
            &request.range,
            &request.values,
        )
        .await?;

    Ok(relay_response("sheets/update", upstream))
}

pub async fn sheets_append(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> GatewayResult<Response> {
    let request: ValuesRequest = relay_body(&body)?;
    let upstream = state
        .google
        .append_values(
            authorization(&headers),
            &request.spreadsheet_id,
            &request.range,
            &request.values,
        )
        .await?;

    Ok(relay_response("sheets/append", upstream))
}

pub async fn sheets_clear(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> GatewayResult<Response> {
    let request: ClearRequest = relay_body(&body)?;
    let upstream = state
        .google
        .clear_values(
            authorization(&headers),
            &request.spreadsheet_id,
            &request.range,
        )
        .await?;

    Ok(relay_response("sheets/clear", upstream))
}

pub async fn language_analyze(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> GatewayResult<Response> {
    let request: AnalyzeRequest = relay_body(&body)?;
    let upstream = state
        .google
        .analyze_entities(authorization(&headers), &request.content)
        .await?;

    Ok(relay_response("language/analyze", upstream))
}

/// Plain-text 404 for unknown API paths and wrong methods
pub async fn api_not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "API endpoint not found")
}

/// Bodies are parsed regardless of `Content-Type`.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, serde_json::Error> {
    serde_json::from_slice(body)
}

fn relay_body<T: DeserializeOwned>(body: &Bytes) -> GatewayResult<T> {
    parse_body(body).map_err(|e| GatewayError::InvalidRequest(e.to_string()))
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

fn relay_response(route: &'static str, upstream: UpstreamResponse) -> Response {
    info!(route, status = %upstream.status, "Relayed upstream response");
    (
        upstream.status,
        [(header::CONTENT_TYPE, "application/json")],
        upstream.body,
    )
        .into_response()
}
