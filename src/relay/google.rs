//! Pass-through calls to the Google Sheets and Natural Language REST APIs
//!
//! The caller's `Authorization` header is forwarded verbatim and the upstream
//! status and body come back untouched. Nothing here parses Google payloads.

use crate::config::GoogleConfig;
use crate::utils::errors::{GatewayError, GatewayResult};
use axum::http::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Raw upstream result, relayed to the browser as-is.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Clone)]
pub struct GoogleRelay {
    client: Client,
    sheets_base: Url,
    language_base: Url,
    timeout: Duration,
}

impl GoogleRelay {
    pub fn new(config: &GoogleConfig) -> GatewayResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            sheets_base: parse_base(&config.sheets_base_url)?,
            language_base: parse_base(&config.language_base_url)?,
            timeout,
        })
    }

    /// `POST /v4/spreadsheets`
    pub async fn create_spreadsheet(
        &self,
        authorization: Option<&str>,
        title: &str,
        sheets: Option<&Value>,
    ) -> GatewayResult<UpstreamResponse> {
        let url = endpoint(&self.sheets_base, &["v4", "spreadsheets"])?;
        let body = json!({
            "properties": { "title": title },
            "sheets": sheets.cloned().unwrap_or(Value::Null),
        });

        self.send(self.client.post(url).json(&body), authorization).await
    }

    /// `PUT /v4/spreadsheets/{id}/values/{range}?valueInputOption=RAW`
    pub async fn update_values(
        &self,
        authorization: Option<&str>,
        spreadsheet_id: &str,
        range: &str,
        values: &Value,
    ) -> GatewayResult<UpstreamResponse> {
        let mut url = self.values_url(spreadsheet_id, range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = json!({ "values": values });
        self.send(self.client.put(url).json(&body), authorization).await
    }

    /// `POST /v4/spreadsheets/{id}/values/{range}:append`
    pub async fn append_values(
        &self,
        authorization: Option<&str>,
        spreadsheet_id: &str,
        range: &str,
        values: &Value,
    ) -> GatewayResult<UpstreamResponse> {
        let mut url = self.values_url(spreadsheet_id, &format!("{}:append", range))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = json!({ "values": values });
        self.send(self.client.post(url).json(&body), authorization).await
    }

    /// `POST /v4/spreadsheets/{id}/values/{range}:clear`
    pub async fn clear_values(
        &self,
        authorization: Option<&str>,
        spreadsheet_id: &str,
        range: &str,
    ) -> GatewayResult<UpstreamResponse> {
        let url = self.values_url(spreadsheet_id, &format!("{}:clear", range))?;
        self.send(self.client.post(url).json(&json!({})), authorization).await
    }

    /// `POST /v1/documents:analyzeEntities`
    pub async fn analyze_entities(
        &self,
        authorization: Option<&str>,
        content: &str,
    ) -> GatewayResult<UpstreamResponse> {
        let url = endpoint(&self.language_base, &["v1", "documents:analyzeEntities"])?;
        let body = json!({
            "document": {
                "type": "PLAIN_TEXT",
                "content": content,
            },
            "encodingType": "UTF8",
        });

        self.send(self.client.post(url).json(&body), authorization).await
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> GatewayResult<Url> {
        endpoint(
            &self.sheets_base,
            &["v4", "spreadsheets", spreadsheet_id, "values", range],
        )
    }

    async fn send(
        &self,
        request: RequestBuilder,
        authorization: Option<&str>,
    ) -> GatewayResult<UpstreamResponse> {
        let mut request = request.header(CONTENT_TYPE, "application/json");
        if let Some(authorization) = authorization {
            request = request.header(AUTHORIZATION, authorization);
        }

        let response = request.send().await.map_err(|e| self.map_error(e))?;
        let status =
            StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        let body = response.text().await.map_err(|e| self.map_error(e))?;

        debug!(%status, bytes = body.len(), "Upstream responded");
        Ok(UpstreamResponse { status, body })
    }

    fn map_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(self.timeout.as_millis() as u64)
        } else {
            GatewayError::Upstream(e.to_string())
        }
    }
}

fn parse_base(raw: &str) -> GatewayResult<Url> {
    let url = Url::parse(raw)
        .map_err(|e| GatewayError::ConfigError(format!("Invalid base URL {}: {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(GatewayError::ConfigError(format!(
            "Base URL cannot carry a path: {}",
            raw
        )));
    }
    Ok(url)
}

/// Append path segments to `base`, percent-encoding each one.
fn endpoint(base: &Url, segments: &[&str]) -> GatewayResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| GatewayError::InternalError(format!("Base URL cannot be a base: {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay() -> GoogleRelay {
        GoogleRelay::new(&GoogleConfig::default()).unwrap()
    }

    #[test]
    fn test_values_url_encodes_range_as_segment() {
        let url = relay().values_url("sheet-1", "Keywords!A2:C").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-1/values/Keywords!A2:C"
        );
    }

    #[test]
    fn test_values_url_escapes_slashes() {
        let url = relay().values_url("a/b", "Logs!A1").unwrap();
        assert!(url.path().contains("a%2Fb"));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let base = Url::parse("http://localhost:9000/google/").unwrap();
        let url = endpoint(&base, &["v1", "documents:analyzeEntities"]).unwrap();
        assert_eq!(url.path(), "/google/v1/documents:analyzeEntities");
    }

    #[test]
    fn test_rejects_opaque_base() {
        let config = GoogleConfig {
            sheets_base_url: "mailto:someone@example.com".to_string(),
            ..Default::default()
        };
        assert!(GoogleRelay::new(&config).is_err());
    }
}
