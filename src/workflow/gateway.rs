//! Client for the gateway's `/api` routes

use crate::http_server::routes::{
    AnalyzeRequest, ClearRequest, ClientConfigResponse, CreateSheetRequest, ProxyRequest,
    ProxyResponse, ValuesRequest,
};
use crate::workflow::api::{
    ContentSource, Entity, EntityAnalysis, LanguageApi, NewSpreadsheet, Row, SheetsApi,
    Spreadsheet,
};
use crate::workflow::errors::{WorkflowError, WorkflowResult};
use crate::workflow::token::TokenStore;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

const PROXY_FAILED: &str = "Failed to fetch URL content";

#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base: Url,
    tokens: TokenStore,
}

impl GatewayClient {
    pub fn new(base_url: &str, tokens: TokenStore) -> WorkflowResult<Self> {
        Self::with_client(Client::new(), base_url, tokens)
    }

    pub fn with_client(client: Client, base_url: &str, tokens: TokenStore) -> WorkflowResult<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| WorkflowError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            client,
            base,
            tokens,
        })
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// OAuth client id published by the gateway
    pub async fn fetch_client_id(&self) -> WorkflowResult<String> {
        let config: ClientConfigResponse = self.call(Method::GET, "api/config", None::<&()>, false).await?;
        config
            .client_id
            .filter(|id| !id.is_empty())
            .ok_or(WorkflowError::MissingClientId)
    }

    fn endpoint(&self, path: &str) -> WorkflowResult<Url> {
        self.base
            .join(path)
            .map_err(|e| WorkflowError::InvalidUrl(e.to_string()))
    }

    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        authorized: bool,
    ) -> WorkflowResult<(StatusCode, String)>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.client.request(method, self.endpoint(path)?);
        if let Some(body) = body {
            request = request.json(body);
        }
        if authorized {
            let token = self
                .tokens
                .current()
                .ok_or(WorkflowError::AuthenticationRequired)?;
            request = request.bearer_auth(&token.access_token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WorkflowError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| WorkflowError::Transport(e.to_string()))?;
        debug!(path, %status, "Gateway responded");

        Ok((status, text))
    }

    async fn call<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        authorized: bool,
    ) -> WorkflowResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let (status, text) = self.send(method, path, body, authorized).await?;
        if !status.is_success() {
            return Err(WorkflowError::Gateway {
                status: status.as_u16(),
                message: error_message(status, &text),
            });
        }
        parse(path, &text)
    }
}

fn parse<T: DeserializeOwned>(path: &str, text: &str) -> WorkflowResult<T> {
    let text = if text.trim().is_empty() { "null" } else { text };
    serde_json::from_str(text)
        .map_err(|e| WorkflowError::InvalidResponse(format!("Invalid response from {}: {}", path, e)))
}

/// Pull the most useful message out of an error body.
fn error_message(status: StatusCode, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let from_json = parsed.as_ref().and_then(|json| {
        json.get("details")
            .and_then(Value::as_str)
            .or_else(|| json.pointer("/error/message").and_then(Value::as_str))
            .or_else(|| json.get("error").and_then(Value::as_str))
            .map(str::to_string)
    });

    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => status.to_string(),
        None => body.trim().to_string(),
    }
}

#[async_trait]
impl SheetsApi for GatewayClient {
    async fn create_spreadsheet(&self, spreadsheet: &NewSpreadsheet) -> WorkflowResult<Spreadsheet> {
        let request = CreateSheetRequest {
            title: spreadsheet.title.clone(),
            headers: Some(spreadsheet.sheets()),
        };
        self.call(Method::POST, "api/sheets/create", Some(&request), true)
            .await
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Row>,
    ) -> WorkflowResult<()> {
        let request = ValuesRequest {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
            values: serde_json::to_value(values)?,
        };
        let _: Value = self
            .call(Method::POST, "api/sheets/update", Some(&request), true)
            .await?;
        Ok(())
    }

    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Row>,
    ) -> WorkflowResult<()> {
        let request = ValuesRequest {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
            values: serde_json::to_value(values)?,
        };
        let _: Value = self
            .call(Method::POST, "api/sheets/append", Some(&request), true)
            .await?;
        Ok(())
    }

    async fn clear_values(&self, spreadsheet_id: &str, range: &str) -> WorkflowResult<()> {
        let request = ClearRequest {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
        };
        let _: Value = self
            .call(Method::POST, "api/sheets/clear", Some(&request), true)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LanguageApi for GatewayClient {
    async fn analyze_entities(&self, content: &str) -> WorkflowResult<Vec<Entity>> {
        let request = AnalyzeRequest {
            content: content.to_string(),
        };
        let analysis: EntityAnalysis = self
            .call(Method::POST, "api/language/analyze", Some(&request), true)
            .await?;
        Ok(analysis.entities)
    }
}

#[async_trait]
impl ContentSource for GatewayClient {
    async fn fetch_content(&self, url: &str) -> WorkflowResult<String> {
        let request = ProxyRequest {
            url: url.to_string(),
        };
        let (status, text) = self
            .send(Method::POST, "api/proxy", Some(&request), false)
            .await?;
        if !status.is_success() {
            let details = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|json| json.get("details").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| PROXY_FAILED.to_string());
            return Err(WorkflowError::Gateway {
                status: status.as_u16(),
                message: details,
            });
        }

        let response: ProxyResponse = parse("api/proxy", &text)?;
        Ok(response.content)
    }
}
