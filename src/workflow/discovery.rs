use crate::workflow::readiness::ApiLoader;
use anyhow::{ensure, Context};
use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

pub const SHEETS_DISCOVERY_DOCS: &[&str] = &[
    "https://sheets.googleapis.com/$discovery/rest?version=v4",
    "https://www.googleapis.com/discovery/v1/apis/drive/v3/rest",
];

pub const LANGUAGE_DISCOVERY_DOCS: &[&str] =
    &["https://language.googleapis.com/$discovery/rest?version=v1"];

/// Loads an API by fetching its discovery documents.
pub struct DiscoveryLoader {
    client: Client,
    documents: Vec<String>,
}

impl DiscoveryLoader {
    pub fn new<I, S>(client: Client, documents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            client,
            documents: documents.into_iter().map(Into::into).collect(),
        }
    }

    async fn fetch_document(&self, url: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to fetch discovery document {}", url))?;

        let status = response.status();
        ensure!(
            status.is_success(),
            "discovery document {} returned {}",
            url,
            status
        );

        let document: Value = response
            .json()
            .await
            .with_context(|| format!("discovery document {} is not JSON", url))?;
        ensure!(
            document.get("name").is_some(),
            "{} is not a discovery document",
            url
        );

        debug!(url, "Loaded discovery document");
        Ok(())
    }
}

#[async_trait]
impl ApiLoader for DiscoveryLoader {
    async fn load(&self) -> anyhow::Result<()> {
        try_join_all(self.documents.iter().map(|url| self.fetch_document(url))).await?;
        Ok(())
    }
}
