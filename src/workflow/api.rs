//! Seams between the flows and the outside world
//!
//! The flows only talk to these traits. [`GatewayClient`] implements all
//! three against the gateway's `/api` routes; tests substitute fakes.
//!
//! [`GatewayClient`]: crate::workflow::gateway::GatewayClient

use crate::workflow::errors::WorkflowResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub type Row = Vec<String>;

/// One tab of a new spreadsheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetTab {
    pub title: String,
    pub frozen_row_count: u32,
}

impl SheetTab {
    pub fn new(title: impl Into<String>, frozen_row_count: u32) -> Self {
        Self {
            title: title.into(),
            frozen_row_count,
        }
    }

    /// Sheets API `Sheet` object for `spreadsheets.create`
    pub fn to_sheet(&self) -> Value {
        json!({
            "properties": {
                "title": self.title,
                "gridProperties": { "frozenRowCount": self.frozen_row_count }
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSpreadsheet {
    pub title: String,
    pub tabs: Vec<SheetTab>,
}

impl NewSpreadsheet {
    pub fn sheets(&self) -> Value {
        Value::Array(self.tabs.iter().map(SheetTab::to_sheet).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spreadsheet {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default)]
    pub spreadsheet_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub salience: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityAnalysis {
    #[serde(default)]
    pub entities: Vec<Entity>,
}

#[async_trait]
pub trait SheetsApi: Send + Sync {
    async fn create_spreadsheet(&self, spreadsheet: &NewSpreadsheet) -> WorkflowResult<Spreadsheet>;

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Row>,
    ) -> WorkflowResult<()>;

    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Row>,
    ) -> WorkflowResult<()>;

    async fn clear_values(&self, spreadsheet_id: &str, range: &str) -> WorkflowResult<()>;
}

#[async_trait]
pub trait LanguageApi: Send + Sync {
    async fn analyze_entities(&self, content: &str) -> WorkflowResult<Vec<Entity>>;
}

/// Text of a third-party page, fetched through the proxy
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_content(&self, url: &str) -> WorkflowResult<String>;
}

pub(crate) fn row<S: AsRef<str>>(cells: &[S]) -> Row {
    cells.iter().map(|cell| cell.as_ref().to_string()).collect()
}
