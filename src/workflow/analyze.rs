//! Fetch a URL, extract the people it mentions, record them in the sheet

use crate::workflow::api::{Entity, Row};
use crate::workflow::errors::{WorkflowError, WorkflowResult};
use crate::workflow::events::AppEvent;
use crate::workflow::readiness::ReadinessManager;
use crate::workflow::session::Services;
use crate::workflow::storage::SheetReference;
use crate::workflow::submission::{Submission, SUBMISSION_CANCELLED};
use crate::workflow::log_timestamp;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use url::Url;

pub const COMPONENT: &str = "greater-fetch-analyze";

/// Content at or above this many bytes is rejected before analysis.
pub const MAX_CONTENT_BYTES: usize = 1024 * 1024;

const KEYWORD_ROWS: &str = "Keywords!A2:C";
const LOG_COLUMNS: &str = "Logs!A:B";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisState {
    Idle,
    Submitting,
    Done(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonKeyword {
    pub name: String,
    pub kind: String,
    pub salience: String,
}

impl PersonKeyword {
    fn into_row(self) -> Row {
        vec![self.name, self.kind, self.salience]
    }
}

pub fn person_keywords(entities: &[Entity]) -> Vec<PersonKeyword> {
    entities
        .iter()
        .filter(|entity| entity.kind == "PERSON")
        .map(|entity| PersonKeyword {
            name: entity.name.clone(),
            kind: entity.kind.clone(),
            salience: format!("{:.3}", entity.salience),
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub url: String,
    pub keywords: Vec<PersonKeyword>,
    pub message: String,
}

pub struct UrlAnalyzer {
    services: Services,
    announced: Mutex<Option<String>>,
    state: Mutex<AnalysisState>,
}

impl UrlAnalyzer {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            announced: Mutex::new(None),
            state: Mutex::new(AnalysisState::Idle),
        }
    }

    pub fn state(&self) -> AnalysisState {
        self.state.lock().clone()
    }

    /// Active sheet: the latest one in session storage, else the id announced
    /// by a `SheetCreated` event during [`prepare`](Self::prepare).
    pub fn sheet_id(&self) -> Option<String> {
        SheetReference::load(self.services.storage.as_ref())
            .map(|reference| reference.id)
            .or_else(|| self.announced.lock().clone())
    }

    /// Sheet id, access token and both APIs, each bounded by `timeout`.
    pub async fn prepare(&self, timeout: Duration) -> WorkflowResult<String> {
        self.try_prepare(timeout).await.map_err(|e| {
            self.report(&e, "Failed to initialize APIs");
            e
        })
    }

    async fn try_prepare(&self, timeout: Duration) -> WorkflowResult<String> {
        let sheet_id = self.await_sheet(timeout).await?;
        self.services.tokens.wait_for_token(timeout).await?;

        let ready = tokio::time::timeout(timeout, async {
            tokio::join!(
                self.services.sheets_ready.initialize(),
                self.services.language_ready.initialize()
            )
        })
        .await
        .map_err(|_| WorkflowError::Timeout(timeout, "API initialization"))?;

        ready.0?;
        ready.1?;
        info!(sheet_id = %sheet_id, "Analyzer ready");
        Ok(sheet_id)
    }

    async fn await_sheet(&self, timeout: Duration) -> WorkflowResult<String> {
        let mut rx = self.services.events.subscribe();
        if let Some(id) = self.sheet_id() {
            return Ok(id);
        }

        let storage = self.services.storage.as_ref();
        let id = tokio::time::timeout(timeout, async {
            loop {
                match rx.recv().await {
                    Ok(AppEvent::SheetCreated(reference)) => return Ok(reference.id),
                    Ok(_) => {}
                    Err(RecvError::Lagged(_)) => {
                        if let Some(reference) = SheetReference::load(storage) {
                            return Ok(reference.id);
                        }
                    }
                    Err(RecvError::Closed) => return Err(WorkflowError::NoActiveSheet),
                }
            }
        })
        .await
        .map_err(|_| WorkflowError::Timeout(timeout, "active sheet"))??;

        *self.announced.lock() = Some(id.clone());
        Ok(id)
    }

    pub async fn analyze(&self, url: &str) -> WorkflowResult<AnalysisOutcome> {
        self.services.events.clear_errors();

        let (sheet_id, url) = match self.precheck(url) {
            Ok(checked) => checked,
            Err(e) => return Err(self.fail(e)),
        };

        let Some(submission) = Submission::begin(
            &self.state,
            AnalysisState::Submitting,
            AnalysisState::Failed(SUBMISSION_CANCELLED.to_string()),
        ) else {
            return Err(self.fail(WorkflowError::Busy));
        };

        match self.run(&sheet_id, &url).await {
            Ok(outcome) => {
                submission.finish(AnalysisState::Done(outcome.message.clone()));
                Ok(outcome)
            }
            Err(e) => {
                submission.finish(AnalysisState::Failed(e.to_string()));
                Err(self.fail(e))
            }
        }
    }

    fn precheck(&self, url: &str) -> WorkflowResult<(String, String)> {
        let url = url.trim();
        if url.is_empty() {
            return Err(WorkflowError::EmptyUrl);
        }
        if self.services.tokens.current().is_none() {
            return Err(WorkflowError::AuthenticationRequired);
        }
        check_access(&self.services.sheets_ready)?;
        check_access(&self.services.language_ready)?;

        let sheet_id = self.sheet_id().ok_or(WorkflowError::NoActiveSheet)?;
        Url::parse(url).map_err(|e| WorkflowError::InvalidUrl(e.to_string()))?;

        Ok((sheet_id, url.to_string()))
    }

    async fn run(&self, sheet_id: &str, url: &str) -> WorkflowResult<AnalysisOutcome> {
        match self.extract(sheet_id, url).await {
            Err(e) if e.is_content_error() => {
                self.log_to_sheet(sheet_id, format!("Error: {} - {}", e, url))
                    .await;
                Err(e)
            }
            result => result,
        }
    }

    async fn extract(&self, sheet_id: &str, url: &str) -> WorkflowResult<AnalysisOutcome> {
        let sheets = &self.services.sheets;

        let content = self.services.content.fetch_content(url).await?;
        check_content(&content)?;

        let entities = self.services.language.analyze_entities(&content).await?;
        let keywords = person_keywords(&entities);
        let count = keywords.len();

        sheets.clear_values(sheet_id, KEYWORD_ROWS).await?;
        if count > 0 {
            let rows = keywords.iter().cloned().map(PersonKeyword::into_row).collect();
            sheets
                .update_values(sheet_id, &format!("Keywords!A2:C{}", count + 1), rows)
                .await?;
        }
        sheets
            .append_values(
                sheet_id,
                LOG_COLUMNS,
                vec![vec![
                    log_timestamp(),
                    format!("URL analyzed: {} (found {} person entities)", url, count),
                ]],
            )
            .await?;

        info!(url, people = count, "URL analyzed");
        Ok(AnalysisOutcome {
            url: url.to_string(),
            keywords,
            message: format!("Analysis complete! Found {} person mentions.", count),
        })
    }

    async fn log_to_sheet(&self, sheet_id: &str, event: String) {
        let row = vec![vec![log_timestamp(), event]];
        if let Err(e) = self
            .services
            .sheets
            .append_values(sheet_id, LOG_COLUMNS, row)
            .await
        {
            warn!("Failed to log error to sheet: {}", e);
        }
    }

    fn fail(&self, err: WorkflowError) -> WorkflowError {
        self.report(&err, "Failed to analyze URL");
        err
    }

    fn report(&self, err: &WorkflowError, fallback: &str) {
        let message = err.user_message().unwrap_or_else(|| fallback.to_string());
        self.services.events.report_error(COMPONENT, message, err);
    }
}

fn check_access(manager: &ReadinessManager) -> WorkflowResult<()> {
    let access = manager.can_make_api_calls();
    if access.allowed {
        return Ok(());
    }
    Err(WorkflowError::NotReady {
        api: manager.api(),
        reason: access.reason.unwrap_or_default(),
    })
}

fn check_content(content: &str) -> WorkflowResult<()> {
    if content.trim().is_empty() {
        return Err(WorkflowError::EmptyContent);
    }
    if content.len() >= MAX_CONTENT_BYTES {
        return Err(WorkflowError::ContentTooLarge {
            size: content.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str, kind: &str, salience: f64) -> Entity {
        Entity {
            name: name.into(),
            kind: kind.into(),
            salience,
        }
    }

    #[test]
    fn test_person_projection() {
        let keywords = person_keywords(&[
            entity("Ada Lovelace", "PERSON", 0.51234),
            entity("London", "LOCATION", 0.3),
            entity("Charles", "PERSON", 0.1),
        ]);

        assert_eq!(keywords.len(), 2);
        assert_eq!(keywords[0].salience, "0.512");
        assert_eq!(keywords[1].clone().into_row(), vec!["Charles", "PERSON", "0.100"]);
    }

    #[test]
    fn test_content_limits() {
        assert!(matches!(check_content("  \n"), Err(WorkflowError::EmptyContent)));
        assert!(check_content(&"a".repeat(MAX_CONTENT_BYTES - 1)).is_ok());

        let err = check_content(&"a".repeat(MAX_CONTENT_BYTES)).unwrap_err();
        assert_eq!(err.to_string(), "URL content exceeds size limit (1.0MB > 1MB)");
    }
}
