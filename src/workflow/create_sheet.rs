//! Guest spreadsheet creation

use crate::workflow::api::{row, NewSpreadsheet, SheetTab};
use crate::workflow::errors::{WorkflowError, WorkflowResult};
use crate::workflow::events::AppEvent;
use crate::workflow::readiness::ApiKind;
use crate::workflow::session::Services;
use crate::workflow::storage::SheetReference;
use crate::workflow::submission::{Submission, SUBMISSION_CANCELLED};
use crate::workflow::log_timestamp;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::info;

pub const COMPONENT: &str = "greater-create-sheet";

pub const BOOKINGS_HEADERS: [&str; 13] = [
    "Confirmation Notes",
    "Name of Podcast",
    "Link to Podcast",
    "Name of Host",
    "Avg Listeners per Episode",
    "Monthly Listeners",
    "Followers Count",
    "Email",
    "Phone Number",
    "Date Booked",
    "Time Booked (CST)",
    "Link to Login to Interview",
    "Notes",
];
pub const KEYWORDS_HEADERS: [&str; 3] = ["Keyword", "Type", "Relevance"];
pub const LOGS_HEADERS: [&str; 2] = ["Date/Time", "Event"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationState {
    Idle,
    Submitting,
    Created(SheetReference),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct CreatedSheet {
    pub reference: SheetReference,
    pub url: Option<String>,
}

/// Trimmed name, 2 to 50 characters of letters, digits, spaces, `'` or `-`.
pub fn validate_guest_name(name: &str) -> WorkflowResult<&str> {
    let name = name.trim();
    let length = name.chars().count();
    if !(2..=50).contains(&length) {
        return Err(WorkflowError::InvalidGuestName(
            "Guest name must be between 2 and 50 characters",
        ));
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, ' ' | '\'' | '-');
    if !name.chars().all(allowed) {
        return Err(WorkflowError::InvalidGuestName(
            "Guest name contains invalid characters",
        ));
    }

    Ok(name)
}

pub fn spreadsheet_for(guest_name: &str) -> NewSpreadsheet {
    NewSpreadsheet {
        title: format!("{} Lead List & Bookings", guest_name),
        tabs: vec![
            SheetTab::new("Bookings", 1),
            SheetTab::new("Keywords", 1),
            SheetTab::new("Logs", 1),
        ],
    }
}

pub struct SheetCreator {
    services: Services,
    state: Mutex<CreationState>,
}

impl SheetCreator {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            state: Mutex::new(CreationState::Idle),
        }
    }

    pub fn state(&self) -> CreationState {
        self.state.lock().clone()
    }

    /// Create the guest's spreadsheet and make it the session's active sheet.
    ///
    /// Validation and readiness failures leave the state untouched; every
    /// failure is also published on the event bus. Dropping the returned
    /// future mid-flight leaves the state `Failed` with [`SUBMISSION_CANCELLED`].
    pub async fn submit(&self, guest_name: &str) -> WorkflowResult<CreatedSheet> {
        let name = match self.precheck(guest_name) {
            Ok(name) => name,
            Err(e) => return Err(self.fail(e)),
        };

        let Some(submission) = Submission::begin(
            &self.state,
            CreationState::Submitting,
            CreationState::Failed(SUBMISSION_CANCELLED.to_string()),
        ) else {
            return Err(self.fail(WorkflowError::Busy));
        };

        match self.create(&name).await {
            Ok(created) => {
                submission.finish(CreationState::Created(created.reference.clone()));
                Ok(created)
            }
            Err(e) => {
                submission.finish(CreationState::Failed(e.to_string()));
                Err(self.fail(e))
            }
        }
    }

    fn precheck(&self, guest_name: &str) -> WorkflowResult<String> {
        let name = validate_guest_name(guest_name)?;

        let access = self.services.sheets_ready.can_make_api_calls();
        if !access.allowed {
            return Err(WorkflowError::NotReady {
                api: ApiKind::Sheets,
                reason: access.reason.unwrap_or_default(),
            });
        }

        Ok(name.to_string())
    }

    async fn create(&self, name: &str) -> WorkflowResult<CreatedSheet> {
        let sheets = &self.services.sheets;

        let spreadsheet = sheets.create_spreadsheet(&spreadsheet_for(name)).await?;
        if spreadsheet.spreadsheet_id.is_empty() {
            return Err(WorkflowError::InvalidResponse(
                "Invalid response from sheet creation".to_string(),
            ));
        }
        let id = spreadsheet.spreadsheet_id.as_str();

        sheets
            .update_values(id, "Bookings!A1:M1", vec![row(&BOOKINGS_HEADERS)])
            .await?;
        sheets
            .update_values(id, "Keywords!A1:C1", vec![row(&KEYWORDS_HEADERS)])
            .await?;
        futures::try_join!(
            sheets.update_values(id, "Logs!A1:B1", vec![row(&LOGS_HEADERS)]),
            sheets.update_values(
                id,
                "Logs!A2:B2",
                vec![vec![log_timestamp(), "Sheet created".to_string()]]
            ),
        )?;

        let reference = SheetReference {
            id: id.to_string(),
            name: name.to_string(),
            created: Utc::now(),
        };
        reference.save(self.services.storage.as_ref())?;
        self.services
            .events
            .publish(AppEvent::SheetCreated(reference.clone()));

        info!(sheet_id = %reference.id, guest = %reference.name, "Sheet created");
        Ok(CreatedSheet {
            reference,
            url: spreadsheet.spreadsheet_url,
        })
    }

    fn fail(&self, err: WorkflowError) -> WorkflowError {
        let message = err
            .user_message()
            .unwrap_or_else(|| "Failed to create sheet".to_string());
        self.services.events.report_error(COMPONENT, message, &err);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_name_rules() {
        assert_eq!(validate_guest_name("  Jo  ").unwrap(), "Jo");
        assert_eq!(validate_guest_name("Mary-Jane O'Neil").unwrap(), "Mary-Jane O'Neil");

        let err = validate_guest_name("J@").unwrap_err();
        assert_eq!(err.to_string(), "Guest name contains invalid characters");

        let err = validate_guest_name("J").unwrap_err();
        assert_eq!(err.to_string(), "Guest name must be between 2 and 50 characters");
        assert!(validate_guest_name(&"a".repeat(51)).is_err());
        assert!(validate_guest_name(&"a".repeat(50)).is_ok());
    }

    #[test]
    fn test_spreadsheet_layout() {
        let spreadsheet = spreadsheet_for("Jo");
        assert_eq!(spreadsheet.title, "Jo Lead List & Bookings");

        let titles: Vec<_> = spreadsheet.tabs.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Bookings", "Keywords", "Logs"]);
        assert!(spreadsheet.tabs.iter().all(|t| t.frozen_row_count == 1));
    }
}
