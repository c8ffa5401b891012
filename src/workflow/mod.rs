//! Browser-side coordination
//!
//! Sheet creation and URL analysis, the readiness managers that gate
//! them, and the error channel that reports their failures. Everything
//! reaches Google through the gateway's `/api` routes.

pub mod analyze;
pub mod api;
pub mod create_sheet;
pub mod discovery;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod readiness;
pub mod session;
pub mod storage;
mod submission;
pub mod token;
pub mod tray;

pub use analyze::{AnalysisOutcome, AnalysisState, PersonKeyword, UrlAnalyzer};
pub use api::{ContentSource, Entity, LanguageApi, NewSpreadsheet, Row, SheetTab, SheetsApi, Spreadsheet};
pub use create_sheet::{validate_guest_name, CreatedSheet, CreationState, SheetCreator};
pub use discovery::DiscoveryLoader;
pub use errors::{ErrorCategory, WorkflowError, WorkflowResult};
pub use events::{AppEvent, ErrorEvent, EventBus};
pub use gateway::GatewayClient;
pub use readiness::{ApiAccess, ApiKind, ApiLoader, ReadinessError, ReadinessManager, ReadinessStatus};
pub use session::{Services, Session, SessionConfig};
pub use submission::SUBMISSION_CANCELLED;
pub use storage::{MemorySessionStore, SessionStore, SheetReference, CURRENT_SHEET_KEY};
pub use token::{AccessToken, TokenStore};
pub use tray::ErrorTray;

/// Local wall-clock time as written to the Logs tab
pub fn log_timestamp() -> String {
    chrono::Local::now().format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}
