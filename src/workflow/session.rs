use crate::workflow::analyze::UrlAnalyzer;
use crate::workflow::api::{ContentSource, LanguageApi, SheetsApi};
use crate::workflow::create_sheet::SheetCreator;
use crate::workflow::discovery::{DiscoveryLoader, LANGUAGE_DISCOVERY_DOCS, SHEETS_DISCOVERY_DOCS};
use crate::workflow::errors::{WorkflowError, WorkflowResult};
use crate::workflow::events::EventBus;
use crate::workflow::gateway::GatewayClient;
use crate::workflow::readiness::{ApiKind, ApiLoader, ReadinessManager};
use crate::workflow::storage::{MemorySessionStore, SessionStore};
use crate::workflow::token::TokenStore;
use crate::workflow::tray::{ErrorTray, DEFAULT_DISMISS_AFTER};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Everything a flow needs, shared by both flows of one session.
#[derive(Clone)]
pub struct Services {
    pub sheets: Arc<dyn SheetsApi>,
    pub language: Arc<dyn LanguageApi>,
    pub content: Arc<dyn ContentSource>,
    pub sheets_ready: Arc<ReadinessManager>,
    pub language_ready: Arc<ReadinessManager>,
    pub tokens: TokenStore,
    pub storage: Arc<dyn SessionStore>,
    pub events: EventBus,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Where the gateway is served, e.g. `http://127.0.0.1:8787`
    pub gateway_url: String,
    pub sheets_discovery: Vec<String>,
    pub language_discovery: Vec<String>,
    pub dismiss_errors_after: Duration,
    pub request_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            gateway_url: "http://127.0.0.1:8787".to_string(),
            sheets_discovery: SHEETS_DISCOVERY_DOCS.iter().map(|s| s.to_string()).collect(),
            language_discovery: LANGUAGE_DISCOVERY_DOCS.iter().map(|s| s.to_string()).collect(),
            dismiss_errors_after: DEFAULT_DISMISS_AFTER,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// One browser session wired against a running gateway.
pub struct Session {
    pub services: Services,
    pub gateway: GatewayClient,
    pub creator: SheetCreator,
    pub analyzer: UrlAnalyzer,
    pub errors: ErrorTray,
}

impl Session {
    /// Must be called from within a Tokio runtime.
    pub fn connect(config: &SessionConfig) -> WorkflowResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| WorkflowError::Transport(e.to_string()))?;

        let tokens = TokenStore::new();
        let gateway = GatewayClient::with_client(http.clone(), &config.gateway_url, tokens.clone())?;

        let sheets_loader: Arc<dyn ApiLoader> = Arc::new(DiscoveryLoader::new(
            http.clone(),
            config.sheets_discovery.clone(),
        ));
        let language_loader: Arc<dyn ApiLoader> = Arc::new(DiscoveryLoader::new(
            http,
            config.language_discovery.clone(),
        ));

        let client = Arc::new(gateway.clone());
        let services = Services {
            sheets: client.clone(),
            language: client.clone(),
            content: client,
            sheets_ready: Arc::new(ReadinessManager::new(
                ApiKind::Sheets,
                sheets_loader,
                tokens.clone(),
            )),
            language_ready: Arc::new(ReadinessManager::new(
                ApiKind::Language,
                language_loader,
                tokens.clone(),
            )),
            tokens,
            storage: Arc::new(MemorySessionStore::new()),
            events: EventBus::new(),
        };

        Ok(Self::from_services(services, gateway, config.dismiss_errors_after))
    }

    pub fn from_services(services: Services, gateway: GatewayClient, dismiss_after: Duration) -> Self {
        Self {
            errors: ErrorTray::spawn(&services.events, dismiss_after),
            creator: SheetCreator::new(services.clone()),
            analyzer: UrlAnalyzer::new(services.clone()),
            gateway,
            services,
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.services.tokens
    }

    /// Fetch the OAuth client id and load the Sheets API.
    pub async fn bootstrap(&self) -> WorkflowResult<String> {
        let client_id = self.gateway.fetch_client_id().await?;
        self.services.sheets_ready.initialize().await?;
        info!("Session bootstrapped");
        Ok(client_id)
    }
}
