use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// User agent sent by the URL content proxy unless overridden.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; GreaterBot/1.0; +https://website)";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate, Default)]
pub struct Config {
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,
    #[serde(default)]
    #[validate(nested)]
    pub google: GoogleConfig,
    #[serde(default)]
    #[validate(nested)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

/// Google API settings.
///
/// `client_id` is handed to the browser for its OAuth token flow; the
/// gateway itself never authenticates against Google.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: Option<String>,
    /// Refuse to start when `client_id` is missing
    pub require_client_id: bool,
    #[validate(url)]
    pub sheets_base_url: String,
    #[validate(url)]
    pub language_base_url: String,
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            require_client_id: false,
            sheets_base_url: "https://sheets.googleapis.com".to_string(),
            language_base_url: "https://language.googleapis.com".to_string(),
            timeout_secs: 30,
        }
    }
}

impl GoogleConfig {
    /// The configured client id, treating an empty string as absent.
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct ProxyConfig {
    #[validate(length(min = 1))]
    pub user_agent: String,
    /// Hosts the proxy may fetch from; empty allows any host
    pub allowed_hosts: Vec<String>,
    /// Largest upstream body accepted, in bytes
    pub max_response_bytes: Option<usize>,
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            allowed_hosts: Vec::new(),
            max_response_bytes: None,
            timeout_secs: 30,
        }
    }
}

impl ProxyConfig {
    pub fn is_open(&self) -> bool {
        self.allowed_hosts.is_empty() && self.max_response_bytes.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CorsConfig {
    /// Preflight cache duration
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            max_age_secs: 86_400,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AssetsConfig {
    pub dir: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: "./public".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
