use crate::config::Config;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Env prefix for config overrides, e.g. `GREATER_SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "GREATER_";

/// Legacy secret name for the OAuth client id.
pub const CLIENT_ID_ENV: &str = "GOOGLE_CLIENT_ID";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Load(Box::new(e))
    }
}

/// Loads layered configuration: defaults, optional TOML file, then env.
pub struct ConfigManager {
    path: Option<PathBuf>,
    config: Arc<RwLock<Config>>,
}

impl ConfigManager {
    pub fn new(path: Option<impl AsRef<Path>>) -> Result<Self, ConfigError> {
        let path = path.map(|p| expand_path(p.as_ref()));
        if let Some(path) = &path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.clone()));
            }
        }

        let config = Self::figment(path.as_deref()).extract::<Config>()?;
        debug!(?path, "Loaded configuration");

        Ok(Self {
            path,
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// Build the provider stack. Later providers override earlier ones.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(
                Env::raw()
                    .only(&[CLIENT_ID_ENV])
                    .map(|_| "google.client_id".into()),
            )
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get_config(&self) -> Config {
        self.config.read().clone()
    }

    pub fn reload(&self) -> Result<(), ConfigError> {
        let config = Self::figment(self.path.as_deref()).extract::<Config>()?;
        *self.config.write() = config;
        info!("Configuration reloaded");
        Ok(())
    }
}

fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let manager = ConfigManager::new(None::<&Path>).unwrap();
        let config = manager.get_config();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.cors.max_age_secs, 86_400);
        assert!(manager.path().is_none());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = ConfigManager::new(Some("/definitely/not/here/greater.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_toml_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("greater.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
host = "0.0.0.0"
port = 9000

[proxy]
allowed_hosts = ["example.com"]
"#,
        )
        .unwrap();

        let manager = ConfigManager::new(Some(&config_path)).unwrap();
        let config = manager.get_config();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.proxy.allowed_hosts, vec!["example.com".to_string()]);
        assert_eq!(config.proxy.timeout_secs, 30);
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("greater.toml");
        std::fs::write(&config_path, "[server]\nport = 4000\n").unwrap();

        let manager = ConfigManager::new(Some(&config_path)).unwrap();
        assert_eq!(manager.get_config().server.port, 4000);

        std::fs::write(&config_path, "[server]\nport = 4001\n").unwrap();
        manager.reload().unwrap();
        assert_eq!(manager.get_config().server.port, 4001);
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("greater.toml", "[google]\nclient_id = \"from-file\"\n")?;
            jail.set_env("GREATER_SERVER__PORT", "7001");
            jail.set_env("GOOGLE_CLIENT_ID", "from-secret");

            let config: Config = ConfigManager::figment(Some(Path::new("greater.toml"))).extract()?;
            assert_eq!(config.server.port, 7001);
            assert_eq!(config.google.client_id.as_deref(), Some("from-secret"));
            Ok(())
        });
    }
}
