pub mod manager;
pub mod types;
pub mod validation;

pub use manager::{ConfigError, ConfigManager};
pub use types::*;
pub use validation::ConfigValidator;
