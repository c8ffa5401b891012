//! Greater: a small gateway that serves the booking UI and relays the
//! browser's Google Sheets and Natural Language calls.

pub mod cli;
pub mod config;
pub mod http_server;
pub mod relay;
pub mod utils;
pub mod workflow;

pub use config::Config;
