//! Gateway HTTP surface

pub mod assets;
pub mod middleware;
pub mod routes;
pub mod server;

pub use server::{build_router, AppState, HttpServer};
