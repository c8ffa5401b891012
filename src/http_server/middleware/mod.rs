//! HTTP server middleware

pub mod cors;
pub mod panic;

pub use cors::{cors_middleware, preflight_response, route_allowance, CorsPolicy, RouteAllowance};
pub use panic::panic_response;
