pub mod errors;
pub mod shutdown;
pub mod tracing;

pub use errors::{GatewayError, GatewayResult};
pub use shutdown::ShutdownSignal;
