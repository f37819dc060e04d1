//! HTTP API module for the county lookup and probe endpoints.

pub mod error;
pub mod handlers;
pub mod routes;

pub use error::{ApiError, ErrorEnvelope};
pub use handlers::AppState;
pub use routes::{create_router, create_router_with_limit};
