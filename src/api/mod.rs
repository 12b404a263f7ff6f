//! # HTTP API
//!
//! One JSON endpoint for the create, check, retrieve and healthcheck actions,
//! plus a `GET /health` liveness endpoint.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod verification;

pub use error::ApiError;
pub use routes::{build_router, ApiState};
pub use server::start_api_server;
pub use verification::{DisabledVerifier, HumanVerifier, TurnstileVerifier};
