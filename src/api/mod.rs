//! HTTP API.
//!
//! Exposes the prediction facade as JSON endpoints. The router is
//! composable: `api_router()` returns a `Router` that can be mounted on any
//! axum server instance, and `start_server()` runs it with graceful
//! shutdown.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_server, ApiServer, ApiSession};
pub use types::ApiContext;
