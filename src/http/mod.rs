//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → request.rs (request id)
//!     → server.rs (Axum router, middleware, live config)
//!         → admin::*            (/admin, bearer auth)
//!         → callback.rs         (/payments/{name}/callback)
//!         → response.rs         (fallback: not-found envelope)
//!     → Send to client
//! ```

pub mod callback;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::{error_response, relay_not_found, ErrorBody, ErrorEnvelope};
pub use server::{AppState, HttpServer};
