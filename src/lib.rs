//! Channel relay library.
//!
//! Tracks the health of upstream AI-provider channels, disables them when
//! upstream errors say they cannot recover on their own, re-enables them on
//! success, and notifies operators of every transition.

pub mod admin;
pub mod channel;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod notify;
pub mod observability;
pub mod payments;

pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
