//! Payment gateway subsystem.
//!
//! # Data Flow
//! ```text
//! startup:  config.payments.gateways → registry.rs announce → created_pay
//! pay:      admin API → registry lookup by kind → PaymentGateway::pay
//! callback: /payments/{name}/callback → registry lookup → handle_callback
//! ```
//!
//! # Design Decisions
//! - Gateways are strategies behind one trait, selected by string key
//! - The registry is built once and never mutated afterwards
//! - One gateway failing never affects another

pub mod gateway;
pub mod registry;
pub mod stripe;

pub use gateway::{CallbackRequest, PayMethod, PayNotify, PayOrder, PayRequest, PaymentError, PaymentGateway};
pub use registry::GatewayRegistry;
