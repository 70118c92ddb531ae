//! Channel health subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream call finished
//!     → outcome.rs (UpstreamOutcome, vendor dialects normalized)
//!     → classifier.rs (rule table → Decision)
//!     → controller.rs (store write + operator notification)
//! ```
//!
//! # State Transitions
//! ```text
//! Enabled      → AutoDisabled: fatal upstream failure, automatic_disable on
//! AutoDisabled → Enabled:      clean success, automatic_enable on
//! any          → ManuallyDisabled / Enabled: operator only
//! ```
//!
//! # Design Decisions
//! - Classification is a pure function of outcome, channel type and policy
//! - Local dispatch errors never count against an upstream
//! - Unclassified failures keep the channel in rotation

pub mod classifier;
pub mod controller;
pub mod outcome;

pub use classifier::{Decision, ErrorClassifier, Predicate, Rule, Verdict, DEFAULT_RULES};
pub use controller::LifecycleController;
pub use outcome::{UpstreamError, UpstreamOutcome};
