//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → shared via ArcSwap to all handlers
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of Arc<RelayConfig>
//!     → next decision observes new flags
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Channel records are seeded once; reloads only change policy and settings

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, ChannelConfig, ChannelHealthConfig, GatewaySettings, ListenerConfig, LogFormat,
    NotifyConfig, ObservabilityConfig, PaymentsConfig, RelayConfig, StoreConfig, TimeoutConfig,
};
