//! Channel subsystem.
//!
//! # Data Flow
//! ```text
//! config.channels
//!     → store.rs (seed InMemoryChannelStore, optional JSON snapshot)
//!     → record.rs (ChannelRecord read by handlers)
//!     → health::controller writes status back through ChannelStore
//! ```
//!
//! # Design Decisions
//! - The store owns channel records; everything else works on clones
//! - Status writes are idempotent and last-write-wins
//! - Only the lifecycle controller calls `update_channel_status`

pub mod record;
pub mod store;

pub use record::{ChannelRecord, ChannelStatus, ChannelType};
pub use store::{ChannelStore, InMemoryChannelStore, StoreError};
