//! # Streamgate Core
//!
//! At-least-once message delivery over an append-only log store with native
//! consumer groups.
//!
//! The store keeps the data and the group bookkeeping; this crate decides how
//! to use it so that competing consumers share work, crashed consumers lose
//! nothing, and stalled consumers can be relieved of their messages.
//!
//! ## Core Concepts
//!
//! - **Stream**: append-only sequence of messages with increasing [`MessageId`]s
//! - **Group**: one consumer group per stream, named `{stream}{suffix}`
//! - **Consumer**: caller-chosen name; the store tracks what each one owns
//! - **Pending entry**: a message delivered to a consumer and not yet acknowledged
//! - **Claim**: moving a pending entry to another consumer
//!
//! ## Delivery Protocol
//!
//! - `consume` reads this consumer's unacknowledged history first, then new
//!   messages, one message per call
//! - `ack` removes a message from the pending list
//! - `reclaim_one` moves one stale message from another consumer to the caller
//! - `ensure_group` creates the group (and stream) once; later calls are no-ops
//!
//! ## Example
//!
//! ```ignore
//! use streamgate_core::{Gateway, GatewayConfig, StartId};
//! use streamgate_redis::RedisLogStore;
//!
//! let store = RedisLogStore::new("redis://127.0.0.1:6379").await?;
//! let gateway = Gateway::new(store, GatewayConfig::from_env()?)?;
//!
//! gateway.ensure_group("orders", StartId::Latest, false).await?;
//! gateway.produce("orders", b"order1", Some(10_000), true).await?;
//!
//! while let Some(message) = gateway.consume("orders", "worker-1", None).await? {
//!     handle(&message)?;
//!     gateway.ack("orders", &[message.id]).await?;
//! }
//! ```

pub mod config;
pub mod consume;
pub mod descriptor;
pub mod environment;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod message;
pub mod naming;
pub mod pending;
pub mod status;
pub mod store;

pub use config::{ConfigError, GatewayConfig};
pub use consume::MessageStream;
pub use descriptor::{
    ConsumerInfo, GroupInfo, PendingEntry, PendingSummary, QueueStatus, StreamInfo,
};
pub use environment::{Clock, SystemClock};
pub use error::{GatewayError, Result};
pub use gateway::Gateway;
pub use message::{Message, MessageId, PAYLOAD_FIELD, ParseMessageIdError};
pub use store::{LogStore, LogStoreError, PendingQuery, ReadCursor, StartId, Trim};
