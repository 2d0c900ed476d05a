//! Log store abstraction consumed by the gateway.
//!
//! [`LogStore`] is the command surface of an append-only log store with native
//! consumer groups. The gateway owns all protocol decisions (which cursor to
//! read from, what to claim, how to name groups); a store implementation only
//! translates each call into exactly one command and parses the reply.
//!
//! # Implementations
//!
//! - `RedisLogStore` (in `streamgate-redis`): Redis Streams over a `ConnectionManager`
//! - `InMemoryLogStore` (in `streamgate-testing`): deterministic test double
//!
//! No implementation retries. A failed command surfaces as a [`LogStoreError`]
//! and the caller decides what to do with it.

use crate::descriptor::{ConsumerInfo, GroupInfo, PendingEntry, StreamInfo};
use crate::message::{Message, MessageId};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Errors reported by a [`LogStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogStoreError {
    /// Connection or command failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The addressed stream or group does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A group with the requested name already exists on the stream.
    #[error("Group already exists: {0}")]
    GroupExists(String),

    /// The reply did not have the documented shape.
    #[error("Unexpected reply to {command}: {detail}")]
    UnexpectedReply {
        /// Command whose reply could not be decoded
        command: &'static str,
        /// What was wrong with it
        detail: String,
    },

    /// The store has been closed and accepts no more commands.
    #[error("Log store is closed")]
    Closed,
}

impl LogStoreError {
    /// Build an [`LogStoreError::UnexpectedReply`].
    pub fn unexpected(command: &'static str, detail: impl Into<String>) -> Self {
        Self::UnexpectedReply {
            command,
            detail: detail.into(),
        }
    }

    /// Returns `true` for [`LogStoreError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Where a group read starts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReadCursor {
    /// Entries already delivered to this consumer and not yet acknowledged (`0`).
    History,
    /// Entries never delivered to any consumer of the group (`>`).
    New,
}

impl ReadCursor {
    /// Wire form of the cursor.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::History => "0",
            Self::New => ">",
        }
    }
}

/// Position at which a new group starts delivering.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum StartId {
    /// Only entries appended after the group is created (`$`).
    #[default]
    Latest,
    /// Every entry in the stream (`0`).
    Beginning,
    /// Entries after the given id.
    After(MessageId),
}

impl StartId {
    /// Wire form of the start id.
    #[must_use]
    pub fn to_wire(self) -> String {
        match self {
            Self::Latest => "$".to_string(),
            Self::Beginning => "0".to_string(),
            Self::After(id) => id.to_string(),
        }
    }
}

/// Length bound applied when appending.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Trim {
    /// Maximum number of entries to keep.
    pub max_len: usize,
    /// Allow the store to keep slightly more entries when trimming is cheaper (`~`).
    pub approximate: bool,
}

/// Filter for [`LogStore::pending`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingQuery {
    /// Only entries idle for at least this long.
    pub min_idle: Option<Duration>,
    /// Lowest id to include; `None` means `-`.
    pub start: Option<MessageId>,
    /// Highest id to include; `None` means `+`.
    pub end: Option<MessageId>,
    /// Maximum number of entries to return.
    pub count: usize,
    /// Only entries owned by this consumer.
    pub consumer: Option<String>,
}

impl PendingQuery {
    /// Full id range, first `count` entries, optionally filtered by idle time.
    #[must_use]
    pub const fn idle_at_least(min_idle: Option<Duration>, count: usize) -> Self {
        Self {
            min_idle,
            start: None,
            end: None,
            count,
            consumer: None,
        }
    }
}

/// Command surface of an append-only log store with consumer groups.
///
/// Every method maps to a single store command. Implementations must be
/// `Send + Sync` so one store can back a gateway shared across tasks.
pub trait LogStore: Send + Sync {
    /// Append an entry and return the id the store assigned to it (`XADD`).
    ///
    /// # Errors
    ///
    /// Returns [`LogStoreError::Transport`] if the command fails.
    fn append(
        &self,
        stream: &str,
        fields: &[(&str, &[u8])],
        trim: Option<Trim>,
    ) -> impl Future<Output = Result<MessageId, LogStoreError>> + Send;

    /// Read up to `count` entries for `consumer` through `group` (`XREADGROUP`).
    ///
    /// Waits up to `block` for entries when none are immediately available.
    /// An empty vector means the wait timed out.
    ///
    /// # Errors
    ///
    /// Returns [`LogStoreError::NotFound`] if the group or stream does not exist.
    fn read_group(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        cursor: ReadCursor,
        count: usize,
        block: Duration,
    ) -> impl Future<Output = Result<Vec<Message>, LogStoreError>> + Send;

    /// Acknowledge entries and return how many were pending (`XACK`).
    ///
    /// # Errors
    ///
    /// Returns [`LogStoreError::Transport`] if the command fails.
    fn ack(
        &self,
        stream: &str,
        group: &str,
        ids: &[MessageId],
    ) -> impl Future<Output = Result<u64, LogStoreError>> + Send;

    /// Create a group (`XGROUP CREATE`), optionally creating the stream too.
    ///
    /// # Errors
    ///
    /// - [`LogStoreError::GroupExists`] if the group already exists
    /// - [`LogStoreError::NotFound`] if the stream is missing and `mkstream` is false
    fn create_group(
        &self,
        stream: &str,
        group: &str,
        start: StartId,
        mkstream: bool,
    ) -> impl Future<Output = Result<(), LogStoreError>> + Send;

    /// Destroy a group (`XGROUP DESTROY`). Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`LogStoreError::NotFound`] if the stream does not exist.
    fn destroy_group(
        &self,
        stream: &str,
        group: &str,
    ) -> impl Future<Output = Result<bool, LogStoreError>> + Send;

    /// Describe a stream (`XINFO STREAM`).
    ///
    /// # Errors
    ///
    /// Returns [`LogStoreError::NotFound`] if the stream does not exist.
    fn stream_info(
        &self,
        stream: &str,
    ) -> impl Future<Output = Result<StreamInfo, LogStoreError>> + Send;

    /// Describe every group of a stream (`XINFO GROUPS`).
    ///
    /// # Errors
    ///
    /// Returns [`LogStoreError::NotFound`] if the stream does not exist.
    fn groups_info(
        &self,
        stream: &str,
    ) -> impl Future<Output = Result<Vec<GroupInfo>, LogStoreError>> + Send;

    /// Describe every consumer of a group (`XINFO CONSUMERS`).
    ///
    /// # Errors
    ///
    /// Returns [`LogStoreError::NotFound`] if the stream or group does not exist.
    fn consumers_info(
        &self,
        stream: &str,
        group: &str,
    ) -> impl Future<Output = Result<Vec<ConsumerInfo>, LogStoreError>> + Send;

    /// List pending entries of a group (`XPENDING` extended form).
    ///
    /// # Errors
    ///
    /// Returns [`LogStoreError::NotFound`] if the stream or group does not exist.
    fn pending(
        &self,
        stream: &str,
        group: &str,
        query: &PendingQuery,
    ) -> impl Future<Output = Result<Vec<PendingEntry>, LogStoreError>> + Send;

    /// Transfer ownership of pending entries to `consumer` (`XCLAIM`).
    ///
    /// Only entries idle for at least `min_idle` move. Returns the entries
    /// that were claimed; ids that are not pending are left out.
    ///
    /// # Errors
    ///
    /// Returns [`LogStoreError::NotFound`] if the stream or group does not exist.
    fn claim(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        min_idle: Duration,
        ids: &[MessageId],
    ) -> impl Future<Output = Result<Vec<Message>, LogStoreError>> + Send;

    /// Delete keys and return how many existed (`DEL`).
    ///
    /// # Errors
    ///
    /// Returns [`LogStoreError::Transport`] if the command fails.
    fn delete(&self, keys: &[&str]) -> impl Future<Output = Result<u64, LogStoreError>> + Send;

    /// Names of every stream-typed key (`SCAN ... TYPE stream`).
    ///
    /// # Errors
    ///
    /// Returns [`LogStoreError::Transport`] if the command fails.
    fn scan_streams(&self) -> impl Future<Output = Result<Vec<String>, LogStoreError>> + Send;

    /// Store a plain value, optionally expiring (`SET` / `SETEX`).
    ///
    /// # Errors
    ///
    /// Returns [`LogStoreError::Transport`] if the command fails.
    fn set(
        &self,
        key: &str,
        value: &[u8],
        expiry: Option<Duration>,
    ) -> impl Future<Output = Result<(), LogStoreError>> + Send;

    /// Read a plain value (`GET`).
    ///
    /// # Errors
    ///
    /// Returns [`LogStoreError::Transport`] if the command fails.
    fn get(&self, key: &str)
    -> impl Future<Output = Result<Option<Vec<u8>>, LogStoreError>> + Send;

    /// Release the store's connections. Later calls fail with [`LogStoreError::Closed`].
    ///
    /// Calling `close` more than once has no further effect.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_wire_forms() {
        assert_eq!(ReadCursor::History.as_str(), "0");
        assert_eq!(ReadCursor::New.as_str(), ">");
    }

    #[test]
    fn start_id_wire_forms() {
        assert_eq!(StartId::default(), StartId::Latest);
        assert_eq!(StartId::Latest.to_wire(), "$");
        assert_eq!(StartId::Beginning.to_wire(), "0");
        assert_eq!(StartId::After(MessageId::new(7, 2)).to_wire(), "7-2");
    }

    #[test]
    fn idle_query_covers_full_range() {
        let query = PendingQuery::idle_at_least(Some(Duration::from_secs(1)), 10);
        assert_eq!(query.start, None);
        assert_eq!(query.end, None);
        assert_eq!(query.consumer, None);
        assert_eq!(query.count, 10);
    }
}
