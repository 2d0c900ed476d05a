//! Redis Streams log store for Streamgate.
//!
//! This crate provides [`RedisLogStore`], the production implementation of the
//! [`LogStore`] trait from `streamgate-core`. Each trait method issues exactly
//! one Redis command (`XADD`, `XREADGROUP`, `XACK`, `XPENDING`, `XCLAIM`, ...)
//! and decodes the reply field by field.
//!
//! # Connections
//!
//! Two `ConnectionManager`s are kept:
//!
//! - **commands**: every non-blocking command
//! - **blocking reads**: `XREADGROUP ... BLOCK`, so a consumer waiting for
//!   messages never holds up appends or acknowledgements queued behind it
//!
//! `ConnectionManager` reconnects on its own; commands are never retried.
//! After [`LogStore::close`] both connections are dropped and every command
//! fails with [`LogStoreError::Closed`].
//!
//! # Example
//!
//! ```no_run
//! use streamgate_core::{Gateway, GatewayConfig, StartId};
//! use streamgate_redis::RedisLogStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RedisLogStore::new("redis://127.0.0.1:6379").await?;
//! let gateway = Gateway::new(store, GatewayConfig::default())?;
//!
//! gateway.ensure_group("orders", StartId::Latest, false).await?;
//! let id = gateway.produce("orders", b"order1", None, true).await?;
//! println!("produced {id}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod reply;

use redis::aio::ConnectionManager;
use redis::{Client, Cmd, Value};
use std::collections::BTreeSet;
use std::time::Duration;
use streamgate_core::{
    ConsumerInfo, GroupInfo, LogStore, LogStoreError, Message, MessageId, PendingEntry,
    PendingQuery, ReadCursor, StartId, StreamInfo, Trim,
};
use tokio::sync::RwLock;

/// Keys requested per `SCAN` round trip.
const SCAN_PAGE_HINT: usize = 100;

/// Redis Streams implementation of [`LogStore`].
///
/// Cloning is not supported; share one store through the gateway (which can
/// itself be wrapped in an `Arc`).
pub struct RedisLogStore {
    url: String,
    connections: RwLock<Option<Connections>>,
}

struct Connections {
    commands: ConnectionManager,
    blocking: ConnectionManager,
}

#[derive(Copy, Clone, Debug)]
enum Lane {
    Commands,
    Blocking,
}

impl RedisLogStore {
    /// Connect to Redis at `url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`LogStoreError::Transport`] if the URL is invalid or the
    /// server cannot be reached.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use streamgate_redis::RedisLogStore;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let store = RedisLogStore::new("redis://127.0.0.1:6379").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new(url: &str) -> Result<Self, LogStoreError> {
        Self::builder().url(url).build().await
    }

    /// Create a new builder for configuring the store.
    #[must_use]
    pub fn builder() -> RedisLogStoreBuilder {
        RedisLogStoreBuilder::default()
    }

    /// The URL this store connected to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn connection(&self, lane: Lane) -> Result<ConnectionManager, LogStoreError> {
        let guard = self.connections.read().await;
        let connections = guard.as_ref().ok_or(LogStoreError::Closed)?;
        Ok(match lane {
            Lane::Commands => connections.commands.clone(),
            Lane::Blocking => connections.blocking.clone(),
        })
    }

    async fn query(&self, lane: Lane, cmd: &Cmd) -> Result<Value, LogStoreError> {
        let mut conn = self.connection(lane).await?;
        let reply: Value = cmd
            .query_async(&mut conn)
            .await
            .map_err(|e| error::classify(&e))?;
        Ok(reply)
    }
}

/// Builder for configuring a [`RedisLogStore`].
///
/// # Example
///
/// ```no_run
/// use streamgate_redis::RedisLogStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = RedisLogStore::builder()
///     .url("redis://:secret@cache.internal:6379/2")
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct RedisLogStoreBuilder {
    url: Option<String>,
}

impl RedisLogStoreBuilder {
    /// Set the connection URL (`redis://[:password@]host[:port][/db]`).
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Connect and build the [`RedisLogStore`].
    ///
    /// # Errors
    ///
    /// Returns [`LogStoreError::Transport`] if:
    /// - URL not set or invalid
    /// - Either connection cannot be established
    pub async fn build(self) -> Result<RedisLogStore, LogStoreError> {
        let url = self
            .url
            .ok_or_else(|| LogStoreError::Transport("Redis URL not configured".to_string()))?;

        let client = Client::open(url.as_str()).map_err(|e| {
            LogStoreError::Transport(format!("Failed to create Redis client: {e}"))
        })?;

        let commands = ConnectionManager::new(client.clone()).await.map_err(|e| {
            LogStoreError::Transport(format!("Failed to create Redis connection manager: {e}"))
        })?;
        let blocking = ConnectionManager::new(client).await.map_err(|e| {
            LogStoreError::Transport(format!(
                "Failed to create Redis connection manager for blocking reads: {e}"
            ))
        })?;

        tracing::info!(url = %redacted(&url), "RedisLogStore connected");

        Ok(RedisLogStore {
            url,
            connections: RwLock::new(Some(Connections { commands, blocking })),
        })
    }
}

/// URL with any password replaced, for logging.
fn redacted(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        },
        _ => url.to_string(),
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl LogStore for RedisLogStore {
    async fn append(
        &self,
        stream: &str,
        fields: &[(&str, &[u8])],
        trim: Option<Trim>,
    ) -> Result<MessageId, LogStoreError> {
        let mut cmd = redis::cmd("XADD");
        cmd.arg(stream);
        if let Some(trim) = trim {
            cmd.arg("MAXLEN");
            if trim.approximate {
                cmd.arg("~");
            }
            cmd.arg(trim.max_len);
        }
        cmd.arg("*");
        for (field, value) in fields {
            cmd.arg(*field).arg(*value);
        }

        let reply = self.query(Lane::Commands, &cmd).await?;
        reply::message_id("XADD", &reply)
    }

    async fn read_group(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        cursor: ReadCursor,
        count: usize,
        block: Duration,
    ) -> Result<Vec<Message>, LogStoreError> {
        let mut cmd = redis::cmd("XREADGROUP");
        cmd.arg("GROUP")
            .arg(group)
            .arg(consumer)
            .arg("COUNT")
            .arg(count)
            .arg("BLOCK")
            .arg(millis(block))
            .arg("STREAMS")
            .arg(stream)
            .arg(cursor.as_str());

        let reply = self.query(Lane::Blocking, &cmd).await?;
        reply::read_group(stream, &reply)
    }

    async fn ack(
        &self,
        stream: &str,
        group: &str,
        ids: &[MessageId],
    ) -> Result<u64, LogStoreError> {
        let mut cmd = redis::cmd("XACK");
        cmd.arg(stream).arg(group);
        for id in ids {
            cmd.arg(id.to_string());
        }

        let reply = self.query(Lane::Commands, &cmd).await?;
        reply::unsigned("XACK", &reply)
    }

    async fn create_group(
        &self,
        stream: &str,
        group: &str,
        start: StartId,
        mkstream: bool,
    ) -> Result<(), LogStoreError> {
        let mut cmd = redis::cmd("XGROUP");
        cmd.arg("CREATE").arg(stream).arg(group).arg(start.to_wire());
        if mkstream {
            cmd.arg("MKSTREAM");
        }

        self.query(Lane::Commands, &cmd).await?;
        Ok(())
    }

    async fn destroy_group(&self, stream: &str, group: &str) -> Result<bool, LogStoreError> {
        let mut cmd = redis::cmd("XGROUP");
        cmd.arg("DESTROY").arg(stream).arg(group);

        let reply = self.query(Lane::Commands, &cmd).await?;
        Ok(reply::unsigned("XGROUP DESTROY", &reply)? > 0)
    }

    async fn stream_info(&self, stream: &str) -> Result<StreamInfo, LogStoreError> {
        let mut cmd = redis::cmd("XINFO");
        cmd.arg("STREAM").arg(stream);

        let reply = self.query(Lane::Commands, &cmd).await?;
        reply::stream_info(&reply)
    }

    async fn groups_info(&self, stream: &str) -> Result<Vec<GroupInfo>, LogStoreError> {
        let mut cmd = redis::cmd("XINFO");
        cmd.arg("GROUPS").arg(stream);

        let reply = self.query(Lane::Commands, &cmd).await?;
        reply::groups_info(&reply)
    }

    async fn consumers_info(
        &self,
        stream: &str,
        group: &str,
    ) -> Result<Vec<ConsumerInfo>, LogStoreError> {
        let mut cmd = redis::cmd("XINFO");
        cmd.arg("CONSUMERS").arg(stream).arg(group);

        let reply = self.query(Lane::Commands, &cmd).await?;
        reply::consumers_info(&reply)
    }

    async fn pending(
        &self,
        stream: &str,
        group: &str,
        query: &PendingQuery,
    ) -> Result<Vec<PendingEntry>, LogStoreError> {
        let mut cmd = redis::cmd("XPENDING");
        cmd.arg(stream).arg(group);
        if let Some(min_idle) = query.min_idle {
            cmd.arg("IDLE").arg(millis(min_idle));
        }
        cmd.arg(query.start.map_or_else(|| "-".to_string(), |id| id.to_string()))
            .arg(query.end.map_or_else(|| "+".to_string(), |id| id.to_string()))
            .arg(query.count);
        if let Some(consumer) = &query.consumer {
            cmd.arg(consumer);
        }

        let reply = self.query(Lane::Commands, &cmd).await?;
        reply::pending(&reply)
    }

    async fn claim(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        min_idle: Duration,
        ids: &[MessageId],
    ) -> Result<Vec<Message>, LogStoreError> {
        let mut cmd = redis::cmd("XCLAIM");
        cmd.arg(stream).arg(group).arg(consumer).arg(millis(min_idle));
        for id in ids {
            cmd.arg(id.to_string());
        }

        let reply = self.query(Lane::Commands, &cmd).await?;
        reply::entries("XCLAIM", &reply)
    }

    async fn delete(&self, keys: &[&str]) -> Result<u64, LogStoreError> {
        let mut cmd = redis::cmd("DEL");
        for key in keys {
            cmd.arg(*key);
        }

        let reply = self.query(Lane::Commands, &cmd).await?;
        reply::unsigned("DEL", &reply)
    }

    async fn scan_streams(&self) -> Result<Vec<String>, LogStoreError> {
        // SCAN may return a key more than once across pages.
        let mut streams = BTreeSet::new();
        let mut cursor = 0_u64;
        loop {
            let mut cmd = redis::cmd("SCAN");
            cmd.arg(cursor)
                .arg("COUNT")
                .arg(SCAN_PAGE_HINT)
                .arg("TYPE")
                .arg("stream");

            let reply = self.query(Lane::Commands, &cmd).await?;
            let (next, keys) = reply::scan_page(&reply)?;
            streams.extend(keys);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(streams.into_iter().collect())
    }

    async fn set(
        &self,
        key: &str,
        value: &[u8],
        expiry: Option<Duration>,
    ) -> Result<(), LogStoreError> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(expiry) = expiry {
            cmd.arg("PX").arg(millis(expiry).max(1));
        }

        self.query(Lane::Commands, &cmd).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LogStoreError> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);

        let reply = self.query(Lane::Commands, &cmd).await?;
        reply::optional_bytes("GET", &reply)
    }

    async fn close(&self) {
        if self.connections.write().await.take().is_some() {
            tracing::info!(url = %redacted(&self.url), "RedisLogStore closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redis_log_store_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<RedisLogStore>();
        assert_sync::<RedisLogStore>();
    }

    #[tokio::test]
    async fn builder_without_url_fails() {
        let result = RedisLogStore::builder().build().await;
        assert!(matches!(result, Err(LogStoreError::Transport(_))));
    }

    #[tokio::test]
    async fn builder_rejects_invalid_url() {
        let result = RedisLogStore::builder().url("not a url").build().await;
        assert!(matches!(result, Err(LogStoreError::Transport(_))));
    }

    #[test]
    fn password_is_redacted() {
        assert_eq!(
            redacted("redis://:secret@cache:6379/2"),
            "redis://***@cache:6379/2"
        );
        assert_eq!(redacted("redis://127.0.0.1:6379"), "redis://127.0.0.1:6379");
    }

    #[test]
    fn millis_saturates() {
        assert_eq!(millis(Duration::from_millis(500)), 500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }
}
