//! The gateway facade.
//!
//! [`Gateway`] is the only entry point applications use. It owns a
//! [`LogStore`] and a [`GatewayConfig`], derives group names, and routes every
//! store failure through one logging and translation point.
//!
//! The protocol operations live next to their component:
//!
//! - lifecycle (`ensure_group`, `delete_queue`, ...) in [`crate::lifecycle`]
//! - two-phase reads (`consume`, `messages`) in [`crate::consume`]
//! - pending tracking and reclamation in [`crate::pending`]
//! - status snapshots in [`crate::status`]
//!
//! This module holds the facade itself plus the operations that are plain
//! pass-throughs: `produce`, `ack`, `value_set`, `value_get` and `close`.
//!
//! # Example
//!
//! ```no_run
//! use streamgate_core::{Gateway, GatewayConfig, LogStore, StartId};
//!
//! async fn example<S: LogStore>(store: S) -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = Gateway::new(store, GatewayConfig::default())?;
//!
//!     gateway.ensure_group("orders", StartId::Latest, false).await?;
//!     let id = gateway.produce("orders", b"order1", None, true).await?;
//!
//!     if let Some(message) = gateway.consume("orders", "worker-1", None).await? {
//!         // process, then acknowledge
//!         gateway.ack("orders", &[message.id]).await?;
//!     }
//!
//!     gateway.close().await;
//!     Ok(())
//! }
//! ```

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result, store_failure};
use crate::message::{MessageId, PAYLOAD_FIELD};
use crate::naming;
use crate::store::{LogStore, LogStoreError, Trim};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Consumer-group delivery gateway over a [`LogStore`].
///
/// A gateway is `Send + Sync` when its store is, so one instance can be shared
/// through an `Arc` by many tasks. Message ownership is enforced by the store's
/// consumer-group bookkeeping; the gateway keeps no locks of its own.
///
/// After [`Gateway::close`] every operation fails with [`GatewayError::Closed`].
pub struct Gateway<S> {
    store: S,
    config: GatewayConfig,
    closed: AtomicBool,
}

impl<S: LogStore> Gateway<S> {
    /// Create a gateway over `store`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] if `config` does not validate.
    pub fn new(store: S, config: GatewayConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| GatewayError::Configuration(e.to_string()))?;

        Ok(Self {
            store,
            config,
            closed: AtomicBool::new(false),
        })
    }

    /// Create a gateway with [`GatewayConfig::default`].
    #[must_use]
    pub fn with_defaults(store: S) -> Self {
        Self {
            store,
            config: GatewayConfig::default(),
            closed: AtomicBool::new(false),
        }
    }

    /// The gateway's configuration.
    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Whether [`Gateway::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Name of the consumer group every operation on `stream` addresses.
    #[must_use]
    pub fn group_name(&self, stream: &str) -> String {
        naming::group_name(stream, &self.config.group_suffix)
    }

    /// The store, unless the gateway is closed.
    pub(crate) fn open_store(&self, operation: &'static str) -> Result<&S> {
        if self.is_closed() {
            tracing::error!(operation, "Gateway used after close");
            return Err(GatewayError::Closed);
        }
        Ok(&self.store)
    }

    /// Run one store command on behalf of `operation`, translating failures.
    pub(crate) async fn call<'a, T, F>(
        &'a self,
        operation: &'static str,
        args: impl fmt::Debug,
        command: impl FnOnce(&'a S) -> F,
    ) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, LogStoreError>>,
    {
        let store = self.open_store(operation)?;
        command(store)
            .await
            .map_err(|source| store_failure(operation, &args, source))
    }

    /// Append `payload` to `stream` and return its id.
    ///
    /// The payload is stored under the `message` field. With `max_len` set the
    /// stream is trimmed to about (`approximate`) or exactly that many entries.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Store`] if the append fails.
    pub async fn produce(
        &self,
        stream: &str,
        payload: &[u8],
        max_len: Option<usize>,
        approximate: bool,
    ) -> Result<MessageId> {
        let trim = max_len.map(|max_len| Trim {
            max_len,
            approximate,
        });
        let fields = [(PAYLOAD_FIELD, payload)];
        let id = self
            .call("produce", (stream, max_len, approximate), |store| {
                store.append(stream, &fields, trim)
            })
            .await?;

        tracing::debug!(stream, id = %id, "Message pushed to stream");
        Ok(id)
    }

    /// Acknowledge processed messages; returns how many were still pending.
    ///
    /// Ids that are not pending count as zero, and so does every id when the
    /// stream or its group is missing.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Store`] if the command fails.
    pub async fn ack(&self, stream: &str, ids: &[MessageId]) -> Result<u64> {
        let group = self.group_name(stream);
        let acknowledged = self
            .call("ack", (stream, ids), |store| store.ack(stream, &group, ids))
            .await?;

        tracing::debug!(
            stream,
            group = %group,
            ids = ?ids,
            acknowledged,
            "Messages acknowledged"
        );
        Ok(acknowledged)
    }

    /// Store a plain value next to the streams, optionally expiring.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Store`] if the command fails.
    pub async fn value_set(&self, key: &str, value: &[u8], expiry: Option<Duration>) -> Result<()> {
        self.call("value_set", (key, expiry), |store| {
            store.set(key, value, expiry)
        })
        .await
    }

    /// Read a plain value.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Store`] if the command fails.
    pub async fn value_get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.call("value_get", key, |store| store.get(key)).await
    }

    /// Release the store's connections.
    ///
    /// Every later call fails with [`GatewayError::Closed`] instead of waiting
    /// on a dead connection. Closing twice is harmless.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.store.close().await;
        tracing::info!("Gateway closed");
    }
}

impl<S> fmt::Debug for Gateway<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.config)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
