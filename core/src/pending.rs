//! Pending entry tracking and stale message reclamation.
//!
//! A message stays pending from delivery until it is acknowledged. If its
//! consumer dies, the message stays pending under the dead consumer forever
//! unless another consumer takes it over. [`Gateway::reclaim_one`] does that
//! one message at a time; callers run it on a periodic tick to drain a dead
//! consumer's backlog.
//!
//! Only the first page of pending entries is examined (10 by default). When
//! more entries are pending, the rest stay invisible until earlier ones are
//! acknowledged or reclaimed.

use crate::descriptor::PendingSummary;
use crate::error::Result;
use crate::gateway::Gateway;
use crate::message::{Message, MessageId};
use crate::store::{LogStore, PendingQuery};
use std::time::Duration;

impl<S: LogStore> Gateway<S> {
    /// Pending entries idle for at least `min_idle`, grouped by owner.
    ///
    /// Logs a warning whenever anything is pending.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the stream or its group does not exist.
    pub async fn list_pending(&self, stream: &str, min_idle: Duration) -> Result<PendingSummary> {
        let group = self.group_name(stream);
        let query = PendingQuery::idle_at_least(Some(min_idle), self.config().pending_page_size);
        let entries = self
            .call("list_pending", (stream, min_idle), |store| {
                store.pending(stream, &group, &query)
            })
            .await?;

        let summary = PendingSummary::from_entries(&entries);
        if !summary.is_empty() {
            tracing::warn!(
                stream,
                group = %group,
                count = summary.total,
                pending = ?summary.by_consumer,
                "Messages pending"
            );
        }
        Ok(summary)
    }

    /// Move one stale message from another consumer to `consumer`.
    ///
    /// Looks at entries idle for at least `min_idle` and claims the oldest one
    /// owned by someone other than `consumer`. Returns whether a message
    /// changed hands. The claim itself does not re-check idle time.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the stream or its group does not exist.
    pub async fn reclaim_one(&self, stream: &str, consumer: &str, min_idle: Duration) -> Result<bool> {
        let summary = self.list_pending(stream, min_idle).await?;

        let Some((previous_owner, id)) = summary.first_not_owned_by(consumer) else {
            return Ok(false);
        };

        let claimed = self.claim(stream, consumer, &[id], None).await?;
        tracing::debug!(
            stream,
            previous_owner,
            consumer,
            id = %id,
            claimed = claimed.len(),
            "Stale message reclaimed"
        );
        Ok(true)
    }

    /// Transfer ownership of `ids` to `consumer` without acknowledging them.
    ///
    /// With `min_idle` set, only entries idle at least that long move. Returns
    /// the messages that were claimed.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the stream or its group does not exist.
    pub async fn claim(
        &self,
        stream: &str,
        consumer: &str,
        ids: &[MessageId],
        min_idle: Option<Duration>,
    ) -> Result<Vec<Message>> {
        let group = self.group_name(stream);
        let min_idle = min_idle.unwrap_or(Duration::ZERO);
        let claimed = self
            .call("claim", (stream, consumer, ids, min_idle), |store| {
                store.claim(stream, &group, consumer, min_idle, ids)
            })
            .await?;

        tracing::debug!(
            stream,
            group = %group,
            consumer,
            requested = ids.len(),
            claimed = claimed.len(),
            "Messages claimed"
        );
        Ok(claimed)
    }
}
