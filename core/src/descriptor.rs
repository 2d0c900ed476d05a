//! Read-only descriptors of streams, groups, consumers and pending entries.
//!
//! These are snapshots returned by the store's introspection commands. None of
//! them is kept up to date after it has been read.

use crate::message::{Message, MessageId};
use std::time::Duration;

/// Snapshot of a stream (`XINFO STREAM`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamInfo {
    /// Number of entries currently in the stream.
    pub length: u64,
    /// Keys in the stream's radix tree index.
    pub radix_tree_keys: u64,
    /// Nodes in the stream's radix tree index.
    pub radix_tree_nodes: u64,
    /// Last id generated by an append, including trimmed or deleted entries.
    pub last_generated_id: MessageId,
    /// Number of consumer groups attached to the stream.
    pub groups: u64,
    /// Oldest entry, absent when the stream is empty.
    pub first_entry: Option<Message>,
    /// Newest entry, absent when the stream is empty.
    pub last_entry: Option<Message>,
}

/// Snapshot of a consumer group (`XINFO GROUPS`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupInfo {
    /// Group name.
    pub name: String,
    /// Consumers known to the group.
    pub consumers: u64,
    /// Entries delivered but not yet acknowledged.
    pub pending: u64,
    /// Id of the last entry handed out to any consumer of the group.
    pub last_delivered_id: MessageId,
}

/// Snapshot of one consumer within a group (`XINFO CONSUMERS`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsumerInfo {
    /// Consumer name, as supplied by the caller of `consume`.
    pub name: String,
    /// Entries this consumer owns and has not acknowledged.
    pub pending: u64,
    /// Time since the consumer last interacted with the group.
    pub idle: Duration,
}

/// One entry of a group's pending entries list (`XPENDING` extended form).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingEntry {
    /// Id of the delivered entry.
    pub message_id: MessageId,
    /// Consumer that currently owns the entry.
    pub consumer: String,
    /// Time since the entry was last delivered or claimed.
    pub idle: Duration,
    /// How many times the entry has been delivered.
    pub delivery_count: u64,
}

/// Aggregate status of a queue: one stream, its groups, and the consumers of
/// its derived group.
///
/// The three parts come from independent reads and may disagree with each
/// other if the queue changes in between.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueStatus {
    /// Stream snapshot.
    pub info: StreamInfo,
    /// Consumers of the derived group.
    pub consumers: Vec<ConsumerInfo>,
    /// All groups attached to the stream.
    pub groups: Vec<GroupInfo>,
}

/// Pending entries grouped by owning consumer.
///
/// Owners appear in the order of their oldest pending id, and each owner's
/// ids keep the store's ascending id order. `total` counts all ids across all
/// consumers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingSummary {
    /// Pending ids per owning consumer.
    pub by_consumer: Vec<(String, Vec<MessageId>)>,
    /// Total number of pending ids in the summary.
    pub total: usize,
}

impl PendingSummary {
    /// Group raw pending entries by their owner.
    #[must_use]
    pub fn from_entries(entries: &[PendingEntry]) -> Self {
        let mut by_consumer: Vec<(String, Vec<MessageId>)> = Vec::new();
        for entry in entries {
            match by_consumer
                .iter_mut()
                .find(|(owner, _)| *owner == entry.consumer)
            {
                Some((_, ids)) => ids.push(entry.message_id),
                None => by_consumer.push((entry.consumer.clone(), vec![entry.message_id])),
            }
        }
        Self {
            by_consumer,
            total: entries.len(),
        }
    }

    /// Whether no entries are pending.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Pending ids owned by `consumer`, empty if it owns none.
    #[must_use]
    pub fn owned_by(&self, consumer: &str) -> &[MessageId] {
        self.by_consumer
            .iter()
            .find(|(owner, _)| owner == consumer)
            .map_or(&[][..], |(_, ids)| ids.as_slice())
    }

    /// Oldest pending id not owned by `consumer`, with its owner.
    #[must_use]
    pub fn first_not_owned_by(&self, consumer: &str) -> Option<(&str, MessageId)> {
        self.by_consumer
            .iter()
            .filter(|(owner, _)| owner.as_str() != consumer)
            .find_map(|(owner, ids)| ids.first().map(|id| (owner.as_str(), *id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, consumer: &str) -> PendingEntry {
        PendingEntry {
            message_id: MessageId::new(id, 0),
            consumer: consumer.to_string(),
            idle: Duration::from_millis(10),
            delivery_count: 1,
        }
    }

    #[test]
    fn summary_groups_by_owner_and_keeps_order() {
        let summary = PendingSummary::from_entries(&[
            entry(1, "a"),
            entry(2, "b"),
            entry(3, "a"),
        ]);

        assert_eq!(summary.total, 3);
        assert_eq!(
            summary.owned_by("a"),
            &[MessageId::new(1, 0), MessageId::new(3, 0)]
        );
        assert_eq!(summary.owned_by("b"), &[MessageId::new(2, 0)]);
        assert!(summary.owned_by("c").is_empty());
    }

    #[test]
    fn empty_summary() {
        let summary = PendingSummary::from_entries(&[]);
        assert!(summary.is_empty());
        assert!(summary.by_consumer.is_empty());
        assert_eq!(summary.first_not_owned_by("a"), None);
    }

    #[test]
    fn first_not_owned_by_skips_the_active_consumer() {
        let summary = PendingSummary::from_entries(&[
            entry(1, "a"),
            entry(2, "b"),
            entry(3, "b"),
        ]);

        assert_eq!(
            summary.first_not_owned_by("a"),
            Some(("b", MessageId::new(2, 0)))
        );
        assert_eq!(
            summary.first_not_owned_by("b"),
            Some(("a", MessageId::new(1, 0)))
        );
    }

    #[test]
    fn owners_are_ordered_by_oldest_entry_not_by_name() {
        let summary = PendingSummary::from_entries(&[
            entry(1, "zed"),
            entry(2, "alice"),
            entry(3, "zed"),
        ]);

        let owners: Vec<&str> = summary
            .by_consumer
            .iter()
            .map(|(owner, _)| owner.as_str())
            .collect();
        assert_eq!(owners, vec!["zed", "alice"]);
        assert_eq!(
            summary.first_not_owned_by("bob"),
            Some(("zed", MessageId::new(1, 0)))
        );
    }

    #[test]
    fn first_not_owned_by_is_none_when_only_active_consumer_pends() {
        let summary = PendingSummary::from_entries(&[entry(1, "a")]);
        assert_eq!(summary.first_not_owned_by("a"), None);
    }
}
