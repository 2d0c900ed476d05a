//! In-memory log store for gateway tests.
//!
//! [`InMemoryLogStore`] implements [`LogStore`] with the same consumer-group
//! bookkeeping Redis keeps: a last-delivered id per group, a pending entries
//! list with owner, delivery time and delivery count, and the consumers each
//! group has seen. Idle times are computed from an injected [`Clock`], so
//! reclaim scenarios run without sleeping.
//!
//! Differences from Redis worth knowing in tests:
//! - group reads never block; the requested block time is recorded in
//!   [`InMemoryLogStore::reads`] instead
//! - approximate trimming trims exactly
//! - radix tree statistics are rough estimates
//!
//! Failures can be injected with [`InMemoryLogStore::fail_next`].

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned lock

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use streamgate_core::environment::{Clock, SystemClock};
use streamgate_core::{
    ConsumerInfo, GroupInfo, LogStore, LogStoreError, Message, MessageId, PendingEntry,
    PendingQuery, ReadCursor, StartId, StreamInfo, Trim,
};

/// One recorded `read_group` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadCall {
    /// Stream read from.
    pub stream: String,
    /// Group read through.
    pub group: String,
    /// Consumer reading.
    pub consumer: String,
    /// Cursor used.
    pub cursor: ReadCursor,
    /// Requested message count.
    pub count: usize,
    /// Requested block time.
    pub block: Duration,
}

/// In-memory [`LogStore`] with Redis consumer-group semantics.
///
/// Clones share state, so a test can keep a handle for inspection after
/// moving the store into a gateway.
///
/// # Example
///
/// ```
/// use streamgate_core::{Gateway, StartId};
/// use streamgate_testing::InMemoryLogStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryLogStore::new();
/// let gateway = Gateway::with_defaults(store.clone());
///
/// gateway.ensure_group("orders", StartId::Latest, false).await?;
/// gateway.produce("orders", b"order1", None, true).await?;
///
/// assert_eq!(store.stream_len("orders"), Some(1));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct InMemoryLogStore {
    state: Arc<Mutex<State>>,
    clock: Arc<dyn Clock>,
}

#[derive(Default)]
struct State {
    streams: BTreeMap<String, StreamState>,
    values: HashMap<String, Value>,
    failures: VecDeque<LogStoreError>,
    commands: Vec<&'static str>,
    reads: Vec<ReadCall>,
    closed: bool,
}

struct StreamState {
    entries: BTreeMap<MessageId, BTreeMap<String, Vec<u8>>>,
    last_id: MessageId,
    groups: BTreeMap<String, GroupState>,
}

struct GroupState {
    last_delivered: MessageId,
    pending: BTreeMap<MessageId, PendingState>,
    /// Consumer name to the last time it was seen, in epoch millis.
    consumers: BTreeMap<String, u64>,
}

struct PendingState {
    consumer: String,
    delivered_at: u64,
    deliveries: u64,
}

struct Value {
    data: Vec<u8>,
    expires_at: Option<u64>,
}

impl StreamState {
    const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            last_id: MessageId::MIN,
            groups: BTreeMap::new(),
        }
    }

    fn message(&self, id: MessageId) -> Option<Message> {
        self.entries
            .get(&id)
            .map(|fields| Message::new(id, fields.clone()))
    }
}

impl GroupState {
    fn owned_by(&self, consumer: &str) -> usize {
        self.pending
            .values()
            .filter(|entry| entry.consumer == consumer)
            .count()
    }
}

impl Value {
    fn is_live(&self, now: u64) -> bool {
        self.expires_at.is_none_or(|expires_at| now < expires_at)
    }
}

fn elapsed(now: u64, since: u64) -> Duration {
    Duration::from_millis(now.saturating_sub(since))
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn no_such_key() -> LogStoreError {
    LogStoreError::NotFound("ERR no such key".to_string())
}

fn no_group(stream: &str, group: &str, command: &str) -> LogStoreError {
    LogStoreError::NotFound(format!(
        "NOGROUP No such key '{stream}' or consumer group '{group}' in {command}"
    ))
}

impl InMemoryLogStore {
    /// Create an empty store on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Create an empty store that reads time from `clock`.
    #[must_use]
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            clock: Arc::new(clock),
        }
    }

    /// Make the next command fail with `error`.
    ///
    /// Several injected failures are consumed in order, one per command.
    pub fn fail_next(&self, error: LogStoreError) {
        self.lock().failures.push_back(error);
    }

    /// Names of the commands issued so far, in order (`XADD`, `XREADGROUP`, ...).
    #[must_use]
    pub fn commands(&self) -> Vec<&'static str> {
        self.lock().commands.clone()
    }

    /// Every `read_group` call issued so far.
    #[must_use]
    pub fn reads(&self) -> Vec<ReadCall> {
        self.lock().reads.clone()
    }

    /// Number of entries in `stream`, or `None` if it does not exist.
    #[must_use]
    pub fn stream_len(&self, stream: &str) -> Option<usize> {
        self.lock()
            .streams
            .get(stream)
            .map(|stream_state| stream_state.entries.len())
    }

    /// Whether `key` exists as a stream or a plain value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        let state = self.lock();
        state.streams.contains_key(key) || state.values.contains_key(key)
    }

    /// Store a plain value without going through the gateway.
    pub fn insert_value(&self, key: &str, value: &[u8]) {
        self.lock().values.insert(
            key.to_string(),
            Value {
                data: value.to_vec(),
                expires_at: None,
            },
        );
    }

    /// Remove a group behind the gateway's back, as another process would.
    pub fn drop_group(&self, stream: &str, group: &str) {
        if let Some(stream_state) = self.lock().streams.get_mut(stream) {
            stream_state.groups.remove(group);
        }
    }

    /// Whether [`LogStore::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Lock the state for one command, applying closure and injected failures.
    fn begin(&self, command: &'static str) -> Result<MutexGuard<'_, State>, LogStoreError> {
        let mut state = self.lock();
        if state.closed {
            return Err(LogStoreError::Closed);
        }
        state.commands.push(command);
        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }
        Ok(state)
    }

    fn now(&self) -> u64 {
        self.clock.now_millis()
    }
}

impl Default for InMemoryLogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryLogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("InMemoryLogStore")
            .field("streams", &state.streams.keys().collect::<Vec<_>>())
            .field("values", &state.values.len())
            .field("closed", &state.closed)
            .finish_non_exhaustive()
    }
}

impl LogStore for InMemoryLogStore {
    async fn append(
        &self,
        stream: &str,
        fields: &[(&str, &[u8])],
        trim: Option<Trim>,
    ) -> Result<MessageId, LogStoreError> {
        let now = self.now();
        let mut state = self.begin("XADD")?;
        let stream_state = state
            .streams
            .entry(stream.to_string())
            .or_insert_with(StreamState::new);

        let id = stream_state.last_id.successor_at(now);
        let fields = fields
            .iter()
            .map(|(field, value)| ((*field).to_string(), value.to_vec()))
            .collect();
        stream_state.entries.insert(id, fields);
        stream_state.last_id = id;

        if let Some(trim) = trim {
            while stream_state.entries.len() > trim.max_len {
                stream_state.entries.pop_first();
            }
        }
        Ok(id)
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
        let now = self.now();
        let mut state = self.begin("XREADGROUP")?;
        state.reads.push(ReadCall {
            stream: stream.to_string(),
            group: group.to_string(),
            consumer: consumer.to_string(),
            cursor,
            count,
            block,
        });

        let StreamState {
            entries, groups, ..
        } = state
            .streams
            .get_mut(stream)
            .ok_or_else(|| no_group(stream, group, "XREADGROUP"))?;
        let group_state = groups
            .get_mut(group)
            .ok_or_else(|| no_group(stream, group, "XREADGROUP"))?;
        group_state.consumers.insert(consumer.to_string(), now);

        let messages = match cursor {
            // Re-delivery resets idle time and bumps the delivery count.
            // Trimmed entries stay pending and come back without fields.
            ReadCursor::History => group_state
                .pending
                .iter_mut()
                .filter(|(_, entry)| entry.consumer == consumer)
                .take(count)
                .map(|(id, entry)| {
                    entry.delivered_at = now;
                    entry.deliveries += 1;
                    Message::new(*id, entries.get(id).cloned().unwrap_or_default())
                })
                .collect(),
            ReadCursor::New => {
                let fresh: Vec<Message> = entries
                    .range(group_state.last_delivered..)
                    .filter(|(id, _)| **id > group_state.last_delivered)
                    .take(count)
                    .map(|(id, fields)| Message::new(*id, fields.clone()))
                    .collect();
                for message in &fresh {
                    group_state.pending.insert(
                        message.id,
                        PendingState {
                            consumer: consumer.to_string(),
                            delivered_at: now,
                            deliveries: 1,
                        },
                    );
                    group_state.last_delivered = message.id;
                }
                fresh
            },
        };
        Ok(messages)
    }

    async fn ack(
        &self,
        stream: &str,
        group: &str,
        ids: &[MessageId],
    ) -> Result<u64, LogStoreError> {
        let mut state = self.begin("XACK")?;
        let Some(group_state) = state
            .streams
            .get_mut(stream)
            .and_then(|stream_state| stream_state.groups.get_mut(group))
        else {
            return Ok(0);
        };

        let acknowledged = ids
            .iter()
            .filter(|id| group_state.pending.remove(*id).is_some())
            .count();
        Ok(acknowledged as u64)
    }

    async fn create_group(
        &self,
        stream: &str,
        group: &str,
        start: StartId,
        mkstream: bool,
    ) -> Result<(), LogStoreError> {
        let mut state = self.begin("XGROUP CREATE")?;
        if !state.streams.contains_key(stream) {
            if !mkstream {
                return Err(LogStoreError::NotFound(
                    "ERR The XGROUP subcommand requires the key to exist".to_string(),
                ));
            }
            state.streams.insert(stream.to_string(), StreamState::new());
        }

        let Some(stream_state) = state.streams.get_mut(stream) else {
            return Err(no_such_key());
        };
        if stream_state.groups.contains_key(group) {
            return Err(LogStoreError::GroupExists(
                "BUSYGROUP Consumer Group name already exists".to_string(),
            ));
        }

        let last_delivered = match start {
            StartId::Latest => stream_state.last_id,
            StartId::Beginning => MessageId::MIN,
            StartId::After(id) => id,
        };
        stream_state.groups.insert(
            group.to_string(),
            GroupState {
                last_delivered,
                pending: BTreeMap::new(),
                consumers: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn destroy_group(&self, stream: &str, group: &str) -> Result<bool, LogStoreError> {
        let mut state = self.begin("XGROUP DESTROY")?;
        let stream_state = state.streams.get_mut(stream).ok_or_else(|| {
            LogStoreError::NotFound(
                "ERR The XGROUP subcommand requires the key to exist".to_string(),
            )
        })?;
        Ok(stream_state.groups.remove(group).is_some())
    }

    async fn stream_info(&self, stream: &str) -> Result<StreamInfo, LogStoreError> {
        let state = self.begin("XINFO STREAM")?;
        let stream_state = state.streams.get(stream).ok_or_else(no_such_key)?;

        let radix_tree_keys = {
            let mut stamps: Vec<u64> = stream_state.entries.keys().map(|id| id.millis()).collect();
            stamps.dedup();
            stamps.len() as u64
        };
        let first_entry = stream_state
            .entries
            .first_key_value()
            .and_then(|(id, _)| stream_state.message(*id));
        let last_entry = stream_state
            .entries
            .last_key_value()
            .and_then(|(id, _)| stream_state.message(*id));

        Ok(StreamInfo {
            length: stream_state.entries.len() as u64,
            radix_tree_keys,
            radix_tree_nodes: radix_tree_keys + 1,
            last_generated_id: stream_state.last_id,
            groups: stream_state.groups.len() as u64,
            first_entry,
            last_entry,
        })
    }

    async fn groups_info(&self, stream: &str) -> Result<Vec<GroupInfo>, LogStoreError> {
        let state = self.begin("XINFO GROUPS")?;
        let stream_state = state.streams.get(stream).ok_or_else(no_such_key)?;

        Ok(stream_state
            .groups
            .iter()
            .map(|(name, group)| GroupInfo {
                name: name.clone(),
                consumers: group.consumers.len() as u64,
                pending: group.pending.len() as u64,
                last_delivered_id: group.last_delivered,
            })
            .collect())
    }

    async fn consumers_info(
        &self,
        stream: &str,
        group: &str,
    ) -> Result<Vec<ConsumerInfo>, LogStoreError> {
        let now = self.now();
        let state = self.begin("XINFO CONSUMERS")?;
        let stream_state = state.streams.get(stream).ok_or_else(no_such_key)?;
        let group_state = stream_state
            .groups
            .get(group)
            .ok_or_else(|| no_group(stream, group, "XINFO CONSUMERS"))?;

        Ok(group_state
            .consumers
            .iter()
            .map(|(name, seen)| ConsumerInfo {
                name: name.clone(),
                pending: group_state.owned_by(name) as u64,
                idle: elapsed(now, *seen),
            })
            .collect())
    }

    async fn pending(
        &self,
        stream: &str,
        group: &str,
        query: &PendingQuery,
    ) -> Result<Vec<PendingEntry>, LogStoreError> {
        let now = self.now();
        let state = self.begin("XPENDING")?;
        let group_state = state
            .streams
            .get(stream)
            .and_then(|stream_state| stream_state.groups.get(group))
            .ok_or_else(|| no_group(stream, group, "XPENDING"))?;

        let min_idle = query.min_idle.map_or(0, millis);
        let start = query.start.unwrap_or(MessageId::MIN);
        let end = query.end.unwrap_or(MessageId::new(u64::MAX, u64::MAX));
        if start > end {
            return Ok(Vec::new());
        }

        Ok(group_state
            .pending
            .range(start..=end)
            .filter(|(_, entry)| {
                query
                    .consumer
                    .as_ref()
                    .is_none_or(|consumer| *consumer == entry.consumer)
            })
            .filter(|(_, entry)| now.saturating_sub(entry.delivered_at) >= min_idle)
            .take(query.count)
            .map(|(id, entry)| PendingEntry {
                message_id: *id,
                consumer: entry.consumer.clone(),
                idle: elapsed(now, entry.delivered_at),
                delivery_count: entry.deliveries,
            })
            .collect())
    }

    async fn claim(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        min_idle: Duration,
        ids: &[MessageId],
    ) -> Result<Vec<Message>, LogStoreError> {
        let now = self.now();
        let mut state = self.begin("XCLAIM")?;
        let StreamState {
            entries, groups, ..
        } = state
            .streams
            .get_mut(stream)
            .ok_or_else(|| no_group(stream, group, "XCLAIM"))?;
        let group_state = groups
            .get_mut(group)
            .ok_or_else(|| no_group(stream, group, "XCLAIM"))?;
        group_state.consumers.insert(consumer.to_string(), now);

        let min_idle = millis(min_idle);
        let mut claimed = Vec::new();
        for id in ids {
            let Some(entry) = group_state.pending.get_mut(id) else {
                continue;
            };
            if now.saturating_sub(entry.delivered_at) < min_idle {
                continue;
            }
            // Deleted entries are dropped from the pending list, not claimed.
            let Some(fields) = entries.get(id) else {
                group_state.pending.remove(id);
                continue;
            };
            entry.consumer = consumer.to_string();
            entry.delivered_at = now;
            entry.deliveries += 1;
            claimed.push(Message::new(*id, fields.clone()));
        }
        Ok(claimed)
    }

    async fn delete(&self, keys: &[&str]) -> Result<u64, LogStoreError> {
        let mut state = self.begin("DEL")?;
        let removed = keys
            .iter()
            .filter(|key| {
                let stream = state.streams.remove(**key).is_some();
                let value = state.values.remove(**key).is_some();
                stream || value
            })
            .count();
        Ok(removed as u64)
    }

    async fn scan_streams(&self) -> Result<Vec<String>, LogStoreError> {
        let state = self.begin("SCAN")?;
        Ok(state.streams.keys().cloned().collect())
    }

    async fn set(
        &self,
        key: &str,
        value: &[u8],
        expiry: Option<Duration>,
    ) -> Result<(), LogStoreError> {
        let now = self.now();
        let mut state = self.begin("SET")?;
        state.streams.remove(key);
        state.values.insert(
            key.to_string(),
            Value {
                data: value.to_vec(),
                expires_at: expiry.map(|expiry| now.saturating_add(millis(expiry))),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LogStoreError> {
        let now = self.now();
        let state = self.begin("GET")?;
        if state.streams.contains_key(key) {
            return Err(LogStoreError::Transport(
                "WRONGTYPE Operation against a key holding the wrong kind of value".to_string(),
            ));
        }
        Ok(state
            .values
            .get(key)
            .filter(|value| value.is_live(now))
            .map(|value| value.data.clone()))
    }

    async fn close(&self) {
        self.lock().closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{FixedClock, ManualClock};
    use chrono::DateTime;

    fn clock_at(millis: i64) -> ManualClock {
        ManualClock::new(DateTime::from_timestamp_millis(millis).unwrap())
    }

    #[tokio::test]
    async fn append_assigns_ids_from_the_clock() {
        let clock = FixedClock::new(DateTime::from_timestamp_millis(1_700_000_000_000).unwrap());
        let store = InMemoryLogStore::with_clock(clock);

        let first = store.append("s", &[("message", b"a")], None).await.unwrap();
        let second = store.append("s", &[("message", b"b")], None).await.unwrap();

        assert_eq!(first.to_string(), "1700000000000-0");
        assert_eq!(second.to_string(), "1700000000000-1");
    }

    #[tokio::test]
    async fn exact_trim_keeps_newest_entries() {
        let store = InMemoryLogStore::with_clock(clock_at(1_000));
        let trim = Trim {
            max_len: 2,
            approximate: false,
        };
        for payload in [b"a", b"b", b"c"] {
            store.append("s", &[("message", payload)], Some(trim)).await.unwrap();
        }

        let info = store.stream_info("s").await.unwrap();
        assert_eq!(info.length, 2);
        assert_eq!(info.first_entry.unwrap().payload(), Some(&b"b"[..]));
        assert_eq!(info.last_generated_id, MessageId::new(1_000, 2));
    }

    #[tokio::test]
    async fn create_group_reports_busygroup_and_missing_stream() {
        let store = InMemoryLogStore::new();

        let missing = store
            .create_group("s", "g", StartId::Latest, false)
            .await
            .unwrap_err();
        assert!(missing.is_not_found());

        store.create_group("s", "g", StartId::Latest, true).await.unwrap();
        let busy = store
            .create_group("s", "g", StartId::Latest, true)
            .await
            .unwrap_err();
        assert!(matches!(busy, LogStoreError::GroupExists(_)));
    }

    #[tokio::test]
    async fn read_from_missing_group_is_nogroup() {
        let store = InMemoryLogStore::new();
        let err = store
            .read_group("s", "g", "c", ReadCursor::New, 1, Duration::from_millis(5))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.reads().len(), 1);
    }

    #[tokio::test]
    async fn pending_tracks_owner_idle_and_deliveries() {
        let clock = clock_at(10_000);
        let store = InMemoryLogStore::with_clock(clock.clone());
        store.create_group("s", "g", StartId::Latest, true).await.unwrap();
        let id = store.append("s", &[("message", b"x")], None).await.unwrap();
        store
            .read_group("s", "g", "alice", ReadCursor::New, 1, Duration::ZERO)
            .await
            .unwrap();

        clock.advance(Duration::from_millis(250));
        let query = PendingQuery::idle_at_least(Some(Duration::from_millis(200)), 10);
        let pending = store.pending("s", "g", &query).await.unwrap();
        assert_eq!(
            pending,
            vec![PendingEntry {
                message_id: id,
                consumer: "alice".to_string(),
                idle: Duration::from_millis(250),
                delivery_count: 1,
            }]
        );

        let claimed = store
            .claim("s", "g", "bob", Duration::ZERO, &[id])
            .await
            .unwrap();
        assert_eq!(claimed.len(), 1);

        let pending = store.pending("s", "g", &PendingQuery::idle_at_least(None, 10)).await.unwrap();
        assert_eq!(pending[0].consumer, "bob");
        assert_eq!(pending[0].delivery_count, 2);
        assert_eq!(pending[0].idle, Duration::ZERO);
    }

    #[tokio::test]
    async fn history_read_resets_idle_and_counts_delivery() {
        let clock = clock_at(10_000);
        let store = InMemoryLogStore::with_clock(clock.clone());
        store.create_group("s", "g", StartId::Latest, true).await.unwrap();
        let id = store.append("s", &[("message", b"x")], None).await.unwrap();
        store
            .read_group("s", "g", "alice", ReadCursor::New, 1, Duration::ZERO)
            .await
            .unwrap();

        clock.advance(Duration::from_secs(60));
        let again = store
            .read_group("s", "g", "alice", ReadCursor::History, 1, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].id, id);

        let pending = store.pending("s", "g", &PendingQuery::idle_at_least(None, 10)).await.unwrap();
        assert_eq!(pending[0].delivery_count, 2);
        assert_eq!(pending[0].idle, Duration::ZERO);

        let stale = PendingQuery::idle_at_least(Some(Duration::from_secs(30)), 10);
        assert!(store.pending("s", "g", &stale).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn claim_respects_min_idle() {
        let clock = clock_at(10_000);
        let store = InMemoryLogStore::with_clock(clock.clone());
        store.create_group("s", "g", StartId::Latest, true).await.unwrap();
        let id = store.append("s", &[("message", b"x")], None).await.unwrap();
        store
            .read_group("s", "g", "alice", ReadCursor::New, 1, Duration::ZERO)
            .await
            .unwrap();

        clock.advance(Duration::from_millis(50));
        let claimed = store
            .claim("s", "g", "bob", Duration::from_millis(100), &[id])
            .await
            .unwrap();
        assert!(claimed.is_empty());
    }

    #[tokio::test]
    async fn values_expire_on_the_clock() {
        let clock = clock_at(0);
        let store = InMemoryLogStore::with_clock(clock.clone());
        store
            .set("k", b"v", Some(Duration::from_millis(100)))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));

        clock.advance(Duration::from_millis(100));
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let store = InMemoryLogStore::new();
        store.fail_next(LogStoreError::Transport("boom".to_string()));

        assert!(store.scan_streams().await.is_err());
        assert!(store.scan_streams().await.is_ok());
        assert_eq!(store.commands(), vec!["SCAN", "SCAN"]);
    }

    #[tokio::test]
    async fn closed_store_rejects_commands() {
        let store = InMemoryLogStore::new();
        store.close().await;

        assert_eq!(store.get("k").await, Err(LogStoreError::Closed));
        assert!(store.commands().is_empty());
    }
}
