//! Decoding of Redis Streams replies.
//!
//! Every reply is taken apart field by field against the shape documented
//! for its command. Anything unexpected becomes
//! [`LogStoreError::UnexpectedReply`] naming the command and what was wrong,
//! rather than a panic or a silently defaulted value.
//!
//! Both RESP2 (flat `[key, value, ...]` arrays) and RESP3 (maps) are accepted
//! wherever the command returns key/value data.

use redis::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use streamgate_core::{
    ConsumerInfo, GroupInfo, LogStoreError, Message, MessageId, PendingEntry, StreamInfo,
};

type Result<T> = std::result::Result<T, LogStoreError>;

/// Elements of an array (or set) reply.
pub(crate) fn array<'a>(command: &'static str, value: &'a Value) -> Result<&'a [Value]> {
    match value {
        Value::Array(items) | Value::Set(items) => Ok(items),
        other => Err(LogStoreError::unexpected(
            command,
            format!("expected array, got {other:?}"),
        )),
    }
}

/// UTF-8 text from a bulk or simple string.
pub(crate) fn string(command: &'static str, value: &Value) -> Result<String> {
    match value {
        Value::BulkString(bytes) => String::from_utf8(bytes.clone())
            .map_err(|e| LogStoreError::unexpected(command, format!("invalid UTF-8: {e}"))),
        Value::SimpleString(text) => Ok(text.clone()),
        Value::Okay => Ok("OK".to_string()),
        other => Err(LogStoreError::unexpected(
            command,
            format!("expected string, got {other:?}"),
        )),
    }
}

/// Non-negative integer, also accepted in string form.
pub(crate) fn unsigned(command: &'static str, value: &Value) -> Result<u64> {
    match value {
        Value::Int(n) => u64::try_from(*n)
            .map_err(|_| LogStoreError::unexpected(command, format!("negative integer {n}"))),
        Value::BulkString(_) | Value::SimpleString(_) => {
            let text = string(command, value)?;
            text.parse().map_err(|_| {
                LogStoreError::unexpected(command, format!("expected integer, got {text:?}"))
            })
        },
        other => Err(LogStoreError::unexpected(
            command,
            format!("expected integer, got {other:?}"),
        )),
    }
}

/// Entry id in `{millis}-{seq}` form.
pub(crate) fn message_id(command: &'static str, value: &Value) -> Result<MessageId> {
    let text = string(command, value)?;
    text.parse()
        .map_err(|e| LogStoreError::unexpected(command, format!("{e}")))
}

/// Optional bulk string (`GET`).
pub(crate) fn optional_bytes(command: &'static str, value: &Value) -> Result<Option<Vec<u8>>> {
    match value {
        Value::Nil => Ok(None),
        Value::BulkString(bytes) => Ok(Some(bytes.clone())),
        Value::SimpleString(text) => Ok(Some(text.clone().into_bytes())),
        other => Err(LogStoreError::unexpected(
            command,
            format!("expected bulk string, got {other:?}"),
        )),
    }
}

/// Named fields of a key/value reply.
pub(crate) struct Fields<'a> {
    command: &'static str,
    pairs: Vec<(String, &'a Value)>,
}

impl<'a> Fields<'a> {
    /// Read a RESP2 flat array or a RESP3 map.
    pub(crate) fn parse(command: &'static str, value: &'a Value) -> Result<Self> {
        let pairs = match value {
            Value::Map(entries) => entries
                .iter()
                .map(|(key, value)| Ok((string(command, key)?, value)))
                .collect::<Result<Vec<_>>>()?,
            Value::Array(items) => {
                if items.len() % 2 != 0 {
                    return Err(LogStoreError::unexpected(
                        command,
                        format!("odd number of elements ({}) in key/value reply", items.len()),
                    ));
                }
                items
                    .chunks_exact(2)
                    .map(|pair| Ok((string(command, &pair[0])?, &pair[1])))
                    .collect::<Result<Vec<_>>>()?
            },
            other => {
                return Err(LogStoreError::unexpected(
                    command,
                    format!("expected key/value reply, got {other:?}"),
                ));
            },
        };
        Ok(Self { command, pairs })
    }

    fn get(&self, name: &str) -> Result<&'a Value> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| LogStoreError::unexpected(self.command, format!("missing field '{name}'")))
    }

    fn string(&self, name: &str) -> Result<String> {
        string(self.command, self.get(name)?)
    }

    fn unsigned(&self, name: &str) -> Result<u64> {
        unsigned(self.command, self.get(name)?)
    }

    fn message_id(&self, name: &str) -> Result<MessageId> {
        message_id(self.command, self.get(name)?)
    }

    fn entry(&self, name: &str) -> Result<Option<Message>> {
        entry(self.command, self.get(name)?)
    }
}

/// One `[id, [field, value, ...]]` entry. `Nil` (an entry deleted while
/// pending) yields `None`.
pub(crate) fn entry(command: &'static str, value: &Value) -> Result<Option<Message>> {
    if matches!(value, Value::Nil) {
        return Ok(None);
    }

    let parts = array(command, value)?;
    let [id, raw_fields] = parts else {
        return Err(LogStoreError::unexpected(
            command,
            format!("entry has {} elements, expected 2", parts.len()),
        ));
    };

    let id = message_id(command, id)?;
    let mut fields = BTreeMap::new();
    match raw_fields {
        Value::Nil => {},
        Value::Map(entries) => {
            for (key, value) in entries {
                fields.insert(string(command, key)?, field_value(command, value)?);
            }
        },
        other => {
            let flat = array(command, other)?;
            if flat.len() % 2 != 0 {
                return Err(LogStoreError::unexpected(
                    command,
                    format!("entry {id} has an odd number of field elements"),
                ));
            }
            for pair in flat.chunks_exact(2) {
                fields.insert(string(command, &pair[0])?, field_value(command, &pair[1])?);
            }
        },
    }

    Ok(Some(Message::new(id, fields)))
}

fn field_value(command: &'static str, value: &Value) -> Result<Vec<u8>> {
    optional_bytes(command, value)?
        .ok_or_else(|| LogStoreError::unexpected(command, "nil field value"))
}

/// A list of entries, dropping deleted ones.
pub(crate) fn entries(command: &'static str, value: &Value) -> Result<Vec<Message>> {
    if matches!(value, Value::Nil) {
        return Ok(Vec::new());
    }
    let mut messages = Vec::new();
    for item in array(command, value)? {
        if let Some(message) = entry(command, item)? {
            messages.push(message);
        }
    }
    Ok(messages)
}

/// Entries for `stream` in an `XREADGROUP` reply. `Nil` means the block
/// timed out.
pub(crate) fn read_group(stream: &str, value: &Value) -> Result<Vec<Message>> {
    const COMMAND: &str = "XREADGROUP";

    let per_stream: Vec<(String, &Value)> = match value {
        Value::Nil => return Ok(Vec::new()),
        Value::Map(streams) => streams
            .iter()
            .map(|(name, entries)| Ok((string(COMMAND, name)?, entries)))
            .collect::<Result<_>>()?,
        other => array(COMMAND, other)?
            .iter()
            .map(|item| match array(COMMAND, item)? {
                [name, entries] => Ok((string(COMMAND, name)?, entries)),
                parts => Err(LogStoreError::unexpected(
                    COMMAND,
                    format!("stream element has {} parts, expected 2", parts.len()),
                )),
            })
            .collect::<Result<_>>()?,
    };

    per_stream
        .into_iter()
        .find(|(name, _)| name == stream)
        .map_or_else(|| Ok(Vec::new()), |(_, value)| entries(COMMAND, value))
}

/// `XINFO STREAM` reply.
pub(crate) fn stream_info(value: &Value) -> Result<StreamInfo> {
    let fields = Fields::parse("XINFO STREAM", value)?;
    Ok(StreamInfo {
        length: fields.unsigned("length")?,
        radix_tree_keys: fields.unsigned("radix-tree-keys")?,
        radix_tree_nodes: fields.unsigned("radix-tree-nodes")?,
        last_generated_id: fields.message_id("last-generated-id")?,
        groups: fields.unsigned("groups")?,
        first_entry: fields.entry("first-entry")?,
        last_entry: fields.entry("last-entry")?,
    })
}

/// `XINFO GROUPS` reply.
pub(crate) fn groups_info(value: &Value) -> Result<Vec<GroupInfo>> {
    const COMMAND: &str = "XINFO GROUPS";
    array(COMMAND, value)?
        .iter()
        .map(|item| {
            let fields = Fields::parse(COMMAND, item)?;
            Ok(GroupInfo {
                name: fields.string("name")?,
                consumers: fields.unsigned("consumers")?,
                pending: fields.unsigned("pending")?,
                last_delivered_id: fields.message_id("last-delivered-id")?,
            })
        })
        .collect()
}

/// `XINFO CONSUMERS` reply.
pub(crate) fn consumers_info(value: &Value) -> Result<Vec<ConsumerInfo>> {
    const COMMAND: &str = "XINFO CONSUMERS";
    array(COMMAND, value)?
        .iter()
        .map(|item| {
            let fields = Fields::parse(COMMAND, item)?;
            Ok(ConsumerInfo {
                name: fields.string("name")?,
                pending: fields.unsigned("pending")?,
                idle: Duration::from_millis(fields.unsigned("idle")?),
            })
        })
        .collect()
}

/// Extended `XPENDING` reply: `[[id, consumer, idle_ms, deliveries], ...]`.
pub(crate) fn pending(value: &Value) -> Result<Vec<PendingEntry>> {
    const COMMAND: &str = "XPENDING";
    array(COMMAND, value)?
        .iter()
        .map(|item| match array(COMMAND, item)? {
            [id, consumer, idle, deliveries] => Ok(PendingEntry {
                message_id: message_id(COMMAND, id)?,
                consumer: string(COMMAND, consumer)?,
                idle: Duration::from_millis(unsigned(COMMAND, idle)?),
                delivery_count: unsigned(COMMAND, deliveries)?,
            }),
            parts => Err(LogStoreError::unexpected(
                COMMAND,
                format!("pending entry has {} elements, expected 4", parts.len()),
            )),
        })
        .collect()
}

/// One `SCAN` page: next cursor and the keys on this page.
pub(crate) fn scan_page(value: &Value) -> Result<(u64, Vec<String>)> {
    const COMMAND: &str = "SCAN";
    match array(COMMAND, value)? {
        [cursor, keys] => {
            let cursor = unsigned(COMMAND, cursor)?;
            let keys = array(COMMAND, keys)?
                .iter()
                .map(|key| string(COMMAND, key))
                .collect::<Result<_>>()?;
            Ok((cursor, keys))
        },
        parts => Err(LogStoreError::unexpected(
            COMMAND,
            format!("reply has {} elements, expected 2", parts.len()),
        )),
    }
}
