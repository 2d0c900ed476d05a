//! Message identification and message value types.
//!
//! Every entry appended to a stream gets a [`MessageId`] of the form
//! `{milliseconds}-{sequence}`. Ids are strictly increasing within a stream and
//! compare numerically on `(milliseconds, sequence)`, never as plain strings
//! (`"9-0"` sorts before `"10-0"`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Field under which [`Gateway::produce`](crate::Gateway::produce) stores the payload.
pub const PAYLOAD_FIELD: &str = "message";

/// Error type for [`MessageId`] parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid message ID: {0}")]
pub struct ParseMessageIdError(String);

/// Identifier of a single stream entry.
///
/// # Examples
///
/// ```
/// use streamgate_core::message::MessageId;
///
/// let id: MessageId = "1700000000000-0".parse().unwrap();
/// assert_eq!(id.millis(), 1_700_000_000_000);
/// assert_eq!(id.seq(), 0);
/// assert_eq!(id.to_string(), "1700000000000-0");
///
/// let later = MessageId::new(1_700_000_000_000, 1);
/// assert!(later > id);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageId {
    millis: u64,
    seq: u64,
}

impl MessageId {
    /// Smallest possible id (`0-0`).
    pub const MIN: Self = Self { millis: 0, seq: 0 };

    /// Create an id from its two components.
    #[must_use]
    pub const fn new(millis: u64, seq: u64) -> Self {
        Self { millis, seq }
    }

    /// Millisecond part of the id.
    #[must_use]
    pub const fn millis(self) -> u64 {
        self.millis
    }

    /// Sequence number within the millisecond.
    #[must_use]
    pub const fn seq(self) -> u64 {
        self.seq
    }

    /// The id that an append at `now_millis` must receive after `self`.
    ///
    /// Falls back to bumping the sequence when the clock has not moved past
    /// the last id, so ids keep strictly increasing even if the clock stalls
    /// or goes backwards. A full sequence rolls over into the next
    /// millisecond; past `u64::MAX-u64::MAX` the id stays put.
    #[must_use]
    pub const fn successor_at(self, now_millis: u64) -> Self {
        if now_millis > self.millis {
            return Self::new(now_millis, 0);
        }
        match (self.seq.checked_add(1), self.millis.checked_add(1)) {
            (Some(seq), _) => Self::new(self.millis, seq),
            (None, Some(millis)) => Self::new(millis, 0),
            (None, None) => self,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.millis, self.seq)
    }
}

impl FromStr for MessageId {
    type Err = ParseMessageIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (millis, seq) = s
            .split_once('-')
            .ok_or_else(|| ParseMessageIdError(s.to_string()))?;
        let millis = millis
            .parse()
            .map_err(|_| ParseMessageIdError(s.to_string()))?;
        let seq = seq.parse().map_err(|_| ParseMessageIdError(s.to_string()))?;
        Ok(Self { millis, seq })
    }
}

impl TryFrom<String> for MessageId {
    type Error = ParseMessageIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MessageId> for String {
    fn from(id: MessageId) -> Self {
        id.to_string()
    }
}

/// A stream entry: its id plus the field/value pairs it was appended with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Entry id.
    pub id: MessageId,
    /// Field/value pairs, keyed by field name.
    pub fields: BTreeMap<String, Vec<u8>>,
}

impl Message {
    /// Create a message from an id and its fields.
    #[must_use]
    pub const fn new(id: MessageId, fields: BTreeMap<String, Vec<u8>>) -> Self {
        Self { id, fields }
    }

    /// Payload written by `produce`, if this entry carries one.
    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> {
        self.fields.get(PAYLOAD_FIELD).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::expect_used)]
    fn parse_and_display() {
        let id: MessageId = "1700000000000-3".parse().expect("valid id");
        assert_eq!(id, MessageId::new(1_700_000_000_000, 3));
        assert_eq!(format!("{id}"), "1700000000000-3");
    }

    #[test]
    fn parse_rejects_malformed_ids() {
        for bad in ["", "0", ">", "$", "12", "12-", "-3", "a-b", "1-2-3"] {
            assert!(bad.parse::<MessageId>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn ordering_is_numeric_not_lexicographic() {
        let nine = MessageId::new(9, 0);
        let ten = MessageId::new(10, 0);
        assert!(nine < ten);
        assert!("9-0" > "10-0");

        assert!(MessageId::new(10, 1) > MessageId::new(10, 0));
        assert!(MessageId::new(11, 0) > MessageId::new(10, 99));
    }

    #[test]
    fn successor_uses_clock_when_it_advances() {
        let last = MessageId::new(100, 4);
        assert_eq!(last.successor_at(101), MessageId::new(101, 0));
    }

    #[test]
    fn successor_bumps_sequence_when_clock_stalls() {
        let last = MessageId::new(100, 4);
        assert_eq!(last.successor_at(100), MessageId::new(100, 5));
        assert_eq!(last.successor_at(50), MessageId::new(100, 5));
    }

    #[test]
    fn full_sequence_rolls_into_next_millisecond() {
        let last = MessageId::new(100, u64::MAX);
        assert_eq!(last.successor_at(50), MessageId::new(101, 0));
        assert_eq!(last.successor_at(100), MessageId::new(101, 0));
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn serde_uses_string_form() {
        let id = MessageId::new(5, 1);
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"5-1\"");
        let back: MessageId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn payload_reads_message_field() {
        let mut fields = BTreeMap::new();
        fields.insert(PAYLOAD_FIELD.to_string(), b"order1".to_vec());
        let message = Message::new(MessageId::new(1, 0), fields);
        assert_eq!(message.payload(), Some(&b"order1"[..]));

        let bare = Message::new(MessageId::new(1, 1), BTreeMap::new());
        assert_eq!(bare.payload(), None);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn ordering_matches_components(a in any::<(u64, u64)>(), b in any::<(u64, u64)>()) {
                let left = MessageId::new(a.0, a.1);
                let right = MessageId::new(b.0, b.1);
                prop_assert_eq!(left.cmp(&right), a.cmp(&b));
            }

            #[test]
            fn successor_is_always_greater(
                millis in 0_u64..u64::MAX,
                seq in any::<u64>(),
                now in any::<u64>(),
            ) {
                let last = MessageId::new(millis, seq);
                prop_assert!(last.successor_at(now) > last);
            }
        }
    }
}
