//! Stream to group name derivation.
//!
//! Each stream has exactly one consumer group managed by the gateway. Its name
//! is the stream name followed by a fixed suffix, so every operation on the
//! same stream addresses the same group without any lookup.

/// Suffix used when the configuration does not override it.
pub const DEFAULT_GROUP_SUFFIX: &str = "-group";

/// Name of the consumer group that belongs to `stream`.
///
/// # Examples
///
/// ```
/// use streamgate_core::naming::{group_name, DEFAULT_GROUP_SUFFIX};
///
/// assert_eq!(group_name("orders", DEFAULT_GROUP_SUFFIX), "orders-group");
/// ```
#[must_use]
pub fn group_name(stream: &str, suffix: &str) -> String {
    format!("{stream}{suffix}")
}

/// Acknowledgement key left behind by older deployments; removed together
/// with the stream.
#[must_use]
pub fn legacy_ack_key(stream: &str, group: &str) -> String {
    format!("{stream}:{group}:acknowledge")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_name_is_stream_plus_suffix() {
        assert_eq!(group_name("orders", "-group"), "orders-group");
        assert_eq!(group_name("orders", ":g"), "orders:g");
    }

    #[test]
    fn group_name_is_deterministic() {
        assert_eq!(
            group_name("payments", DEFAULT_GROUP_SUFFIX),
            group_name("payments", DEFAULT_GROUP_SUFFIX)
        );
        assert_ne!(
            group_name("payments", DEFAULT_GROUP_SUFFIX),
            group_name("orders", DEFAULT_GROUP_SUFFIX)
        );
    }

    #[test]
    fn legacy_key_layout() {
        assert_eq!(
            legacy_ack_key("orders", "orders-group"),
            "orders:orders-group:acknowledge"
        );
    }
}
