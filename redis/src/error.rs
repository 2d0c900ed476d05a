//! Mapping of Redis errors onto [`LogStoreError`].

use redis::RedisError;
use streamgate_core::LogStoreError;

/// Classify a failed Redis command.
pub(crate) fn classify(err: &RedisError) -> LogStoreError {
    classify_reply(err.code(), &err.to_string())
}

/// Classify by error code and rendered message.
///
/// Stream commands report missing keys through plain `ERR` replies, so the
/// message text has to be inspected as well as the code.
fn classify_reply(code: Option<&str>, message: &str) -> LogStoreError {
    if code == Some("BUSYGROUP") || message.contains("BUSYGROUP") {
        return LogStoreError::GroupExists(message.to_string());
    }
    if code == Some("NOGROUP") || message.contains("NOGROUP") {
        return LogStoreError::NotFound(message.to_string());
    }

    let lower = message.to_ascii_lowercase();
    if lower.contains("no such key") || lower.contains("requires the key to exist") {
        return LogStoreError::NotFound(message.to_string());
    }

    LogStoreError::Transport(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use redis::ErrorKind;

    #[test]
    fn busygroup_means_group_exists() {
        let err = classify_reply(
            Some("BUSYGROUP"),
            "BUSYGROUP: Consumer Group name already exists",
        );
        assert!(matches!(err, LogStoreError::GroupExists(_)));
    }

    #[test]
    fn nogroup_means_not_found() {
        let err = classify_reply(
            Some("NOGROUP"),
            "NOGROUP: No such key 'orders' or consumer group 'orders-group'",
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn missing_stream_means_not_found() {
        let err = classify_reply(Some("ERR"), "An error was signalled by the server - ResponseError: no such key");
        assert!(err.is_not_found());

        let err = classify_reply(
            Some("ERR"),
            "ERR The XGROUP subcommand requires the key to exist",
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn everything_else_is_transport() {
        let err = classify_reply(None, "Connection refused (os error 111)");
        assert_eq!(
            err,
            LogStoreError::Transport("Connection refused (os error 111)".to_string())
        );
    }

    #[test]
    fn classifies_real_redis_errors() {
        let err = RedisError::from((
            ErrorKind::ResponseError,
            "An error was signalled by the server",
            "no such key".to_string(),
        ));
        assert!(classify(&err).is_not_found());

        let err = RedisError::from((ErrorKind::IoError, "connection reset"));
        assert!(matches!(classify(&err), LogStoreError::Transport(_)));
    }
}
