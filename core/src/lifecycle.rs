//! Group and stream lifecycle.
//!
//! Groups are created on demand and idempotently: [`Gateway::ensure_group`]
//! checks for the derived group first and only creates it when it is missing,
//! creating the stream along with it if needed. Deletion is the opposite: it
//! is not idempotent, and a missing group is reported instead of ignored.
//!
//! The existence check and the create are two separate commands. When two
//! callers race between them, the loser's create is rejected with
//! "group already exists", which `ensure_group` treats as success.

use crate::descriptor::{ConsumerInfo, GroupInfo, StreamInfo};
use crate::error::{GatewayError, Result, store_failure};
use crate::gateway::Gateway;
use crate::naming;
use crate::store::{LogStore, LogStoreError, StartId};

impl<S: LogStore> Gateway<S> {
    /// Whether the stream's derived group exists.
    ///
    /// # Errors
    ///
    /// Returns a not-found [`GatewayError::Store`] if the stream itself does
    /// not exist; that case is not reported as `false`.
    pub async fn group_exists(&self, stream: &str) -> Result<bool> {
        let group = self.group_name(stream);
        let groups = self
            .call("group_exists", stream, |store| store.groups_info(stream))
            .await?;
        Ok(contains_group(&groups, &group))
    }

    /// Make sure the stream's derived group exists, creating it (and the
    /// stream) if necessary. Returns `true` once the group exists.
    ///
    /// `start` only applies when the group is actually created. An existing
    /// group keeps its position even if it differs from `start`.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Configuration`] if `persistent` is requested; no
    ///   command is sent in that case
    /// - [`GatewayError::Store`] if a store command fails
    pub async fn ensure_group(&self, stream: &str, start: StartId, persistent: bool) -> Result<bool> {
        if persistent {
            tracing::error!(stream, "Persistent consumer groups are not supported");
            return Err(GatewayError::Configuration(
                "persistent consumer groups are not supported".to_string(),
            ));
        }

        let store = self.open_store("ensure_group")?;
        let group = self.group_name(stream);

        match store.groups_info(stream).await {
            Ok(groups) if contains_group(&groups, &group) => {
                tracing::debug!(
                    stream,
                    group = %group,
                    requested_start = %start.to_wire(),
                    "Group already exists; start position left unchanged"
                );
                return Ok(true);
            },
            // Missing stream: created below together with the group.
            Ok(_) | Err(LogStoreError::NotFound(_)) => {},
            Err(source) => return Err(store_failure("ensure_group", &(stream, start), source)),
        }

        match store.create_group(stream, &group, start, true).await {
            Ok(()) => {
                tracing::debug!(
                    stream,
                    group = %group,
                    start = %start.to_wire(),
                    "Group created"
                );
                Ok(true)
            },
            Err(LogStoreError::GroupExists(_)) => {
                tracing::debug!(stream, group = %group, "Group created concurrently by another caller");
                Ok(true)
            },
            Err(source) => Err(store_failure("ensure_group", &(stream, start), source)),
        }
    }

    /// Destroy the stream's derived group.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the group or the stream does not exist.
    pub async fn delete_group(&self, stream: &str) -> Result<bool> {
        let group = self.group_name(stream);
        let destroyed = self
            .call("delete_group", stream, |store| {
                store.destroy_group(stream, &group)
            })
            .await?;

        if !destroyed {
            tracing::error!(stream, group = %group, "Group to delete does not exist");
            return Err(GatewayError::NotFound {
                operation: "delete_group",
                what: format!("group '{group}' on stream '{stream}'"),
            });
        }

        tracing::debug!(stream, group = %group, "Group destroyed");
        Ok(true)
    }

    /// Every group attached to the stream.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the stream does not exist.
    pub async fn list_groups(&self, stream: &str) -> Result<Vec<GroupInfo>> {
        self.call("list_groups", stream, |store| store.groups_info(stream))
            .await
    }

    /// Consumers of the stream's derived group.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the stream or group does not exist.
    pub async fn list_consumers(&self, stream: &str) -> Result<Vec<ConsumerInfo>> {
        let group = self.group_name(stream);
        self.call("list_consumers", stream, |store| {
            store.consumers_info(stream, &group)
        })
        .await
    }

    /// Whether a stream with this name exists.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Store`] if the key scan fails.
    pub async fn stream_exists(&self, stream: &str) -> Result<bool> {
        let streams = self
            .call("stream_exists", stream, |store| store.scan_streams())
            .await?;
        Ok(streams.iter().any(|name| name == stream))
    }

    /// Snapshot of the stream.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the stream does not exist.
    pub async fn stream_info(&self, stream: &str) -> Result<StreamInfo> {
        self.call("stream_info", stream, |store| store.stream_info(stream))
            .await
    }

    /// Delete the stream and all of its entries.
    ///
    /// Also removes the `{stream}:{group}:acknowledge` key older deployments
    /// kept next to the stream.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Store`] if the delete fails.
    pub async fn delete_stream(&self, stream: &str) -> Result<()> {
        let legacy_key = naming::legacy_ack_key(stream, &self.group_name(stream));
        let keys = [stream, legacy_key.as_str()];
        let removed = self
            .call("delete_stream", stream, |store| store.delete(&keys))
            .await?;

        tracing::debug!(stream, removed, "Stream deleted");
        Ok(())
    }

    /// Delete the derived group, then the stream.
    ///
    /// Stops at the first failure, so a missing group leaves the stream in
    /// place.
    ///
    /// # Errors
    ///
    /// Returns the error of whichever step failed.
    pub async fn delete_queue(&self, stream: &str) -> Result<()> {
        self.delete_group(stream).await?;
        self.delete_stream(stream).await
    }
}

fn contains_group(groups: &[GroupInfo], name: &str) -> bool {
    groups.iter().any(|group| group.name == name)
}
