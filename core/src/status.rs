//! Queue status snapshots.

use crate::descriptor::QueueStatus;
use crate::error::Result;
use crate::gateway::Gateway;
use crate::store::LogStore;

impl<S: LogStore> Gateway<S> {
    /// Stream info, the derived group's consumers and all groups of `stream`.
    ///
    /// The three parts are read one after another, not atomically.
    ///
    /// # Errors
    ///
    /// Returns the first failing read's error, e.g. not-found if the stream or
    /// group does not exist.
    pub async fn status(&self, stream: &str) -> Result<QueueStatus> {
        let info = self.stream_info(stream).await?;
        let consumers = self.list_consumers(stream).await?;
        let groups = self.list_groups(stream).await?;

        Ok(QueueStatus {
            info,
            consumers,
            groups,
        })
    }
}
