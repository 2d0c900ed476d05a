//! Two-phase consumer reads.
//!
//! Each [`Gateway::consume`] call first asks the group for entries already
//! delivered to this consumer but never acknowledged (cursor `0`). Only if
//! there are none does it ask for entries never delivered to anyone (cursor
//! `>`). A consumer that crashed mid-processing therefore gets its unfinished
//! work back before anything new.
//!
//! At most one message is returned per call, and each phase may wait up to
//! the block duration, so a call can take up to twice that long.

use crate::error::Result;
use crate::gateway::Gateway;
use crate::message::Message;
use crate::store::{LogStore, ReadCursor};
use futures::Stream;
use std::pin::Pin;
use std::time::Duration;

/// Messages per `consume` call.
const MESSAGES_PER_READ: usize = 1;

/// Stream of messages produced by [`Gateway::messages`].
pub type MessageStream<'a> = Pin<Box<dyn Stream<Item = Result<Message>> + Send + 'a>>;

impl<S: LogStore> Gateway<S> {
    /// Fetch the next message for `consumer`, or `None` if nothing arrived
    /// within the timeout.
    ///
    /// Unacknowledged messages already owned by `consumer` come first. `timeout`
    /// of `None` or zero uses the configured block duration.
    ///
    /// # Errors
    ///
    /// Returns a not-found [`GatewayError::Store`](crate::GatewayError::Store)
    /// if the stream's group does not exist.
    pub async fn consume(
        &self,
        stream: &str,
        consumer: &str,
        timeout: Option<Duration>,
    ) -> Result<Option<Message>> {
        let group = self.group_name(stream);
        let block = self.block_for(timeout);

        if let Some(message) = self
            .read_one(stream, &group, consumer, ReadCursor::History, block)
            .await?
        {
            tracing::debug!(
                stream,
                group = %group,
                consumer,
                id = %message.id,
                "Redelivering unacknowledged message"
            );
            return Ok(Some(message));
        }

        let message = self
            .read_one(stream, &group, consumer, ReadCursor::New, block)
            .await?;
        if let Some(message) = &message {
            tracing::debug!(
                stream,
                group = %group,
                consumer,
                id = %message.id,
                "Message consumed"
            );
        }
        Ok(message)
    }

    /// Endless stream of messages for `consumer`, built on [`Gateway::consume`].
    ///
    /// Empty polls are skipped. The stream ends right after yielding its first
    /// error; after [`Gateway::close`] that error is
    /// [`GatewayError::Closed`](crate::GatewayError::Closed).
    ///
    /// Messages are not acknowledged automatically. Acknowledge each one before
    /// polling the next, otherwise the history phase hands it out again.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use futures::StreamExt;
    /// use streamgate_core::{Gateway, LogStore};
    ///
    /// async fn run<S: LogStore>(gateway: &Gateway<S>) -> Result<(), streamgate_core::GatewayError> {
    ///     let mut messages = gateway.messages("orders", "worker-1");
    ///     while let Some(message) = messages.next().await {
    ///         let message = message?;
    ///         gateway.ack("orders", &[message.id]).await?;
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub fn messages<'a>(&'a self, stream: &'a str, consumer: &'a str) -> MessageStream<'a> {
        let stream_of_messages = async_stream::stream! {
            loop {
                match self.consume(stream, consumer, None).await {
                    Ok(Some(message)) => yield Ok(message),
                    Ok(None) => {},
                    Err(e) => {
                        yield Err(e);
                        break;
                    },
                }
            }
        };
        Box::pin(stream_of_messages)
    }

    async fn read_one(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        cursor: ReadCursor,
        block: Duration,
    ) -> Result<Option<Message>> {
        let messages = self
            .call(
                "consume",
                (stream, group, consumer, cursor.as_str(), block),
                |store| store.read_group(stream, group, consumer, cursor, MESSAGES_PER_READ, block),
            )
            .await?;
        Ok(messages.into_iter().next())
    }

    fn block_for(&self, timeout: Option<Duration>) -> Duration {
        match timeout {
            Some(timeout) if !timeout.is_zero() => timeout,
            _ => self.config().block(),
        }
    }
}
