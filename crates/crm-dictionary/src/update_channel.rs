//! In-process invalidation channel and the publisher helper used by write
//! paths.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, error, warn};

use crm_core::defaults::{UPDATE_CHANNEL, UPDATE_CHANNEL_CAPACITY};
use crm_core::{Result, UpdatePublisher, UpdateStream, UpdateSubscriber};

/// Broadcast-backed pub/sub for single-process deployments and tests.
///
/// Like the networked transport, delivery is at-most-once: messages sent
/// while nobody is subscribed are dropped, and a lagging subscriber skips
/// what it missed.
#[derive(Clone)]
pub struct InMemoryUpdateChannel {
    sender: broadcast::Sender<(String, String)>,
}

impl Default for InMemoryUpdateChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUpdateChannel {
    pub fn new() -> Self {
        Self::with_capacity(UPDATE_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl UpdateSubscriber for InMemoryUpdateChannel {
    async fn subscribe(&self, channel: &str) -> Result<UpdateStream> {
        use tokio_stream::StreamExt as _;

        let channel = channel.to_string();
        let stream = BroadcastStream::new(self.sender.subscribe()).filter_map(
            move |received: std::result::Result<(String, String), _>| match received {
                Ok((topic, payload)) => (topic == channel).then_some(payload),
                Err(BroadcastStreamRecvError::Lagged(missed)) => {
                    warn!(
                        subsystem = "dictionary",
                        component = "pubsub",
                        channel = %channel,
                        missed,
                        "Update subscriber lagged, messages dropped"
                    );
                    None
                }
            },
        );
        Ok(Box::pin(stream))
    }
}

#[async_trait]
impl UpdatePublisher for InMemoryUpdateChannel {
    async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        // No receivers is not an error: the message is simply not delivered.
        let delivered = self
            .sender
            .send((channel.to_string(), payload.to_string()))
            .unwrap_or(0);
        debug!(
            subsystem = "dictionary",
            component = "pubsub",
            channel,
            payload,
            delivered,
            "Published update"
        );
        Ok(())
    }
}

/// Announce a committed mutation on the update channel.
///
/// `tag` names the mutated category and is only used for logging on the
/// receiving side. Failures are logged and swallowed; the timed refresh
/// catches up with anything a lost message would have triggered.
pub async fn publish_update(publisher: &dyn UpdatePublisher, tag: &str) {
    if let Err(e) = publisher.publish(UPDATE_CHANNEL, tag).await {
        error!(
            subsystem = "dictionary",
            component = "pubsub",
            channel = UPDATE_CHANNEL,
            payload = tag,
            error = %e,
            "Failed to publish update"
        );
    }
}
