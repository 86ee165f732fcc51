//! Redis-backed invalidation channel.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `REDIS_URL`: Redis connection URL (default: redis://localhost:6379)

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crm_core::{Error, Result, UpdatePublisher, UpdateStream, UpdateSubscriber};

/// Default Redis URL when `REDIS_URL` is unset.
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

fn pubsub_error(e: redis::RedisError) -> Error {
    Error::PubSub(e.to_string())
}

/// Update channel over Redis `PUBLISH`/`SUBSCRIBE`.
///
/// Every subscription opens its own connection. The publishing
/// [`ConnectionManager`] is opened on the first publish and then shared;
/// it reconnects on its own.
#[derive(Clone)]
pub struct RedisUpdateChannel {
    client: redis::Client,
    publisher: Arc<OnceCell<ConnectionManager>>,
}

impl RedisUpdateChannel {
    /// Parse `redis_url`. No connection is opened until the first
    /// subscribe or publish.
    pub fn open(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).map_err(pubsub_error)?;
        info!(
            subsystem = "server",
            component = "pubsub",
            redis_url = %redis_url.replace(|c: char| c.is_ascii_alphanumeric(), "*"),
            "Redis update channel configured"
        );
        Ok(Self {
            client,
            publisher: Arc::new(OnceCell::new()),
        })
    }

    /// Open using `REDIS_URL`.
    pub fn from_env() -> Result<Self> {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string());
        Self::open(&redis_url)
    }

    async fn publisher(&self) -> Result<ConnectionManager> {
        let manager = self
            .publisher
            .get_or_try_init(|| async {
                let manager = ConnectionManager::new(self.client.clone())
                    .await
                    .map_err(pubsub_error)?;
                info!(
                    subsystem = "server",
                    component = "pubsub",
                    "Publisher connected to Redis"
                );
                Ok::<_, Error>(manager)
            })
            .await?;
        Ok(manager.clone())
    }
}

#[async_trait]
impl UpdateSubscriber for RedisUpdateChannel {
    async fn subscribe(&self, channel: &str) -> Result<UpdateStream> {
        let mut pubsub = self.client.get_async_pubsub().await.map_err(pubsub_error)?;
        pubsub.subscribe(channel).await.map_err(pubsub_error)?;

        let channel = channel.to_string();
        let messages = pubsub.into_on_message().filter_map(move |msg| {
            let payload = match msg.get_payload::<String>() {
                Ok(payload) => Some(payload),
                Err(e) => {
                    warn!(
                        subsystem = "server",
                        component = "pubsub",
                        channel = %channel,
                        error = %e,
                        "Dropping update with non-text payload"
                    );
                    None
                }
            };
            futures::future::ready(payload)
        });
        Ok(messages.boxed())
    }
}

#[async_trait]
impl UpdatePublisher for RedisUpdateChannel {
    async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        let mut conn = self.publisher().await?;
        let _receivers: i64 = conn.publish(channel, payload).await.map_err(pubsub_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_pubsub_error() {
        let result = RedisUpdateChannel::open("not a url");
        assert!(matches!(result, Err(Error::PubSub(_))));
    }

    #[test]
    fn test_open_connects_nothing() {
        // Nothing listens on port 1.
        let channel = RedisUpdateChannel::open("redis://127.0.0.1:1").unwrap();
        assert!(!channel.publisher.initialized());
        assert!(!channel.clone().publisher.initialized());
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_publish_reaches_subscriber() {
        let channel = RedisUpdateChannel::from_env().unwrap();
        let mut stream = channel.subscribe("update-test").await.unwrap();

        channel.publish("update-test", "tags").await.unwrap();

        assert_eq!(stream.next().await.as_deref(), Some("tags"));
        assert!(channel.publisher.initialized());
    }
}
