use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::sync::broadcast;

use crate::messaging::ChatMessage;

const CHANNEL_CAPACITY: usize = 256;

/// Stable key for the unordered user pair, optionally narrowed to one dog's
/// thread.
pub fn conversation_key(user_a: &str, user_b: &str, dog_id: Option<&str>) -> String {
    let (low, high) = if user_a <= user_b {
        (user_a, user_b)
    } else {
        (user_b, user_a)
    };
    match dog_id {
        Some(dog_id) if !dog_id.is_empty() => format!("{low}:{high}:{dog_id}"),
        _ => format!("{low}:{high}"),
    }
}

/// In-process publish/subscribe feed for chat delivery. Subscribing hands
/// back a broadcast receiver; dropping it unsubscribes. Channels with no
/// remaining receivers are pruned on the next publish.
#[derive(Clone, Default)]
pub struct MessageFeed {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<ChatMessage>>>>,
}

impl MessageFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self, key: &str) -> broadcast::Receiver<ChatMessage> {
        let mut channels = self.channels.write().await;
        channels
            .entry(key.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Delivers to current subscribers; returns how many received it.
    pub async fn publish(&self, key: &str, message: ChatMessage) -> usize {
        let mut channels = self.channels.write().await;
        let Some(sender) = channels.get(key) else {
            return 0;
        };
        if sender.receiver_count() == 0 {
            channels.remove(key);
            return 0;
        }
        sender.send(message).unwrap_or(0)
    }

    pub async fn subscriber_count(&self, key: &str) -> usize {
        self.channels
            .read()
            .await
            .get(key)
            .map(broadcast::Sender::receiver_count)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(body: &str) -> ChatMessage {
        ChatMessage {
            message_id: crate::util::uuid_v7_without_dashes(),
            sender_id: "user-a".to_string(),
            receiver_id: "user-b".to_string(),
            dog_id: None,
            body: body.to_string(),
            is_read: false,
            created_at_ms: 1,
            updated_at_ms: 1,
        }
    }

    #[test]
    fn conversation_key_is_order_independent() {
        assert_eq!(
            conversation_key("user-a", "user-b", None),
            conversation_key("user-b", "user-a", None)
        );
        assert_ne!(
            conversation_key("user-a", "user-b", Some("dog-1")),
            conversation_key("user-a", "user-b", None)
        );
    }

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let feed = MessageFeed::new();
        let key = conversation_key("user-a", "user-b", None);
        let mut receiver = feed.subscribe(&key).await;

        let delivered = feed.publish(&key, message("hola")).await;
        assert_eq!(delivered, 1);
        let received = receiver.recv().await.expect("receive");
        assert_eq!(received.body, "hola");
    }

    #[tokio::test]
    async fn dropping_receiver_unsubscribes_and_channel_is_pruned() {
        let feed = MessageFeed::new();
        let key = conversation_key("user-a", "user-b", None);
        let receiver = feed.subscribe(&key).await;
        assert_eq!(feed.subscriber_count(&key).await, 1);

        drop(receiver);
        assert_eq!(feed.publish(&key, message("hola")).await, 0);
        assert_eq!(feed.subscriber_count(&key).await, 0);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_no_op() {
        let feed = MessageFeed::new();
        let key = conversation_key("user-a", "user-b", Some("dog-1"));
        assert_eq!(feed.publish(&key, message("hola")).await, 0);
    }
}
