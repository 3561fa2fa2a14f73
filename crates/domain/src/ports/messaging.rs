use crate::DomainResult;
use crate::messaging::{ChatMessage, ConversationHead};

use super::BoxFuture;

#[allow(clippy::needless_pass_by_value)]
pub trait MessageRepository: Send + Sync {
    fn create(&self, message: &ChatMessage) -> BoxFuture<'_, DomainResult<ChatMessage>>;

    fn get(&self, message_id: &str) -> BoxFuture<'_, DomainResult<Option<ChatMessage>>>;

    /// Messages in both directions between the pair, ascending by creation
    /// time, optionally filtered to one dog's thread.
    fn list_between(
        &self,
        user_a: &str,
        user_b: &str,
        dog_id: Option<&str>,
    ) -> BoxFuture<'_, DomainResult<Vec<ChatMessage>>>;

    fn mark_read(&self, message_ids: &[String]) -> BoxFuture<'_, DomainResult<()>>;

    fn unread_count(&self, receiver_id: &str) -> BoxFuture<'_, DomainResult<u64>>;

    fn delete(&self, message_id: &str) -> BoxFuture<'_, DomainResult<()>>;

    /// Distinct (counterpart, dog) threads for a user, newest first.
    fn conversation_heads(
        &self,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<ConversationHead>>>;
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::Arc;

    use tokio::sync::RwLock;

    use super::*;
    use crate::error::DomainError;

    #[derive(Default)]
    pub struct InMemoryMessageStore {
        store: Arc<RwLock<HashMap<String, ChatMessage>>>,
    }

    fn sorted_ascending(mut messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
        messages.sort_by(|a, b| {
            a.created_at_ms
                .cmp(&b.created_at_ms)
                .then_with(|| a.message_id.cmp(&b.message_id))
        });
        messages
    }

    impl MessageRepository for InMemoryMessageStore {
        fn create(&self, message: &ChatMessage) -> BoxFuture<'_, DomainResult<ChatMessage>> {
            let message = message.clone();
            let store = self.store.clone();
            Box::pin(async move {
                let mut store = store.write().await;
                if store.contains_key(&message.message_id) {
                    return Err(DomainError::Conflict);
                }
                store.insert(message.message_id.clone(), message.clone());
                Ok(message)
            })
        }

        fn get(&self, message_id: &str) -> BoxFuture<'_, DomainResult<Option<ChatMessage>>> {
            let message_id = message_id.to_string();
            let store = self.store.clone();
            Box::pin(async move { Ok(store.read().await.get(&message_id).cloned()) })
        }

        fn list_between(
            &self,
            user_a: &str,
            user_b: &str,
            dog_id: Option<&str>,
        ) -> BoxFuture<'_, DomainResult<Vec<ChatMessage>>> {
            let user_a = user_a.to_string();
            let user_b = user_b.to_string();
            let dog_id = dog_id.map(str::to_string);
            let store = self.store.clone();
            Box::pin(async move {
                let messages: Vec<_> = store
                    .read()
                    .await
                    .values()
                    .filter(|message| {
                        let pair_match = (message.sender_id == user_a
                            && message.receiver_id == user_b)
                            || (message.sender_id == user_b && message.receiver_id == user_a);
                        pair_match
                            && dog_id
                                .as_deref()
                                .is_none_or(|dog_id| message.dog_id.as_deref() == Some(dog_id))
                    })
                    .cloned()
                    .collect();
                Ok(sorted_ascending(messages))
            })
        }

        fn mark_read(&self, message_ids: &[String]) -> BoxFuture<'_, DomainResult<()>> {
            let message_ids = message_ids.to_vec();
            let store = self.store.clone();
            Box::pin(async move {
                let mut store = store.write().await;
                for message_id in &message_ids {
                    if let Some(message) = store.get_mut(message_id) {
                        message.is_read = true;
                    }
                }
                Ok(())
            })
        }

        fn unread_count(&self, receiver_id: &str) -> BoxFuture<'_, DomainResult<u64>> {
            let receiver_id = receiver_id.to_string();
            let store = self.store.clone();
            Box::pin(async move {
                let count = store
                    .read()
                    .await
                    .values()
                    .filter(|message| message.receiver_id == receiver_id && !message.is_read)
                    .count();
                Ok(count as u64)
            })
        }

        fn delete(&self, message_id: &str) -> BoxFuture<'_, DomainResult<()>> {
            let message_id = message_id.to_string();
            let store = self.store.clone();
            Box::pin(async move {
                store
                    .write()
                    .await
                    .remove(&message_id)
                    .map(|_| ())
                    .ok_or(DomainError::NotFound)
            })
        }

        fn conversation_heads(
            &self,
            user_id: &str,
        ) -> BoxFuture<'_, DomainResult<Vec<ConversationHead>>> {
            let user_id = user_id.to_string();
            let store = self.store.clone();
            Box::pin(async move {
                let messages: Vec<ChatMessage> =
                    store.read().await.values().cloned().collect();
                Ok(crate::messaging::aggregate_conversation_heads(
                    &messages, &user_id,
                ))
            })
        }
    }
}
