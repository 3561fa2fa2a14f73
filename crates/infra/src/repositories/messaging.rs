use std::collections::HashMap;
use std::sync::Arc;

use patitas_domain::DomainResult;
use patitas_domain::error::DomainError;
use patitas_domain::messaging::{ChatMessage, ConversationHead, aggregate_conversation_heads};
use patitas_domain::ports::BoxFuture;
use patitas_domain::ports::messaging::MessageRepository;
use serde_json::Value;
use surrealdb::{Surreal, engine::remote::ws::Client};
use tokio::sync::RwLock;

use super::surreal::{connect, count_from_rows, decode_rows, map_surreal_error};
use crate::db::DbConfig;

const MESSAGE_FIELDS: &str = "SELECT * OMIT id FROM messages";

#[derive(Default)]
pub struct InMemoryMessageRepository {
    store: Arc<RwLock<HashMap<String, ChatMessage>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageRepository for InMemoryMessageRepository {
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
            let mut messages: Vec<_> = store
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
            messages.sort_by(|a, b| {
                a.created_at_ms
                    .cmp(&b.created_at_ms)
                    .then_with(|| a.message_id.cmp(&b.message_id))
            });
            Ok(messages)
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
            let messages: Vec<ChatMessage> = store.read().await.values().cloned().collect();
            Ok(aggregate_conversation_heads(&messages, &user_id))
        })
    }
}

#[derive(Clone)]
pub struct SurrealMessageRepository {
    client: Arc<Surreal<Client>>,
}

impl SurrealMessageRepository {
    pub fn with_client(client: Arc<Surreal<Client>>) -> Self {
        Self { client }
    }

    pub async fn new(db_config: &DbConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: connect(db_config).await?,
        })
    }
}

impl MessageRepository for SurrealMessageRepository {
    fn create(&self, message: &ChatMessage) -> BoxFuture<'_, DomainResult<ChatMessage>> {
        let message = message.clone();
        let client = self.client.clone();
        Box::pin(async move {
            let data = serde_json::to_value(&message).map_err(|err| {
                DomainError::Validation(format!("invalid message payload: {err}"))
            })?;
            let response = client
                .query("CREATE messages CONTENT $data")
                .bind(("data", data))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(message)
        })
    }

    fn get(&self, message_id: &str) -> BoxFuture<'_, DomainResult<Option<ChatMessage>>> {
        let message_id = message_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query(format!("{MESSAGE_FIELDS} WHERE message_id = $message_id LIMIT 1"))
                .bind(("message_id", message_id))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            Ok(decode_rows::<ChatMessage>(rows, "message")?.into_iter().next())
        })
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
        let client = self.client.clone();
        Box::pin(async move {
            let mut sql = format!(
                "{MESSAGE_FIELDS} WHERE ((sender_id = $user_a AND receiver_id = $user_b) \
                 OR (sender_id = $user_b AND receiver_id = $user_a))"
            );
            if dog_id.is_some() {
                sql.push_str(" AND dog_id = $dog_id");
            }
            sql.push_str(" ORDER BY created_at_ms ASC, message_id ASC");

            let mut handle = client
                .query(&sql)
                .bind(("user_a", user_a))
                .bind(("user_b", user_b));
            if let Some(dog_id) = dog_id {
                handle = handle.bind(("dog_id", dog_id));
            }
            let mut response = handle.await.map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            decode_rows(rows, "message")
        })
    }

    fn mark_read(&self, message_ids: &[String]) -> BoxFuture<'_, DomainResult<()>> {
        let message_ids = message_ids.to_vec();
        let client = self.client.clone();
        Box::pin(async move {
            let response = client
                .query("UPDATE messages SET is_read = true WHERE message_id IN $message_ids")
                .bind(("message_ids", message_ids))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(())
        })
    }

    fn unread_count(&self, receiver_id: &str) -> BoxFuture<'_, DomainResult<u64>> {
        let receiver_id = receiver_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query(
                    "SELECT count() AS count FROM messages \
                     WHERE receiver_id = $receiver_id AND is_read = false GROUP ALL",
                )
                .bind(("receiver_id", receiver_id))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            Ok(count_from_rows(rows))
        })
    }

    fn delete(&self, message_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let message_id = message_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let response = client
                .query("DELETE messages WHERE message_id = $message_id")
                .bind(("message_id", message_id))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(())
        })
    }

    fn conversation_heads(
        &self,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<ConversationHead>>> {
        let user_id = user_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query(format!(
                    "{MESSAGE_FIELDS} WHERE sender_id = $user_id OR receiver_id = $user_id"
                ))
                .bind(("user_id", user_id.clone()))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            let messages: Vec<ChatMessage> = decode_rows(rows, "message")?;
            Ok(aggregate_conversation_heads(&messages, &user_id))
        })
    }
}
