use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::identity::ActorIdentity;
use crate::ports::dogs::DogRepository;
use crate::ports::messaging::MessageRepository;
use crate::ports::profiles::ProfileRepository;
use crate::util::now_ms;

const MAX_BODY_LENGTH: usize = 2_000;
const MAX_MARK_READ_BATCH: usize = 200;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub message_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub dog_id: Option<String>,
    pub body: String,
    pub is_read: bool,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

/// One distinct counterpart thread from the raw message table.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversationHead {
    pub other_user_id: String,
    pub dog_id: Option<String>,
    pub last_message: String,
    pub last_message_at_ms: i64,
    pub unread_count: u64,
}

/// Head enriched with counterpart profile and dog labels, the shape the
/// conversations listing serves.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Conversation {
    pub user_id: String,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub last_message: String,
    pub last_message_at_ms: i64,
    pub unread_count: u64,
    pub dog_id: Option<String>,
    pub dog_name: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SendMessageInput {
    pub receiver_id: String,
    pub body: String,
    pub dog_id: Option<String>,
}

#[derive(Clone)]
pub struct MessagingService {
    messages: Arc<dyn MessageRepository>,
    profiles: Arc<dyn ProfileRepository>,
    dogs: Arc<dyn DogRepository>,
}

impl MessagingService {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        profiles: Arc<dyn ProfileRepository>,
        dogs: Arc<dyn DogRepository>,
    ) -> Self {
        Self {
            messages,
            profiles,
            dogs,
        }
    }

    /// Both directions of the pair, ascending by creation time, optionally
    /// narrowed to one dog's thread.
    pub async fn list_conversation(
        &self,
        actor: &ActorIdentity,
        other_user_id: &str,
        dog_id: Option<&str>,
    ) -> DomainResult<Vec<ChatMessage>> {
        self.messages
            .list_between(&actor.user_id, other_user_id, dog_id)
            .await
    }

    pub async fn send(
        &self,
        actor: &ActorIdentity,
        input: SendMessageInput,
    ) -> DomainResult<ChatMessage> {
        let receiver_id = input.receiver_id.trim().to_string();
        let body = input.body.trim().to_string();
        if receiver_id.is_empty() {
            return Err(DomainError::Validation("receiver_id is required".into()));
        }
        if receiver_id == actor.user_id {
            return Err(DomainError::Validation(
                "cannot send a message to yourself".into(),
            ));
        }
        validate_body(&body)?;

        let now = now_ms();
        let message = ChatMessage {
            message_id: crate::util::uuid_v7_without_dashes(),
            sender_id: actor.user_id.clone(),
            receiver_id,
            dog_id: input.dog_id.filter(|dog_id| !dog_id.trim().is_empty()),
            body,
            is_read: false,
            created_at_ms: now,
            updated_at_ms: now,
        };
        self.messages.create(&message).await
    }

    pub async fn mark_read(&self, message_ids: &[String]) -> DomainResult<()> {
        if message_ids.is_empty() {
            return Ok(());
        }
        if message_ids.len() > MAX_MARK_READ_BATCH {
            return Err(DomainError::Validation(format!(
                "mark-read batch exceeds max of {MAX_MARK_READ_BATCH}"
            )));
        }
        self.messages.mark_read(message_ids).await
    }

    pub async fn unread_count(&self, actor: &ActorIdentity) -> DomainResult<u64> {
        self.messages.unread_count(&actor.user_id).await
    }

    /// Only the sender may remove a message.
    pub async fn delete(&self, actor: &ActorIdentity, message_id: &str) -> DomainResult<()> {
        let message = self
            .messages
            .get(message_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if message.sender_id != actor.user_id {
            return Err(DomainError::Validation(
                "only the sender can delete a message".into(),
            ));
        }
        self.messages.delete(message_id).await
    }

    /// Distinct counterpart threads with last message and unread count,
    /// enriched with counterpart and dog labels.
    pub async fn conversations(&self, actor: &ActorIdentity) -> DomainResult<Vec<Conversation>> {
        let heads = self.messages.conversation_heads(&actor.user_id).await?;
        let mut conversations = Vec::with_capacity(heads.len());
        for head in heads {
            let profile = self.profiles.get(&head.other_user_id).await?;
            let (user_name, user_avatar) = match profile {
                Some(profile) => (profile.display_name(), profile.avatar_url),
                None => (head.other_user_id.clone(), None),
            };
            let dog_name = match head.dog_id.as_deref() {
                Some(dog_id) => self.dogs.get(dog_id).await?.map(|dog| dog.name),
                None => None,
            };
            conversations.push(Conversation {
                user_id: head.other_user_id,
                user_name,
                user_avatar,
                last_message: head.last_message,
                last_message_at_ms: head.last_message_at_ms,
                unread_count: head.unread_count,
                dog_id: head.dog_id,
                dog_name,
            });
        }
        Ok(conversations)
    }
}

/// Groups a user's raw messages into distinct (counterpart, dog) threads
/// with last message and unread count, newest thread first. Shared by the
/// repository implementations.
pub fn aggregate_conversation_heads(
    messages: &[ChatMessage],
    user_id: &str,
) -> Vec<ConversationHead> {
    use std::collections::HashMap;

    let mut heads: HashMap<(String, Option<String>), ConversationHead> = HashMap::new();
    for message in messages {
        let other = if message.sender_id == user_id {
            message.receiver_id.clone()
        } else if message.receiver_id == user_id {
            message.sender_id.clone()
        } else {
            continue;
        };
        let key = (other.clone(), message.dog_id.clone());
        let unread = u64::from(message.receiver_id == user_id && !message.is_read);
        let entry = heads.entry(key).or_insert_with(|| ConversationHead {
            other_user_id: other,
            dog_id: message.dog_id.clone(),
            last_message: message.body.clone(),
            last_message_at_ms: message.created_at_ms,
            unread_count: 0,
        });
        entry.unread_count += unread;
        if message.created_at_ms >= entry.last_message_at_ms {
            entry.last_message = message.body.clone();
            entry.last_message_at_ms = message.created_at_ms;
        }
    }
    let mut heads: Vec<_> = heads.into_values().collect();
    heads.sort_by(|a, b| b.last_message_at_ms.cmp(&a.last_message_at_ms));
    heads
}

fn validate_body(body: &str) -> DomainResult<()> {
    if body.is_empty() {
        return Err(DomainError::Validation("body is required".into()));
    }
    if body.chars().count() > MAX_BODY_LENGTH {
        return Err(DomainError::Validation(format!(
            "body exceeds max length of {MAX_BODY_LENGTH}"
        )));
    }
    Ok(())
}
