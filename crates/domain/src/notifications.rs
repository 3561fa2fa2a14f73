use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::identity::ActorIdentity;
use crate::ports::notifications::NotificationPreferenceRepository;
use crate::util::now_ms;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationPreferences {
    pub user_id: String,
    pub new_dogs: bool,
    pub messages: bool,
    pub appointments: bool,
    pub adoption_status: bool,
    pub followups: bool,
    pub favorites_updates: bool,
    pub push_token: Option<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl NotificationPreferences {
    /// Everything on, no push token.
    pub fn defaults_for(user_id: &str, now_ms: i64) -> Self {
        Self {
            user_id: user_id.to_string(),
            new_dogs: true,
            messages: true,
            appointments: true,
            adoption_status: true,
            followups: true,
            favorites_updates: true,
            push_token: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct NotificationPreferencesUpdate {
    pub new_dogs: Option<bool>,
    pub messages: Option<bool>,
    pub appointments: Option<bool>,
    pub adoption_status: Option<bool>,
    pub followups: Option<bool>,
    pub favorites_updates: Option<bool>,
}

#[derive(Clone)]
pub struct NotificationService {
    repository: Arc<dyn NotificationPreferenceRepository>,
}

impl NotificationService {
    pub fn new(repository: Arc<dyn NotificationPreferenceRepository>) -> Self {
        Self { repository }
    }

    /// First read lazily creates the default row.
    pub async fn get_preferences(
        &self,
        actor: &ActorIdentity,
    ) -> DomainResult<NotificationPreferences> {
        if let Some(preferences) = self.repository.get(&actor.user_id).await? {
            return Ok(preferences);
        }
        let defaults = NotificationPreferences::defaults_for(&actor.user_id, now_ms());
        match self.repository.insert(&defaults).await {
            Ok(preferences) => Ok(preferences),
            // A concurrent first read may have inserted already.
            Err(DomainError::Conflict) => self
                .repository
                .get(&actor.user_id)
                .await?
                .ok_or(DomainError::Conflict),
            Err(err) => Err(err),
        }
    }

    pub async fn update_preferences(
        &self,
        actor: &ActorIdentity,
        update: NotificationPreferencesUpdate,
    ) -> DomainResult<NotificationPreferences> {
        self.get_preferences(actor).await?;
        self.repository
            .update(&actor.user_id, &update, now_ms())
            .await
    }

    pub async fn save_push_token(
        &self,
        actor: &ActorIdentity,
        push_token: String,
    ) -> DomainResult<NotificationPreferences> {
        let push_token = push_token.trim().to_string();
        if push_token.is_empty() {
            return Err(DomainError::Validation("push_token is required".into()));
        }
        self.get_preferences(actor).await?;
        self.repository
            .set_push_token(&actor.user_id, Some(push_token), now_ms())
            .await
    }

    pub async fn remove_push_token(
        &self,
        actor: &ActorIdentity,
    ) -> DomainResult<NotificationPreferences> {
        self.get_preferences(actor).await?;
        self.repository
            .set_push_token(&actor.user_id, None, now_ms())
            .await
    }
}
