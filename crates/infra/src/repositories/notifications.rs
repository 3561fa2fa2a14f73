use std::collections::HashMap;
use std::sync::Arc;

use patitas_domain::DomainResult;
use patitas_domain::error::DomainError;
use patitas_domain::notifications::{NotificationPreferences, NotificationPreferencesUpdate};
use patitas_domain::ports::BoxFuture;
use patitas_domain::ports::notifications::{
    NotificationPreferenceRepository, apply_preferences_update,
};
use serde_json::Value;
use surrealdb::{Surreal, engine::remote::ws::Client};
use tokio::sync::RwLock;

use super::surreal::{connect, decode_rows, map_surreal_error};
use crate::db::DbConfig;

const PREFERENCE_FIELDS: &str = "SELECT * OMIT id FROM notification_preferences";

#[derive(Default)]
pub struct InMemoryNotificationRepository {
    store: Arc<RwLock<HashMap<String, NotificationPreferences>>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationPreferenceRepository for InMemoryNotificationRepository {
    fn get(
        &self,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<NotificationPreferences>>> {
        let user_id = user_id.to_string();
        let store = self.store.clone();
        Box::pin(async move { Ok(store.read().await.get(&user_id).cloned()) })
    }

    fn insert(
        &self,
        preferences: &NotificationPreferences,
    ) -> BoxFuture<'_, DomainResult<NotificationPreferences>> {
        let preferences = preferences.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            if store.contains_key(&preferences.user_id) {
                return Err(DomainError::Conflict);
            }
            store.insert(preferences.user_id.clone(), preferences.clone());
            Ok(preferences)
        })
    }

    fn update(
        &self,
        user_id: &str,
        update: &NotificationPreferencesUpdate,
        updated_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<NotificationPreferences>> {
        let user_id = user_id.to_string();
        let update = update.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            let preferences = store.get_mut(&user_id).ok_or(DomainError::NotFound)?;
            apply_preferences_update(preferences, &update, updated_at_ms);
            Ok(preferences.clone())
        })
    }

    fn set_push_token(
        &self,
        user_id: &str,
        push_token: Option<String>,
        updated_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<NotificationPreferences>> {
        let user_id = user_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            let preferences = store.get_mut(&user_id).ok_or(DomainError::NotFound)?;
            preferences.push_token = push_token;
            preferences.updated_at_ms = updated_at_ms;
            Ok(preferences.clone())
        })
    }
}

#[derive(Clone)]
pub struct SurrealNotificationRepository {
    client: Arc<Surreal<Client>>,
}

impl SurrealNotificationRepository {
    pub fn with_client(client: Arc<Surreal<Client>>) -> Self {
        Self { client }
    }

    pub async fn new(db_config: &DbConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: connect(db_config).await?,
        })
    }

    async fn fetch(
        client: &Surreal<Client>,
        user_id: &str,
    ) -> DomainResult<Option<NotificationPreferences>> {
        let mut response = client
            .query(format!("{PREFERENCE_FIELDS} WHERE user_id = $user_id LIMIT 1"))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(map_surreal_error)?;
        let rows: Vec<Value> = response
            .take(0)
            .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
        Ok(
            decode_rows::<NotificationPreferences>(rows, "notification preferences")?
                .into_iter()
                .next(),
        )
    }

    async fn write_back(
        client: &Surreal<Client>,
        preferences: &NotificationPreferences,
    ) -> DomainResult<()> {
        let data = serde_json::to_value(preferences).map_err(|err| {
            DomainError::Validation(format!("invalid preferences payload: {err}"))
        })?;
        let response = client
            .query("UPDATE notification_preferences CONTENT $data WHERE user_id = $user_id")
            .bind(("data", data))
            .bind(("user_id", preferences.user_id.clone()))
            .await
            .map_err(map_surreal_error)?;
        response.check().map_err(map_surreal_error)?;
        Ok(())
    }
}

impl NotificationPreferenceRepository for SurrealNotificationRepository {
    fn get(
        &self,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<NotificationPreferences>>> {
        let user_id = user_id.to_string();
        let client = self.client.clone();
        Box::pin(async move { Self::fetch(&client, &user_id).await })
    }

    fn insert(
        &self,
        preferences: &NotificationPreferences,
    ) -> BoxFuture<'_, DomainResult<NotificationPreferences>> {
        let preferences = preferences.clone();
        let client = self.client.clone();
        Box::pin(async move {
            if Self::fetch(&client, &preferences.user_id).await?.is_some() {
                return Err(DomainError::Conflict);
            }
            let data = serde_json::to_value(&preferences).map_err(|err| {
                DomainError::Validation(format!("invalid preferences payload: {err}"))
            })?;
            let response = client
                .query("CREATE notification_preferences CONTENT $data")
                .bind(("data", data))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(preferences)
        })
    }

    fn update(
        &self,
        user_id: &str,
        update: &NotificationPreferencesUpdate,
        updated_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<NotificationPreferences>> {
        let user_id = user_id.to_string();
        let update = update.clone();
        let client = self.client.clone();
        Box::pin(async move {
            let mut preferences = Self::fetch(&client, &user_id)
                .await?
                .ok_or(DomainError::NotFound)?;
            apply_preferences_update(&mut preferences, &update, updated_at_ms);
            Self::write_back(&client, &preferences).await?;
            Ok(preferences)
        })
    }

    fn set_push_token(
        &self,
        user_id: &str,
        push_token: Option<String>,
        updated_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<NotificationPreferences>> {
        let user_id = user_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut preferences = Self::fetch(&client, &user_id)
                .await?
                .ok_or(DomainError::NotFound)?;
            preferences.push_token = push_token;
            preferences.updated_at_ms = updated_at_ms;
            Self::write_back(&client, &preferences).await?;
            Ok(preferences)
        })
    }
}
