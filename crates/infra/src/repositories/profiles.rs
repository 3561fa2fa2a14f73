use std::collections::HashMap;
use std::sync::Arc;

use patitas_domain::DomainResult;
use patitas_domain::error::DomainError;
use patitas_domain::ports::BoxFuture;
use patitas_domain::ports::profiles::{ProfileRepository, apply_profile_update};
use patitas_domain::profiles::{ProfileUpdate, UserProfile};
use serde_json::Value;
use surrealdb::{Surreal, engine::remote::ws::Client};
use tokio::sync::RwLock;

use super::surreal::{connect, decode_rows, map_surreal_error};
use crate::db::DbConfig;

const PROFILE_FIELDS: &str = "SELECT * OMIT id FROM user_profiles";

#[derive(Default)]
pub struct InMemoryProfileRepository {
    store: Arc<RwLock<HashMap<String, UserProfile>>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileRepository for InMemoryProfileRepository {
    fn get(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Option<UserProfile>>> {
        let user_id = user_id.to_string();
        let store = self.store.clone();
        Box::pin(async move { Ok(store.read().await.get(&user_id).cloned()) })
    }

    fn create(&self, profile: &UserProfile) -> BoxFuture<'_, DomainResult<UserProfile>> {
        let profile = profile.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            if store.contains_key(&profile.user_id) {
                return Err(DomainError::Conflict);
            }
            store.insert(profile.user_id.clone(), profile.clone());
            Ok(profile)
        })
    }

    fn update(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
        updated_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<UserProfile>> {
        let user_id = user_id.to_string();
        let update = update.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            let profile = store.get_mut(&user_id).ok_or(DomainError::NotFound)?;
            apply_profile_update(profile, &update, updated_at_ms);
            Ok(profile.clone())
        })
    }
}

/// Runs with the root client; the complete-profile insert is the
/// privileged multi-field write ordinary sessions cannot perform.
#[derive(Clone)]
pub struct SurrealProfileRepository {
    client: Arc<Surreal<Client>>,
}

impl SurrealProfileRepository {
    pub fn with_client(client: Arc<Surreal<Client>>) -> Self {
        Self { client }
    }

    pub async fn new(db_config: &DbConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: connect(db_config).await?,
        })
    }

    async fn fetch(client: &Surreal<Client>, user_id: &str) -> DomainResult<Option<UserProfile>> {
        let mut response = client
            .query(format!("{PROFILE_FIELDS} WHERE user_id = $user_id LIMIT 1"))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(map_surreal_error)?;
        let rows: Vec<Value> = response
            .take(0)
            .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
        Ok(decode_rows::<UserProfile>(rows, "user profile")?
            .into_iter()
            .next())
    }
}

impl ProfileRepository for SurrealProfileRepository {
    fn get(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Option<UserProfile>>> {
        let user_id = user_id.to_string();
        let client = self.client.clone();
        Box::pin(async move { Self::fetch(&client, &user_id).await })
    }

    fn create(&self, profile: &UserProfile) -> BoxFuture<'_, DomainResult<UserProfile>> {
        let profile = profile.clone();
        let client = self.client.clone();
        Box::pin(async move {
            if Self::fetch(&client, &profile.user_id).await?.is_some() {
                return Err(DomainError::Conflict);
            }
            let data = serde_json::to_value(&profile).map_err(|err| {
                DomainError::Validation(format!("invalid profile payload: {err}"))
            })?;
            let response = client
                .query("CREATE user_profiles CONTENT $data")
                .bind(("data", data))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(profile)
        })
    }

    fn update(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
        updated_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<UserProfile>> {
        let user_id = user_id.to_string();
        let update = update.clone();
        let client = self.client.clone();
        Box::pin(async move {
            let mut profile = Self::fetch(&client, &user_id)
                .await?
                .ok_or(DomainError::NotFound)?;
            apply_profile_update(&mut profile, &update, updated_at_ms);
            let data = serde_json::to_value(&profile).map_err(|err| {
                DomainError::Validation(format!("invalid profile payload: {err}"))
            })?;
            let response = client
                .query("UPDATE user_profiles CONTENT $data WHERE user_id = $user_id")
                .bind(("data", data))
                .bind(("user_id", user_id))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(profile)
        })
    }
}
