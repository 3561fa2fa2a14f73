use std::collections::HashMap;
use std::sync::Arc;

use patitas_domain::DomainResult;
use patitas_domain::error::DomainError;
use patitas_domain::favorites::Favorite;
use patitas_domain::ports::BoxFuture;
use patitas_domain::ports::favorites::FavoriteRepository;
use serde_json::Value;
use surrealdb::{Surreal, engine::remote::ws::Client};
use tokio::sync::RwLock;

use super::surreal::{connect, count_from_rows, decode_rows, map_surreal_error};
use crate::db::DbConfig;

const FAVORITE_FIELDS: &str = "SELECT * OMIT id FROM favorites";

#[derive(Default)]
pub struct InMemoryFavoriteRepository {
    store: Arc<RwLock<HashMap<(String, String), Favorite>>>,
}

impl InMemoryFavoriteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FavoriteRepository for InMemoryFavoriteRepository {
    fn insert(&self, favorite: &Favorite) -> BoxFuture<'_, DomainResult<Favorite>> {
        let favorite = favorite.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let key = (favorite.user_id.clone(), favorite.dog_id.clone());
            let mut store = store.write().await;
            if store.contains_key(&key) {
                return Err(DomainError::Conflict);
            }
            store.insert(key, favorite.clone());
            Ok(favorite)
        })
    }

    fn delete(&self, user_id: &str, dog_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let key = (user_id.to_string(), dog_id.to_string());
        let store = self.store.clone();
        Box::pin(async move {
            store
                .write()
                .await
                .remove(&key)
                .map(|_| ())
                .ok_or(DomainError::NotFound)
        })
    }

    fn exists(&self, user_id: &str, dog_id: &str) -> BoxFuture<'_, DomainResult<bool>> {
        let key = (user_id.to_string(), dog_id.to_string());
        let store = self.store.clone();
        Box::pin(async move { Ok(store.read().await.contains_key(&key)) })
    }

    fn list_by_user(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Vec<Favorite>>> {
        let user_id = user_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut favorites: Vec<_> = store
                .read()
                .await
                .values()
                .filter(|favorite| favorite.user_id == user_id)
                .cloned()
                .collect();
            favorites.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
            Ok(favorites)
        })
    }

    fn count_by_dog(&self, dog_id: &str) -> BoxFuture<'_, DomainResult<u64>> {
        let dog_id = dog_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let count = store
                .read()
                .await
                .values()
                .filter(|favorite| favorite.dog_id == dog_id)
                .count();
            Ok(count as u64)
        })
    }

    fn count_by_user(&self, user_id: &str) -> BoxFuture<'_, DomainResult<u64>> {
        let user_id = user_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let count = store
                .read()
                .await
                .values()
                .filter(|favorite| favorite.user_id == user_id)
                .count();
            Ok(count as u64)
        })
    }
}

#[derive(Clone)]
pub struct SurrealFavoriteRepository {
    client: Arc<Surreal<Client>>,
}

impl SurrealFavoriteRepository {
    pub fn with_client(client: Arc<Surreal<Client>>) -> Self {
        Self { client }
    }

    pub async fn new(db_config: &DbConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: connect(db_config).await?,
        })
    }

    async fn count(client: &Surreal<Client>, field: &str, value: String) -> DomainResult<u64> {
        let mut response = client
            .query(format!(
                "SELECT count() AS count FROM favorites WHERE {field} = $value GROUP ALL"
            ))
            .bind(("value", value))
            .await
            .map_err(map_surreal_error)?;
        let rows: Vec<Value> = response
            .take(0)
            .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
        Ok(count_from_rows(rows))
    }
}

impl FavoriteRepository for SurrealFavoriteRepository {
    fn insert(&self, favorite: &Favorite) -> BoxFuture<'_, DomainResult<Favorite>> {
        let favorite = favorite.clone();
        let client = self.client.clone();
        Box::pin(async move {
            if surreal_exists(&client, &favorite.user_id, &favorite.dog_id).await? {
                return Err(DomainError::Conflict);
            }
            let data = serde_json::to_value(&favorite).map_err(|err| {
                DomainError::Validation(format!("invalid favorite payload: {err}"))
            })?;
            let response = client
                .query("CREATE favorites CONTENT $data")
                .bind(("data", data))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(favorite)
        })
    }

    fn delete(&self, user_id: &str, dog_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let user_id = user_id.to_string();
        let dog_id = dog_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            if !surreal_exists(&client, &user_id, &dog_id).await? {
                return Err(DomainError::NotFound);
            }
            let response = client
                .query("DELETE favorites WHERE user_id = $user_id AND dog_id = $dog_id")
                .bind(("user_id", user_id))
                .bind(("dog_id", dog_id))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(())
        })
    }

    fn exists(&self, user_id: &str, dog_id: &str) -> BoxFuture<'_, DomainResult<bool>> {
        let user_id = user_id.to_string();
        let dog_id = dog_id.to_string();
        let client = self.client.clone();
        Box::pin(async move { surreal_exists(&client, &user_id, &dog_id).await })
    }

    fn list_by_user(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Vec<Favorite>>> {
        let user_id = user_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query(format!(
                    "{FAVORITE_FIELDS} WHERE user_id = $user_id ORDER BY created_at_ms DESC"
                ))
                .bind(("user_id", user_id))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            decode_rows(rows, "favorite")
        })
    }

    fn count_by_dog(&self, dog_id: &str) -> BoxFuture<'_, DomainResult<u64>> {
        let dog_id = dog_id.to_string();
        let client = self.client.clone();
        Box::pin(async move { Self::count(&client, "dog_id", dog_id).await })
    }

    fn count_by_user(&self, user_id: &str) -> BoxFuture<'_, DomainResult<u64>> {
        let user_id = user_id.to_string();
        let client = self.client.clone();
        Box::pin(async move { Self::count(&client, "user_id", user_id).await })
    }
}

async fn surreal_exists(
    client: &Surreal<Client>,
    user_id: &str,
    dog_id: &str,
) -> DomainResult<bool> {
    let mut response = client
        .query(
            "SELECT user_id FROM favorites \
             WHERE user_id = $user_id AND dog_id = $dog_id LIMIT 1",
        )
        .bind(("user_id", user_id.to_string()))
        .bind(("dog_id", dog_id.to_string()))
        .await
        .map_err(map_surreal_error)?;
    let rows: Vec<Value> = response
        .take(0)
        .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
    Ok(!rows.is_empty())
}
