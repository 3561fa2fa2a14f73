use std::collections::HashMap;
use std::sync::Arc;

use patitas_domain::DomainResult;
use patitas_domain::dogs::{Dog, DogListQuery, DogStatus, DogUpdate};
use patitas_domain::error::DomainError;
use patitas_domain::ports::BoxFuture;
use patitas_domain::ports::dogs::{DogRepository, apply_dog_update, matches_search_term};
use serde_json::Value;
use surrealdb::{Surreal, engine::remote::ws::Client};
use tokio::sync::RwLock;

use super::surreal::{connect, count_from_rows, decode_rows, map_surreal_error};
use crate::db::DbConfig;

const DOG_FIELDS: &str = "SELECT * OMIT id FROM dogs";

#[derive(Default)]
pub struct InMemoryDogRepository {
    store: Arc<RwLock<HashMap<String, Dog>>>,
}

impl InMemoryDogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared with the adoption repository so transition side effects land
    /// on the same records.
    pub fn handle(&self) -> Arc<RwLock<HashMap<String, Dog>>> {
        self.store.clone()
    }
}

impl DogRepository for InMemoryDogRepository {
    fn create(&self, dog: &Dog) -> BoxFuture<'_, DomainResult<Dog>> {
        let dog = dog.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            if store.contains_key(&dog.dog_id) {
                return Err(DomainError::Conflict);
            }
            store.insert(dog.dog_id.clone(), dog.clone());
            Ok(dog)
        })
    }

    fn get(&self, dog_id: &str) -> BoxFuture<'_, DomainResult<Option<Dog>>> {
        let dog_id = dog_id.to_string();
        let store = self.store.clone();
        Box::pin(async move { Ok(store.read().await.get(&dog_id).cloned()) })
    }

    fn list(&self, query: &DogListQuery) -> BoxFuture<'_, DomainResult<Vec<Dog>>> {
        let query = query.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut dogs: Vec<_> = store
                .read()
                .await
                .values()
                .filter(|dog| {
                    query.status.is_none_or(|status| dog.status == status)
                        && query.size.is_none_or(|size| dog.size == size)
                        && query.gender.is_none_or(|gender| dog.gender == gender)
                })
                .cloned()
                .collect();
            dogs.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
            Ok(dogs)
        })
    }

    fn list_by_rescuer(&self, rescuer_id: &str) -> BoxFuture<'_, DomainResult<Vec<Dog>>> {
        let rescuer_id = rescuer_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut dogs: Vec<_> = store
                .read()
                .await
                .values()
                .filter(|dog| dog.rescuer_id == rescuer_id)
                .cloned()
                .collect();
            dogs.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
            Ok(dogs)
        })
    }

    fn update(
        &self,
        dog_id: &str,
        update: &DogUpdate,
        updated_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<Dog>> {
        let dog_id = dog_id.to_string();
        let update = update.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            let dog = store.get_mut(&dog_id).ok_or(DomainError::NotFound)?;
            apply_dog_update(dog, &update, updated_at_ms);
            Ok(dog.clone())
        })
    }

    fn delete(&self, dog_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let dog_id = dog_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            store
                .write()
                .await
                .remove(&dog_id)
                .map(|_| ())
                .ok_or(DomainError::NotFound)
        })
    }

    fn search(&self, term: &str) -> BoxFuture<'_, DomainResult<Vec<Dog>>> {
        let term = term.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut dogs: Vec<_> = store
                .read()
                .await
                .values()
                .filter(|dog| matches_search_term(dog, &term))
                .cloned()
                .collect();
            dogs.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
            Ok(dogs)
        })
    }

    fn increment_view(&self, dog_id: &str) -> BoxFuture<'_, DomainResult<u64>> {
        let dog_id = dog_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            let dog = store.get_mut(&dog_id).ok_or(DomainError::NotFound)?;
            dog.view_count += 1;
            Ok(dog.view_count)
        })
    }

    fn count_by_rescuer(
        &self,
        rescuer_id: &str,
        status: Option<DogStatus>,
    ) -> BoxFuture<'_, DomainResult<u64>> {
        let rescuer_id = rescuer_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let count = store
                .read()
                .await
                .values()
                .filter(|dog| {
                    dog.rescuer_id == rescuer_id
                        && status.is_none_or(|status| dog.status == status)
                })
                .count();
            Ok(count as u64)
        })
    }
}

#[derive(Clone)]
pub struct SurrealDogRepository {
    client: Arc<Surreal<Client>>,
}

impl SurrealDogRepository {
    pub fn with_client(client: Arc<Surreal<Client>>) -> Self {
        Self { client }
    }

    pub async fn new(db_config: &DbConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: connect(db_config).await?,
        })
    }

    async fn fetch(client: &Surreal<Client>, dog_id: &str) -> DomainResult<Option<Dog>> {
        let mut response = client
            .query(format!("{DOG_FIELDS} WHERE dog_id = $dog_id LIMIT 1"))
            .bind(("dog_id", dog_id.to_string()))
            .await
            .map_err(map_surreal_error)?;
        let rows: Vec<Value> = response
            .take(0)
            .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
        Ok(decode_rows::<Dog>(rows, "dog")?.into_iter().next())
    }
}

impl DogRepository for SurrealDogRepository {
    fn create(&self, dog: &Dog) -> BoxFuture<'_, DomainResult<Dog>> {
        let dog = dog.clone();
        let client = self.client.clone();
        Box::pin(async move {
            let data = serde_json::to_value(&dog)
                .map_err(|err| DomainError::Validation(format!("invalid dog payload: {err}")))?;
            let response = client
                .query("CREATE dogs CONTENT $data")
                .bind(("data", data))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(dog)
        })
    }

    fn get(&self, dog_id: &str) -> BoxFuture<'_, DomainResult<Option<Dog>>> {
        let dog_id = dog_id.to_string();
        let client = self.client.clone();
        Box::pin(async move { Self::fetch(&client, &dog_id).await })
    }

    fn list(&self, query: &DogListQuery) -> BoxFuture<'_, DomainResult<Vec<Dog>>> {
        let query = query.clone();
        let client = self.client.clone();
        Box::pin(async move {
            let mut conditions = Vec::<String>::new();
            if query.status.is_some() {
                conditions.push("status = $status".to_string());
            }
            if query.size.is_some() {
                conditions.push("size = $size".to_string());
            }
            if query.gender.is_some() {
                conditions.push("gender = $gender".to_string());
            }
            let mut sql = DOG_FIELDS.to_string();
            if !conditions.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&conditions.join(" AND "));
            }
            sql.push_str(" ORDER BY created_at_ms DESC");

            let mut handle = client.query(&sql);
            if let Some(status) = query.status {
                handle = handle.bind(("status", status.as_str()));
            }
            if let Some(size) = query.size {
                handle = handle.bind((
                    "size",
                    serde_json::to_value(size).unwrap_or(Value::Null),
                ));
            }
            if let Some(gender) = query.gender {
                handle = handle.bind((
                    "gender",
                    serde_json::to_value(gender).unwrap_or(Value::Null),
                ));
            }
            let mut response = handle.await.map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            decode_rows(rows, "dog")
        })
    }

    fn list_by_rescuer(&self, rescuer_id: &str) -> BoxFuture<'_, DomainResult<Vec<Dog>>> {
        let rescuer_id = rescuer_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query(format!(
                    "{DOG_FIELDS} WHERE rescuer_id = $rescuer_id ORDER BY created_at_ms DESC"
                ))
                .bind(("rescuer_id", rescuer_id))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            decode_rows(rows, "dog")
        })
    }

    fn update(
        &self,
        dog_id: &str,
        update: &DogUpdate,
        updated_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<Dog>> {
        let dog_id = dog_id.to_string();
        let update = update.clone();
        let client = self.client.clone();
        Box::pin(async move {
            let mut dog = Self::fetch(&client, &dog_id)
                .await?
                .ok_or(DomainError::NotFound)?;
            apply_dog_update(&mut dog, &update, updated_at_ms);
            let data = serde_json::to_value(&dog)
                .map_err(|err| DomainError::Validation(format!("invalid dog payload: {err}")))?;
            let response = client
                .query("UPDATE dogs CONTENT $data WHERE dog_id = $dog_id")
                .bind(("data", data))
                .bind(("dog_id", dog_id))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(dog)
        })
    }

    fn delete(&self, dog_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let dog_id = dog_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            Self::fetch(&client, &dog_id)
                .await?
                .ok_or(DomainError::NotFound)?;
            let response = client
                .query("DELETE dogs WHERE dog_id = $dog_id")
                .bind(("dog_id", dog_id))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(())
        })
    }

    fn search(&self, term: &str) -> BoxFuture<'_, DomainResult<Vec<Dog>>> {
        let term = term.to_lowercase();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query(format!(
                    "{DOG_FIELDS} WHERE status = 'available' AND \
                     (string::lowercase(name) CONTAINS $term \
                     OR string::lowercase(breed ?? '') CONTAINS $term \
                     OR string::lowercase(location ?? '') CONTAINS $term) \
                     ORDER BY created_at_ms DESC"
                ))
                .bind(("term", term))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            decode_rows(rows, "dog")
        })
    }

    fn increment_view(&self, dog_id: &str) -> BoxFuture<'_, DomainResult<u64>> {
        let dog_id = dog_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query("UPDATE dogs SET view_count += 1 WHERE dog_id = $dog_id RETURN AFTER")
                .bind(("dog_id", dog_id))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            let view_count = rows
                .first()
                .and_then(|row| row.get("view_count"))
                .and_then(Value::as_u64)
                .ok_or(DomainError::NotFound)?;
            Ok(view_count)
        })
    }

    fn count_by_rescuer(
        &self,
        rescuer_id: &str,
        status: Option<DogStatus>,
    ) -> BoxFuture<'_, DomainResult<u64>> {
        let rescuer_id = rescuer_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut sql =
                "SELECT count() AS count FROM dogs WHERE rescuer_id = $rescuer_id".to_string();
            if status.is_some() {
                sql.push_str(" AND status = $status");
            }
            sql.push_str(" GROUP ALL");
            let mut handle = client.query(&sql).bind(("rescuer_id", rescuer_id));
            if let Some(status) = status {
                handle = handle.bind(("status", status.as_str()));
            }
            let mut response = handle.await.map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            Ok(count_from_rows(rows))
        })
    }
}
