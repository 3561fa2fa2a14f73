use std::collections::HashMap;
use std::sync::Arc;

use patitas_domain::DomainResult;
use patitas_domain::error::DomainError;
use patitas_domain::followups::{AdoptionFollowup, FollowupStatus, FollowupUpdate};
use patitas_domain::ports::BoxFuture;
use patitas_domain::ports::followups::{FollowupRepository, apply_followup_update};
use serde_json::Value;
use surrealdb::{Surreal, engine::remote::ws::Client};
use tokio::sync::RwLock;

use super::surreal::{connect, decode_rows, map_surreal_error};
use crate::db::DbConfig;

const FOLLOWUP_FIELDS: &str = "SELECT * OMIT id FROM adoption_followups";

#[derive(Default)]
pub struct InMemoryFollowupRepository {
    store: Arc<RwLock<HashMap<String, AdoptionFollowup>>>,
}

impl InMemoryFollowupRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FollowupRepository for InMemoryFollowupRepository {
    fn create(
        &self,
        followup: &AdoptionFollowup,
    ) -> BoxFuture<'_, DomainResult<AdoptionFollowup>> {
        let followup = followup.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            if store.contains_key(&followup.followup_id) {
                return Err(DomainError::Conflict);
            }
            store.insert(followup.followup_id.clone(), followup.clone());
            Ok(followup)
        })
    }

    fn create_many(&self, followups: &[AdoptionFollowup]) -> BoxFuture<'_, DomainResult<()>> {
        let followups = followups.to_vec();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            for followup in followups {
                store.insert(followup.followup_id.clone(), followup);
            }
            Ok(())
        })
    }

    fn get(&self, followup_id: &str) -> BoxFuture<'_, DomainResult<Option<AdoptionFollowup>>> {
        let followup_id = followup_id.to_string();
        let store = self.store.clone();
        Box::pin(async move { Ok(store.read().await.get(&followup_id).cloned()) })
    }

    fn list_by_request(
        &self,
        adoption_request_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<AdoptionFollowup>>> {
        let adoption_request_id = adoption_request_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut followups: Vec<_> = store
                .read()
                .await
                .values()
                .filter(|followup| followup.adoption_request_id == adoption_request_id)
                .cloned()
                .collect();
            followups.sort_by(|a, b| b.followup_date_ms.cmp(&a.followup_date_ms));
            Ok(followups)
        })
    }

    fn list_pending_by_requests(
        &self,
        request_ids: &[String],
    ) -> BoxFuture<'_, DomainResult<Vec<AdoptionFollowup>>> {
        let request_ids = request_ids.to_vec();
        let store = self.store.clone();
        Box::pin(async move {
            let mut followups: Vec<_> = store
                .read()
                .await
                .values()
                .filter(|followup| {
                    followup.status == FollowupStatus::Pending
                        && request_ids.contains(&followup.adoption_request_id)
                })
                .cloned()
                .collect();
            followups.sort_by(|a, b| a.followup_date_ms.cmp(&b.followup_date_ms));
            Ok(followups)
        })
    }

    fn update(
        &self,
        followup_id: &str,
        update: &FollowupUpdate,
        updated_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<AdoptionFollowup>> {
        let followup_id = followup_id.to_string();
        let update = update.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            let followup = store.get_mut(&followup_id).ok_or(DomainError::NotFound)?;
            apply_followup_update(followup, &update, updated_at_ms);
            Ok(followup.clone())
        })
    }

    fn delete(&self, followup_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let followup_id = followup_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            store
                .write()
                .await
                .remove(&followup_id)
                .map(|_| ())
                .ok_or(DomainError::NotFound)
        })
    }
}

#[derive(Clone)]
pub struct SurrealFollowupRepository {
    client: Arc<Surreal<Client>>,
}

impl SurrealFollowupRepository {
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
        followup_id: &str,
    ) -> DomainResult<Option<AdoptionFollowup>> {
        let mut response = client
            .query(format!("{FOLLOWUP_FIELDS} WHERE followup_id = $followup_id LIMIT 1"))
            .bind(("followup_id", followup_id.to_string()))
            .await
            .map_err(map_surreal_error)?;
        let rows: Vec<Value> = response
            .take(0)
            .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
        Ok(decode_rows::<AdoptionFollowup>(rows, "adoption followup")?
            .into_iter()
            .next())
    }
}

impl FollowupRepository for SurrealFollowupRepository {
    fn create(
        &self,
        followup: &AdoptionFollowup,
    ) -> BoxFuture<'_, DomainResult<AdoptionFollowup>> {
        let followup = followup.clone();
        let client = self.client.clone();
        Box::pin(async move {
            let data = serde_json::to_value(&followup).map_err(|err| {
                DomainError::Validation(format!("invalid followup payload: {err}"))
            })?;
            let response = client
                .query("CREATE adoption_followups CONTENT $data")
                .bind(("data", data))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(followup)
        })
    }

    fn create_many(&self, followups: &[AdoptionFollowup]) -> BoxFuture<'_, DomainResult<()>> {
        let followups = followups.to_vec();
        let client = self.client.clone();
        Box::pin(async move {
            let data = serde_json::to_value(&followups).map_err(|err| {
                DomainError::Validation(format!("invalid followup payload: {err}"))
            })?;
            let response = client
                .query("INSERT INTO adoption_followups $data")
                .bind(("data", data))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(())
        })
    }

    fn get(&self, followup_id: &str) -> BoxFuture<'_, DomainResult<Option<AdoptionFollowup>>> {
        let followup_id = followup_id.to_string();
        let client = self.client.clone();
        Box::pin(async move { Self::fetch(&client, &followup_id).await })
    }

    fn list_by_request(
        &self,
        adoption_request_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<AdoptionFollowup>>> {
        let adoption_request_id = adoption_request_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query(format!(
                    "{FOLLOWUP_FIELDS} WHERE adoption_request_id = $adoption_request_id \
                     ORDER BY followup_date_ms DESC"
                ))
                .bind(("adoption_request_id", adoption_request_id))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            decode_rows(rows, "adoption followup")
        })
    }

    fn list_pending_by_requests(
        &self,
        request_ids: &[String],
    ) -> BoxFuture<'_, DomainResult<Vec<AdoptionFollowup>>> {
        let request_ids = request_ids.to_vec();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query(format!(
                    "{FOLLOWUP_FIELDS} WHERE status = 'pending' \
                     AND adoption_request_id IN $request_ids \
                     ORDER BY followup_date_ms ASC"
                ))
                .bind(("request_ids", request_ids))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            decode_rows(rows, "adoption followup")
        })
    }

    fn update(
        &self,
        followup_id: &str,
        update: &FollowupUpdate,
        updated_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<AdoptionFollowup>> {
        let followup_id = followup_id.to_string();
        let update = update.clone();
        let client = self.client.clone();
        Box::pin(async move {
            let mut followup = Self::fetch(&client, &followup_id)
                .await?
                .ok_or(DomainError::NotFound)?;
            apply_followup_update(&mut followup, &update, updated_at_ms);
            let data = serde_json::to_value(&followup).map_err(|err| {
                DomainError::Validation(format!("invalid followup payload: {err}"))
            })?;
            let response = client
                .query("UPDATE adoption_followups CONTENT $data WHERE followup_id = $followup_id")
                .bind(("data", data))
                .bind(("followup_id", followup_id))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(followup)
        })
    }

    fn delete(&self, followup_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let followup_id = followup_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            Self::fetch(&client, &followup_id)
                .await?
                .ok_or(DomainError::NotFound)?;
            let response = client
                .query("DELETE adoption_followups WHERE followup_id = $followup_id")
                .bind(("followup_id", followup_id))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(())
        })
    }
}
