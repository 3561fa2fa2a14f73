use std::collections::HashMap;
use std::sync::Arc;

use patitas_domain::DomainResult;
use patitas_domain::adoptions::{AdoptionRequest, AdoptionStatus, AdoptionTransition};
use patitas_domain::dogs::Dog;
use patitas_domain::error::DomainError;
use patitas_domain::ports::BoxFuture;
use patitas_domain::ports::adoptions::{AdoptionRepository, apply_transition_fields};
use serde_json::Value;
use surrealdb::{Surreal, engine::remote::ws::Client};
use tokio::sync::RwLock;

use super::surreal::{connect, count_from_rows, decode_rows, map_surreal_error};
use crate::db::DbConfig;

const REQUEST_FIELDS: &str = "SELECT * OMIT id FROM adoption_requests";

/// Holds a handle to the dog map so `apply_transition` can update the
/// request and its dog side effect inside one critical section.
pub struct InMemoryAdoptionRepository {
    requests: Arc<RwLock<HashMap<String, AdoptionRequest>>>,
    dogs: Arc<RwLock<HashMap<String, Dog>>>,
}

impl InMemoryAdoptionRepository {
    pub fn new(dogs: Arc<RwLock<HashMap<String, Dog>>>) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            dogs,
        }
    }
}

impl AdoptionRepository for InMemoryAdoptionRepository {
    fn create(&self, request: &AdoptionRequest) -> BoxFuture<'_, DomainResult<AdoptionRequest>> {
        let request = request.clone();
        let requests = self.requests.clone();
        Box::pin(async move {
            let mut requests = requests.write().await;
            if requests.contains_key(&request.request_id) {
                return Err(DomainError::Conflict);
            }
            requests.insert(request.request_id.clone(), request.clone());
            Ok(request)
        })
    }

    fn get(&self, request_id: &str) -> BoxFuture<'_, DomainResult<Option<AdoptionRequest>>> {
        let request_id = request_id.to_string();
        let requests = self.requests.clone();
        Box::pin(async move { Ok(requests.read().await.get(&request_id).cloned()) })
    }

    fn find_by_pair(
        &self,
        dog_id: &str,
        adopter_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<AdoptionRequest>>> {
        let dog_id = dog_id.to_string();
        let adopter_id = adopter_id.to_string();
        let requests = self.requests.clone();
        Box::pin(async move {
            let found = requests
                .read()
                .await
                .values()
                .find(|request| request.dog_id == dog_id && request.adopter_id == adopter_id)
                .cloned();
            Ok(found)
        })
    }

    fn latest_cancelled(
        &self,
        dog_id: &str,
        adopter_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<AdoptionRequest>>> {
        let dog_id = dog_id.to_string();
        let adopter_id = adopter_id.to_string();
        let requests = self.requests.clone();
        Box::pin(async move {
            let mut cancelled: Vec<_> = requests
                .read()
                .await
                .values()
                .filter(|request| {
                    request.dog_id == dog_id
                        && request.adopter_id == adopter_id
                        && request.status == AdoptionStatus::CancelledByAdopter
                })
                .cloned()
                .collect();
            cancelled.sort_by(|a, b| b.cancelled_at_ms.cmp(&a.cancelled_at_ms));
            Ok(cancelled.into_iter().next())
        })
    }

    fn list_by_adopter(
        &self,
        adopter_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<AdoptionRequest>>> {
        let adopter_id = adopter_id.to_string();
        let requests = self.requests.clone();
        Box::pin(async move {
            let mut list: Vec<_> = requests
                .read()
                .await
                .values()
                .filter(|request| request.adopter_id == adopter_id)
                .cloned()
                .collect();
            list.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
            Ok(list)
        })
    }

    fn list_by_rescuer(
        &self,
        rescuer_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<AdoptionRequest>>> {
        let rescuer_id = rescuer_id.to_string();
        let requests = self.requests.clone();
        Box::pin(async move {
            let mut list: Vec<_> = requests
                .read()
                .await
                .values()
                .filter(|request| request.rescuer_id == rescuer_id)
                .cloned()
                .collect();
            list.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
            Ok(list)
        })
    }

    fn apply_transition(
        &self,
        transition: &AdoptionTransition,
    ) -> BoxFuture<'_, DomainResult<AdoptionRequest>> {
        let transition = transition.clone();
        let requests = self.requests.clone();
        let dogs = self.dogs.clone();
        Box::pin(async move {
            let mut requests = requests.write().await;
            let mut dogs = dogs.write().await;
            let request = requests
                .get_mut(&transition.request_id)
                .ok_or(DomainError::NotFound)?;
            apply_transition_fields(request, &transition);
            if let Some(dog_status) = transition.dog_status {
                if let Some(dog) = dogs.get_mut(&request.dog_id) {
                    dog.status = dog_status;
                    dog.updated_at_ms = transition.updated_at_ms;
                }
            }
            Ok(request.clone())
        })
    }

    fn count_by_adopter(
        &self,
        adopter_id: &str,
        status: Option<AdoptionStatus>,
    ) -> BoxFuture<'_, DomainResult<u64>> {
        let adopter_id = adopter_id.to_string();
        let requests = self.requests.clone();
        Box::pin(async move {
            let count = requests
                .read()
                .await
                .values()
                .filter(|request| {
                    request.adopter_id == adopter_id
                        && status.is_none_or(|status| request.status == status)
                })
                .count();
            Ok(count as u64)
        })
    }

    fn count_by_rescuer(
        &self,
        rescuer_id: &str,
        status: Option<AdoptionStatus>,
    ) -> BoxFuture<'_, DomainResult<u64>> {
        let rescuer_id = rescuer_id.to_string();
        let requests = self.requests.clone();
        Box::pin(async move {
            let count = requests
                .read()
                .await
                .values()
                .filter(|request| {
                    request.rescuer_id == rescuer_id
                        && status.is_none_or(|status| request.status == status)
                })
                .count();
            Ok(count as u64)
        })
    }

    fn count_by_dog(&self, dog_id: &str) -> BoxFuture<'_, DomainResult<u64>> {
        let dog_id = dog_id.to_string();
        let requests = self.requests.clone();
        Box::pin(async move {
            let count = requests
                .read()
                .await
                .values()
                .filter(|request| request.dog_id == dog_id)
                .count();
            Ok(count as u64)
        })
    }

    fn list_approved_since(
        &self,
        rescuer_id: &str,
        since_ms: i64,
    ) -> BoxFuture<'_, DomainResult<Vec<AdoptionRequest>>> {
        let rescuer_id = rescuer_id.to_string();
        let requests = self.requests.clone();
        Box::pin(async move {
            let mut list: Vec<_> = requests
                .read()
                .await
                .values()
                .filter(|request| {
                    request.rescuer_id == rescuer_id
                        && request.status == AdoptionStatus::Approved
                        && request.created_at_ms >= since_ms
                })
                .cloned()
                .collect();
            list.sort_by(|a, b| a.created_at_ms.cmp(&b.created_at_ms));
            Ok(list)
        })
    }
}

#[derive(Clone)]
pub struct SurrealAdoptionRepository {
    client: Arc<Surreal<Client>>,
}

impl SurrealAdoptionRepository {
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
        request_id: &str,
    ) -> DomainResult<Option<AdoptionRequest>> {
        let mut response = client
            .query(format!("{REQUEST_FIELDS} WHERE request_id = $request_id LIMIT 1"))
            .bind(("request_id", request_id.to_string()))
            .await
            .map_err(map_surreal_error)?;
        let rows: Vec<Value> = response
            .take(0)
            .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
        Ok(decode_rows::<AdoptionRequest>(rows, "adoption request")?
            .into_iter()
            .next())
    }

    async fn list_where(
        client: &Surreal<Client>,
        field: &str,
        value: String,
    ) -> DomainResult<Vec<AdoptionRequest>> {
        let mut response = client
            .query(format!(
                "{REQUEST_FIELDS} WHERE {field} = $value ORDER BY created_at_ms DESC"
            ))
            .bind(("value", value))
            .await
            .map_err(map_surreal_error)?;
        let rows: Vec<Value> = response
            .take(0)
            .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
        decode_rows(rows, "adoption request")
    }
}

impl AdoptionRepository for SurrealAdoptionRepository {
    fn create(&self, request: &AdoptionRequest) -> BoxFuture<'_, DomainResult<AdoptionRequest>> {
        let request = request.clone();
        let client = self.client.clone();
        Box::pin(async move {
            let data = serde_json::to_value(&request).map_err(|err| {
                DomainError::Validation(format!("invalid adoption request payload: {err}"))
            })?;
            let response = client
                .query("CREATE adoption_requests CONTENT $data")
                .bind(("data", data))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(request)
        })
    }

    fn get(&self, request_id: &str) -> BoxFuture<'_, DomainResult<Option<AdoptionRequest>>> {
        let request_id = request_id.to_string();
        let client = self.client.clone();
        Box::pin(async move { Self::fetch(&client, &request_id).await })
    }

    fn find_by_pair(
        &self,
        dog_id: &str,
        adopter_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<AdoptionRequest>>> {
        let dog_id = dog_id.to_string();
        let adopter_id = adopter_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query(format!(
                    "{REQUEST_FIELDS} WHERE dog_id = $dog_id AND adopter_id = $adopter_id LIMIT 1"
                ))
                .bind(("dog_id", dog_id))
                .bind(("adopter_id", adopter_id))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            Ok(decode_rows::<AdoptionRequest>(rows, "adoption request")?
                .into_iter()
                .next())
        })
    }

    fn latest_cancelled(
        &self,
        dog_id: &str,
        adopter_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<AdoptionRequest>>> {
        let dog_id = dog_id.to_string();
        let adopter_id = adopter_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query(format!(
                    "{REQUEST_FIELDS} WHERE dog_id = $dog_id AND adopter_id = $adopter_id \
                     AND status = 'cancelled_by_adopter' \
                     ORDER BY cancelled_at_ms DESC LIMIT 1"
                ))
                .bind(("dog_id", dog_id))
                .bind(("adopter_id", adopter_id))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            Ok(decode_rows::<AdoptionRequest>(rows, "adoption request")?
                .into_iter()
                .next())
        })
    }

    fn list_by_adopter(
        &self,
        adopter_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<AdoptionRequest>>> {
        let adopter_id = adopter_id.to_string();
        let client = self.client.clone();
        Box::pin(async move { Self::list_where(&client, "adopter_id", adopter_id).await })
    }

    fn list_by_rescuer(
        &self,
        rescuer_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<AdoptionRequest>>> {
        let rescuer_id = rescuer_id.to_string();
        let client = self.client.clone();
        Box::pin(async move { Self::list_where(&client, "rescuer_id", rescuer_id).await })
    }

    fn apply_transition(
        &self,
        transition: &AdoptionTransition,
    ) -> BoxFuture<'_, DomainResult<AdoptionRequest>> {
        let transition = transition.clone();
        let client = self.client.clone();
        Box::pin(async move {
            let mut request = Self::fetch(&client, &transition.request_id)
                .await?
                .ok_or(DomainError::NotFound)?;
            apply_transition_fields(&mut request, &transition);

            let data = serde_json::to_value(&request).map_err(|err| {
                DomainError::Validation(format!("invalid adoption request payload: {err}"))
            })?;
            // Request update and dog side effect commit or fail together.
            let mut sql = String::from(
                "BEGIN TRANSACTION;\
                 UPDATE adoption_requests CONTENT $data WHERE request_id = $request_id;",
            );
            if transition.dog_status.is_some() {
                sql.push_str(
                    "UPDATE dogs SET status = $dog_status, updated_at_ms = $updated_at \
                     WHERE dog_id = $dog_id;",
                );
            }
            sql.push_str("COMMIT TRANSACTION;");

            let mut handle = client
                .query(&sql)
                .bind(("data", data))
                .bind(("request_id", transition.request_id.clone()));
            if let Some(dog_status) = transition.dog_status {
                handle = handle
                    .bind(("dog_status", dog_status.as_str()))
                    .bind(("updated_at", transition.updated_at_ms))
                    .bind(("dog_id", request.dog_id.clone()));
            }
            let response = handle.await.map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(request)
        })
    }

    fn count_by_adopter(
        &self,
        adopter_id: &str,
        status: Option<AdoptionStatus>,
    ) -> BoxFuture<'_, DomainResult<u64>> {
        let adopter_id = adopter_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            count_where(&client, "adopter_id", adopter_id, status).await
        })
    }

    fn count_by_rescuer(
        &self,
        rescuer_id: &str,
        status: Option<AdoptionStatus>,
    ) -> BoxFuture<'_, DomainResult<u64>> {
        let rescuer_id = rescuer_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            count_where(&client, "rescuer_id", rescuer_id, status).await
        })
    }

    fn count_by_dog(&self, dog_id: &str) -> BoxFuture<'_, DomainResult<u64>> {
        let dog_id = dog_id.to_string();
        let client = self.client.clone();
        Box::pin(async move { count_where(&client, "dog_id", dog_id, None).await })
    }

    fn list_approved_since(
        &self,
        rescuer_id: &str,
        since_ms: i64,
    ) -> BoxFuture<'_, DomainResult<Vec<AdoptionRequest>>> {
        let rescuer_id = rescuer_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query(format!(
                    "{REQUEST_FIELDS} WHERE rescuer_id = $rescuer_id \
                     AND status = 'approved' AND created_at_ms >= $since \
                     ORDER BY created_at_ms ASC"
                ))
                .bind(("rescuer_id", rescuer_id))
                .bind(("since", since_ms))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            decode_rows(rows, "adoption request")
        })
    }
}

async fn count_where(
    client: &Surreal<Client>,
    field: &str,
    value: String,
    status: Option<AdoptionStatus>,
) -> DomainResult<u64> {
    let mut sql = format!("SELECT count() AS count FROM adoption_requests WHERE {field} = $value");
    if status.is_some() {
        sql.push_str(" AND status = $status");
    }
    sql.push_str(" GROUP ALL");
    let mut handle = client.query(&sql).bind(("value", value));
    if let Some(status) = status {
        handle = handle.bind(("status", status.as_str()));
    }
    let mut response = handle.await.map_err(map_surreal_error)?;
    let rows: Vec<Value> = response
        .take(0)
        .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
    Ok(count_from_rows(rows))
}
