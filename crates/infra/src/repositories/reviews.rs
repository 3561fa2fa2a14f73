use std::collections::HashMap;
use std::sync::Arc;

use patitas_domain::DomainResult;
use patitas_domain::error::DomainError;
use patitas_domain::ports::BoxFuture;
use patitas_domain::ports::reviews::ReviewRepository;
use patitas_domain::reviews::Review;
use serde_json::Value;
use surrealdb::{Surreal, engine::remote::ws::Client};
use tokio::sync::RwLock;

use super::surreal::{connect, count_from_rows, decode_rows, map_surreal_error};
use crate::db::DbConfig;

const REVIEW_FIELDS: &str = "SELECT * OMIT id FROM reviews";

#[derive(Default)]
pub struct InMemoryReviewRepository {
    store: Arc<RwLock<HashMap<String, Review>>>,
}

impl InMemoryReviewRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReviewRepository for InMemoryReviewRepository {
    fn create(&self, review: &Review) -> BoxFuture<'_, DomainResult<Review>> {
        let review = review.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            if store.contains_key(&review.review_id) {
                return Err(DomainError::Conflict);
            }
            store.insert(review.review_id.clone(), review.clone());
            Ok(review)
        })
    }

    fn get(&self, review_id: &str) -> BoxFuture<'_, DomainResult<Option<Review>>> {
        let review_id = review_id.to_string();
        let store = self.store.clone();
        Box::pin(async move { Ok(store.read().await.get(&review_id).cloned()) })
    }

    fn list_approved_by_rescuer(
        &self,
        rescuer_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<Review>>> {
        let rescuer_id = rescuer_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut reviews: Vec<_> = store
                .read()
                .await
                .values()
                .filter(|review| review.rescuer_id == rescuer_id && review.is_approved)
                .cloned()
                .collect();
            reviews.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
            Ok(reviews)
        })
    }

    fn update(
        &self,
        review_id: &str,
        rating: u8,
        comment: Option<String>,
        updated_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<Review>> {
        let review_id = review_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            let review = store.get_mut(&review_id).ok_or(DomainError::NotFound)?;
            review.rating = rating;
            review.comment = comment;
            review.updated_at_ms = updated_at_ms;
            Ok(review.clone())
        })
    }

    fn delete(&self, review_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let review_id = review_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            store
                .write()
                .await
                .remove(&review_id)
                .map(|_| ())
                .ok_or(DomainError::NotFound)
        })
    }

    fn exists(
        &self,
        reviewer_id: &str,
        rescuer_id: &str,
        dog_id: Option<&str>,
    ) -> BoxFuture<'_, DomainResult<bool>> {
        let reviewer_id = reviewer_id.to_string();
        let rescuer_id = rescuer_id.to_string();
        let dog_id = dog_id.map(str::to_string);
        let store = self.store.clone();
        Box::pin(async move {
            let found = store.read().await.values().any(|review| {
                review.reviewer_id == reviewer_id
                    && review.rescuer_id == rescuer_id
                    && dog_id
                        .as_deref()
                        .is_none_or(|dog_id| review.dog_id.as_deref() == Some(dog_id))
            });
            Ok(found)
        })
    }

    fn count_unapproved(&self, rescuer_id: &str) -> BoxFuture<'_, DomainResult<u64>> {
        let rescuer_id = rescuer_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let count = store
                .read()
                .await
                .values()
                .filter(|review| review.rescuer_id == rescuer_id && !review.is_approved)
                .count();
            Ok(count as u64)
        })
    }
}

#[derive(Clone)]
pub struct SurrealReviewRepository {
    client: Arc<Surreal<Client>>,
}

impl SurrealReviewRepository {
    pub fn with_client(client: Arc<Surreal<Client>>) -> Self {
        Self { client }
    }

    pub async fn new(db_config: &DbConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: connect(db_config).await?,
        })
    }
}

impl ReviewRepository for SurrealReviewRepository {
    fn create(&self, review: &Review) -> BoxFuture<'_, DomainResult<Review>> {
        let review = review.clone();
        let client = self.client.clone();
        Box::pin(async move {
            let data = serde_json::to_value(&review).map_err(|err| {
                DomainError::Validation(format!("invalid review payload: {err}"))
            })?;
            let response = client
                .query("CREATE reviews CONTENT $data")
                .bind(("data", data))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(review)
        })
    }

    fn get(&self, review_id: &str) -> BoxFuture<'_, DomainResult<Option<Review>>> {
        let review_id = review_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query(format!("{REVIEW_FIELDS} WHERE review_id = $review_id LIMIT 1"))
                .bind(("review_id", review_id))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            Ok(decode_rows::<Review>(rows, "review")?.into_iter().next())
        })
    }

    fn list_approved_by_rescuer(
        &self,
        rescuer_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<Review>>> {
        let rescuer_id = rescuer_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query(format!(
                    "{REVIEW_FIELDS} WHERE rescuer_id = $rescuer_id AND is_approved = true \
                     ORDER BY created_at_ms DESC"
                ))
                .bind(("rescuer_id", rescuer_id))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            decode_rows(rows, "review")
        })
    }

    fn update(
        &self,
        review_id: &str,
        rating: u8,
        comment: Option<String>,
        updated_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<Review>> {
        let review_id = review_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query(
                    "UPDATE reviews SET rating = $rating, comment = $comment, \
                     updated_at_ms = $updated_at \
                     WHERE review_id = $review_id RETURN AFTER",
                )
                .bind(("rating", i64::from(rating)))
                .bind(("comment", comment))
                .bind(("updated_at", updated_at_ms))
                .bind(("review_id", review_id))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            decode_rows::<Review>(rows, "review")?
                .into_iter()
                .next()
                .ok_or(DomainError::NotFound)
        })
    }

    fn delete(&self, review_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let review_id = review_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let response = client
                .query("DELETE reviews WHERE review_id = $review_id")
                .bind(("review_id", review_id))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(())
        })
    }

    fn exists(
        &self,
        reviewer_id: &str,
        rescuer_id: &str,
        dog_id: Option<&str>,
    ) -> BoxFuture<'_, DomainResult<bool>> {
        let reviewer_id = reviewer_id.to_string();
        let rescuer_id = rescuer_id.to_string();
        let dog_id = dog_id.map(str::to_string);
        let client = self.client.clone();
        Box::pin(async move {
            let mut sql = String::from(
                "SELECT review_id FROM reviews \
                 WHERE reviewer_id = $reviewer_id AND rescuer_id = $rescuer_id",
            );
            if dog_id.is_some() {
                sql.push_str(" AND dog_id = $dog_id");
            }
            sql.push_str(" LIMIT 1");
            let mut handle = client
                .query(&sql)
                .bind(("reviewer_id", reviewer_id))
                .bind(("rescuer_id", rescuer_id));
            if let Some(dog_id) = dog_id {
                handle = handle.bind(("dog_id", dog_id));
            }
            let mut response = handle.await.map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            Ok(!rows.is_empty())
        })
    }

    fn count_unapproved(&self, rescuer_id: &str) -> BoxFuture<'_, DomainResult<u64>> {
        let rescuer_id = rescuer_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query(
                    "SELECT count() AS count FROM reviews \
                     WHERE rescuer_id = $rescuer_id AND is_approved = false GROUP ALL",
                )
                .bind(("rescuer_id", rescuer_id))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            Ok(count_from_rows(rows))
        })
    }
}
