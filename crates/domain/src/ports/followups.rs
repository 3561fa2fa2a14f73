use crate::DomainResult;
use crate::followups::{AdoptionFollowup, FollowupUpdate};

use super::BoxFuture;

#[allow(clippy::needless_pass_by_value)]
pub trait FollowupRepository: Send + Sync {
    fn create(
        &self,
        followup: &AdoptionFollowup,
    ) -> BoxFuture<'_, DomainResult<AdoptionFollowup>>;

    fn create_many(&self, followups: &[AdoptionFollowup]) -> BoxFuture<'_, DomainResult<()>>;

    fn get(&self, followup_id: &str) -> BoxFuture<'_, DomainResult<Option<AdoptionFollowup>>>;

    /// All check-ins of one adoption, most recent date first.
    fn list_by_request(
        &self,
        adoption_request_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<AdoptionFollowup>>>;

    /// Pending check-ins across the given requests, earliest date first.
    fn list_pending_by_requests(
        &self,
        request_ids: &[String],
    ) -> BoxFuture<'_, DomainResult<Vec<AdoptionFollowup>>>;

    fn update(
        &self,
        followup_id: &str,
        update: &FollowupUpdate,
        updated_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<AdoptionFollowup>>;

    fn delete(&self, followup_id: &str) -> BoxFuture<'_, DomainResult<()>>;
}

/// Applies a partial followup update in place; shared with the in-memory
/// infra repository.
pub fn apply_followup_update(
    followup: &mut AdoptionFollowup,
    update: &FollowupUpdate,
    updated_at_ms: i64,
) {
    if let Some(dog_health) = &update.dog_health {
        followup.dog_health = Some(dog_health.clone());
    }
    if let Some(dog_behavior) = &update.dog_behavior {
        followup.dog_behavior = Some(dog_behavior.clone());
    }
    if let Some(satisfaction) = update.adopter_satisfaction {
        followup.adopter_satisfaction = Some(satisfaction);
    }
    if let Some(photos) = &update.photos {
        followup.photos = photos.clone();
    }
    if let Some(notes) = &update.notes {
        followup.notes = Some(notes.clone());
    }
    if let Some(status) = update.status {
        followup.status = status;
    }
    followup.updated_at_ms = updated_at_ms;
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::Arc;

    use tokio::sync::RwLock;

    use super::*;
    use crate::error::DomainError;
    use crate::followups::FollowupStatus;

    #[derive(Default)]
    pub struct InMemoryFollowupStore {
        store: Arc<RwLock<HashMap<String, AdoptionFollowup>>>,
    }

    impl FollowupRepository for InMemoryFollowupStore {
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

        fn create_many(
            &self,
            followups: &[AdoptionFollowup],
        ) -> BoxFuture<'_, DomainResult<()>> {
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

        fn get(
            &self,
            followup_id: &str,
        ) -> BoxFuture<'_, DomainResult<Option<AdoptionFollowup>>> {
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
}
