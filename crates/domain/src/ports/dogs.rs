use crate::DomainResult;
use crate::dogs::{Dog, DogListQuery, DogStatus, DogUpdate};

use super::BoxFuture;

#[allow(clippy::needless_pass_by_value)]
pub trait DogRepository: Send + Sync {
    fn create(&self, dog: &Dog) -> BoxFuture<'_, DomainResult<Dog>>;

    fn get(&self, dog_id: &str) -> BoxFuture<'_, DomainResult<Option<Dog>>>;

    fn list(&self, query: &DogListQuery) -> BoxFuture<'_, DomainResult<Vec<Dog>>>;

    fn list_by_rescuer(&self, rescuer_id: &str) -> BoxFuture<'_, DomainResult<Vec<Dog>>>;

    fn update(
        &self,
        dog_id: &str,
        update: &DogUpdate,
        updated_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<Dog>>;

    fn delete(&self, dog_id: &str) -> BoxFuture<'_, DomainResult<()>>;

    fn search(&self, term: &str) -> BoxFuture<'_, DomainResult<Vec<Dog>>>;

    fn increment_view(&self, dog_id: &str) -> BoxFuture<'_, DomainResult<u64>>;

    fn count_by_rescuer(
        &self,
        rescuer_id: &str,
        status: Option<DogStatus>,
    ) -> BoxFuture<'_, DomainResult<u64>>;
}

/// Applies a partial update in place; shared by the test store and the
/// in-memory infra repository so both stay in step with `DogUpdate`.
pub fn apply_dog_update(dog: &mut Dog, update: &DogUpdate, updated_at_ms: i64) {
    if let Some(name) = &update.name {
        dog.name = name.clone();
    }
    if let Some(breed) = &update.breed {
        dog.breed = Some(breed.clone());
    }
    if let Some(age_years) = update.age_years {
        dog.age_years = Some(age_years);
    }
    if let Some(age_months) = update.age_months {
        dog.age_months = Some(age_months);
    }
    if let Some(size) = update.size {
        dog.size = size;
    }
    if let Some(gender) = update.gender {
        dog.gender = gender;
    }
    if let Some(description) = &update.description {
        dog.description = description.clone();
    }
    if let Some(medical_history) = &update.medical_history {
        dog.medical_history = Some(medical_history.clone());
    }
    if let Some(is_vaccinated) = update.is_vaccinated {
        dog.is_vaccinated = is_vaccinated;
    }
    if let Some(is_sterilized) = update.is_sterilized {
        dog.is_sterilized = is_sterilized;
    }
    if let Some(main_image_url) = &update.main_image_url {
        dog.main_image_url = Some(main_image_url.clone());
    }
    if let Some(images) = &update.images {
        dog.images = images.clone();
    }
    if let Some(location) = &update.location {
        dog.location = Some(location.clone());
    }
    if let Some(status) = update.status {
        dog.status = status;
    }
    if let Some(energy_level) = update.energy_level {
        dog.energy_level = Some(energy_level);
    }
    if let Some(good_with_kids) = update.good_with_kids {
        dog.good_with_kids = Some(good_with_kids);
    }
    if let Some(good_with_dogs) = update.good_with_dogs {
        dog.good_with_dogs = Some(good_with_dogs);
    }
    if let Some(good_with_cats) = update.good_with_cats {
        dog.good_with_cats = Some(good_with_cats);
    }
    if let Some(special_needs) = &update.special_needs {
        dog.special_needs = Some(special_needs.clone());
    }
    if let Some(experience_required) = update.experience_required {
        dog.experience_required = Some(experience_required);
    }
    if let Some(urgency_level) = update.urgency_level {
        dog.urgency_level = Some(urgency_level);
    }
    if let Some(video_url) = &update.video_url {
        dog.video_url = Some(video_url.clone());
    }
    dog.updated_at_ms = updated_at_ms;
}

pub fn matches_search_term(dog: &Dog, term: &str) -> bool {
    let term = term.to_lowercase();
    if dog.status != DogStatus::Available {
        return false;
    }
    dog.name.to_lowercase().contains(&term)
        || dog
            .breed
            .as_deref()
            .is_some_and(|breed| breed.to_lowercase().contains(&term))
        || dog
            .location
            .as_deref()
            .is_some_and(|location| location.to_lowercase().contains(&term))
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::Arc;

    use tokio::sync::RwLock;

    use super::*;
    use crate::error::DomainError;

    #[derive(Default)]
    pub struct InMemoryDogStore {
        store: Arc<RwLock<HashMap<String, Dog>>>,
    }

    impl InMemoryDogStore {
        pub fn handle(&self) -> Arc<RwLock<HashMap<String, Dog>>> {
            self.store.clone()
        }
    }

    impl DogRepository for InMemoryDogStore {
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
                let dogs = store
                    .read()
                    .await
                    .values()
                    .filter(|dog| matches_search_term(dog, &term))
                    .cloned()
                    .collect();
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
}
