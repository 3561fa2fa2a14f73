use crate::DomainResult;
use crate::profiles::{ProfileUpdate, UserProfile};

use super::BoxFuture;

#[allow(clippy::needless_pass_by_value)]
pub trait ProfileRepository: Send + Sync {
    fn get(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Option<UserProfile>>>;

    fn create(&self, profile: &UserProfile) -> BoxFuture<'_, DomainResult<UserProfile>>;

    fn update(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
        updated_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<UserProfile>>;
}

/// Applies a partial profile update in place; shared with the in-memory
/// infra repository.
pub fn apply_profile_update(profile: &mut UserProfile, update: &ProfileUpdate, updated_at_ms: i64) {
    if let Some(first_name) = &update.first_name {
        profile.first_name = first_name.clone();
    }
    if let Some(last_name) = &update.last_name {
        profile.last_name = last_name.clone();
    }
    if let Some(phone) = &update.phone {
        profile.phone = Some(phone.clone());
    }
    if let Some(address) = &update.address {
        profile.address = Some(address.clone());
    }
    if let Some(organization_name) = &update.organization_name {
        profile.organization_name = Some(organization_name.clone());
    }
    if let Some(description) = &update.description {
        profile.description = Some(description.clone());
    }
    if let Some(avatar_url) = &update.avatar_url {
        profile.avatar_url = Some(avatar_url.clone());
    }
    if let Some(home_type) = update.home_type {
        profile.home_type = Some(home_type);
    }
    if let Some(has_yard) = update.has_yard {
        profile.has_yard = Some(has_yard);
    }
    if let Some(household_members) = update.household_members {
        profile.household_members = Some(household_members);
    }
    if let Some(has_pets) = update.has_pets {
        profile.has_pets = Some(has_pets);
    }
    if let Some(pet_experience) = &update.pet_experience {
        profile.pet_experience = Some(pet_experience.clone());
    }
    if let Some(why_adopt) = &update.why_adopt {
        profile.why_adopt = Some(why_adopt.clone());
    }
    if let Some(occupation) = &update.occupation {
        profile.occupation = Some(occupation.clone());
    }
    if let Some(rescuer_type) = update.rescuer_type {
        profile.rescuer_type = Some(rescuer_type);
    }
    if let Some(years_experience) = update.years_experience {
        profile.years_experience = Some(years_experience);
    }
    if let Some(rescue_address) = &update.rescue_address {
        profile.rescue_address = Some(rescue_address.clone());
    }
    if let Some(followup_process) = &update.followup_process {
        profile.followup_process = Some(followup_process.clone());
    }
    profile.updated_at_ms = updated_at_ms;
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::error::DomainError;

    #[derive(Default)]
    pub struct InMemoryProfileStore {
        store: Arc<Mutex<HashMap<String, UserProfile>>>,
    }

    impl InMemoryProfileStore {
        pub fn seed(&self, profile: UserProfile) {
            if let Ok(mut store) = self.store.lock() {
                store.insert(profile.user_id.clone(), profile);
            }
        }
    }

    impl ProfileRepository for InMemoryProfileStore {
        fn get(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Option<UserProfile>>> {
            let user_id = user_id.to_string();
            let store = self.store.clone();
            Box::pin(async move {
                let store = store
                    .lock()
                    .map_err(|_| DomainError::Validation("profile store poisoned".into()))?;
                Ok(store.get(&user_id).cloned())
            })
        }

        fn create(&self, profile: &UserProfile) -> BoxFuture<'_, DomainResult<UserProfile>> {
            let profile = profile.clone();
            let store = self.store.clone();
            Box::pin(async move {
                let mut store = store
                    .lock()
                    .map_err(|_| DomainError::Validation("profile store poisoned".into()))?;
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
                let mut store = store
                    .lock()
                    .map_err(|_| DomainError::Validation("profile store poisoned".into()))?;
                let profile = store.get_mut(&user_id).ok_or(DomainError::NotFound)?;
                apply_profile_update(profile, &update, updated_at_ms);
                Ok(profile.clone())
            })
        }
    }
}
