use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::dogs::Dog;
use crate::error::DomainError;
use crate::identity::ActorIdentity;
use crate::ports::dogs::DogRepository;
use crate::ports::favorites::FavoriteRepository;
use crate::util::now_ms;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Favorite {
    pub user_id: String,
    pub dog_id: String,
    pub created_at_ms: i64,
}

#[derive(Clone)]
pub struct FavoriteService {
    favorites: Arc<dyn FavoriteRepository>,
    dogs: Arc<dyn DogRepository>,
}

impl FavoriteService {
    pub fn new(favorites: Arc<dyn FavoriteRepository>, dogs: Arc<dyn DogRepository>) -> Self {
        Self { favorites, dogs }
    }

    /// Removes the favorite when present, adds it otherwise. Returns the
    /// resulting state: true when the dog is now a favorite.
    pub async fn toggle(&self, actor: &ActorIdentity, dog_id: &str) -> DomainResult<bool> {
        let dog_id = dog_id.trim();
        if dog_id.is_empty() {
            return Err(DomainError::Validation("dog_id is required".into()));
        }
        if self.favorites.exists(&actor.user_id, dog_id).await? {
            self.favorites.delete(&actor.user_id, dog_id).await?;
            return Ok(false);
        }
        self.dogs.get(dog_id).await?.ok_or(DomainError::NotFound)?;
        let favorite = Favorite {
            user_id: actor.user_id.clone(),
            dog_id: dog_id.to_string(),
            created_at_ms: now_ms(),
        };
        self.favorites.insert(&favorite).await?;
        Ok(true)
    }

    pub async fn is_favorite(&self, actor: &ActorIdentity, dog_id: &str) -> DomainResult<bool> {
        self.favorites.exists(&actor.user_id, dog_id).await
    }

    /// The user's favorited dogs, most recently favorited first. Dogs that
    /// were deleted since favoriting are skipped.
    pub async fn list_dogs(&self, actor: &ActorIdentity) -> DomainResult<Vec<Dog>> {
        let favorites = self.favorites.list_by_user(&actor.user_id).await?;
        let mut dogs = Vec::with_capacity(favorites.len());
        for favorite in favorites {
            if let Some(dog) = self.dogs.get(&favorite.dog_id).await? {
                dogs.push(dog);
            }
        }
        Ok(dogs)
    }

    pub async fn count_for_dog(&self, dog_id: &str) -> DomainResult<u64> {
        self.favorites.count_by_dog(dog_id).await
    }
}
