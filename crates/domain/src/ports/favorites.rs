use crate::DomainResult;
use crate::favorites::Favorite;

use super::BoxFuture;

#[allow(clippy::needless_pass_by_value)]
pub trait FavoriteRepository: Send + Sync {
    fn insert(&self, favorite: &Favorite) -> BoxFuture<'_, DomainResult<Favorite>>;

    fn delete(&self, user_id: &str, dog_id: &str) -> BoxFuture<'_, DomainResult<()>>;

    fn exists(&self, user_id: &str, dog_id: &str) -> BoxFuture<'_, DomainResult<bool>>;

    /// Most recently favorited first.
    fn list_by_user(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Vec<Favorite>>>;

    fn count_by_dog(&self, dog_id: &str) -> BoxFuture<'_, DomainResult<u64>>;

    fn count_by_user(&self, user_id: &str) -> BoxFuture<'_, DomainResult<u64>>;
}
