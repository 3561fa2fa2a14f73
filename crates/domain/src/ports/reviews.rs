use crate::DomainResult;
use crate::reviews::Review;

use super::BoxFuture;

#[allow(clippy::needless_pass_by_value)]
pub trait ReviewRepository: Send + Sync {
    fn create(&self, review: &Review) -> BoxFuture<'_, DomainResult<Review>>;

    fn get(&self, review_id: &str) -> BoxFuture<'_, DomainResult<Option<Review>>>;

    /// Approved reviews for a rescuer, newest first.
    fn list_approved_by_rescuer(
        &self,
        rescuer_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<Review>>>;

    fn update(
        &self,
        review_id: &str,
        rating: u8,
        comment: Option<String>,
        updated_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<Review>>;

    fn delete(&self, review_id: &str) -> BoxFuture<'_, DomainResult<()>>;

    /// Whether the reviewer already reviewed this rescuer (and dog, when
    /// given).
    fn exists(
        &self,
        reviewer_id: &str,
        rescuer_id: &str,
        dog_id: Option<&str>,
    ) -> BoxFuture<'_, DomainResult<bool>>;

    fn count_unapproved(&self, rescuer_id: &str) -> BoxFuture<'_, DomainResult<u64>>;
}
