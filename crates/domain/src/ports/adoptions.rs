use crate::DomainResult;
use crate::adoptions::{AdoptionRequest, AdoptionStatus, AdoptionTransition};

use super::BoxFuture;

#[allow(clippy::needless_pass_by_value)]
pub trait AdoptionRepository: Send + Sync {
    fn create(&self, request: &AdoptionRequest) -> BoxFuture<'_, DomainResult<AdoptionRequest>>;

    fn get(&self, request_id: &str) -> BoxFuture<'_, DomainResult<Option<AdoptionRequest>>>;

    /// At most one request per (dog, adopter) pair is assumed; no ordering
    /// is applied because uniqueness is assumed, not enforced.
    fn find_by_pair(
        &self,
        dog_id: &str,
        adopter_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<AdoptionRequest>>>;

    /// Most recently cancelled request for the pair, by `cancelled_at_ms`
    /// descending.
    fn latest_cancelled(
        &self,
        dog_id: &str,
        adopter_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<AdoptionRequest>>>;

    fn list_by_adopter(
        &self,
        adopter_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<AdoptionRequest>>>;

    fn list_by_rescuer(
        &self,
        rescuer_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<AdoptionRequest>>>;

    /// Applies the request update and its dog-status side effect as one
    /// unit: a single transaction on SurrealDB, a single critical section
    /// in memory. Returns the updated request.
    fn apply_transition(
        &self,
        transition: &AdoptionTransition,
    ) -> BoxFuture<'_, DomainResult<AdoptionRequest>>;

    fn count_by_adopter(
        &self,
        adopter_id: &str,
        status: Option<AdoptionStatus>,
    ) -> BoxFuture<'_, DomainResult<u64>>;

    fn count_by_rescuer(
        &self,
        rescuer_id: &str,
        status: Option<AdoptionStatus>,
    ) -> BoxFuture<'_, DomainResult<u64>>;

    fn count_by_dog(&self, dog_id: &str) -> BoxFuture<'_, DomainResult<u64>>;

    /// Approved requests created at or after `since_ms` for a rescuer's
    /// dogs, ascending by creation time.
    fn list_approved_since(
        &self,
        rescuer_id: &str,
        since_ms: i64,
    ) -> BoxFuture<'_, DomainResult<Vec<AdoptionRequest>>>;
}

/// Applies transition fields to a request record; shared by the test store
/// and the in-memory infra repository.
pub fn apply_transition_fields(request: &mut AdoptionRequest, transition: &AdoptionTransition) {
    request.status = transition.to_status;
    if transition.response_message.is_some() {
        request.response_message = transition.response_message.clone();
    }
    if transition.to_status == AdoptionStatus::CancelledByAdopter {
        request.cancellation_reason = transition.cancellation_reason.clone();
        request.cancelled_at_ms = transition.cancelled_at_ms;
    }
    request.updated_at_ms = transition.updated_at_ms;
}
