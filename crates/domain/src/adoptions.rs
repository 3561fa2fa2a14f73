use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::dogs::DogStatus;
use crate::error::DomainError;
use crate::identity::ActorIdentity;
use crate::ports::adoptions::AdoptionRepository;
use crate::ports::dogs::DogRepository;
use crate::util::now_ms;

pub const COOLDOWN_DAYS: i64 = 7;
pub const DAY_MS: i64 = 86_400_000;

const MAX_TEXT_LENGTH: usize = 2_000;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdoptionStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
    CancelledByAdopter,
}

impl AdoptionStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(AdoptionStatus::Pending),
            "approved" => Some(AdoptionStatus::Approved),
            "rejected" => Some(AdoptionStatus::Rejected),
            "completed" => Some(AdoptionStatus::Completed),
            "cancelled_by_adopter" => Some(AdoptionStatus::CancelledByAdopter),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdoptionStatus::Pending => "pending",
            AdoptionStatus::Approved => "approved",
            AdoptionStatus::Rejected => "rejected",
            AdoptionStatus::Completed => "completed",
            AdoptionStatus::CancelledByAdopter => "cancelled_by_adopter",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AdoptionStatus::Rejected
                | AdoptionStatus::Completed
                | AdoptionStatus::CancelledByAdopter
        )
    }

    /// User-facing reason an existing request blocks a new submission.
    pub fn blocking_reason(&self) -> &'static str {
        match self {
            AdoptionStatus::Pending => "already pending",
            AdoptionStatus::Approved => "already approved",
            AdoptionStatus::Rejected => "previously rejected",
            AdoptionStatus::Completed => "already completed",
            AdoptionStatus::CancelledByAdopter => "previously cancelled, cooldown applies",
        }
    }
}

/// Legal moves only; anything off this table is an `InvalidTransition`.
const LEGAL_TRANSITIONS: &[(AdoptionStatus, AdoptionStatus)] = &[
    (AdoptionStatus::Pending, AdoptionStatus::Approved),
    (AdoptionStatus::Pending, AdoptionStatus::Rejected),
    (AdoptionStatus::Approved, AdoptionStatus::Completed),
    (AdoptionStatus::Pending, AdoptionStatus::CancelledByAdopter),
    (AdoptionStatus::Approved, AdoptionStatus::CancelledByAdopter),
];

/// Dog-status side effect of entering a request status.
pub fn dog_status_effect(to: AdoptionStatus) -> Option<DogStatus> {
    match to {
        AdoptionStatus::Approved => Some(DogStatus::InProcess),
        AdoptionStatus::Completed => Some(DogStatus::Adopted),
        AdoptionStatus::CancelledByAdopter => Some(DogStatus::Available),
        AdoptionStatus::Pending | AdoptionStatus::Rejected => None,
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AdoptionRequest {
    pub request_id: String,
    pub dog_id: String,
    pub adopter_id: String,
    pub rescuer_id: String,
    pub status: AdoptionStatus,
    pub message: Option<String>,
    pub response_message: Option<String>,
    pub has_experience: bool,
    pub has_other_pets: bool,
    pub has_yard: bool,
    pub reason_for_adoption: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at_ms: Option<i64>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct AdoptionRequestCreate {
    pub dog_id: String,
    pub message: Option<String>,
    pub has_experience: bool,
    pub has_other_pets: bool,
    pub has_yard: bool,
    pub reason_for_adoption: Option<String>,
}

#[derive(Clone, Debug)]
pub struct AdoptionTransition {
    pub request_id: String,
    pub to_status: AdoptionStatus,
    pub response_message: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at_ms: Option<i64>,
    pub dog_status: Option<DogStatus>,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct CooldownStatus {
    pub in_cooldown: bool,
    pub days_remaining: Option<i64>,
}

impl CooldownStatus {
    pub fn clear() -> Self {
        Self {
            in_cooldown: false,
            days_remaining: None,
        }
    }
}

/// Whole days elapsed are a floor of the millisecond difference, so a
/// cancellation 6 days and 23 hours old still counts as 6 elapsed days.
pub fn cooldown_status(cancelled_at_ms: i64, now_ms: i64) -> CooldownStatus {
    let elapsed_days = (now_ms - cancelled_at_ms).div_euclid(DAY_MS);
    if elapsed_days < COOLDOWN_DAYS {
        CooldownStatus {
            in_cooldown: true,
            days_remaining: Some(COOLDOWN_DAYS - elapsed_days),
        }
    } else {
        CooldownStatus::clear()
    }
}

#[derive(Clone)]
pub struct AdoptionService {
    requests: Arc<dyn AdoptionRepository>,
    dogs: Arc<dyn DogRepository>,
}

impl AdoptionService {
    pub fn new(requests: Arc<dyn AdoptionRepository>, dogs: Arc<dyn DogRepository>) -> Self {
        Self { requests, dogs }
    }

    /// Any prior request for the pair blocks a new one; the caller maps its
    /// status to a user-facing reason. The check is advisory: two
    /// submissions racing past it can both land (see the concurrency test).
    pub async fn check_existing_request(
        &self,
        dog_id: &str,
        adopter_id: &str,
    ) -> DomainResult<Option<AdoptionRequest>> {
        self.requests.find_by_pair(dog_id, adopter_id).await
    }

    pub async fn check_cooldown_period(
        &self,
        dog_id: &str,
        adopter_id: &str,
    ) -> DomainResult<CooldownStatus> {
        let latest = self.requests.latest_cancelled(dog_id, adopter_id).await?;
        let Some(cancelled_at_ms) = latest.and_then(|request| request.cancelled_at_ms) else {
            return Ok(CooldownStatus::clear());
        };
        Ok(cooldown_status(cancelled_at_ms, now_ms()))
    }

    /// Resolves the rescuer from the dog's current owner field at
    /// submission time. The dog stays `available` until the rescuer acts.
    pub async fn create_request(
        &self,
        actor: &ActorIdentity,
        input: AdoptionRequestCreate,
    ) -> DomainResult<AdoptionRequest> {
        let input = validate_request_create(input)?;
        let dog = self
            .dogs
            .get(&input.dog_id)
            .await?
            .ok_or(DomainError::NotFound)?;

        let now = now_ms();
        let request = AdoptionRequest {
            request_id: crate::util::uuid_v7_without_dashes(),
            dog_id: input.dog_id,
            adopter_id: actor.user_id.clone(),
            rescuer_id: dog.rescuer_id,
            status: AdoptionStatus::Pending,
            message: input.message,
            response_message: None,
            has_experience: input.has_experience,
            has_other_pets: input.has_other_pets,
            has_yard: input.has_yard,
            reason_for_adoption: input.reason_for_adoption,
            cancellation_reason: None,
            cancelled_at_ms: None,
            created_at_ms: now,
            updated_at_ms: now,
        };
        self.requests.create(&request).await
    }

    pub async fn get(&self, request_id: &str) -> DomainResult<AdoptionRequest> {
        self.requests
            .get(request_id)
            .await?
            .ok_or(DomainError::NotFound)
    }

    pub async fn list_by_adopter(&self, adopter_id: &str) -> DomainResult<Vec<AdoptionRequest>> {
        self.requests.list_by_adopter(adopter_id).await
    }

    pub async fn list_by_rescuer(&self, rescuer_id: &str) -> DomainResult<Vec<AdoptionRequest>> {
        self.requests.list_by_rescuer(rescuer_id).await
    }

    /// Rescuer decision: approve, reject, or mark completed. The request
    /// update and the dog side effect land as one repository unit.
    pub async fn update_status(
        &self,
        request_id: &str,
        to_status: AdoptionStatus,
        response_message: Option<String>,
    ) -> DomainResult<AdoptionRequest> {
        if to_status == AdoptionStatus::CancelledByAdopter {
            return Err(DomainError::Validation(
                "cancellation goes through cancel_request".into(),
            ));
        }
        let response_message = validate_optional_text(response_message, "response_message")?;
        let request = self.get(request_id).await?;
        ensure_legal_transition(request.status, to_status)?;

        let transition = AdoptionTransition {
            request_id: request.request_id,
            to_status,
            response_message,
            cancellation_reason: None,
            cancelled_at_ms: None,
            dog_status: dog_status_effect(to_status),
            updated_at_ms: now_ms(),
        };
        self.requests.apply_transition(&transition).await
    }

    /// Adopter cancellation from `pending` or `approved`. The dog reverts
    /// to `available` unconditionally; by the single-active-request
    /// assumption no other approved request should exist for it.
    pub async fn cancel_request(
        &self,
        request_id: &str,
        reason: Option<String>,
    ) -> DomainResult<AdoptionRequest> {
        let reason = validate_optional_text(reason, "cancellation_reason")?;
        let request = self.get(request_id).await?;
        ensure_legal_transition(request.status, AdoptionStatus::CancelledByAdopter)?;

        let now = now_ms();
        let transition = AdoptionTransition {
            request_id: request.request_id,
            to_status: AdoptionStatus::CancelledByAdopter,
            response_message: None,
            cancellation_reason: reason,
            cancelled_at_ms: Some(now),
            dog_status: Some(DogStatus::Available),
            updated_at_ms: now,
        };
        self.requests.apply_transition(&transition).await
    }
}

fn ensure_legal_transition(from: AdoptionStatus, to: AdoptionStatus) -> DomainResult<()> {
    if LEGAL_TRANSITIONS.contains(&(from, to)) {
        return Ok(());
    }
    Err(DomainError::InvalidTransition {
        from: from.as_str().to_string(),
        to: to.as_str().to_string(),
    })
}

fn validate_request_create(mut input: AdoptionRequestCreate) -> DomainResult<AdoptionRequestCreate> {
    input.dog_id = input.dog_id.trim().to_string();
    if input.dog_id.is_empty() {
        return Err(DomainError::Validation("dog_id is required".into()));
    }
    input.message = validate_optional_text(input.message, "message")?;
    input.reason_for_adoption =
        validate_optional_text(input.reason_for_adoption, "reason_for_adoption")?;
    Ok(input)
}

fn validate_optional_text(value: Option<String>, field: &str) -> DomainResult<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let value = value.trim().to_string();
    if value.is_empty() {
        return Ok(None);
    }
    if value.chars().count() > MAX_TEXT_LENGTH {
        return Err(DomainError::Validation(format!(
            "{field} exceeds max length of {MAX_TEXT_LENGTH}"
        )));
    }
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dogs::{Dog, DogGender, DogSize};
    use crate::ports::adoptions::testing::InMemoryAdoptionStore;
    use crate::ports::dogs::DogRepository;
    use crate::ports::dogs::testing::InMemoryDogStore;

    fn dog_fixture(dog_id: &str, rescuer_id: &str) -> Dog {
        Dog {
            dog_id: dog_id.to_string(),
            name: "Rocky".to_string(),
            breed: None,
            age_years: Some(2),
            age_months: None,
            size: DogSize::Medium,
            gender: DogGender::Male,
            description: "friendly".to_string(),
            medical_history: None,
            is_vaccinated: true,
            is_sterilized: true,
            status: DogStatus::Available,
            main_image_url: None,
            images: vec![],
            rescuer_id: rescuer_id.to_string(),
            location: None,
            energy_level: None,
            good_with_kids: None,
            good_with_dogs: None,
            good_with_cats: None,
            special_needs: None,
            experience_required: None,
            urgency_level: None,
            video_url: None,
            view_count: 0,
            created_at_ms: 1,
            updated_at_ms: 1,
        }
    }

    fn create_input(dog_id: &str) -> AdoptionRequestCreate {
        AdoptionRequestCreate {
            dog_id: dog_id.to_string(),
            message: Some("I would love to adopt Rocky".to_string()),
            has_experience: true,
            has_other_pets: false,
            has_yard: true,
            reason_for_adoption: Some("lifelong dog household".to_string()),
        }
    }

    async fn service_with_dog() -> (AdoptionService, Arc<InMemoryDogStore>) {
        let dogs = Arc::new(InMemoryDogStore::default());
        dogs.create(&dog_fixture("dog-1", "rescuer-1"))
            .await
            .expect("seed dog");
        let requests = Arc::new(InMemoryAdoptionStore::new(dogs.handle()));
        (AdoptionService::new(requests, dogs.clone()), dogs)
    }

    async fn dog_status(dogs: &InMemoryDogStore, dog_id: &str) -> DogStatus {
        dogs.get(dog_id)
            .await
            .expect("get dog")
            .expect("dog exists")
            .status
    }

    #[tokio::test]
    async fn create_resolves_rescuer_and_leaves_dog_available() {
        let (service, dogs) = service_with_dog().await;
        let adopter = ActorIdentity::with_user_id("adopter-1");

        assert!(
            service
                .check_existing_request("dog-1", "adopter-1")
                .await
                .expect("check")
                .is_none()
        );

        let request = service
            .create_request(&adopter, create_input("dog-1"))
            .await
            .expect("create request");

        assert_eq!(request.status, AdoptionStatus::Pending);
        assert_eq!(request.rescuer_id, "rescuer-1");
        assert_eq!(request.cancelled_at_ms, None);
        assert_eq!(dog_status(&dogs, "dog-1").await, DogStatus::Available);

        let existing = service
            .check_existing_request("dog-1", "adopter-1")
            .await
            .expect("check")
            .expect("created record is visible");
        assert_eq!(existing.request_id, request.request_id);
        assert_eq!(existing.status.blocking_reason(), "already pending");
    }

    #[tokio::test]
    async fn create_fails_when_dog_is_gone() {
        let (service, _dogs) = service_with_dog().await;
        let adopter = ActorIdentity::with_user_id("adopter-1");
        let err = service
            .create_request(&adopter, create_input("dog-missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[test]
    fn cooldown_boundary_exactly_seven_days_is_clear() {
        let cancelled = 1_000_000_000_000;
        let status = cooldown_status(cancelled, cancelled + COOLDOWN_DAYS * DAY_MS);
        assert!(!status.in_cooldown);
        assert_eq!(status.days_remaining, None);
    }

    #[test]
    fn cooldown_six_days_twenty_three_hours_leaves_one_day() {
        let cancelled = 1_000_000_000_000;
        let elapsed = 6 * DAY_MS + 23 * 60 * 60 * 1000;
        let status = cooldown_status(cancelled, cancelled + elapsed);
        assert!(status.in_cooldown);
        assert_eq!(status.days_remaining, Some(1));
    }

    #[test]
    fn cooldown_fresh_cancellation_has_full_window() {
        let status = cooldown_status(1_000, 1_000);
        assert!(status.in_cooldown);
        assert_eq!(status.days_remaining, Some(COOLDOWN_DAYS));
    }

    #[tokio::test]
    async fn lifecycle_approve_then_complete_moves_dog_along() {
        let (service, dogs) = service_with_dog().await;
        let adopter = ActorIdentity::with_user_id("adopter-1");
        let request = service
            .create_request(&adopter, create_input("dog-1"))
            .await
            .expect("create");

        let approved = service
            .update_status(
                &request.request_id,
                AdoptionStatus::Approved,
                Some("come meet him this week".to_string()),
            )
            .await
            .expect("approve");
        assert_eq!(approved.status, AdoptionStatus::Approved);
        assert_eq!(
            approved.response_message.as_deref(),
            Some("come meet him this week")
        );
        assert_eq!(approved.cancelled_at_ms, None);
        assert_eq!(dog_status(&dogs, "dog-1").await, DogStatus::InProcess);

        let completed = service
            .update_status(&request.request_id, AdoptionStatus::Completed, None)
            .await
            .expect("complete");
        assert_eq!(completed.status, AdoptionStatus::Completed);
        assert_eq!(dog_status(&dogs, "dog-1").await, DogStatus::Adopted);
    }

    #[tokio::test]
    async fn reject_leaves_dog_untouched() {
        let (service, dogs) = service_with_dog().await;
        let adopter = ActorIdentity::with_user_id("adopter-1");
        let request = service
            .create_request(&adopter, create_input("dog-1"))
            .await
            .expect("create");

        let rejected = service
            .update_status(&request.request_id, AdoptionStatus::Rejected, None)
            .await
            .expect("reject");
        assert_eq!(rejected.status, AdoptionStatus::Rejected);
        assert_eq!(dog_status(&dogs, "dog-1").await, DogStatus::Available);
    }

    #[tokio::test]
    async fn cancel_sets_reason_and_reverts_dog_then_cooldown_blocks() {
        let (service, dogs) = service_with_dog().await;
        let adopter = ActorIdentity::with_user_id("adopter-1");
        let request = service
            .create_request(&adopter, create_input("dog-1"))
            .await
            .expect("create");

        let cancelled = service
            .cancel_request(&request.request_id, Some("changed my mind".to_string()))
            .await
            .expect("cancel");
        assert_eq!(cancelled.status, AdoptionStatus::CancelledByAdopter);
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("changed my mind"));
        assert!(cancelled.cancelled_at_ms.is_some());
        assert_eq!(dog_status(&dogs, "dog-1").await, DogStatus::Available);

        let cooldown = service
            .check_cooldown_period("dog-1", "adopter-1")
            .await
            .expect("cooldown");
        assert!(cooldown.in_cooldown);
        let remaining = cooldown.days_remaining.expect("days remaining");
        assert!((1..=COOLDOWN_DAYS).contains(&remaining));
    }

    #[tokio::test]
    async fn skipping_approved_is_an_invalid_transition() {
        let (service, dogs) = service_with_dog().await;
        let adopter = ActorIdentity::with_user_id("adopter-1");
        let request = service
            .create_request(&adopter, create_input("dog-1"))
            .await
            .expect("create");

        let err = service
            .update_status(&request.request_id, AdoptionStatus::Completed, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidTransition { ref from, ref to }
                if from == "pending" && to == "completed"
        ));
        // The guard fires before any write: request and dog are untouched.
        let reloaded = service.get(&request.request_id).await.expect("reload");
        assert_eq!(reloaded.status, AdoptionStatus::Pending);
        assert_eq!(dog_status(&dogs, "dog-1").await, DogStatus::Available);
    }

    #[tokio::test]
    async fn terminal_states_accept_no_further_moves() {
        let (service, _dogs) = service_with_dog().await;
        let adopter = ActorIdentity::with_user_id("adopter-1");
        let request = service
            .create_request(&adopter, create_input("dog-1"))
            .await
            .expect("create");
        service
            .update_status(&request.request_id, AdoptionStatus::Rejected, None)
            .await
            .expect("reject");

        let err = service
            .update_status(&request.request_id, AdoptionStatus::Approved, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));

        let err = service
            .cancel_request(&request.request_id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn repeated_cancel_write_keeps_last_reason_and_dog_available() {
        // Driven at the repository layer: the write path itself is
        // accidentally idempotent, the second reason simply overwrites.
        let dogs = Arc::new(InMemoryDogStore::default());
        dogs.create(&dog_fixture("dog-1", "rescuer-1"))
            .await
            .expect("seed dog");
        let requests = Arc::new(InMemoryAdoptionStore::new(dogs.handle()));
        let service = AdoptionService::new(requests.clone(), dogs.clone());
        let adopter = ActorIdentity::with_user_id("adopter-1");
        let request = service
            .create_request(&adopter, create_input("dog-1"))
            .await
            .expect("create");

        use crate::ports::adoptions::AdoptionRepository as _;
        for reason in ["first thoughts", "second thoughts"] {
            requests
                .apply_transition(&AdoptionTransition {
                    request_id: request.request_id.clone(),
                    to_status: AdoptionStatus::CancelledByAdopter,
                    response_message: None,
                    cancellation_reason: Some(reason.to_string()),
                    cancelled_at_ms: Some(now_ms()),
                    dog_status: Some(DogStatus::Available),
                    updated_at_ms: now_ms(),
                })
                .await
                .expect("cancel write");
        }

        let reloaded = service.get(&request.request_id).await.expect("reload");
        assert_eq!(
            reloaded.cancellation_reason.as_deref(),
            Some("second thoughts")
        );
        assert_eq!(dog_status(&dogs, "dog-1").await, DogStatus::Available);
    }

    #[tokio::test]
    async fn concurrent_duplicate_requests_both_survive() {
        // Known limitation: the existing-request check is advisory, so two
        // submissions racing past it both land. Asserted, not guaranteed
        // away.
        let (service, _dogs) = service_with_dog().await;
        let adopter = ActorIdentity::with_user_id("adopter-1");

        let (first, second) = tokio::join!(
            service.create_request(&adopter, create_input("dog-1")),
            service.create_request(&adopter, create_input("dog-1")),
        );
        let first = first.expect("first create");
        let second = second.expect("second create");
        assert_ne!(first.request_id, second.request_id);

        let count = service
            .requests
            .count_by_dog("dog-1")
            .await
            .expect("count");
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn cancelled_at_is_set_only_on_cancellation() {
        let (service, _dogs) = service_with_dog().await;
        let adopter = ActorIdentity::with_user_id("adopter-1");
        let request = service
            .create_request(&adopter, create_input("dog-1"))
            .await
            .expect("create");
        assert_eq!(request.cancelled_at_ms, None);

        let approved = service
            .update_status(&request.request_id, AdoptionStatus::Approved, None)
            .await
            .expect("approve");
        assert_eq!(approved.cancelled_at_ms, None);

        let cancelled = service
            .cancel_request(&request.request_id, None)
            .await
            .expect("cancel");
        assert!(cancelled.cancelled_at_ms.is_some());
    }

    #[test]
    fn status_parse_round_trips() {
        for status in [
            AdoptionStatus::Pending,
            AdoptionStatus::Approved,
            AdoptionStatus::Rejected,
            AdoptionStatus::Completed,
            AdoptionStatus::CancelledByAdopter,
        ] {
            assert_eq!(AdoptionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AdoptionStatus::parse("archived"), None);
    }
}
