use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::adoptions::DAY_MS;
use crate::error::DomainError;
use crate::identity::ActorIdentity;
use crate::ports::adoptions::AdoptionRepository;
use crate::ports::followups::FollowupRepository;
use crate::util::now_ms;

/// Check-ins happen 7, 30 and 90 days after the adoption completes.
pub const FOLLOWUP_SCHEDULE_DAYS: [i64; 3] = [7, 30, 90];

const MAX_PHOTO_COUNT: usize = 10;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FollowupStatus {
    Pending,
    Completed,
}

impl FollowupStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(FollowupStatus::Pending),
            "completed" => Some(FollowupStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FollowupStatus::Pending => "pending",
            FollowupStatus::Completed => "completed",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AdoptionFollowup {
    pub followup_id: String,
    pub adoption_request_id: String,
    pub followup_date_ms: i64,
    pub status: FollowupStatus,
    pub dog_health: Option<String>,
    pub dog_behavior: Option<String>,
    pub adopter_satisfaction: Option<u8>,
    pub photos: Vec<String>,
    pub notes: Option<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug, Default)]
pub struct FollowupUpdate {
    pub dog_health: Option<String>,
    pub dog_behavior: Option<String>,
    pub adopter_satisfaction: Option<u8>,
    pub photos: Option<Vec<String>>,
    pub notes: Option<String>,
    pub status: Option<FollowupStatus>,
}

#[derive(Clone)]
pub struct FollowupService {
    followups: Arc<dyn FollowupRepository>,
    requests: Arc<dyn AdoptionRepository>,
}

impl FollowupService {
    pub fn new(
        followups: Arc<dyn FollowupRepository>,
        requests: Arc<dyn AdoptionRepository>,
    ) -> Self {
        Self {
            followups,
            requests,
        }
    }

    pub async fn create(
        &self,
        adoption_request_id: &str,
        followup_date_ms: i64,
    ) -> DomainResult<AdoptionFollowup> {
        if followup_date_ms <= 0 {
            return Err(DomainError::Validation(
                "followup_date_ms is required".into(),
            ));
        }
        self.requests
            .get(adoption_request_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        let followup = new_pending_followup(adoption_request_id, followup_date_ms);
        self.followups.create(&followup).await
    }

    /// All check-ins of one adoption, most recent date first.
    pub async fn list_by_request(
        &self,
        adoption_request_id: &str,
    ) -> DomainResult<Vec<AdoptionFollowup>> {
        self.followups.list_by_request(adoption_request_id).await
    }

    /// Pending check-ins across the user's adoptions: their own requests as
    /// adopter, their dogs' requests as rescuer.
    pub async fn list_pending(
        &self,
        actor: &ActorIdentity,
        as_rescuer: bool,
    ) -> DomainResult<Vec<AdoptionFollowup>> {
        let requests = if as_rescuer {
            self.requests.list_by_rescuer(&actor.user_id).await?
        } else {
            self.requests.list_by_adopter(&actor.user_id).await?
        };
        let request_ids: Vec<String> = requests
            .into_iter()
            .map(|request| request.request_id)
            .collect();
        if request_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.followups.list_pending_by_requests(&request_ids).await
    }

    pub async fn update(
        &self,
        followup_id: &str,
        update: FollowupUpdate,
    ) -> DomainResult<AdoptionFollowup> {
        let update = validate_followup_update(update)?;
        self.followups.update(followup_id, &update, now_ms()).await
    }

    pub async fn complete(
        &self,
        followup_id: &str,
        dog_health: String,
        dog_behavior: String,
        satisfaction: u8,
        photos: Vec<String>,
        notes: Option<String>,
    ) -> DomainResult<AdoptionFollowup> {
        self.update(
            followup_id,
            FollowupUpdate {
                dog_health: Some(dog_health),
                dog_behavior: Some(dog_behavior),
                adopter_satisfaction: Some(satisfaction),
                photos: Some(photos),
                notes,
                status: Some(FollowupStatus::Completed),
            },
        )
        .await
    }

    /// Seeds the 7/30/90-day check-ins after an adoption completes.
    pub async fn schedule(
        &self,
        adoption_request_id: &str,
        adoption_date_ms: i64,
    ) -> DomainResult<Vec<AdoptionFollowup>> {
        self.requests
            .get(adoption_request_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        let followups: Vec<AdoptionFollowup> = FOLLOWUP_SCHEDULE_DAYS
            .iter()
            .map(|days| {
                new_pending_followup(adoption_request_id, adoption_date_ms + days * DAY_MS)
            })
            .collect();
        self.followups.create_many(&followups).await?;
        Ok(followups)
    }

    pub async fn delete(&self, followup_id: &str) -> DomainResult<()> {
        self.followups.delete(followup_id).await
    }
}

fn new_pending_followup(adoption_request_id: &str, followup_date_ms: i64) -> AdoptionFollowup {
    let now = now_ms();
    AdoptionFollowup {
        followup_id: crate::util::uuid_v7_without_dashes(),
        adoption_request_id: adoption_request_id.to_string(),
        followup_date_ms,
        status: FollowupStatus::Pending,
        dog_health: None,
        dog_behavior: None,
        adopter_satisfaction: None,
        photos: Vec::new(),
        notes: None,
        created_at_ms: now,
        updated_at_ms: now,
    }
}

fn validate_followup_update(update: FollowupUpdate) -> DomainResult<FollowupUpdate> {
    if let Some(satisfaction) = update.adopter_satisfaction {
        if !(1..=5).contains(&satisfaction) {
            return Err(DomainError::Validation(
                "adopter_satisfaction must be 1 to 5".into(),
            ));
        }
    }
    if let Some(photos) = &update.photos {
        if photos.len() > MAX_PHOTO_COUNT {
            return Err(DomainError::Validation(format!(
                "photos exceeds max of {MAX_PHOTO_COUNT}"
            )));
        }
    }
    Ok(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adoptions::{AdoptionRequest, AdoptionStatus};
    use crate::ports::adoptions::testing::InMemoryAdoptionStore;
    use crate::ports::followups::testing::InMemoryFollowupStore;

    fn request_fixture(request_id: &str, adopter_id: &str) -> AdoptionRequest {
        AdoptionRequest {
            request_id: request_id.to_string(),
            dog_id: "dog-1".to_string(),
            adopter_id: adopter_id.to_string(),
            rescuer_id: "rescuer-1".to_string(),
            status: AdoptionStatus::Completed,
            message: None,
            response_message: None,
            has_experience: true,
            has_other_pets: false,
            has_yard: true,
            reason_for_adoption: None,
            cancellation_reason: None,
            cancelled_at_ms: None,
            created_at_ms: 1,
            updated_at_ms: 1,
        }
    }

    async fn service_with_request() -> FollowupService {
        let dogs = std::sync::Arc::new(tokio::sync::RwLock::new(std::collections::HashMap::new()));
        let requests = Arc::new(InMemoryAdoptionStore::new(dogs));
        use crate::ports::adoptions::AdoptionRepository as _;
        requests
            .create(&request_fixture("request-1", "adopter-1"))
            .await
            .expect("seed request");
        FollowupService::new(Arc::new(InMemoryFollowupStore::default()), requests)
    }

    #[tokio::test]
    async fn schedule_seeds_three_pending_checkins() {
        let service = service_with_request().await;
        let base = 1_000_000_000_000;
        let scheduled = service.schedule("request-1", base).await.expect("schedule");

        assert_eq!(scheduled.len(), 3);
        let dates: Vec<i64> = scheduled.iter().map(|f| f.followup_date_ms).collect();
        assert_eq!(
            dates,
            vec![base + 7 * DAY_MS, base + 30 * DAY_MS, base + 90 * DAY_MS]
        );
        assert!(scheduled.iter().all(|f| f.status == FollowupStatus::Pending));

        let listed = service.list_by_request("request-1").await.expect("list");
        assert_eq!(listed.len(), 3);
        // Most recent date first.
        assert_eq!(listed[0].followup_date_ms, base + 90 * DAY_MS);
    }

    #[tokio::test]
    async fn schedule_unknown_request_is_not_found() {
        let service = service_with_request().await;
        let err = service.schedule("request-missing", 1_000).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[tokio::test]
    async fn complete_fills_report_and_flips_status() {
        let service = service_with_request().await;
        let followup = service
            .create("request-1", 1_000_000)
            .await
            .expect("create");

        let completed = service
            .complete(
                &followup.followup_id,
                "healthy".to_string(),
                "settled in well".to_string(),
                5,
                vec!["https://cdn.example.com/photo.jpg".to_string()],
                None,
            )
            .await
            .expect("complete");
        assert_eq!(completed.status, FollowupStatus::Completed);
        assert_eq!(completed.adopter_satisfaction, Some(5));

        let adopter = ActorIdentity::with_user_id("adopter-1");
        let pending = service.list_pending(&adopter, false).await.expect("pending");
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn pending_filters_by_side() {
        let service = service_with_request().await;
        service.create("request-1", 1_000_000).await.expect("create");

        let adopter = ActorIdentity::with_user_id("adopter-1");
        let rescuer = ActorIdentity::with_user_id("rescuer-1");
        let other = ActorIdentity::with_user_id("adopter-2");

        assert_eq!(service.list_pending(&adopter, false).await.expect("a").len(), 1);
        assert_eq!(service.list_pending(&rescuer, true).await.expect("r").len(), 1);
        assert!(service.list_pending(&other, false).await.expect("o").is_empty());
    }

    #[test]
    fn satisfaction_is_bounded() {
        let err = validate_followup_update(FollowupUpdate {
            adopter_satisfaction: Some(6),
            ..FollowupUpdate::default()
        })
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
