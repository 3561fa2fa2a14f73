use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::DomainResult;
use crate::adoptions::{AdoptionStatus, DAY_MS};
use crate::dogs::{Dog, DogSize, DogStatus};
use crate::error::DomainError;
use crate::identity::ActorIdentity;
use crate::ports::adoptions::AdoptionRepository;
use crate::ports::appointments::AppointmentRepository;
use crate::ports::dogs::DogRepository;
use crate::ports::favorites::FavoriteRepository;
use crate::ports::messaging::MessageRepository;
use crate::ports::reviews::ReviewRepository;
use crate::util::{month_key, now_ms};

const APPROVAL_WINDOW_DAYS: i64 = 30;
const DEFAULT_CHART_MONTHS: u32 = 12;
const MAX_CHART_MONTHS: u32 = 36;
const DEFAULT_TOP_DOGS: usize = 5;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct RescuerDashboardStats {
    pub total_dogs: u64,
    pub available_dogs: u64,
    pub adopted_dogs: u64,
    pub pending_requests: u64,
    pub approved_last_30_days: u64,
    pub upcoming_appointments: u64,
    pub unread_messages: u64,
    pub pending_reviews: u64,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct AdopterDashboardStats {
    pub pending_requests: u64,
    pub approved_requests: u64,
    pub favorites: u64,
    pub upcoming_appointments: u64,
    pub unread_messages: u64,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct DogViewStats {
    pub dog_id: String,
    pub dog_name: String,
    pub view_count: u64,
    pub favorite_count: u64,
    pub request_count: u64,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct MonthlyCount {
    pub month: String,
    pub count: u64,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct SizeCount {
    pub size: DogSize,
    pub count: u64,
}

/// Read-only dashboard aggregation. Counts are issued one after another;
/// no snapshot isolation is implied across them.
#[derive(Clone)]
pub struct StatsService {
    dogs: Arc<dyn DogRepository>,
    adoptions: Arc<dyn AdoptionRepository>,
    appointments: Arc<dyn AppointmentRepository>,
    messages: Arc<dyn MessageRepository>,
    reviews: Arc<dyn ReviewRepository>,
    favorites: Arc<dyn FavoriteRepository>,
}

impl StatsService {
    pub fn new(
        dogs: Arc<dyn DogRepository>,
        adoptions: Arc<dyn AdoptionRepository>,
        appointments: Arc<dyn AppointmentRepository>,
        messages: Arc<dyn MessageRepository>,
        reviews: Arc<dyn ReviewRepository>,
        favorites: Arc<dyn FavoriteRepository>,
    ) -> Self {
        Self {
            dogs,
            adoptions,
            appointments,
            messages,
            reviews,
            favorites,
        }
    }

    pub async fn rescuer_stats(
        &self,
        actor: &ActorIdentity,
    ) -> DomainResult<RescuerDashboardStats> {
        let rescuer_id = actor.user_id.as_str();
        let now = now_ms();
        let total_dogs = self.dogs.count_by_rescuer(rescuer_id, None).await?;
        let available_dogs = self
            .dogs
            .count_by_rescuer(rescuer_id, Some(DogStatus::Available))
            .await?;
        let adopted_dogs = self
            .dogs
            .count_by_rescuer(rescuer_id, Some(DogStatus::Adopted))
            .await?;
        let pending_requests = self
            .adoptions
            .count_by_rescuer(rescuer_id, Some(AdoptionStatus::Pending))
            .await?;
        let approved_last_30_days = self
            .adoptions
            .list_approved_since(rescuer_id, now - APPROVAL_WINDOW_DAYS * DAY_MS)
            .await?
            .len() as u64;
        let upcoming_appointments = self
            .appointments
            .count_upcoming(rescuer_id, true, now)
            .await?;
        let unread_messages = self.messages.unread_count(rescuer_id).await?;
        let pending_reviews = self.reviews.count_unapproved(rescuer_id).await?;

        Ok(RescuerDashboardStats {
            total_dogs,
            available_dogs,
            adopted_dogs,
            pending_requests,
            approved_last_30_days,
            upcoming_appointments,
            unread_messages,
            pending_reviews,
        })
    }

    pub async fn adopter_stats(
        &self,
        actor: &ActorIdentity,
    ) -> DomainResult<AdopterDashboardStats> {
        let adopter_id = actor.user_id.as_str();
        let pending_requests = self
            .adoptions
            .count_by_adopter(adopter_id, Some(AdoptionStatus::Pending))
            .await?;
        let approved_requests = self
            .adoptions
            .count_by_adopter(adopter_id, Some(AdoptionStatus::Approved))
            .await?;
        let favorites = self.favorites.count_by_user(adopter_id).await?;
        let upcoming_appointments = self
            .appointments
            .count_upcoming(adopter_id, false, now_ms())
            .await?;
        let unread_messages = self.messages.unread_count(adopter_id).await?;

        Ok(AdopterDashboardStats {
            pending_requests,
            approved_requests,
            favorites,
            upcoming_appointments,
            unread_messages,
        })
    }

    pub async fn dog_view_stats(&self, dog_id: &str) -> DomainResult<DogViewStats> {
        let dog = self.dogs.get(dog_id).await?.ok_or(DomainError::NotFound)?;
        let favorite_count = self.favorites.count_by_dog(dog_id).await?;
        let request_count = self.adoptions.count_by_dog(dog_id).await?;
        Ok(DogViewStats {
            dog_id: dog.dog_id,
            dog_name: dog.name,
            view_count: dog.view_count,
            favorite_count,
            request_count,
        })
    }

    /// Approved requests grouped by `YYYY-MM` over the trailing window.
    pub async fn adoptions_by_month(
        &self,
        actor: &ActorIdentity,
        months: Option<u32>,
    ) -> DomainResult<Vec<MonthlyCount>> {
        let months = months
            .unwrap_or(DEFAULT_CHART_MONTHS)
            .clamp(1, MAX_CHART_MONTHS);
        let since = now_ms() - i64::from(months) * 30 * DAY_MS;
        let approved = self
            .adoptions
            .list_approved_since(&actor.user_id, since)
            .await?;

        let mut buckets: BTreeMap<String, u64> = BTreeMap::new();
        for request in approved {
            *buckets.entry(month_key(request.created_at_ms)).or_default() += 1;
        }
        Ok(buckets
            .into_iter()
            .map(|(month, count)| MonthlyCount { month, count })
            .collect())
    }

    pub async fn dogs_by_size(&self, actor: &ActorIdentity) -> DomainResult<Vec<SizeCount>> {
        let dogs = self.dogs.list_by_rescuer(&actor.user_id).await?;
        let mut counts: Vec<SizeCount> = Vec::new();
        for size in [DogSize::Small, DogSize::Medium, DogSize::Large] {
            let count = dogs.iter().filter(|dog| dog.size == size).count() as u64;
            if count > 0 {
                counts.push(SizeCount { size, count });
            }
        }
        Ok(counts)
    }

    /// Most viewed listings of the rescuer.
    pub async fn top_dogs(
        &self,
        actor: &ActorIdentity,
        limit: Option<usize>,
    ) -> DomainResult<Vec<Dog>> {
        let mut dogs = self.dogs.list_by_rescuer(&actor.user_id).await?;
        dogs.sort_by(|a, b| b.view_count.cmp(&a.view_count));
        dogs.truncate(limit.unwrap_or(DEFAULT_TOP_DOGS));
        Ok(dogs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adoptions::{AdoptionRequest, AdoptionStatus};
    use crate::dogs::DogGender;
    use crate::ports::adoptions::testing::InMemoryAdoptionStore;
    use crate::ports::appointments::testing::InMemoryAppointmentStore;
    use crate::ports::dogs::testing::InMemoryDogStore;
    use crate::ports::favorites::testing::InMemoryFavoriteStore;
    use crate::ports::messaging::testing::InMemoryMessageStore;
    use crate::ports::reviews::testing::InMemoryReviewStore;

    fn dog(dog_id: &str, rescuer_id: &str, size: DogSize, status: DogStatus, views: u64) -> Dog {
        Dog {
            dog_id: dog_id.to_string(),
            name: format!("dog {dog_id}"),
            breed: None,
            age_years: None,
            age_months: None,
            size,
            gender: DogGender::Male,
            description: "friendly".to_string(),
            medical_history: None,
            is_vaccinated: true,
            is_sterilized: true,
            status,
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
            view_count: views,
            created_at_ms: 1,
            updated_at_ms: 1,
        }
    }

    fn request(
        request_id: &str,
        dog_id: &str,
        adopter_id: &str,
        rescuer_id: &str,
        status: AdoptionStatus,
        created_at_ms: i64,
    ) -> AdoptionRequest {
        AdoptionRequest {
            request_id: request_id.to_string(),
            dog_id: dog_id.to_string(),
            adopter_id: adopter_id.to_string(),
            rescuer_id: rescuer_id.to_string(),
            status,
            message: None,
            response_message: None,
            has_experience: false,
            has_other_pets: false,
            has_yard: false,
            reason_for_adoption: None,
            cancellation_reason: None,
            cancelled_at_ms: None,
            created_at_ms,
            updated_at_ms: created_at_ms,
        }
    }

    async fn fixture() -> StatsService {
        use crate::ports::adoptions::AdoptionRepository as _;
        use crate::ports::dogs::DogRepository as _;

        let dogs = Arc::new(InMemoryDogStore::default());
        for seeded in [
            dog("dog-1", "rescuer-1", DogSize::Small, DogStatus::Available, 9),
            dog("dog-2", "rescuer-1", DogSize::Small, DogStatus::Adopted, 30),
            dog("dog-3", "rescuer-1", DogSize::Large, DogStatus::InProcess, 2),
            dog("dog-4", "rescuer-2", DogSize::Medium, DogStatus::Available, 50),
        ] {
            dogs.create(&seeded).await.expect("seed dog");
        }

        let adoptions = Arc::new(InMemoryAdoptionStore::new(dogs.handle()));
        let recent = now_ms() - DAY_MS;
        for seeded in [
            request("req-1", "dog-1", "adopter-1", "rescuer-1", AdoptionStatus::Pending, recent),
            request("req-2", "dog-2", "adopter-1", "rescuer-1", AdoptionStatus::Approved, recent),
            request("req-3", "dog-3", "adopter-2", "rescuer-1", AdoptionStatus::Approved, 1_000),
        ] {
            adoptions.create(&seeded).await.expect("seed request");
        }

        StatsService::new(
            dogs,
            adoptions,
            Arc::new(InMemoryAppointmentStore::default()),
            Arc::new(InMemoryMessageStore::default()),
            Arc::new(InMemoryReviewStore::default()),
            Arc::new(InMemoryFavoriteStore::default()),
        )
    }

    #[tokio::test]
    async fn rescuer_stats_count_own_records_only() {
        let service = fixture().await;
        let rescuer = ActorIdentity::with_user_id("rescuer-1");
        let stats = service.rescuer_stats(&rescuer).await.expect("stats");

        assert_eq!(stats.total_dogs, 3);
        assert_eq!(stats.available_dogs, 1);
        assert_eq!(stats.adopted_dogs, 1);
        assert_eq!(stats.pending_requests, 1);
        // req-2 is inside the 30-day window, req-3 is ancient history.
        assert_eq!(stats.approved_last_30_days, 1);
    }

    #[tokio::test]
    async fn adopter_stats_split_by_status() {
        let service = fixture().await;
        let adopter = ActorIdentity::with_user_id("adopter-1");
        let stats = service.adopter_stats(&adopter).await.expect("stats");
        assert_eq!(stats.pending_requests, 1);
        assert_eq!(stats.approved_requests, 1);
    }

    #[tokio::test]
    async fn dog_view_stats_compose_three_counters() {
        let service = fixture().await;
        let stats = service.dog_view_stats("dog-1").await.expect("stats");
        assert_eq!(stats.view_count, 9);
        assert_eq!(stats.favorite_count, 0);
        assert_eq!(stats.request_count, 1);

        let err = service.dog_view_stats("dog-missing").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[tokio::test]
    async fn size_distribution_and_top_dogs() {
        let service = fixture().await;
        let rescuer = ActorIdentity::with_user_id("rescuer-1");

        let sizes = service.dogs_by_size(&rescuer).await.expect("sizes");
        assert_eq!(
            sizes,
            vec![
                SizeCount { size: DogSize::Small, count: 2 },
                SizeCount { size: DogSize::Large, count: 1 },
            ]
        );

        let top = service.top_dogs(&rescuer, Some(2)).await.expect("top");
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].dog_id, "dog-2");
        assert_eq!(top[1].dog_id, "dog-1");
    }

    #[tokio::test]
    async fn adoptions_by_month_buckets_recent_approvals() {
        let service = fixture().await;
        let rescuer = ActorIdentity::with_user_id("rescuer-1");
        let monthly = service
            .adoptions_by_month(&rescuer, Some(12))
            .await
            .expect("monthly");
        let total: u64 = monthly.iter().map(|bucket| bucket.count).sum();
        assert_eq!(total, 1);
    }
}
