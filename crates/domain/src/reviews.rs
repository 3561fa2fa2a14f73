use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::identity::ActorIdentity;
use crate::ports::profiles::ProfileRepository;
use crate::ports::reviews::ReviewRepository;
use crate::util::now_ms;

const MAX_COMMENT_LENGTH: usize = 2_000;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub review_id: String,
    pub reviewer_id: String,
    pub rescuer_id: String,
    pub dog_id: Option<String>,
    pub rating: u8,
    pub comment: Option<String>,
    pub is_approved: bool,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct ReviewCreate {
    pub rescuer_id: String,
    pub dog_id: Option<String>,
    pub rating: u8,
    pub comment: Option<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct RescuerRating {
    pub average: f64,
    pub count: u32,
}

#[derive(Clone)]
pub struct ReviewService {
    reviews: Arc<dyn ReviewRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl ReviewService {
    pub fn new(reviews: Arc<dyn ReviewRepository>, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { reviews, profiles }
    }

    /// New reviews await moderation before showing on the rescuer page.
    pub async fn create(
        &self,
        actor: &ActorIdentity,
        input: ReviewCreate,
    ) -> DomainResult<Review> {
        let input = validate_review_create(input)?;
        if !self
            .can_review(actor, &input.rescuer_id, input.dog_id.as_deref())
            .await?
        {
            return Err(DomainError::Conflict);
        }
        let now = now_ms();
        let review = Review {
            review_id: crate::util::uuid_v7_without_dashes(),
            reviewer_id: actor.user_id.clone(),
            rescuer_id: input.rescuer_id,
            dog_id: input.dog_id,
            rating: input.rating,
            comment: input.comment,
            is_approved: false,
            created_at_ms: now,
            updated_at_ms: now,
        };
        self.reviews.create(&review).await
    }

    /// Approved reviews only, newest first.
    pub async fn list_for_rescuer(&self, rescuer_id: &str) -> DomainResult<Vec<Review>> {
        self.reviews.list_approved_by_rescuer(rescuer_id).await
    }

    pub async fn update(
        &self,
        actor: &ActorIdentity,
        review_id: &str,
        rating: u8,
        comment: Option<String>,
    ) -> DomainResult<Review> {
        validate_rating(rating)?;
        let comment = normalize_comment(comment)?;
        let review = self
            .reviews
            .get(review_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if review.reviewer_id != actor.user_id {
            return Err(DomainError::Validation(
                "only the reviewer can edit a review".into(),
            ));
        }
        self.reviews
            .update(review_id, rating, comment, now_ms())
            .await
    }

    pub async fn delete(&self, actor: &ActorIdentity, review_id: &str) -> DomainResult<()> {
        let review = self
            .reviews
            .get(review_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if review.reviewer_id != actor.user_id {
            return Err(DomainError::Validation(
                "only the reviewer can delete a review".into(),
            ));
        }
        self.reviews.delete(review_id).await
    }

    /// One review per reviewer/rescuer pair (per dog when given).
    pub async fn can_review(
        &self,
        actor: &ActorIdentity,
        rescuer_id: &str,
        dog_id: Option<&str>,
    ) -> DomainResult<bool> {
        let exists = self
            .reviews
            .exists(&actor.user_id, rescuer_id, dog_id)
            .await?;
        Ok(!exists)
    }

    /// Rating aggregate as stored on the rescuer profile; missing profiles
    /// read as unrated.
    pub async fn rescuer_rating(&self, rescuer_id: &str) -> DomainResult<RescuerRating> {
        let profile = self.profiles.get(rescuer_id).await?;
        Ok(match profile {
            Some(profile) => RescuerRating {
                average: profile.rating_average.unwrap_or(0.0),
                count: profile.rating_count,
            },
            None => RescuerRating {
                average: 0.0,
                count: 0,
            },
        })
    }
}

fn validate_review_create(mut input: ReviewCreate) -> DomainResult<ReviewCreate> {
    input.rescuer_id = input.rescuer_id.trim().to_string();
    if input.rescuer_id.is_empty() {
        return Err(DomainError::Validation("rescuer_id is required".into()));
    }
    validate_rating(input.rating)?;
    input.comment = normalize_comment(input.comment)?;
    input.dog_id = input.dog_id.filter(|dog_id| !dog_id.trim().is_empty());
    Ok(input)
}

fn validate_rating(rating: u8) -> DomainResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(DomainError::Validation("rating must be 1 to 5".into()));
    }
    Ok(())
}

fn normalize_comment(comment: Option<String>) -> DomainResult<Option<String>> {
    let Some(comment) = comment else {
        return Ok(None);
    };
    let comment = comment.trim().to_string();
    if comment.is_empty() {
        return Ok(None);
    }
    if comment.chars().count() > MAX_COMMENT_LENGTH {
        return Err(DomainError::Validation(format!(
            "comment exceeds max length of {MAX_COMMENT_LENGTH}"
        )));
    }
    Ok(Some(comment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::profiles::testing::InMemoryProfileStore;
    use crate::ports::reviews::testing::InMemoryReviewStore;
    use crate::profiles::testing::profile_fixture;

    fn service() -> (ReviewService, Arc<InMemoryReviewStore>) {
        let reviews = Arc::new(InMemoryReviewStore::default());
        let profiles = Arc::new(InMemoryProfileStore::default());
        (ReviewService::new(reviews.clone(), profiles), reviews)
    }

    fn input(rating: u8) -> ReviewCreate {
        ReviewCreate {
            rescuer_id: "rescuer-1".to_string(),
            dog_id: None,
            rating,
            comment: Some("great rescuer".to_string()),
        }
    }

    #[tokio::test]
    async fn create_awaits_approval_and_blocks_second_review() {
        let (service, _) = service();
        let reviewer = ActorIdentity::with_user_id("adopter-1");

        let review = service.create(&reviewer, input(5)).await.expect("create");
        assert!(!review.is_approved);
        assert!(
            !service
                .can_review(&reviewer, "rescuer-1", None)
                .await
                .expect("can review")
        );

        let err = service.create(&reviewer, input(4)).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict));
    }

    #[tokio::test]
    async fn listing_shows_only_approved() {
        let (service, reviews) = service();
        let reviewer = ActorIdentity::with_user_id("adopter-1");
        let review = service.create(&reviewer, input(5)).await.expect("create");

        assert!(service.list_for_rescuer("rescuer-1").await.expect("list").is_empty());
        reviews.approve(&review.review_id).await;
        let listed = service.list_for_rescuer("rescuer-1").await.expect("list");
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn only_reviewer_edits_and_rating_is_bounded() {
        let (service, _) = service();
        let reviewer = ActorIdentity::with_user_id("adopter-1");
        let stranger = ActorIdentity::with_user_id("adopter-2");
        let review = service.create(&reviewer, input(5)).await.expect("create");

        let err = service
            .update(&stranger, &review.review_id, 1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = service
            .update(&reviewer, &review.review_id, 6, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let updated = service
            .update(&reviewer, &review.review_id, 3, Some("decent".to_string()))
            .await
            .expect("update");
        assert_eq!(updated.rating, 3);
    }

    #[tokio::test]
    async fn rating_reads_from_profile_with_unrated_fallback() {
        let reviews = Arc::new(InMemoryReviewStore::default());
        let profiles = Arc::new(InMemoryProfileStore::default());
        let mut rated = profile_fixture("rescuer-1", "Rita", "Campos");
        rated.rating_average = Some(4.5);
        rated.rating_count = 12;
        profiles.seed(rated);
        let service = ReviewService::new(reviews, profiles);

        let rating = service.rescuer_rating("rescuer-1").await.expect("rating");
        assert_eq!(rating, RescuerRating { average: 4.5, count: 12 });

        let rating = service.rescuer_rating("rescuer-2").await.expect("rating");
        assert_eq!(rating, RescuerRating { average: 0.0, count: 0 });
    }
}
