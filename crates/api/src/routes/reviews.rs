use axum::extract::{Extension, Path, Query, State};
use axum::{Json, http::StatusCode};
use patitas_domain::reviews::{RescuerRating, Review, ReviewCreate, ReviewService};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::actor_identity;
use crate::error::{ApiError, map_domain_error};
use crate::middleware::AuthContext;
use crate::state::AppState;
use crate::validation;

fn service(state: &AppState) -> ReviewService {
    ReviewService::new(state.review_repo.clone(), state.profile_repo.clone())
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CreateReviewBody {
    #[validate(length(min = 1, max = 128))]
    rescuer_id: String,
    dog_id: Option<String>,
    #[validate(range(min = 1, max = 5))]
    rating: u8,
    #[validate(length(max = 2000))]
    comment: Option<String>,
}

pub(crate) async fn create_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateReviewBody>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    validation::validate(&payload)?;
    let actor = actor_identity(&auth)?;
    let review = service(&state)
        .create(
            &actor,
            ReviewCreate {
                rescuer_id: payload.rescuer_id,
                dog_id: payload.dog_id,
                rating: payload.rating,
                comment: payload.comment,
            },
        )
        .await
        .map_err(|err| match err {
            patitas_domain::error::DomainError::Conflict => {
                ApiError::Conflict("you have already reviewed this rescuer".into())
            }
            other => map_domain_error(other),
        })?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub(crate) async fn list_reviews(
    State(state): State<AppState>,
    Path(rescuer_id): Path<String>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let reviews = service(&state)
        .list_for_rescuer(&rescuer_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(reviews))
}

pub(crate) async fn rescuer_rating(
    State(state): State<AppState>,
    Path(rescuer_id): Path<String>,
) -> Result<Json<RescuerRating>, ApiError> {
    let rating = service(&state)
        .rescuer_rating(&rescuer_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(rating))
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UpdateReviewBody {
    #[validate(range(min = 1, max = 5))]
    rating: u8,
    #[validate(length(max = 2000))]
    comment: Option<String>,
}

pub(crate) async fn update_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(review_id): Path<String>,
    Json(payload): Json<UpdateReviewBody>,
) -> Result<Json<Review>, ApiError> {
    validation::validate(&payload)?;
    let actor = actor_identity(&auth)?;
    let review = service(&state)
        .update(&actor, &review_id, payload.rating, payload.comment)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(review))
}

pub(crate) async fn delete_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(review_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let actor = actor_identity(&auth)?;
    service(&state)
        .delete(&actor, &review_id)
        .await
        .map_err(map_domain_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub(crate) struct CanReviewQuery {
    rescuer_id: String,
    dog_id: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct CanReviewResponse {
    can_review: bool,
}

pub(crate) async fn can_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<CanReviewQuery>,
) -> Result<Json<CanReviewResponse>, ApiError> {
    let actor = actor_identity(&auth)?;
    let can_review = service(&state)
        .can_review(&actor, &query.rescuer_id, query.dog_id.as_deref())
        .await
        .map_err(map_domain_error)?;
    Ok(Json(CanReviewResponse { can_review }))
}
