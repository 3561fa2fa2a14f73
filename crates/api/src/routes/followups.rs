use axum::extract::{Extension, Path, Query, State};
use axum::{Json, http::StatusCode};
use patitas_domain::followups::{
    AdoptionFollowup, FollowupService, FollowupStatus, FollowupUpdate,
};
use serde::Deserialize;
use validator::Validate;

use super::actor_identity;
use crate::error::{ApiError, map_domain_error};
use crate::middleware::AuthContext;
use crate::state::AppState;
use crate::validation;

fn service(state: &AppState) -> FollowupService {
    FollowupService::new(state.followup_repo.clone(), state.adoption_repo.clone())
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CreateFollowupBody {
    #[validate(length(min = 1, max = 128))]
    adoption_request_id: String,
    followup_date_ms: i64,
}

pub(crate) async fn create_followup(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateFollowupBody>,
) -> Result<(StatusCode, Json<AdoptionFollowup>), ApiError> {
    validation::validate(&payload)?;
    let _ = actor_identity(&auth)?;
    let followup = service(&state)
        .create(&payload.adoption_request_id, payload.followup_date_ms)
        .await
        .map_err(map_domain_error)?;
    Ok((StatusCode::CREATED, Json(followup)))
}

pub(crate) async fn followups_by_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(request_id): Path<String>,
) -> Result<Json<Vec<AdoptionFollowup>>, ApiError> {
    let _ = actor_identity(&auth)?;
    let followups = service(&state)
        .list_by_request(&request_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(followups))
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct PendingQuery {
    #[serde(default)]
    as_rescuer: bool,
}

pub(crate) async fn pending_followups(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<Vec<AdoptionFollowup>>, ApiError> {
    let actor = actor_identity(&auth)?;
    let followups = service(&state)
        .list_pending(&actor, query.as_rescuer)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(followups))
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UpdateFollowupBody {
    #[validate(length(max = 2000))]
    dog_health: Option<String>,
    #[validate(length(max = 2000))]
    dog_behavior: Option<String>,
    adopter_satisfaction: Option<u8>,
    photos: Option<Vec<String>>,
    #[validate(length(max = 2000))]
    notes: Option<String>,
    status: Option<FollowupStatus>,
}

pub(crate) async fn update_followup(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(followup_id): Path<String>,
    Json(payload): Json<UpdateFollowupBody>,
) -> Result<Json<AdoptionFollowup>, ApiError> {
    validation::validate(&payload)?;
    let _ = actor_identity(&auth)?;
    let followup = service(&state)
        .update(
            &followup_id,
            FollowupUpdate {
                dog_health: payload.dog_health,
                dog_behavior: payload.dog_behavior,
                adopter_satisfaction: payload.adopter_satisfaction,
                photos: payload.photos,
                notes: payload.notes,
                status: payload.status,
            },
        )
        .await
        .map_err(map_domain_error)?;
    Ok(Json(followup))
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CompleteFollowupBody {
    #[validate(length(min = 1, max = 2000))]
    dog_health: String,
    #[validate(length(min = 1, max = 2000))]
    dog_behavior: String,
    #[validate(range(min = 1, max = 5))]
    adopter_satisfaction: u8,
    #[serde(default)]
    photos: Vec<String>,
    #[validate(length(max = 2000))]
    notes: Option<String>,
}

pub(crate) async fn complete_followup(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(followup_id): Path<String>,
    Json(payload): Json<CompleteFollowupBody>,
) -> Result<Json<AdoptionFollowup>, ApiError> {
    validation::validate(&payload)?;
    let _ = actor_identity(&auth)?;
    let followup = service(&state)
        .complete(
            &followup_id,
            payload.dog_health,
            payload.dog_behavior,
            payload.adopter_satisfaction,
            payload.photos,
            payload.notes,
        )
        .await
        .map_err(map_domain_error)?;
    Ok(Json(followup))
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ScheduleFollowupsBody {
    #[validate(length(min = 1, max = 128))]
    adoption_request_id: String,
    adoption_date_ms: i64,
}

pub(crate) async fn schedule_followups(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<ScheduleFollowupsBody>,
) -> Result<(StatusCode, Json<Vec<AdoptionFollowup>>), ApiError> {
    validation::validate(&payload)?;
    let _ = actor_identity(&auth)?;
    let followups = service(&state)
        .schedule(&payload.adoption_request_id, payload.adoption_date_ms)
        .await
        .map_err(map_domain_error)?;
    Ok((StatusCode::CREATED, Json(followups)))
}

pub(crate) async fn delete_followup(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(followup_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let _ = actor_identity(&auth)?;
    service(&state)
        .delete(&followup_id)
        .await
        .map_err(map_domain_error)?;
    Ok(StatusCode::NO_CONTENT)
}
