use axum::extract::{Extension, Path, Query, State};
use axum::{Json, http::StatusCode};
use patitas_domain::dogs::{
    Dog, DogCreate, DogGender, DogListQuery, DogService, DogSize, DogStatus, DogUpdate,
    EnergyLevel, ExperienceRequired, UrgencyLevel,
};
use serde::Deserialize;
use validator::Validate;

use super::actor_identity;
use crate::error::{ApiError, map_domain_error};
use crate::middleware::AuthContext;
use crate::state::AppState;
use crate::validation;

fn service(state: &AppState) -> DogService {
    DogService::new(state.dog_repo.clone())
}

#[derive(Debug, Deserialize)]
pub(crate) struct DogsQuery {
    status: Option<DogStatus>,
    size: Option<DogSize>,
    gender: Option<DogGender>,
}

pub(crate) async fn list_dogs(
    State(state): State<AppState>,
    Query(query): Query<DogsQuery>,
) -> Result<Json<Vec<Dog>>, ApiError> {
    let dogs = service(&state)
        .list(DogListQuery {
            status: query.status,
            size: query.size,
            gender: query.gender,
        })
        .await
        .map_err(map_domain_error)?;
    Ok(Json(dogs))
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SearchQuery {
    #[validate(length(min = 1, max = 100))]
    q: String,
}

pub(crate) async fn search_dogs(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Dog>>, ApiError> {
    validation::validate(&query)?;
    let dogs = service(&state)
        .search(&query.q)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(dogs))
}

pub(crate) async fn get_dog(
    State(state): State<AppState>,
    Path(dog_id): Path<String>,
) -> Result<Json<Dog>, ApiError> {
    let dog = service(&state)
        .get(&dog_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(dog))
}

pub(crate) async fn my_dogs(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Dog>>, ApiError> {
    let actor = actor_identity(&auth)?;
    let dogs = service(&state)
        .list_by_rescuer(&actor.user_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(dogs))
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CreateDogBody {
    #[validate(length(min = 1, max = 100))]
    name: String,
    breed: Option<String>,
    age_years: Option<u8>,
    age_months: Option<u8>,
    size: DogSize,
    gender: DogGender,
    #[validate(length(min = 1, max = 4000))]
    description: String,
    medical_history: Option<String>,
    is_vaccinated: bool,
    is_sterilized: bool,
    main_image_url: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    location: Option<String>,
    energy_level: Option<EnergyLevel>,
    good_with_kids: Option<bool>,
    good_with_dogs: Option<bool>,
    good_with_cats: Option<bool>,
    special_needs: Option<String>,
    experience_required: Option<ExperienceRequired>,
    urgency_level: Option<UrgencyLevel>,
    video_url: Option<String>,
}

pub(crate) async fn create_dog(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateDogBody>,
) -> Result<(StatusCode, Json<Dog>), ApiError> {
    validation::validate(&payload)?;
    if !auth.role.can_publish_dogs() {
        return Err(ApiError::Validation(
            "only rescuers can publish dogs".into(),
        ));
    }
    let actor = actor_identity(&auth)?;
    let dog = service(&state)
        .create(
            &actor,
            DogCreate {
                name: payload.name,
                breed: payload.breed,
                age_years: payload.age_years,
                age_months: payload.age_months,
                size: payload.size,
                gender: payload.gender,
                description: payload.description,
                medical_history: payload.medical_history,
                is_vaccinated: payload.is_vaccinated,
                is_sterilized: payload.is_sterilized,
                main_image_url: payload.main_image_url,
                images: payload.images,
                location: payload.location,
                energy_level: payload.energy_level,
                good_with_kids: payload.good_with_kids,
                good_with_dogs: payload.good_with_dogs,
                good_with_cats: payload.good_with_cats,
                special_needs: payload.special_needs,
                experience_required: payload.experience_required,
                urgency_level: payload.urgency_level,
                video_url: payload.video_url,
            },
        )
        .await
        .map_err(map_domain_error)?;
    Ok((StatusCode::CREATED, Json(dog)))
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct UpdateDogBody {
    name: Option<String>,
    breed: Option<String>,
    age_years: Option<u8>,
    age_months: Option<u8>,
    size: Option<DogSize>,
    gender: Option<DogGender>,
    description: Option<String>,
    medical_history: Option<String>,
    is_vaccinated: Option<bool>,
    is_sterilized: Option<bool>,
    main_image_url: Option<String>,
    images: Option<Vec<String>>,
    location: Option<String>,
    status: Option<DogStatus>,
    energy_level: Option<EnergyLevel>,
    good_with_kids: Option<bool>,
    good_with_dogs: Option<bool>,
    good_with_cats: Option<bool>,
    special_needs: Option<String>,
    experience_required: Option<ExperienceRequired>,
    urgency_level: Option<UrgencyLevel>,
    video_url: Option<String>,
}

pub(crate) async fn update_dog(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(dog_id): Path<String>,
    Json(payload): Json<UpdateDogBody>,
) -> Result<Json<Dog>, ApiError> {
    let actor = actor_identity(&auth)?;
    let dog = service(&state)
        .update(
            &actor,
            &dog_id,
            DogUpdate {
                name: payload.name,
                breed: payload.breed,
                age_years: payload.age_years,
                age_months: payload.age_months,
                size: payload.size,
                gender: payload.gender,
                description: payload.description,
                medical_history: payload.medical_history,
                is_vaccinated: payload.is_vaccinated,
                is_sterilized: payload.is_sterilized,
                main_image_url: payload.main_image_url,
                images: payload.images,
                location: payload.location,
                status: payload.status,
                energy_level: payload.energy_level,
                good_with_kids: payload.good_with_kids,
                good_with_dogs: payload.good_with_dogs,
                good_with_cats: payload.good_with_cats,
                special_needs: payload.special_needs,
                experience_required: payload.experience_required,
                urgency_level: payload.urgency_level,
                video_url: payload.video_url,
            },
        )
        .await
        .map_err(map_domain_error)?;
    Ok(Json(dog))
}

pub(crate) async fn delete_dog(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(dog_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let actor = actor_identity(&auth)?;
    service(&state)
        .delete(&actor, &dog_id)
        .await
        .map_err(map_domain_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fire-and-forget view counter; the response does not wait on it.
pub(crate) async fn record_view(
    State(state): State<AppState>,
    Path(dog_id): Path<String>,
) -> StatusCode {
    let service = service(&state);
    tokio::spawn(async move {
        service.record_view(&dog_id).await;
    });
    StatusCode::ACCEPTED
}
