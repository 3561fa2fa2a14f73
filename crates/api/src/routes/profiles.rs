use axum::extract::{Extension, Path, State};
use axum::{Json, http::StatusCode};
use patitas_domain::auth::Role;
use patitas_domain::profiles::{
    CompleteProfileInput, HomeType, ProfileService, ProfileUpdate, RescuerType, UserProfile,
};
use serde::Deserialize;
use validator::Validate;

use super::actor_identity;
use crate::error::{ApiError, map_domain_error};
use crate::middleware::AuthContext;
use crate::state::AppState;
use crate::validation;

fn service(state: &AppState) -> ProfileService {
    ProfileService::new(state.profile_repo.clone())
}

pub(crate) async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = service(&state)
        .get(&user_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(profile))
}

pub(crate) async fn my_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UserProfile>, ApiError> {
    let actor = actor_identity(&auth)?;
    let profile = service(&state)
        .get(&actor.user_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(profile))
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CompleteProfileBody {
    #[validate(email)]
    email: String,
    #[validate(length(min = 1, max = 100))]
    first_name: String,
    #[validate(length(max = 100))]
    last_name: String,
    #[validate(length(min = 1, max = 32))]
    role: String,
    phone: Option<String>,
    address: Option<String>,
    organization_name: Option<String>,
    #[validate(length(max = 2000))]
    description: Option<String>,
    avatar_url: Option<String>,
    home_type: Option<HomeType>,
    has_yard: Option<bool>,
    household_members: Option<u32>,
    has_pets: Option<bool>,
    pet_experience: Option<String>,
    why_adopt: Option<String>,
    occupation: Option<String>,
    rescuer_type: Option<RescuerType>,
    years_experience: Option<u32>,
    rescue_address: Option<String>,
    followup_process: Option<String>,
}

/// Counterpart of the privileged `create_complete_user_profile` remote
/// procedure: one multi-field insert for the authenticated user.
pub(crate) async fn complete_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CompleteProfileBody>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    validation::validate(&payload)?;
    let actor = actor_identity(&auth)?;
    let role = Role::parse(&payload.role)
        .ok_or_else(|| ApiError::Validation(format!("unknown role '{}'", payload.role)))?;

    let profile = service(&state)
        .create_complete(
            &actor,
            CompleteProfileInput {
                email: payload.email,
                first_name: payload.first_name,
                last_name: payload.last_name,
                role,
                phone: payload.phone,
                address: payload.address,
                organization_name: payload.organization_name,
                description: payload.description,
                avatar_url: payload.avatar_url,
                home_type: payload.home_type,
                has_yard: payload.has_yard,
                household_members: payload.household_members,
                has_pets: payload.has_pets,
                pet_experience: payload.pet_experience,
                why_adopt: payload.why_adopt,
                occupation: payload.occupation,
                rescuer_type: payload.rescuer_type,
                years_experience: payload.years_experience,
                rescue_address: payload.rescue_address,
                followup_process: payload.followup_process,
            },
        )
        .await
        .map_err(map_domain_error)?;

    state
        .session_hub
        .signed_in(actor, Some(profile.clone()))
        .await;
    Ok((StatusCode::CREATED, Json(profile)))
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct UpdateProfileBody {
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    organization_name: Option<String>,
    description: Option<String>,
    avatar_url: Option<String>,
    home_type: Option<HomeType>,
    has_yard: Option<bool>,
    household_members: Option<u32>,
    has_pets: Option<bool>,
    pet_experience: Option<String>,
    why_adopt: Option<String>,
    occupation: Option<String>,
    rescuer_type: Option<RescuerType>,
    years_experience: Option<u32>,
    rescue_address: Option<String>,
    followup_process: Option<String>,
}

pub(crate) async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdateProfileBody>,
) -> Result<Json<UserProfile>, ApiError> {
    let actor = actor_identity(&auth)?;
    let profile = service(&state)
        .update(
            &actor,
            ProfileUpdate {
                first_name: payload.first_name,
                last_name: payload.last_name,
                phone: payload.phone,
                address: payload.address,
                organization_name: payload.organization_name,
                description: payload.description,
                avatar_url: payload.avatar_url,
                home_type: payload.home_type,
                has_yard: payload.has_yard,
                household_members: payload.household_members,
                has_pets: payload.has_pets,
                pet_experience: payload.pet_experience,
                why_adopt: payload.why_adopt,
                occupation: payload.occupation,
                rescuer_type: payload.rescuer_type,
                years_experience: payload.years_experience,
                rescue_address: payload.rescue_address,
                followup_process: payload.followup_process,
            },
        )
        .await
        .map_err(map_domain_error)?;

    state.session_hub.profile_updated(profile.clone()).await;
    Ok(Json(profile))
}
