use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use patitas_domain::notifications::{
    NotificationPreferences, NotificationPreferencesUpdate, NotificationService,
};
use serde::Deserialize;
use validator::Validate;

use super::actor_identity;
use crate::error::{ApiError, map_domain_error};
use crate::middleware::AuthContext;
use crate::state::AppState;
use crate::validation;

fn service(state: &AppState) -> NotificationService {
    NotificationService::new(state.notification_repo.clone())
}

pub(crate) async fn get_preferences(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<NotificationPreferences>, ApiError> {
    let actor = actor_identity(&auth)?;
    let preferences = service(&state)
        .get_preferences(&actor)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(preferences))
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct UpdatePreferencesBody {
    new_dogs: Option<bool>,
    messages: Option<bool>,
    appointments: Option<bool>,
    adoption_status: Option<bool>,
    followups: Option<bool>,
    favorites_updates: Option<bool>,
}

pub(crate) async fn update_preferences(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdatePreferencesBody>,
) -> Result<Json<NotificationPreferences>, ApiError> {
    let actor = actor_identity(&auth)?;
    let preferences = service(&state)
        .update_preferences(
            &actor,
            NotificationPreferencesUpdate {
                new_dogs: payload.new_dogs,
                messages: payload.messages,
                appointments: payload.appointments,
                adoption_status: payload.adoption_status,
                followups: payload.followups,
                favorites_updates: payload.favorites_updates,
            },
        )
        .await
        .map_err(map_domain_error)?;
    Ok(Json(preferences))
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PushTokenBody {
    #[validate(length(min = 1, max = 512))]
    push_token: String,
}

pub(crate) async fn save_push_token(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<PushTokenBody>,
) -> Result<Json<NotificationPreferences>, ApiError> {
    validation::validate(&payload)?;
    let actor = actor_identity(&auth)?;
    let preferences = service(&state)
        .save_push_token(&actor, payload.push_token)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(preferences))
}

pub(crate) async fn remove_push_token(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, ApiError> {
    let actor = actor_identity(&auth)?;
    service(&state)
        .remove_push_token(&actor)
        .await
        .map_err(map_domain_error)?;
    Ok(StatusCode::NO_CONTENT)
}
