use axum::Json;
use axum::extract::{Extension, Path, State};
use patitas_domain::dogs::Dog;
use patitas_domain::favorites::FavoriteService;
use serde::Serialize;

use super::actor_identity;
use crate::error::{ApiError, map_domain_error};
use crate::middleware::AuthContext;
use crate::state::AppState;

fn service(state: &AppState) -> FavoriteService {
    FavoriteService::new(state.favorite_repo.clone(), state.dog_repo.clone())
}

#[derive(Serialize)]
pub(crate) struct ToggleResponse {
    dog_id: String,
    is_favorite: bool,
}

pub(crate) async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(dog_id): Path<String>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let actor = actor_identity(&auth)?;
    let is_favorite = service(&state)
        .toggle(&actor, &dog_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(ToggleResponse {
        dog_id,
        is_favorite,
    }))
}

pub(crate) async fn list_favorites(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Dog>>, ApiError> {
    let actor = actor_identity(&auth)?;
    let dogs = service(&state)
        .list_dogs(&actor)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(dogs))
}

#[derive(Serialize)]
pub(crate) struct FavoriteCountResponse {
    dog_id: String,
    count: u64,
}

pub(crate) async fn favorite_count(
    State(state): State<AppState>,
    Path(dog_id): Path<String>,
) -> Result<Json<FavoriteCountResponse>, ApiError> {
    let count = service(&state)
        .count_for_dog(&dog_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(FavoriteCountResponse { dog_id, count }))
}
