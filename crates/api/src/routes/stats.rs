use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use patitas_domain::dogs::Dog;
use patitas_domain::stats::{
    AdopterDashboardStats, DogViewStats, MonthlyCount, RescuerDashboardStats, SizeCount,
    StatsService,
};
use serde::Deserialize;

use super::actor_identity;
use crate::error::{ApiError, map_domain_error};
use crate::middleware::AuthContext;
use crate::state::AppState;

fn service(state: &AppState) -> StatsService {
    StatsService::new(
        state.dog_repo.clone(),
        state.adoption_repo.clone(),
        state.appointment_repo.clone(),
        state.message_repo.clone(),
        state.review_repo.clone(),
        state.favorite_repo.clone(),
    )
}

pub(crate) async fn rescuer_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<RescuerDashboardStats>, ApiError> {
    let actor = actor_identity(&auth)?;
    let stats = service(&state)
        .rescuer_stats(&actor)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(stats))
}

pub(crate) async fn adopter_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<AdopterDashboardStats>, ApiError> {
    let actor = actor_identity(&auth)?;
    let stats = service(&state)
        .adopter_stats(&actor)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(stats))
}

pub(crate) async fn dog_view_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(dog_id): Path<String>,
) -> Result<Json<DogViewStats>, ApiError> {
    let _ = actor_identity(&auth)?;
    let stats = service(&state)
        .dog_view_stats(&dog_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(stats))
}

#[derive(Debug, Deserialize)]
pub(crate) struct MonthsQuery {
    months: Option<u32>,
}

pub(crate) async fn adoptions_by_month(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<MonthsQuery>,
) -> Result<Json<Vec<MonthlyCount>>, ApiError> {
    let actor = actor_identity(&auth)?;
    let monthly = service(&state)
        .adoptions_by_month(&actor, query.months)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(monthly))
}

pub(crate) async fn dogs_by_size(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<SizeCount>>, ApiError> {
    let actor = actor_identity(&auth)?;
    let sizes = service(&state)
        .dogs_by_size(&actor)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(sizes))
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopDogsQuery {
    limit: Option<usize>,
}

pub(crate) async fn top_dogs(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<TopDogsQuery>,
) -> Result<Json<Vec<Dog>>, ApiError> {
    let actor = actor_identity(&auth)?;
    let dogs = service(&state)
        .top_dogs(&actor, query.limit)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(dogs))
}
