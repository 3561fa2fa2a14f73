use axum::extract::{Extension, Path, Query, State};
use axum::{Json, http::StatusCode};
use patitas_domain::appointments::{
    Appointment, AppointmentCreate, AppointmentService, AppointmentStatus,
};
use serde::Deserialize;
use validator::Validate;

use super::actor_identity;
use crate::error::{ApiError, map_domain_error};
use crate::middleware::AuthContext;
use crate::state::AppState;
use crate::validation;

fn service(state: &AppState) -> AppointmentService {
    AppointmentService::new(state.appointment_repo.clone())
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CreateAppointmentBody {
    #[validate(length(min = 1, max = 128))]
    rescuer_id: String,
    #[validate(length(min = 1, max = 128))]
    dog_id: String,
    appointment_date_ms: i64,
    #[validate(length(max = 2000))]
    notes: Option<String>,
}

pub(crate) async fn create_appointment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateAppointmentBody>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    validation::validate(&payload)?;
    let actor = actor_identity(&auth)?;
    let appointment = service(&state)
        .create(
            &actor,
            AppointmentCreate {
                rescuer_id: payload.rescuer_id,
                dog_id: payload.dog_id,
                appointment_date_ms: payload.appointment_date_ms,
                notes: payload.notes,
            },
        )
        .await
        .map_err(map_domain_error)?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct SideQuery {
    #[serde(default)]
    as_rescuer: bool,
}

pub(crate) async fn my_appointments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<SideQuery>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let actor = actor_identity(&auth)?;
    let appointments = service(&state)
        .list_mine(&actor, query.as_rescuer)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(appointments))
}

pub(crate) async fn upcoming_appointments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<SideQuery>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let actor = actor_identity(&auth)?;
    let appointments = service(&state)
        .upcoming(&actor, query.as_rescuer)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(appointments))
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UpdateAppointmentStatusBody {
    #[validate(length(min = 1, max = 32))]
    status: String,
}

pub(crate) async fn update_appointment_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(appointment_id): Path<String>,
    Json(payload): Json<UpdateAppointmentStatusBody>,
) -> Result<Json<Appointment>, ApiError> {
    validation::validate(&payload)?;
    let actor = actor_identity(&auth)?;
    let status = AppointmentStatus::parse(&payload.status)
        .ok_or_else(|| ApiError::Validation(format!("unknown status '{}'", payload.status)))?;

    // Either party may move the appointment along.
    let service = service(&state);
    let appointments = service.list_mine(&actor, false).await.map_err(map_domain_error)?;
    let involved = appointments
        .iter()
        .any(|appointment| appointment.appointment_id == appointment_id)
        || service
            .list_mine(&actor, true)
            .await
            .map_err(map_domain_error)?
            .iter()
            .any(|appointment| appointment.appointment_id == appointment_id);
    if !involved {
        return Err(ApiError::NotFound);
    }

    let appointment = service
        .update_status(&appointment_id, status)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(appointment))
}
