use axum::extract::{Extension, Path, Query, State};
use axum::{Json, http::StatusCode};
use patitas_domain::adoptions::{
    AdoptionRequest, AdoptionRequestCreate, AdoptionService, AdoptionStatus, CooldownStatus,
};
use patitas_domain::audit::{AuditAction, AuditEntry, AuditTrail};
use patitas_domain::followups::FollowupService;
use patitas_domain::profiles::UserProfile;
use patitas_domain::util::now_ms;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::actor_identity;
use crate::error::{ApiError, map_domain_error};
use crate::middleware::AuthContext;
use crate::observability;
use crate::state::AppState;
use crate::validation;

fn service(state: &AppState) -> AdoptionService {
    AdoptionService::new(state.adoption_repo.clone(), state.dog_repo.clone())
}

/// Lifecycle mutations leave an audit record; the append never blocks or
/// fails the mutation it describes.
fn spawn_audit(
    state: &AppState,
    actor_id: String,
    action: AuditAction,
    request: &AdoptionRequest,
    detail: Option<String>,
) {
    let trail = AuditTrail::new(state.audit_repo.clone());
    let request_id = request.request_id.clone();
    let dog_id = request.dog_id.clone();
    tokio::spawn(async move {
        trail
            .record(&actor_id, action, &request_id, &dog_id, detail)
            .await;
    });
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CreateAdoptionRequestBody {
    #[validate(length(min = 1, max = 128))]
    dog_id: String,
    #[validate(length(max = 2000))]
    message: Option<String>,
    has_experience: bool,
    has_other_pets: bool,
    has_yard: bool,
    #[validate(length(max = 2000))]
    reason_for_adoption: Option<String>,
}

pub(crate) async fn create_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateAdoptionRequestBody>,
) -> Result<(StatusCode, Json<AdoptionRequest>), ApiError> {
    validation::validate(&payload)?;
    let actor = actor_identity(&auth)?;
    let service = service(&state);

    // Advisory pre-checks; a race between two submissions can slip past
    // them, the storage layer does not enforce pair uniqueness.
    if let Some(existing) = service
        .check_existing_request(&payload.dog_id, &actor.user_id)
        .await
        .map_err(map_domain_error)?
    {
        return Err(ApiError::Conflict(
            existing.status.blocking_reason().to_string(),
        ));
    }
    let cooldown = service
        .check_cooldown_period(&payload.dog_id, &actor.user_id)
        .await
        .map_err(map_domain_error)?;
    if cooldown.in_cooldown {
        let days = cooldown.days_remaining.unwrap_or_default();
        return Err(ApiError::Validation(format!(
            "cooldown active, {days} day(s) remaining"
        )));
    }

    let request = service
        .create_request(
            &actor,
            AdoptionRequestCreate {
                dog_id: payload.dog_id,
                message: payload.message,
                has_experience: payload.has_experience,
                has_other_pets: payload.has_other_pets,
                has_yard: payload.has_yard,
                reason_for_adoption: payload.reason_for_adoption,
            },
        )
        .await
        .map_err(map_domain_error)?;

    spawn_audit(
        &state,
        actor.user_id.clone(),
        AuditAction::RequestCreated,
        &request,
        None,
    );
    spawn_request_received_mail(state, request.clone());
    Ok((StatusCode::CREATED, Json(request)))
}

pub(crate) async fn my_requests(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<AdoptionRequest>>, ApiError> {
    let actor = actor_identity(&auth)?;
    let requests = service(&state)
        .list_by_adopter(&actor.user_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(requests))
}

pub(crate) async fn received_requests(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<AdoptionRequest>>, ApiError> {
    let actor = actor_identity(&auth)?;
    let requests = service(&state)
        .list_by_rescuer(&actor.user_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(requests))
}

pub(crate) async fn get_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(request_id): Path<String>,
) -> Result<Json<AdoptionRequest>, ApiError> {
    let actor = actor_identity(&auth)?;
    let request = service(&state)
        .get(&request_id)
        .await
        .map_err(map_domain_error)?;
    if request.adopter_id != actor.user_id && request.rescuer_id != actor.user_id {
        return Err(ApiError::NotFound);
    }
    Ok(Json(request))
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UpdateStatusBody {
    #[validate(length(min = 1, max = 32))]
    status: String,
    #[validate(length(max = 2000))]
    response_message: Option<String>,
}

pub(crate) async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(request_id): Path<String>,
    Json(payload): Json<UpdateStatusBody>,
) -> Result<Json<AdoptionRequest>, ApiError> {
    validation::validate(&payload)?;
    let actor = actor_identity(&auth)?;
    let to_status = AdoptionStatus::parse(&payload.status)
        .ok_or_else(|| ApiError::Validation(format!("unknown status '{}'", payload.status)))?;

    let service = service(&state);
    let request = service.get(&request_id).await.map_err(map_domain_error)?;
    if request.rescuer_id != actor.user_id {
        return Err(ApiError::Validation(
            "only the listing rescuer can decide on this request".into(),
        ));
    }

    let updated = service
        .update_status(&request_id, to_status, payload.response_message)
        .await
        .map_err(map_domain_error)?;

    let action = match updated.status {
        AdoptionStatus::Approved => AuditAction::RequestApproved,
        AdoptionStatus::Completed => AuditAction::RequestCompleted,
        _ => AuditAction::RequestRejected,
    };
    spawn_audit(
        &state,
        actor.user_id.clone(),
        action,
        &updated,
        updated.response_message.clone(),
    );
    match updated.status {
        AdoptionStatus::Approved => spawn_approved_mail(state, updated.clone()),
        AdoptionStatus::Completed => spawn_followup_schedule(state, updated.request_id.clone()),
        _ => {}
    }
    Ok(Json(updated))
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CancelRequestBody {
    #[validate(length(max = 2000))]
    reason: Option<String>,
}

pub(crate) async fn cancel_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(request_id): Path<String>,
    Json(payload): Json<CancelRequestBody>,
) -> Result<Json<AdoptionRequest>, ApiError> {
    validation::validate(&payload)?;
    let actor = actor_identity(&auth)?;

    let service = service(&state);
    let request = service.get(&request_id).await.map_err(map_domain_error)?;
    if request.adopter_id != actor.user_id {
        return Err(ApiError::Validation(
            "only the requesting adopter can cancel this request".into(),
        ));
    }

    let cancelled = service
        .cancel_request(&request_id, payload.reason)
        .await
        .map_err(map_domain_error)?;
    spawn_audit(
        &state,
        actor.user_id.clone(),
        AuditAction::RequestCancelled,
        &cancelled,
        cancelled.cancellation_reason.clone(),
    );
    spawn_cancelled_mail(state, cancelled.clone());
    Ok(Json(cancelled))
}

#[derive(Debug, Deserialize)]
pub(crate) struct PairQuery {
    dog_id: String,
}

#[derive(Serialize)]
pub(crate) struct ExistingRequestResponse {
    exists: bool,
    blocking_reason: Option<&'static str>,
    request: Option<AdoptionRequest>,
}

pub(crate) async fn check_existing(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<PairQuery>,
) -> Result<Json<ExistingRequestResponse>, ApiError> {
    let actor = actor_identity(&auth)?;
    let existing = service(&state)
        .check_existing_request(&query.dog_id, &actor.user_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(ExistingRequestResponse {
        exists: existing.is_some(),
        blocking_reason: existing
            .as_ref()
            .map(|request| request.status.blocking_reason()),
        request: existing,
    }))
}

/// Audit trail of one request, visible to its two parties only.
pub(crate) async fn request_audit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(request_id): Path<String>,
) -> Result<Json<Vec<AuditEntry>>, ApiError> {
    let actor = actor_identity(&auth)?;
    let request = service(&state)
        .get(&request_id)
        .await
        .map_err(map_domain_error)?;
    if request.adopter_id != actor.user_id && request.rescuer_id != actor.user_id {
        return Err(ApiError::NotFound);
    }
    let entries = AuditTrail::new(state.audit_repo.clone())
        .for_request(&request_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(entries))
}

pub(crate) async fn check_cooldown(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<PairQuery>,
) -> Result<Json<CooldownStatus>, ApiError> {
    let actor = actor_identity(&auth)?;
    let cooldown = service(&state)
        .check_cooldown_period(&query.dog_id, &actor.user_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(cooldown))
}

fn display_or_id(profile: Option<&UserProfile>, fallback: &str) -> String {
    profile
        .map(UserProfile::display_name)
        .unwrap_or_else(|| fallback.to_string())
}

/// Notification mail is best effort and never blocks the response.
fn spawn_request_received_mail(state: AppState, request: AdoptionRequest) {
    tokio::spawn(async move {
        let rescuer = state
            .profile_repo
            .get(&request.rescuer_id)
            .await
            .ok()
            .flatten();
        let adopter = state
            .profile_repo
            .get(&request.adopter_id)
            .await
            .ok()
            .flatten();
        let dog = state.dog_repo.get(&request.dog_id).await.ok().flatten();
        let (Some(rescuer), Some(dog)) = (rescuer, dog) else {
            return;
        };
        state
            .mailer
            .send_adoption_request_received(
                &rescuer.email,
                &rescuer.display_name(),
                &display_or_id(adopter.as_ref(), &request.adopter_id),
                &dog.name,
            )
            .await;
        observability::register_mail_send("adoption_request_received");
    });
}

fn spawn_approved_mail(state: AppState, request: AdoptionRequest) {
    tokio::spawn(async move {
        let adopter = state
            .profile_repo
            .get(&request.adopter_id)
            .await
            .ok()
            .flatten();
        let rescuer = state
            .profile_repo
            .get(&request.rescuer_id)
            .await
            .ok()
            .flatten();
        let dog = state.dog_repo.get(&request.dog_id).await.ok().flatten();
        let (Some(adopter), Some(dog)) = (adopter, dog) else {
            return;
        };
        state
            .mailer
            .send_adoption_approved(
                &adopter.email,
                &adopter.display_name(),
                &dog.name,
                &display_or_id(rescuer.as_ref(), &request.rescuer_id),
            )
            .await;
        observability::register_mail_send("adoption_approved");
    });
}

fn spawn_cancelled_mail(state: AppState, request: AdoptionRequest) {
    tokio::spawn(async move {
        let rescuer = state
            .profile_repo
            .get(&request.rescuer_id)
            .await
            .ok()
            .flatten();
        let adopter = state
            .profile_repo
            .get(&request.adopter_id)
            .await
            .ok()
            .flatten();
        let dog = state.dog_repo.get(&request.dog_id).await.ok().flatten();
        let (Some(rescuer), Some(dog)) = (rescuer, dog) else {
            return;
        };
        let reason = request
            .cancellation_reason
            .clone()
            .unwrap_or_else(|| "sin motivo indicado".to_string());
        state
            .mailer
            .send_adoption_cancelled(
                &rescuer.email,
                &rescuer.display_name(),
                &display_or_id(adopter.as_ref(), &request.adopter_id),
                &dog.name,
                &reason,
            )
            .await;
        observability::register_mail_send("adoption_cancelled");
    });
}

/// Completed adoptions seed their 7/30/90-day check-ins in the background.
fn spawn_followup_schedule(state: AppState, request_id: String) {
    tokio::spawn(async move {
        let followups = FollowupService::new(state.followup_repo.clone(), state.adoption_repo.clone());
        if let Err(err) = followups.schedule(&request_id, now_ms()).await {
            tracing::warn!(error = %err, request_id, "followup scheduling failed");
        }
    });
}
