mod adoptions;
mod appointments;
mod dogs;
mod favorites;
mod followups;
mod messages;
mod notifications;
mod profiles;
mod reviews;
mod stats;
mod upload;

use axum::extract::State;
use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use patitas_domain::identity::ActorIdentity;
use serde::Serialize;

use crate::middleware::AuthContext;
use crate::{error::ApiError, middleware as app_middleware, observability, state::AppState};

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api/dogs", get(dogs::list_dogs))
        .route("/api/dogs/search", get(dogs::search_dogs))
        .route("/api/dogs/:dog_id", get(dogs::get_dog))
        .route("/api/dogs/:dog_id/view", post(dogs::record_view))
        .route("/api/favorites/:dog_id/count", get(favorites::favorite_count))
        .route("/api/reviews/rescuer/:rescuer_id", get(reviews::list_reviews))
        .route(
            "/api/reviews/rescuer/:rescuer_id/rating",
            get(reviews::rescuer_rating),
        )
        .route("/api/profiles/:user_id", get(profiles::get_profile));

    let protected = Router::new()
        .route("/api/dogs", post(dogs::create_dog))
        .route("/api/dogs/mine", get(dogs::my_dogs))
        .route(
            "/api/dogs/:dog_id",
            put(dogs::update_dog).delete(dogs::delete_dog),
        )
        .route(
            "/api/adoptions",
            post(adoptions::create_request).get(adoptions::my_requests),
        )
        .route("/api/adoptions/received", get(adoptions::received_requests))
        .route("/api/adoptions/check", get(adoptions::check_existing))
        .route("/api/adoptions/cooldown", get(adoptions::check_cooldown))
        .route("/api/adoptions/:request_id", get(adoptions::get_request))
        .route("/api/adoptions/:request_id/audit", get(adoptions::request_audit))
        .route(
            "/api/adoptions/:request_id/status",
            post(adoptions::update_status),
        )
        .route(
            "/api/adoptions/:request_id/cancel",
            post(adoptions::cancel_request),
        )
        .route("/api/messages", post(messages::send_message))
        .route("/api/messages/conversations", get(messages::conversations))
        .route("/api/messages/unread-count", get(messages::unread_count))
        .route("/api/messages/mark-read", post(messages::mark_read))
        .route("/api/messages/with/:other_user_id", get(messages::list_conversation))
        .route(
            "/api/messages/stream/:other_user_id",
            get(messages::stream_conversation),
        )
        .route("/api/messages/:message_id", delete(messages::delete_message))
        .route("/api/favorites", get(favorites::list_favorites))
        .route("/api/favorites/:dog_id/toggle", post(favorites::toggle_favorite))
        .route(
            "/api/appointments",
            post(appointments::create_appointment).get(appointments::my_appointments),
        )
        .route(
            "/api/appointments/upcoming",
            get(appointments::upcoming_appointments),
        )
        .route(
            "/api/appointments/:appointment_id/status",
            post(appointments::update_appointment_status),
        )
        .route("/api/reviews", post(reviews::create_review))
        .route("/api/reviews/can-review", get(reviews::can_review))
        .route(
            "/api/reviews/:review_id",
            put(reviews::update_review).delete(reviews::delete_review),
        )
        .route(
            "/api/followups",
            post(followups::create_followup),
        )
        .route("/api/followups/pending", get(followups::pending_followups))
        .route("/api/followups/schedule", post(followups::schedule_followups))
        .route(
            "/api/followups/request/:request_id",
            get(followups::followups_by_request),
        )
        .route(
            "/api/followups/:followup_id",
            put(followups::update_followup).delete(followups::delete_followup),
        )
        .route(
            "/api/followups/:followup_id/complete",
            post(followups::complete_followup),
        )
        .route(
            "/api/notifications/preferences",
            get(notifications::get_preferences).put(notifications::update_preferences),
        )
        .route(
            "/api/notifications/push-token",
            put(notifications::save_push_token).delete(notifications::remove_push_token),
        )
        .route(
            "/api/profiles/me",
            get(profiles::my_profile).put(profiles::update_profile),
        )
        .route("/api/profiles/complete", post(profiles::complete_profile))
        .route("/api/stats/rescuer", get(stats::rescuer_stats))
        .route("/api/stats/adopter", get(stats::adopter_stats))
        .route("/api/stats/dogs/:dog_id", get(stats::dog_view_stats))
        .route("/api/stats/adoptions-by-month", get(stats::adoptions_by_month))
        .route("/api/stats/dogs-by-size", get(stats::dogs_by_size))
        .route("/api/stats/top-dogs", get(stats::top_dogs))
        .route("/api/upload/single", post(upload::upload_single))
        .route("/api/upload/multiple", post(upload::upload_multiple))
        .route_layer(middleware::from_fn(app_middleware::require_auth_middleware));

    let mut app = public
        .merge(protected)
        .layer(middleware::from_fn(app_middleware::metrics_layer))
        .layer(app_middleware::timeout_layer())
        .layer(app_middleware::trace_layer())
        .layer(app_middleware::set_request_id_layer())
        .layer(app_middleware::propagate_request_id_layer())
        .layer(app_middleware::cors_layer(&state.config.cors_allowed_origin))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth_middleware,
        ));

    if !state.config.app_env.eq_ignore_ascii_case("test") {
        app = app.layer(app_middleware::rate_limit_layer());
    }

    app.with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.app_env.clone(),
    })
}

async fn metrics() -> impl IntoResponse {
    match observability::render_metrics() {
        Some(body) => (StatusCode::OK, body).into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder offline").into_response(),
    }
}

pub(crate) fn actor_identity(auth: &AuthContext) -> Result<ActorIdentity, ApiError> {
    let user_id = auth
        .user_id
        .as_ref()
        .filter(|user_id| !user_id.trim().is_empty())
        .ok_or(ApiError::Unauthorized)?;
    Ok(ActorIdentity {
        user_id: user_id.to_string(),
        username: auth
            .username
            .clone()
            .unwrap_or_else(|| user_id.to_string()),
    })
}
