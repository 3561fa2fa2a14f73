use std::collections::HashSet;
use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Extension, Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::{Json, http::StatusCode};
use patitas_domain::messaging::{
    ChatMessage, Conversation, MessagingService, SendMessageInput,
};
use patitas_domain::realtime::conversation_key;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_stream::wrappers::UnboundedReceiverStream;
use validator::Validate;

use super::actor_identity;
use crate::error::{ApiError, map_domain_error};
use crate::middleware::AuthContext;
use crate::observability;
use crate::state::AppState;
use crate::validation;

fn service(state: &AppState) -> MessagingService {
    MessagingService::new(
        state.message_repo.clone(),
        state.profile_repo.clone(),
        state.dog_repo.clone(),
    )
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SendMessageBody {
    #[validate(length(min = 1, max = 128))]
    receiver_id: String,
    #[validate(length(min = 1, max = 2000))]
    body: String,
    dog_id: Option<String>,
}

pub(crate) async fn send_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<SendMessageBody>,
) -> Result<(StatusCode, Json<ChatMessage>), ApiError> {
    validation::validate(&payload)?;
    let actor = actor_identity(&auth)?;
    let message = service(&state)
        .send(
            &actor,
            SendMessageInput {
                receiver_id: payload.receiver_id,
                body: payload.body,
                dog_id: payload.dog_id,
            },
        )
        .await
        .map_err(map_domain_error)?;

    let key = conversation_key(
        &message.sender_id,
        &message.receiver_id,
        message.dog_id.as_deref(),
    );
    state.message_feed.publish(&key, message.clone()).await;
    spawn_new_message_mail(state, message.clone());

    Ok((StatusCode::CREATED, Json(message)))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConversationQuery {
    dog_id: Option<String>,
}

pub(crate) async fn list_conversation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(other_user_id): Path<String>,
    Query(query): Query<ConversationQuery>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    let actor = actor_identity(&auth)?;
    let messages = service(&state)
        .list_conversation(&actor, &other_user_id, query.dog_id.as_deref())
        .await
        .map_err(map_domain_error)?;
    Ok(Json(messages))
}

pub(crate) async fn conversations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Conversation>>, ApiError> {
    let actor = actor_identity(&auth)?;
    let conversations = service(&state)
        .conversations(&actor)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(conversations))
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct MarkReadBody {
    #[validate(length(min = 1, max = 200))]
    message_ids: Vec<String>,
}

pub(crate) async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<MarkReadBody>,
) -> Result<StatusCode, ApiError> {
    validation::validate(&payload)?;
    let _ = actor_identity(&auth)?;
    service(&state)
        .mark_read(&payload.message_ids)
        .await
        .map_err(map_domain_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub(crate) struct UnreadCountResponse {
    unread: u64,
}

pub(crate) async fn unread_count(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let actor = actor_identity(&auth)?;
    let unread = service(&state)
        .unread_count(&actor)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(UnreadCountResponse { unread }))
}

pub(crate) async fn delete_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(message_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let actor = actor_identity(&auth)?;
    service(&state)
        .delete(&actor, &message_id)
        .await
        .map_err(map_domain_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
struct ChatStreamEnvelope {
    event_type: &'static str,
    message: ChatMessage,
}

fn chat_stream_event(message: ChatMessage) -> Event {
    Event::default()
        .event("message")
        .json_data(ChatStreamEnvelope {
            event_type: "message",
            message,
        })
        .unwrap_or_else(|_| {
            Event::default()
                .event("error")
                .data("failed-to-serialize-message")
        })
}

/// Live conversation feed. The subscription starts when the client
/// connects and dies with it; the backlog is replayed first so a fresh
/// viewer sees the whole thread.
pub(crate) async fn stream_conversation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(other_user_id): Path<String>,
    Query(query): Query<ConversationQuery>,
) -> Result<Response, ApiError> {
    let actor = actor_identity(&auth)?;
    let key = conversation_key(&actor.user_id, &other_user_id, query.dog_id.as_deref());
    let mut receiver = state.message_feed.subscribe(&key).await;

    let backlog = service(&state)
        .list_conversation(&actor, &other_user_id, query.dog_id.as_deref())
        .await
        .map_err(map_domain_error)?;

    let (tx, rx) = mpsc::unbounded_channel::<Result<Event, Infallible>>();
    let mut seen = HashSet::new();
    for message in backlog {
        seen.insert(message.message_id.clone());
        let _ = tx.send(Ok(chat_stream_event(message)));
    }

    observability::register_chat_stream_event("subscribed");
    tokio::spawn(async move {
        let mut heartbeat = interval(Duration::from_secs(15));
        loop {
            tokio::select! {
                event = receiver.recv() => {
                    match event {
                        Ok(message) => {
                            if !seen.insert(message.message_id.clone()) {
                                continue;
                            }
                            if tx.send(Ok(chat_stream_event(message))).is_err() {
                                break;
                            }
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {
                            observability::register_chat_stream_event("lagged");
                            if tx
                                .send(Ok(Event::default().event("replay").data("missed_messages")))
                                .is_err()
                            {
                                break;
                            }
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    }
                }
                _ = heartbeat.tick() => {
                    if tx.send(Ok(Event::default().event("ping").data("keep-alive"))).is_err() {
                        break;
                    }
                }
            }
        }
        observability::register_chat_stream_event("closed");
    });

    Ok(Sse::new(UnboundedReceiverStream::new(rx))
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
        .into_response())
}

fn spawn_new_message_mail(state: AppState, message: ChatMessage) {
    tokio::spawn(async move {
        let receiver = state
            .profile_repo
            .get(&message.receiver_id)
            .await
            .ok()
            .flatten();
        let sender = state
            .profile_repo
            .get(&message.sender_id)
            .await
            .ok()
            .flatten();
        let Some(receiver) = receiver else {
            return;
        };
        let sender_name = sender
            .map(|profile| profile.display_name())
            .unwrap_or_else(|| message.sender_id.clone());
        state
            .mailer
            .send_new_message(
                &receiver.email,
                &receiver.display_name(),
                &sender_name,
                &message.body,
            )
            .await;
        observability::register_mail_send("new_message");
    });
}
