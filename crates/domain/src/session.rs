use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::sync::broadcast;

use crate::identity::ActorIdentity;
use crate::profiles::UserProfile;

const EVENT_CAPACITY: usize = 64;

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    SignedIn { user: ActorIdentity },
    SignedOut,
    ProfileUpdated { profile: UserProfile },
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct SessionSnapshot {
    pub user: Option<ActorIdentity>,
    pub profile: Option<UserProfile>,
}

/// Process-wide session context. The current user/profile pair is mutated
/// only through the transition methods below; observers subscribe to the
/// event stream instead of polling shared state.
#[derive(Clone, Default)]
pub struct SessionHub {
    state: Arc<RwLock<SessionSnapshot>>,
    events: Arc<RwLock<Option<broadcast::Sender<SessionEvent>>>>,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.read().await.clone()
    }

    pub async fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        let mut events = self.events.write().await;
        events
            .get_or_insert_with(|| broadcast::channel(EVENT_CAPACITY).0)
            .subscribe()
    }

    pub async fn signed_in(&self, user: ActorIdentity, profile: Option<UserProfile>) {
        {
            let mut state = self.state.write().await;
            state.user = Some(user.clone());
            state.profile = profile;
        }
        self.emit(SessionEvent::SignedIn { user }).await;
    }

    pub async fn signed_out(&self) {
        {
            let mut state = self.state.write().await;
            state.user = None;
            state.profile = None;
        }
        self.emit(SessionEvent::SignedOut).await;
    }

    /// No-op unless the profile belongs to the signed-in user.
    pub async fn profile_updated(&self, profile: UserProfile) {
        {
            let mut state = self.state.write().await;
            let matches = state
                .user
                .as_ref()
                .is_some_and(|user| user.user_id == profile.user_id);
            if !matches {
                return;
            }
            state.profile = Some(profile.clone());
        }
        self.emit(SessionEvent::ProfileUpdated { profile }).await;
    }

    async fn emit(&self, event: SessionEvent) {
        let events = self.events.read().await;
        if let Some(sender) = events.as_ref() {
            let _ = sender.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::testing::profile_fixture;

    #[tokio::test]
    async fn sign_in_updates_snapshot_and_notifies() {
        let hub = SessionHub::new();
        let mut events = hub.subscribe().await;

        let user = ActorIdentity::with_user_id("user-1");
        hub.signed_in(user.clone(), None).await;

        let snapshot = hub.snapshot().await;
        assert_eq!(snapshot.user, Some(user.clone()));
        assert_eq!(events.recv().await, Ok(SessionEvent::SignedIn { user }));
    }

    #[tokio::test]
    async fn sign_out_clears_both_fields() {
        let hub = SessionHub::new();
        hub.signed_in(
            ActorIdentity::with_user_id("user-1"),
            Some(profile_fixture("user-1", "Ana", "Rojas")),
        )
        .await;
        hub.signed_out().await;

        let snapshot = hub.snapshot().await;
        assert_eq!(snapshot.user, None);
        assert_eq!(snapshot.profile, None);
    }

    #[tokio::test]
    async fn profile_update_for_another_user_is_ignored() {
        let hub = SessionHub::new();
        hub.signed_in(ActorIdentity::with_user_id("user-1"), None)
            .await;
        let mut events = hub.subscribe().await;

        hub.profile_updated(profile_fixture("user-2", "Eva", "Luna"))
            .await;
        assert_eq!(hub.snapshot().await.profile, None);

        hub.profile_updated(profile_fixture("user-1", "Ana", "Rojas"))
            .await;
        let snapshot = hub.snapshot().await;
        assert_eq!(
            snapshot.profile.map(|profile| profile.first_name),
            Some("Ana".to_string())
        );
        assert!(matches!(
            events.recv().await,
            Ok(SessionEvent::ProfileUpdated { .. })
        ));
    }
}
