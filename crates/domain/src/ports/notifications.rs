use crate::DomainResult;
use crate::notifications::{NotificationPreferences, NotificationPreferencesUpdate};

use super::BoxFuture;

#[allow(clippy::needless_pass_by_value)]
pub trait NotificationPreferenceRepository: Send + Sync {
    fn get(
        &self,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<NotificationPreferences>>>;

    fn insert(
        &self,
        preferences: &NotificationPreferences,
    ) -> BoxFuture<'_, DomainResult<NotificationPreferences>>;

    fn update(
        &self,
        user_id: &str,
        update: &NotificationPreferencesUpdate,
        updated_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<NotificationPreferences>>;

    fn set_push_token(
        &self,
        user_id: &str,
        push_token: Option<String>,
        updated_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<NotificationPreferences>>;
}

pub fn apply_preferences_update(
    preferences: &mut NotificationPreferences,
    update: &NotificationPreferencesUpdate,
    updated_at_ms: i64,
) {
    if let Some(new_dogs) = update.new_dogs {
        preferences.new_dogs = new_dogs;
    }
    if let Some(messages) = update.messages {
        preferences.messages = messages;
    }
    if let Some(appointments) = update.appointments {
        preferences.appointments = appointments;
    }
    if let Some(adoption_status) = update.adoption_status {
        preferences.adoption_status = adoption_status;
    }
    if let Some(followups) = update.followups {
        preferences.followups = followups;
    }
    if let Some(favorites_updates) = update.favorites_updates {
        preferences.favorites_updates = favorites_updates;
    }
    preferences.updated_at_ms = updated_at_ms;
}
