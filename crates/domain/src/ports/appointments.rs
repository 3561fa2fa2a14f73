use crate::DomainResult;
use crate::appointments::{Appointment, AppointmentStatus};

use super::BoxFuture;

#[allow(clippy::needless_pass_by_value)]
pub trait AppointmentRepository: Send + Sync {
    fn create(&self, appointment: &Appointment) -> BoxFuture<'_, DomainResult<Appointment>>;

    fn get(&self, appointment_id: &str) -> BoxFuture<'_, DomainResult<Option<Appointment>>>;

    /// As adopter or as rescuer, date ascending.
    fn list_by_user(
        &self,
        user_id: &str,
        as_rescuer: bool,
    ) -> BoxFuture<'_, DomainResult<Vec<Appointment>>>;

    fn update_status(
        &self,
        appointment_id: &str,
        status: AppointmentStatus,
        updated_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<Appointment>>;

    /// Future pending/confirmed appointments, earliest first.
    fn upcoming(
        &self,
        user_id: &str,
        as_rescuer: bool,
        now_ms: i64,
        limit: usize,
    ) -> BoxFuture<'_, DomainResult<Vec<Appointment>>>;

    fn count_upcoming(
        &self,
        user_id: &str,
        as_rescuer: bool,
        now_ms: i64,
    ) -> BoxFuture<'_, DomainResult<u64>>;
}

pub fn is_upcoming(appointment: &Appointment, now_ms: i64) -> bool {
    appointment.appointment_date_ms >= now_ms
        && matches!(
            appointment.status,
            AppointmentStatus::Pending | AppointmentStatus::Confirmed
        )
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::Arc;

    use tokio::sync::RwLock;

    use super::*;
    use crate::error::DomainError;

    #[derive(Default)]
    pub struct InMemoryAppointmentStore {
        store: Arc<RwLock<HashMap<String, Appointment>>>,
    }

    fn side_matches(appointment: &Appointment, user_id: &str, as_rescuer: bool) -> bool {
        if as_rescuer {
            appointment.rescuer_id == user_id
        } else {
            appointment.adopter_id == user_id
        }
    }

    impl AppointmentRepository for InMemoryAppointmentStore {
        fn create(&self, appointment: &Appointment) -> BoxFuture<'_, DomainResult<Appointment>> {
            let appointment = appointment.clone();
            let store = self.store.clone();
            Box::pin(async move {
                let mut store = store.write().await;
                if store.contains_key(&appointment.appointment_id) {
                    return Err(DomainError::Conflict);
                }
                store.insert(appointment.appointment_id.clone(), appointment.clone());
                Ok(appointment)
            })
        }

        fn get(
            &self,
            appointment_id: &str,
        ) -> BoxFuture<'_, DomainResult<Option<Appointment>>> {
            let appointment_id = appointment_id.to_string();
            let store = self.store.clone();
            Box::pin(async move { Ok(store.read().await.get(&appointment_id).cloned()) })
        }

        fn list_by_user(
            &self,
            user_id: &str,
            as_rescuer: bool,
        ) -> BoxFuture<'_, DomainResult<Vec<Appointment>>> {
            let user_id = user_id.to_string();
            let store = self.store.clone();
            Box::pin(async move {
                let mut appointments: Vec<_> = store
                    .read()
                    .await
                    .values()
                    .filter(|appointment| side_matches(appointment, &user_id, as_rescuer))
                    .cloned()
                    .collect();
                appointments.sort_by(|a, b| a.appointment_date_ms.cmp(&b.appointment_date_ms));
                Ok(appointments)
            })
        }

        fn update_status(
            &self,
            appointment_id: &str,
            status: AppointmentStatus,
            updated_at_ms: i64,
        ) -> BoxFuture<'_, DomainResult<Appointment>> {
            let appointment_id = appointment_id.to_string();
            let store = self.store.clone();
            Box::pin(async move {
                let mut store = store.write().await;
                let appointment = store
                    .get_mut(&appointment_id)
                    .ok_or(DomainError::NotFound)?;
                appointment.status = status;
                appointment.updated_at_ms = updated_at_ms;
                Ok(appointment.clone())
            })
        }

        fn upcoming(
            &self,
            user_id: &str,
            as_rescuer: bool,
            now_ms: i64,
            limit: usize,
        ) -> BoxFuture<'_, DomainResult<Vec<Appointment>>> {
            let user_id = user_id.to_string();
            let store = self.store.clone();
            Box::pin(async move {
                let mut appointments: Vec<_> = store
                    .read()
                    .await
                    .values()
                    .filter(|appointment| {
                        side_matches(appointment, &user_id, as_rescuer)
                            && is_upcoming(appointment, now_ms)
                    })
                    .cloned()
                    .collect();
                appointments.sort_by(|a, b| a.appointment_date_ms.cmp(&b.appointment_date_ms));
                appointments.truncate(limit);
                Ok(appointments)
            })
        }

        fn count_upcoming(
            &self,
            user_id: &str,
            as_rescuer: bool,
            now_ms: i64,
        ) -> BoxFuture<'_, DomainResult<u64>> {
            let user_id = user_id.to_string();
            let store = self.store.clone();
            Box::pin(async move {
                let count = store
                    .read()
                    .await
                    .values()
                    .filter(|appointment| {
                        side_matches(appointment, &user_id, as_rescuer)
                            && is_upcoming(appointment, now_ms)
                    })
                    .count();
                Ok(count as u64)
            })
        }
    }
}
