use std::collections::HashMap;
use std::sync::Arc;

use patitas_domain::DomainResult;
use patitas_domain::appointments::{Appointment, AppointmentStatus};
use patitas_domain::error::DomainError;
use patitas_domain::ports::BoxFuture;
use patitas_domain::ports::appointments::{AppointmentRepository, is_upcoming};
use serde_json::Value;
use surrealdb::{Surreal, engine::remote::ws::Client};
use tokio::sync::RwLock;

use super::surreal::{connect, count_from_rows, decode_rows, map_surreal_error};
use crate::db::DbConfig;

const APPOINTMENT_FIELDS: &str = "SELECT * OMIT id FROM appointments";

#[derive(Default)]
pub struct InMemoryAppointmentRepository {
    store: Arc<RwLock<HashMap<String, Appointment>>>,
}

impl InMemoryAppointmentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn side_matches(appointment: &Appointment, user_id: &str, as_rescuer: bool) -> bool {
    if as_rescuer {
        appointment.rescuer_id == user_id
    } else {
        appointment.adopter_id == user_id
    }
}

impl AppointmentRepository for InMemoryAppointmentRepository {
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

    fn get(&self, appointment_id: &str) -> BoxFuture<'_, DomainResult<Option<Appointment>>> {
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

#[derive(Clone)]
pub struct SurrealAppointmentRepository {
    client: Arc<Surreal<Client>>,
}

impl SurrealAppointmentRepository {
    pub fn with_client(client: Arc<Surreal<Client>>) -> Self {
        Self { client }
    }

    pub async fn new(db_config: &DbConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: connect(db_config).await?,
        })
    }

    fn side_field(as_rescuer: bool) -> &'static str {
        if as_rescuer { "rescuer_id" } else { "adopter_id" }
    }
}

impl AppointmentRepository for SurrealAppointmentRepository {
    fn create(&self, appointment: &Appointment) -> BoxFuture<'_, DomainResult<Appointment>> {
        let appointment = appointment.clone();
        let client = self.client.clone();
        Box::pin(async move {
            let data = serde_json::to_value(&appointment).map_err(|err| {
                DomainError::Validation(format!("invalid appointment payload: {err}"))
            })?;
            let response = client
                .query("CREATE appointments CONTENT $data")
                .bind(("data", data))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(appointment)
        })
    }

    fn get(&self, appointment_id: &str) -> BoxFuture<'_, DomainResult<Option<Appointment>>> {
        let appointment_id = appointment_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query(format!(
                    "{APPOINTMENT_FIELDS} WHERE appointment_id = $appointment_id LIMIT 1"
                ))
                .bind(("appointment_id", appointment_id))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            Ok(decode_rows::<Appointment>(rows, "appointment")?
                .into_iter()
                .next())
        })
    }

    fn list_by_user(
        &self,
        user_id: &str,
        as_rescuer: bool,
    ) -> BoxFuture<'_, DomainResult<Vec<Appointment>>> {
        let user_id = user_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let field = Self::side_field(as_rescuer);
            let mut response = client
                .query(format!(
                    "{APPOINTMENT_FIELDS} WHERE {field} = $user_id \
                     ORDER BY appointment_date_ms ASC"
                ))
                .bind(("user_id", user_id))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            decode_rows(rows, "appointment")
        })
    }

    fn update_status(
        &self,
        appointment_id: &str,
        status: AppointmentStatus,
        updated_at_ms: i64,
    ) -> BoxFuture<'_, DomainResult<Appointment>> {
        let appointment_id = appointment_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query(
                    "UPDATE appointments SET status = $status, updated_at_ms = $updated_at \
                     WHERE appointment_id = $appointment_id RETURN AFTER",
                )
                .bind(("status", status.as_str()))
                .bind(("updated_at", updated_at_ms))
                .bind(("appointment_id", appointment_id))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            decode_rows::<Appointment>(rows, "appointment")?
                .into_iter()
                .next()
                .ok_or(DomainError::NotFound)
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
        let client = self.client.clone();
        Box::pin(async move {
            let field = Self::side_field(as_rescuer);
            let mut response = client
                .query(format!(
                    "{APPOINTMENT_FIELDS} WHERE {field} = $user_id \
                     AND appointment_date_ms >= $now \
                     AND status IN ['pending', 'confirmed'] \
                     ORDER BY appointment_date_ms ASC LIMIT $limit"
                ))
                .bind(("user_id", user_id))
                .bind(("now", now_ms))
                .bind(("limit", limit as i64))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            decode_rows(rows, "appointment")
        })
    }

    fn count_upcoming(
        &self,
        user_id: &str,
        as_rescuer: bool,
        now_ms: i64,
    ) -> BoxFuture<'_, DomainResult<u64>> {
        let user_id = user_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let field = Self::side_field(as_rescuer);
            let mut response = client
                .query(format!(
                    "SELECT count() AS count FROM appointments WHERE {field} = $user_id \
                     AND appointment_date_ms >= $now \
                     AND status IN ['pending', 'confirmed'] GROUP ALL"
                ))
                .bind(("user_id", user_id))
                .bind(("now", now_ms))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            Ok(count_from_rows(rows))
        })
    }
}
