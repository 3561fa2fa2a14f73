use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::identity::ActorIdentity;
use crate::ports::appointments::AppointmentRepository;
use crate::util::now_ms;

pub const UPCOMING_LIMIT: usize = 5;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(AppointmentStatus::Pending),
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            "completed" => Some(AppointmentStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub appointment_id: String,
    pub adopter_id: String,
    pub rescuer_id: String,
    pub dog_id: String,
    pub appointment_date_ms: i64,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct AppointmentCreate {
    pub rescuer_id: String,
    pub dog_id: String,
    pub appointment_date_ms: i64,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct AppointmentService {
    repository: Arc<dyn AppointmentRepository>,
}

impl AppointmentService {
    pub fn new(repository: Arc<dyn AppointmentRepository>) -> Self {
        Self { repository }
    }

    pub async fn create(
        &self,
        actor: &ActorIdentity,
        input: AppointmentCreate,
    ) -> DomainResult<Appointment> {
        let input = validate_appointment_create(input)?;
        let now = now_ms();
        let appointment = Appointment {
            appointment_id: crate::util::uuid_v7_without_dashes(),
            adopter_id: actor.user_id.clone(),
            rescuer_id: input.rescuer_id,
            dog_id: input.dog_id,
            appointment_date_ms: input.appointment_date_ms,
            status: AppointmentStatus::Pending,
            notes: input.notes,
            created_at_ms: now,
            updated_at_ms: now,
        };
        self.repository.create(&appointment).await
    }

    /// Either side of the appointment, date ascending.
    pub async fn list_mine(
        &self,
        actor: &ActorIdentity,
        as_rescuer: bool,
    ) -> DomainResult<Vec<Appointment>> {
        self.repository.list_by_user(&actor.user_id, as_rescuer).await
    }

    pub async fn update_status(
        &self,
        appointment_id: &str,
        status: AppointmentStatus,
    ) -> DomainResult<Appointment> {
        self.repository
            .update_status(appointment_id, status, now_ms())
            .await
    }

    pub async fn cancel(&self, appointment_id: &str) -> DomainResult<Appointment> {
        self.update_status(appointment_id, AppointmentStatus::Cancelled)
            .await
    }

    pub async fn confirm(&self, appointment_id: &str) -> DomainResult<Appointment> {
        self.update_status(appointment_id, AppointmentStatus::Confirmed)
            .await
    }

    pub async fn complete(&self, appointment_id: &str) -> DomainResult<Appointment> {
        self.update_status(appointment_id, AppointmentStatus::Completed)
            .await
    }

    /// Future pending/confirmed appointments, earliest first, capped at 5.
    pub async fn upcoming(
        &self,
        actor: &ActorIdentity,
        as_rescuer: bool,
    ) -> DomainResult<Vec<Appointment>> {
        self.repository
            .upcoming(&actor.user_id, as_rescuer, now_ms(), UPCOMING_LIMIT)
            .await
    }
}

fn validate_appointment_create(mut input: AppointmentCreate) -> DomainResult<AppointmentCreate> {
    input.rescuer_id = input.rescuer_id.trim().to_string();
    input.dog_id = input.dog_id.trim().to_string();
    if input.rescuer_id.is_empty() {
        return Err(DomainError::Validation("rescuer_id is required".into()));
    }
    if input.dog_id.is_empty() {
        return Err(DomainError::Validation("dog_id is required".into()));
    }
    if input.appointment_date_ms <= 0 {
        return Err(DomainError::Validation(
            "appointment_date_ms is required".into(),
        ));
    }
    Ok(input)
}
