use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::auth::Role;
use crate::error::DomainError;
use crate::identity::ActorIdentity;
use crate::ports::profiles::ProfileRepository;
use crate::util::now_ms;

const MAX_NAME_LENGTH: usize = 100;
const MAX_TEXT_LENGTH: usize = 2_000;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HomeType {
    House,
    Apartment,
    Farm,
    Other,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RescuerType {
    Individual,
    Organization,
    Shelter,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Role,
    pub organization_name: Option<String>,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    // Adopter verification fields.
    pub home_type: Option<HomeType>,
    pub has_yard: Option<bool>,
    pub household_members: Option<u32>,
    pub has_pets: Option<bool>,
    pub pet_experience: Option<String>,
    pub why_adopt: Option<String>,
    pub occupation: Option<String>,
    // Rescuer fields.
    pub rescuer_type: Option<RescuerType>,
    pub years_experience: Option<u32>,
    pub rescue_address: Option<String>,
    pub followup_process: Option<String>,
    pub is_verified: bool,
    pub rating_average: Option<f64>,
    pub rating_count: u32,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string();
        if !full.is_empty() {
            return full;
        }
        self.organization_name
            .clone()
            .unwrap_or_else(|| self.user_id.clone())
    }
}

/// Input of the privileged multi-field profile insert.
#[derive(Clone, Debug)]
pub struct CompleteProfileInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub organization_name: Option<String>,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub home_type: Option<HomeType>,
    pub has_yard: Option<bool>,
    pub household_members: Option<u32>,
    pub has_pets: Option<bool>,
    pub pet_experience: Option<String>,
    pub why_adopt: Option<String>,
    pub occupation: Option<String>,
    pub rescuer_type: Option<RescuerType>,
    pub years_experience: Option<u32>,
    pub rescue_address: Option<String>,
    pub followup_process: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub organization_name: Option<String>,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub home_type: Option<HomeType>,
    pub has_yard: Option<bool>,
    pub household_members: Option<u32>,
    pub has_pets: Option<bool>,
    pub pet_experience: Option<String>,
    pub why_adopt: Option<String>,
    pub occupation: Option<String>,
    pub rescuer_type: Option<RescuerType>,
    pub years_experience: Option<u32>,
    pub rescue_address: Option<String>,
    pub followup_process: Option<String>,
}

#[derive(Clone)]
pub struct ProfileService {
    repository: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    pub fn new(repository: Arc<dyn ProfileRepository>) -> Self {
        Self { repository }
    }

    pub async fn get(&self, user_id: &str) -> DomainResult<UserProfile> {
        self.repository
            .get(user_id)
            .await?
            .ok_or(DomainError::NotFound)
    }

    pub async fn find(&self, user_id: &str) -> DomainResult<Option<UserProfile>> {
        self.repository.get(user_id).await
    }

    /// Privileged multi-field insert for the authenticated user. Conflicts
    /// when a profile already exists.
    pub async fn create_complete(
        &self,
        actor: &ActorIdentity,
        input: CompleteProfileInput,
    ) -> DomainResult<UserProfile> {
        let input = validate_complete_input(input)?;
        if self.repository.get(&actor.user_id).await?.is_some() {
            return Err(DomainError::Conflict);
        }
        let now = now_ms();
        let profile = UserProfile {
            user_id: actor.user_id.clone(),
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            phone: input.phone,
            address: input.address,
            role: input.role,
            organization_name: input.organization_name,
            description: input.description,
            avatar_url: input.avatar_url,
            home_type: input.home_type,
            has_yard: input.has_yard,
            household_members: input.household_members,
            has_pets: input.has_pets,
            pet_experience: input.pet_experience,
            why_adopt: input.why_adopt,
            occupation: input.occupation,
            rescuer_type: input.rescuer_type,
            years_experience: input.years_experience,
            rescue_address: input.rescue_address,
            followup_process: input.followup_process,
            is_verified: false,
            rating_average: None,
            rating_count: 0,
            created_at_ms: now,
            updated_at_ms: now,
        };
        self.repository.create(&profile).await
    }

    /// Users edit only their own profile.
    pub async fn update(
        &self,
        actor: &ActorIdentity,
        update: ProfileUpdate,
    ) -> DomainResult<UserProfile> {
        self.get(&actor.user_id).await?;
        self.repository
            .update(&actor.user_id, &update, now_ms())
            .await
    }
}

fn validate_complete_input(mut input: CompleteProfileInput) -> DomainResult<CompleteProfileInput> {
    input.email = input.email.trim().to_lowercase();
    input.first_name = input.first_name.trim().to_string();
    input.last_name = input.last_name.trim().to_string();

    if input.email.is_empty() || !input.email.contains('@') {
        return Err(DomainError::Validation("a valid email is required".into()));
    }
    if input.first_name.is_empty() {
        return Err(DomainError::Validation("first_name is required".into()));
    }
    if input.first_name.chars().count() > MAX_NAME_LENGTH
        || input.last_name.chars().count() > MAX_NAME_LENGTH
    {
        return Err(DomainError::Validation(format!(
            "names exceed max length of {MAX_NAME_LENGTH}"
        )));
    }
    if !matches!(input.role, Role::Adopter | Role::Rescuer) {
        return Err(DomainError::Validation(
            "role must be adopter or rescuer".into(),
        ));
    }
    if input.role == Role::Rescuer && input.rescuer_type.is_none() {
        return Err(DomainError::Validation(
            "rescuer_type is required for rescuers".into(),
        ));
    }
    if let Some(description) = &input.description {
        if description.chars().count() > MAX_TEXT_LENGTH {
            return Err(DomainError::Validation(format!(
                "description exceeds max length of {MAX_TEXT_LENGTH}"
            )));
        }
    }
    Ok(input)
}
