use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::identity::ActorIdentity;
use crate::ports::dogs::DogRepository;
use crate::util::now_ms;

const MAX_NAME_LENGTH: usize = 100;
const MAX_DESCRIPTION_LENGTH: usize = 4_000;
const MAX_IMAGE_COUNT: usize = 10;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DogStatus {
    Available,
    InProcess,
    Adopted,
}

impl DogStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "available" => Some(DogStatus::Available),
            "in_process" => Some(DogStatus::InProcess),
            "adopted" => Some(DogStatus::Adopted),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DogStatus::Available => "available",
            DogStatus::InProcess => "in_process",
            DogStatus::Adopted => "adopted",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DogSize {
    Small,
    Medium,
    Large,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DogGender {
    Male,
    Female,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnergyLevel {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceRequired {
    None,
    Basic,
    Intermediate,
    Advanced,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Normal,
    High,
    Urgent,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Dog {
    pub dog_id: String,
    pub name: String,
    pub breed: Option<String>,
    pub age_years: Option<u8>,
    pub age_months: Option<u8>,
    pub size: DogSize,
    pub gender: DogGender,
    pub description: String,
    pub medical_history: Option<String>,
    pub is_vaccinated: bool,
    pub is_sterilized: bool,
    pub status: DogStatus,
    pub main_image_url: Option<String>,
    pub images: Vec<String>,
    pub rescuer_id: String,
    pub location: Option<String>,
    pub energy_level: Option<EnergyLevel>,
    pub good_with_kids: Option<bool>,
    pub good_with_dogs: Option<bool>,
    pub good_with_cats: Option<bool>,
    pub special_needs: Option<String>,
    pub experience_required: Option<ExperienceRequired>,
    pub urgency_level: Option<UrgencyLevel>,
    pub video_url: Option<String>,
    pub view_count: u64,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct DogCreate {
    pub name: String,
    pub breed: Option<String>,
    pub age_years: Option<u8>,
    pub age_months: Option<u8>,
    pub size: DogSize,
    pub gender: DogGender,
    pub description: String,
    pub medical_history: Option<String>,
    pub is_vaccinated: bool,
    pub is_sterilized: bool,
    pub main_image_url: Option<String>,
    pub images: Vec<String>,
    pub location: Option<String>,
    pub energy_level: Option<EnergyLevel>,
    pub good_with_kids: Option<bool>,
    pub good_with_dogs: Option<bool>,
    pub good_with_cats: Option<bool>,
    pub special_needs: Option<String>,
    pub experience_required: Option<ExperienceRequired>,
    pub urgency_level: Option<UrgencyLevel>,
    pub video_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct DogUpdate {
    pub name: Option<String>,
    pub breed: Option<String>,
    pub age_years: Option<u8>,
    pub age_months: Option<u8>,
    pub size: Option<DogSize>,
    pub gender: Option<DogGender>,
    pub description: Option<String>,
    pub medical_history: Option<String>,
    pub is_vaccinated: Option<bool>,
    pub is_sterilized: Option<bool>,
    pub main_image_url: Option<String>,
    pub images: Option<Vec<String>>,
    pub location: Option<String>,
    pub status: Option<DogStatus>,
    pub energy_level: Option<EnergyLevel>,
    pub good_with_kids: Option<bool>,
    pub good_with_dogs: Option<bool>,
    pub good_with_cats: Option<bool>,
    pub special_needs: Option<String>,
    pub experience_required: Option<ExperienceRequired>,
    pub urgency_level: Option<UrgencyLevel>,
    pub video_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct DogListQuery {
    pub status: Option<DogStatus>,
    pub size: Option<DogSize>,
    pub gender: Option<DogGender>,
}

#[derive(Clone)]
pub struct DogService {
    repository: Arc<dyn DogRepository>,
}

impl DogService {
    pub fn new(repository: Arc<dyn DogRepository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: DogListQuery) -> DomainResult<Vec<Dog>> {
        self.repository.list(&query).await
    }

    pub async fn get(&self, dog_id: &str) -> DomainResult<Dog> {
        self.repository
            .get(dog_id)
            .await?
            .ok_or(DomainError::NotFound)
    }

    pub async fn list_by_rescuer(&self, rescuer_id: &str) -> DomainResult<Vec<Dog>> {
        self.repository.list_by_rescuer(rescuer_id).await
    }

    pub async fn create(&self, actor: &ActorIdentity, input: DogCreate) -> DomainResult<Dog> {
        let input = validate_dog_create(input)?;
        let now = now_ms();
        let dog = Dog {
            dog_id: crate::util::uuid_v7_without_dashes(),
            name: input.name,
            breed: input.breed,
            age_years: input.age_years,
            age_months: input.age_months,
            size: input.size,
            gender: input.gender,
            description: input.description,
            medical_history: input.medical_history,
            is_vaccinated: input.is_vaccinated,
            is_sterilized: input.is_sterilized,
            status: DogStatus::Available,
            main_image_url: input.main_image_url,
            images: input.images,
            rescuer_id: actor.user_id.clone(),
            location: input.location,
            energy_level: input.energy_level,
            good_with_kids: input.good_with_kids,
            good_with_dogs: input.good_with_dogs,
            good_with_cats: input.good_with_cats,
            special_needs: input.special_needs,
            experience_required: input.experience_required,
            urgency_level: input.urgency_level,
            video_url: input.video_url,
            view_count: 0,
            created_at_ms: now,
            updated_at_ms: now,
        };
        self.repository.create(&dog).await
    }

    /// Only the owning rescuer may mutate a listing.
    pub async fn update(
        &self,
        actor: &ActorIdentity,
        dog_id: &str,
        update: DogUpdate,
    ) -> DomainResult<Dog> {
        let dog = self.get(dog_id).await?;
        if dog.rescuer_id != actor.user_id {
            return Err(DomainError::Validation(
                "only the listing rescuer can update this dog".into(),
            ));
        }
        self.repository.update(dog_id, &update, now_ms()).await
    }

    pub async fn delete(&self, actor: &ActorIdentity, dog_id: &str) -> DomainResult<()> {
        let dog = self.get(dog_id).await?;
        if dog.rescuer_id != actor.user_id {
            return Err(DomainError::Validation(
                "only the listing rescuer can delete this dog".into(),
            ));
        }
        self.repository.delete(dog_id).await
    }

    /// Substring match over name, breed and location of available dogs.
    pub async fn search(&self, term: &str) -> DomainResult<Vec<Dog>> {
        let term = term.trim();
        if term.is_empty() {
            return Err(DomainError::Validation("search term is required".into()));
        }
        self.repository.search(term).await
    }

    /// Best-effort view counter; failures are logged, not surfaced.
    pub async fn record_view(&self, dog_id: &str) {
        if let Err(err) = self.repository.increment_view(dog_id).await {
            tracing::debug!(error = %err, dog_id, "view counter increment failed");
        }
    }
}

fn validate_dog_create(mut input: DogCreate) -> DomainResult<DogCreate> {
    input.name = input.name.trim().to_string();
    input.description = input.description.trim().to_string();

    if input.name.is_empty() {
        return Err(DomainError::Validation("name is required".into()));
    }
    if input.name.chars().count() > MAX_NAME_LENGTH {
        return Err(DomainError::Validation(format!(
            "name exceeds max length of {MAX_NAME_LENGTH}"
        )));
    }
    if input.description.is_empty() {
        return Err(DomainError::Validation("description is required".into()));
    }
    if input.description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(DomainError::Validation(format!(
            "description exceeds max length of {MAX_DESCRIPTION_LENGTH}"
        )));
    }
    if input.images.len() > MAX_IMAGE_COUNT {
        return Err(DomainError::Validation(format!(
            "images exceeds max of {MAX_IMAGE_COUNT}"
        )));
    }
    Ok(input)
}
