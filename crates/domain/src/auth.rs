use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Anonymous,
    Adopter,
    Rescuer,
    Admin,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "anonymous" | "guest" => Some(Role::Anonymous),
            "adopter" => Some(Role::Adopter),
            "rescuer" => Some(Role::Rescuer),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Anonymous => "anonymous",
            Role::Adopter => "adopter",
            Role::Rescuer => "rescuer",
            Role::Admin => "admin",
        }
    }

    pub fn can_publish_dogs(&self) -> bool {
        matches!(self, Role::Rescuer | Role::Admin)
    }
}
