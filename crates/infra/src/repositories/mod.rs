mod surreal;

pub mod adoptions;
pub mod appointments;
pub mod audit;
pub mod dogs;
pub mod favorites;
pub mod followups;
pub mod messaging;
pub mod notifications;
pub mod profiles;
pub mod reviews;

pub use surreal::connect;

pub use adoptions::*;
pub use appointments::*;
pub use audit::*;
pub use dogs::*;
pub use favorites::*;
pub use followups::*;
pub use messaging::*;
pub use notifications::*;
pub use profiles::*;
pub use reviews::*;
