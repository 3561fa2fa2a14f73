use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

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
