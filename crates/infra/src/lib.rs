pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod mailer;
pub mod media;
pub mod repositories;
