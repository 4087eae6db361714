pub mod ai;
pub mod auth;
pub mod conversations;
pub mod discovery;
pub mod health;
pub mod images;
pub mod messages;
pub mod notifications;
pub mod photo;
pub mod profile;
pub mod swipes;
