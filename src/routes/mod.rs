pub mod auth;
pub mod health;
pub mod projects;
pub mod time_entries;
pub mod users;
