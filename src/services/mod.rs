pub mod identity_service;
pub mod project_service;
pub mod time_entry_service;
pub mod user_service;
