pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    identity_service::IdentityService, project_service::ProjectService,
    time_entry_service::TimeEntryService, user_service::UserService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub identity_service: IdentityService,
    pub user_service: UserService,
    pub project_service: ProjectService,
    pub time_entry_service: TimeEntryService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let identity_service = IdentityService::new(pool.clone());
        let user_service = UserService::new(pool.clone());
        let project_service = ProjectService::new(pool.clone());
        let time_entry_service = TimeEntryService::new(pool.clone());

        Self {
            pool,
            identity_service,
            user_service,
            project_service,
            time_entry_service,
        }
    }
}
