pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::database::catalog::Repository;
use crate::middleware::auth::JwtKeys;
use crate::services::{
    submission_service::SubmissionService, survey_service::SurveyService,
    user_service::UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub keys: JwtKeys,
    pub survey_service: SurveyService,
    pub user_service: UserService,
    pub submission_service: SubmissionService<dyn Repository>,
}

impl AppState {
    pub fn new(store: Arc<dyn Repository>, keys: JwtKeys) -> Self {
        Self {
            survey_service: SurveyService::new(store.clone()),
            user_service: UserService::new(store.clone()),
            submission_service: SubmissionService::new(store),
            keys,
        }
    }
}
