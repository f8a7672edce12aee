pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod repository;
pub mod routes;
pub mod services;

#[cfg(test)]
mod test_utils;

use crate::policy::AuthoringPolicy;
use crate::repository::{PgRepository, SkillTestRepository};
use crate::services::{question_service::QuestionService, test_service::TestService};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState<R: SkillTestRepository = PgRepository> {
    pub test_service: TestService<R>,
    pub question_service: QuestionService<R>,
    pub jwt_secret: Arc<str>,
}

impl<R: SkillTestRepository> AppState<R> {
    pub fn new(repo: R, policy: Arc<dyn AuthoringPolicy>, jwt_secret: &str) -> Self {
        Self {
            test_service: TestService::new(repo.clone(), policy.clone()),
            question_service: QuestionService::new(repo, policy),
            jwt_secret: Arc::from(jwt_secret),
        }
    }
}
