pub mod health;
pub mod questions;
pub mod skill_tests;

use crate::middleware::auth::require_bearer_auth;
use crate::repository::SkillTestRepository;
use crate::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};

/// Every authoring route sits behind the bearer-token middleware; `/health`
/// stays open.
pub fn router<R: SkillTestRepository>(state: AppState<R>) -> Router {
    let authoring = Router::new()
        .route(
            "/api/tests",
            get(skill_tests::list_tests::<R>).post(skill_tests::create_test::<R>),
        )
        .route(
            "/api/tests/:id",
            get(skill_tests::get_test::<R>)
                .patch(skill_tests::update_test::<R>)
                .delete(skill_tests::delete_test::<R>),
        )
        .route("/api/tests/:id/publish", post(skill_tests::publish_test::<R>))
        .route("/api/tests/:id/archive", post(skill_tests::archive_test::<R>))
        .route("/api/tests/:id/purge", post(skill_tests::purge_test::<R>))
        .route("/api/tests/:id/stats", get(skill_tests::test_stats::<R>))
        .route(
            "/api/tests/:id/readiness",
            get(skill_tests::publish_readiness::<R>),
        )
        .route(
            "/api/tests/:id/questions",
            get(questions::list_questions::<R>).post(questions::add_question::<R>),
        )
        .route(
            "/api/tests/:id/questions/order",
            put(questions::reorder_questions::<R>),
        )
        .route(
            "/api/questions/:id",
            get(questions::get_question::<R>)
                .patch(questions::update_question::<R>)
                .delete(questions::delete_question::<R>),
        )
        .route(
            "/api/questions/:id/duplicate",
            post(questions::duplicate_question::<R>),
        )
        .route("/api/questions/:id/stats", get(questions::question_stats::<R>))
        .route(
            "/api/questions/:id/validation",
            get(questions::validate_question::<R>),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.jwt_secret.clone(),
            require_bearer_auth,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(authoring)
        .with_state(state)
}
