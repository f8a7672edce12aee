use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::skill_test_dto::{CreateTestPayload, TestListQuery, UpdateTestPayload},
    error::{Error, Result},
    models::actor::Actor,
    repository::SkillTestRepository,
    AppState,
};

pub async fn create_test<R: SkillTestRepository>(
    State(state): State<AppState<R>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateTestPayload>,
) -> Result<impl IntoResponse> {
    let test = state.test_service.create_test(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(test)))
}

pub async fn list_tests<R: SkillTestRepository>(
    State(state): State<AppState<R>>,
    Query(query): Query<TestListQuery>,
) -> Result<impl IntoResponse> {
    let tests = state.test_service.tests_by_status(&query.status).await?;
    Ok(Json(tests))
}

pub async fn get_test<R: SkillTestRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let test = state.test_service.get_test(id).await?;
    Ok(Json(test))
}

pub async fn update_test<R: SkillTestRepository>(
    State(state): State<AppState<R>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTestPayload>,
) -> Result<impl IntoResponse> {
    let test = state.test_service.update_test(&actor, id, payload).await?;
    Ok(Json(test))
}

pub async fn delete_test<R: SkillTestRepository>(
    State(state): State<AppState<R>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.test_service.delete_test(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn publish_test<R: SkillTestRepository>(
    State(state): State<AppState<R>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let test = state.test_service.publish_test(&actor, id).await?;
    Ok(Json(test))
}

pub async fn archive_test<R: SkillTestRepository>(
    State(state): State<AppState<R>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let test = state.test_service.archive_test(&actor, id).await?;
    Ok(Json(test))
}

pub async fn purge_test<R: SkillTestRepository>(
    State(state): State<AppState<R>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    if state.test_service.purge_test(&actor, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound("Test not found".to_string()))
    }
}

pub async fn test_stats<R: SkillTestRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let stats = state.test_service.test_stats(id).await?;
    Ok(Json(stats))
}

pub async fn publish_readiness<R: SkillTestRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let readiness = state.test_service.publish_readiness(id).await?;
    Ok(Json(readiness))
}
