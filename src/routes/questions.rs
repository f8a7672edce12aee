use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    dto::skill_test_dto::{
        CreateQuestionPayload, DuplicateQuestionPayload, ReorderQuestionsPayload,
        UpdateQuestionPayload,
    },
    error::{Error, Result},
    models::actor::Actor,
    repository::SkillTestRepository,
    AppState,
};

pub async fn add_question<R: SkillTestRepository>(
    State(state): State<AppState<R>>,
    Extension(actor): Extension<Actor>,
    Path(test_id): Path<Uuid>,
    Json(payload): Json<CreateQuestionPayload>,
) -> Result<impl IntoResponse> {
    let question = state
        .question_service
        .add_question(&actor, test_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn list_questions<R: SkillTestRepository>(
    State(state): State<AppState<R>>,
    Path(test_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let questions = state.question_service.get_questions(test_id).await?;
    Ok(Json(questions))
}

pub async fn reorder_questions<R: SkillTestRepository>(
    State(state): State<AppState<R>>,
    Extension(actor): Extension<Actor>,
    Path(test_id): Path<Uuid>,
    Json(payload): Json<ReorderQuestionsPayload>,
) -> Result<impl IntoResponse> {
    let questions = state
        .question_service
        .reorder_questions(&actor, test_id, payload.question_ids)
        .await?;
    Ok(Json(questions))
}

pub async fn get_question<R: SkillTestRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let question = state.question_service.get_question(id).await?;
    Ok(Json(question))
}

pub async fn update_question<R: SkillTestRepository>(
    State(state): State<AppState<R>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQuestionPayload>,
) -> Result<impl IntoResponse> {
    let question = state
        .question_service
        .update_question(&actor, id, payload)
        .await?;
    Ok(Json(question))
}

pub async fn delete_question<R: SkillTestRepository>(
    State(state): State<AppState<R>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    if state.question_service.delete_question(&actor, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound("Question not found".to_string()))
    }
}

pub async fn duplicate_question<R: SkillTestRepository>(
    State(state): State<AppState<R>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DuplicateQuestionPayload>,
) -> Result<impl IntoResponse> {
    let question = state
        .question_service
        .duplicate_question(&actor, id, payload.target_test_id)
        .await?;
    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn question_stats<R: SkillTestRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let stats = state.question_service.question_stats(id).await?;
    Ok(Json(stats))
}

pub async fn validate_question<R: SkillTestRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let errors = state
        .question_service
        .validate_question_configuration(id)
        .await?;
    Ok(Json(json!({
        "valid": errors.is_empty(),
        "errors": errors,
    })))
}
