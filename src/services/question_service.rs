use crate::dto::skill_test_dto::{
    CreateQuestionPayload, OptionPayload, TextConfigPayload, UpdateQuestionPayload,
};
use crate::error::{Error, Result};
use crate::models::actor::Actor;
use crate::models::question::{
    Question, QuestionBody, QuestionOption, QuestionType, TextQuestionConfig,
};
use crate::models::skill_test::SkillTest;
use crate::policy::{ensure_can_manage, AuthoringPolicy};
use crate::repository::SkillTestRepository;
use crate::services::ordering::plan_order;
use crate::services::question_validator::{ensure_valid, validate_question, QUESTION_TEXT_REQUIRED};
use crate::services::stats::{question_stats, QuestionStats};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

const OPTIONS_NOT_ALLOWED: &str = "Text questions cannot have answer options.";
const TEXT_CONFIG_NOT_ALLOWED: &str = "Only text questions can have a text configuration.";

#[derive(Clone)]
pub struct QuestionService<R> {
    repo: R,
    policy: Arc<dyn AuthoringPolicy>,
}

fn to_option(payload: OptionPayload) -> QuestionOption {
    QuestionOption {
        id: Uuid::new_v4(),
        option_text: payload.option_text.trim().to_string(),
        is_correct: payload.is_correct,
        explanation: payload.explanation,
    }
}

fn to_text_config(payload: TextConfigPayload) -> TextQuestionConfig {
    TextQuestionConfig {
        expected_answer_guidelines: payload
            .expected_answer_guidelines
            .map(|g| g.trim().to_string())
            .unwrap_or_default(),
        min_characters: payload.min_characters,
        max_characters: payload.max_characters,
    }
}

fn build_body(
    question_type: QuestionType,
    options: Vec<OptionPayload>,
    text_config: Option<TextConfigPayload>,
) -> Result<QuestionBody> {
    if question_type.uses_options() && text_config.is_some() {
        return Err(Error::validation(TEXT_CONFIG_NOT_ALLOWED));
    }
    if !question_type.uses_options() && !options.is_empty() {
        return Err(Error::validation(OPTIONS_NOT_ALLOWED));
    }
    let options = options.into_iter().map(to_option).collect();
    Ok(match question_type {
        QuestionType::Mcq => QuestionBody::Mcq { options },
        QuestionType::SingleAnswer => QuestionBody::SingleAnswer { options },
        QuestionType::Text => QuestionBody::Text {
            text_config: text_config.map(to_text_config),
        },
    })
}

/// Options are replaced wholesale; text config fields are upserted.
fn merge_body(
    body: &mut QuestionBody,
    options: Option<Vec<OptionPayload>>,
    text_config: Option<TextConfigPayload>,
) -> Result<()> {
    match body {
        QuestionBody::Mcq { options: current } | QuestionBody::SingleAnswer { options: current } => {
            if text_config.is_some() {
                return Err(Error::validation(TEXT_CONFIG_NOT_ALLOWED));
            }
            if let Some(replacement) = options {
                *current = replacement.into_iter().map(to_option).collect();
            }
        }
        QuestionBody::Text { text_config: current } => {
            if options.is_some_and(|o| !o.is_empty()) {
                return Err(Error::validation(OPTIONS_NOT_ALLOWED));
            }
            if let Some(patch) = text_config {
                match current {
                    Some(config) => {
                        if let Some(guidelines) = patch.expected_answer_guidelines {
                            config.expected_answer_guidelines = guidelines.trim().to_string();
                        }
                        if patch.min_characters.is_some() {
                            config.min_characters = patch.min_characters;
                        }
                        if patch.max_characters.is_some() {
                            config.max_characters = patch.max_characters;
                        }
                    }
                    None => *current = Some(to_text_config(patch)),
                }
            }
        }
    }
    Ok(())
}

fn ensure_writable(policy: &dyn AuthoringPolicy, actor: &Actor, test: &SkillTest) -> Result<()> {
    ensure_can_manage(policy, actor, test)?;
    test.ensure_editable()
}

impl<R: SkillTestRepository> QuestionService<R> {
    pub fn new(repo: R, policy: Arc<dyn AuthoringPolicy>) -> Self {
        Self { repo, policy }
    }

    /// Validates the proposed question and appends it to the test.
    pub async fn add_question(
        &self,
        actor: &Actor,
        test_id: Uuid,
        payload: CreateQuestionPayload,
    ) -> Result<Question> {
        let question_type: QuestionType = payload.question_type.parse()?;
        let question_text = payload.question_text.trim().to_string();
        if question_text.is_empty() {
            return Err(Error::validation(QUESTION_TEXT_REQUIRED));
        }
        payload.validate()?;

        let body = build_body(question_type, payload.options, payload.text_config)?;
        ensure_valid(&question_text, &body)?;

        let now = Utc::now();
        let question = Question {
            id: Uuid::new_v4(),
            test_id,
            question_text,
            points: payload.points,
            order: 0,
            body,
            created_at: now,
            updated_at: now,
        };

        let policy = self.policy.as_ref();
        let question = self
            .repo
            .insert_question(question, move |test| ensure_writable(policy, actor, test))
            .await?;

        tracing::info!(
            test_id = %test_id,
            question_id = %question.id,
            question_type = %question.question_type(),
            order = question.order,
            "Question added"
        );
        Ok(question)
    }

    pub async fn update_question(
        &self,
        actor: &Actor,
        question_id: Uuid,
        payload: UpdateQuestionPayload,
    ) -> Result<Question> {
        payload.validate()?;
        if payload
            .question_text
            .as_deref()
            .is_some_and(|t| t.trim().is_empty())
        {
            return Err(Error::validation(QUESTION_TEXT_REQUIRED));
        }

        let policy = self.policy.as_ref();
        let question = self
            .repo
            .modify_question(question_id, move |test, question| {
                ensure_writable(policy, actor, test)?;

                if let Some(text) = payload.question_text {
                    question.question_text = text.trim().to_string();
                }
                if let Some(points) = payload.points {
                    question.points = points;
                }
                merge_body(&mut question.body, payload.options, payload.text_config)?;
                ensure_valid(&question.question_text, &question.body)?;
                question.updated_at = Utc::now();
                Ok(())
            })
            .await?;

        tracing::info!(question_id = %question.id, "Question updated");
        Ok(question)
    }

    /// Removes the question with its options or text config. Returns `false`
    /// when there was nothing to delete.
    pub async fn delete_question(&self, actor: &Actor, question_id: Uuid) -> Result<bool> {
        let policy = self.policy.as_ref();
        let deleted = self
            .repo
            .delete_question(question_id, move |test| ensure_writable(policy, actor, test))
            .await?;
        if deleted {
            tracing::info!(question_id = %question_id, "Question deleted");
        }
        Ok(deleted)
    }

    /// Renumbers the test's questions 1..N, either in the requested sequence
    /// or compacting the current one.
    pub async fn reorder_questions(
        &self,
        actor: &Actor,
        test_id: Uuid,
        question_ids: Option<Vec<Uuid>>,
    ) -> Result<Vec<Question>> {
        let policy = self.policy.as_ref();
        let questions = self
            .repo
            .renumber_questions(test_id, move |test, current| {
                ensure_writable(policy, actor, test)?;
                plan_order(current, question_ids.as_deref())
            })
            .await?;

        tracing::info!(test_id = %test_id, count = questions.len(), "Questions reordered");
        Ok(questions)
    }

    /// Deep copy into `target_test_id`, appended after its last question.
    pub async fn duplicate_question(
        &self,
        actor: &Actor,
        question_id: Uuid,
        target_test_id: Uuid,
    ) -> Result<Question> {
        let source = self.get_question(question_id).await?;

        let now = Utc::now();
        let copy = Question {
            id: Uuid::new_v4(),
            test_id: target_test_id,
            question_text: source.question_text.clone(),
            points: source.points,
            order: 0,
            body: source.body.clone_detached(),
            created_at: now,
            updated_at: now,
        };

        let policy = self.policy.as_ref();
        let copy = self
            .repo
            .insert_question(copy, move |test| ensure_writable(policy, actor, test))
            .await?;

        tracing::info!(
            source_id = %source.id,
            question_id = %copy.id,
            target_test_id = %target_test_id,
            "Question duplicated"
        );
        Ok(copy)
    }

    pub async fn get_question(&self, question_id: Uuid) -> Result<Question> {
        self.repo
            .find_question(question_id)
            .await?
            .ok_or_else(|| Error::NotFound("Question not found".to_string()))
    }

    pub async fn get_questions(&self, test_id: Uuid) -> Result<Vec<Question>> {
        if self.repo.find_test(test_id).await?.is_none() {
            return Err(Error::NotFound("Test not found".to_string()));
        }
        self.repo.questions_for_test(test_id).await
    }

    pub async fn question_stats(&self, question_id: Uuid) -> Result<QuestionStats> {
        let question = self.get_question(question_id).await?;
        Ok(question_stats(&question))
    }

    /// Every structural problem with the stored question; empty when valid.
    pub async fn validate_question_configuration(&self, question_id: Uuid) -> Result<Vec<String>> {
        let question = self.get_question(question_id).await?;
        Ok(validate_question(&question.question_text, &question.body))
    }
}
