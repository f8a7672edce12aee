//! Structural rules for each question variant.
//!
//! The same rules run in two places: strictly when a question is written
//! (first violation aborts the write) and as a read-only sweep over every
//! question of a test before it may be published.

use crate::error::{Error, Result};
use crate::models::question::{Question, QuestionBody, QuestionOption, TextQuestionConfig};
use serde::Serialize;
use uuid::Uuid;

pub const QUESTION_TEXT_REQUIRED: &str = "Question text is required.";
pub const NO_QUESTIONS: &str = "Cannot publish test without at least one question.";

/// Every violation for one question; an empty list means the question is valid.
pub fn validate_question(question_text: &str, body: &QuestionBody) -> Vec<String> {
    let mut errors = Vec::new();
    if question_text.trim().is_empty() {
        errors.push(QUESTION_TEXT_REQUIRED.to_string());
    }
    match body {
        QuestionBody::Mcq { options } => validate_mcq(options, &mut errors),
        QuestionBody::SingleAnswer { options } => validate_single_answer(options, &mut errors),
        QuestionBody::Text { text_config } => validate_text(text_config.as_ref(), &mut errors),
    }
    errors
}

fn correct_count(options: &[QuestionOption]) -> usize {
    options.iter().filter(|o| o.is_correct).count()
}

fn validate_mcq(options: &[QuestionOption], errors: &mut Vec<String>) {
    if options.len() < 2 {
        errors.push("Multiple choice questions must have at least 2 options.".to_string());
    }
    if correct_count(options) == 0 {
        errors.push("Multiple choice questions must have at least one correct answer.".to_string());
    }
}

fn validate_single_answer(options: &[QuestionOption], errors: &mut Vec<String>) {
    if options.len() < 2 {
        errors.push("Single answer questions must have at least 2 options.".to_string());
    }
    if correct_count(options) != 1 {
        errors.push("Single answer questions must have exactly one correct answer.".to_string());
    }
}

fn validate_text(config: Option<&TextQuestionConfig>, errors: &mut Vec<String>) {
    let Some(config) = config else {
        errors.push("Text questions must have a configuration.".to_string());
        return;
    };
    if config.expected_answer_guidelines.trim().is_empty() {
        errors.push("Text questions must have expected answer guidelines.".to_string());
    }
    let negative = |limit: Option<i32>| limit.is_some_and(|n| n < 0);
    if negative(config.min_characters) || negative(config.max_characters) {
        errors.push("Character limits cannot be negative.".to_string());
    }
    if let (Some(min), Some(max)) = (config.min_characters, config.max_characters) {
        if min > max {
            errors.push(
                "Minimum character limit cannot be greater than maximum character limit."
                    .to_string(),
            );
        }
    }
}

/// Write-time enforcement: the first violation becomes the error.
pub fn ensure_valid(question_text: &str, body: &QuestionBody) -> Result<()> {
    match validate_question(question_text, body).into_iter().next() {
        Some(message) => Err(Error::Validation(message)),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionIssues {
    pub question_id: Uuid,
    pub order: i32,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishReadiness {
    pub ready: bool,
    pub question_count: usize,
    /// Test-level problems, such as having no questions at all.
    pub errors: Vec<String>,
    pub questions: Vec<QuestionIssues>,
}

impl PublishReadiness {
    pub fn first_error(&self) -> Option<&str> {
        self.errors
            .iter()
            .chain(self.questions.iter().flat_map(|q| q.errors.iter()))
            .map(String::as_str)
            .next()
    }
}

/// Collects every problem across `questions` without stopping at the first.
pub fn publish_readiness(questions: &[Question]) -> PublishReadiness {
    let mut errors = Vec::new();
    if questions.is_empty() {
        errors.push(NO_QUESTIONS.to_string());
    }
    let issues: Vec<QuestionIssues> = questions
        .iter()
        .filter_map(|q| {
            let errors = validate_question(&q.question_text, &q.body);
            (!errors.is_empty()).then(|| QuestionIssues {
                question_id: q.id,
                order: q.order,
                errors,
            })
        })
        .collect();

    PublishReadiness {
        ready: errors.is_empty() && issues.is_empty(),
        question_count: questions.len(),
        errors,
        questions: issues,
    }
}
