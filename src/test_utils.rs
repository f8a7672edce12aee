//! Shared fixtures for unit tests.

use crate::dto::skill_test_dto::{
    CreateQuestionPayload, CreateTestPayload, OptionPayload, TextConfigPayload,
};
use crate::models::actor::{Actor, Role};
use crate::models::skill_test::{Difficulty, FeedbackTiming};
use uuid::Uuid;

pub fn hr() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Hr)
}

pub fn admin() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Admin)
}

pub fn create_payload(name: &str) -> CreateTestPayload {
    CreateTestPayload {
        name: name.to_string(),
        description: Some("Core concepts".to_string()),
        category: Some("Engineering".to_string()),
        difficulty: Difficulty::Medium,
        passing_score: 70,
        time_limit_minutes: Some(30),
        max_attempts: 1,
        randomize_questions: false,
        randomize_options: false,
        show_correct_answers: true,
        feedback_timing: FeedbackTiming::Immediate,
    }
}

pub fn option(text: &str, is_correct: bool) -> OptionPayload {
    OptionPayload {
        option_text: text.to_string(),
        is_correct,
        explanation: None,
    }
}

fn choice_payload(question_type: &str, text: &str, options: &[(&str, bool)]) -> CreateQuestionPayload {
    CreateQuestionPayload {
        question_type: question_type.to_string(),
        question_text: text.to_string(),
        points: 1,
        options: options.iter().map(|(t, c)| option(t, *c)).collect(),
        text_config: None,
    }
}

pub fn mcq_payload(text: &str, options: &[(&str, bool)]) -> CreateQuestionPayload {
    choice_payload("mcq", text, options)
}

pub fn single_answer_payload(text: &str, options: &[(&str, bool)]) -> CreateQuestionPayload {
    choice_payload("single_answer", text, options)
}

pub fn text_payload(
    text: &str,
    guidelines: &str,
    min_characters: Option<i32>,
    max_characters: Option<i32>,
) -> CreateQuestionPayload {
    CreateQuestionPayload {
        question_type: "text".to_string(),
        question_text: text.to_string(),
        points: 1,
        options: Vec::new(),
        text_config: Some(TextConfigPayload {
            expected_answer_guidelines: Some(guidelines.to_string()),
            min_characters,
            max_characters,
        }),
    }
}
