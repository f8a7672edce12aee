use crate::models::skill_test::{Difficulty, FeedbackTiming};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

fn default_max_attempts() -> i32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_points() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTestPayload {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[validate(range(min = 0, max = 100, message = "Passing score must be between 0 and 100."))]
    pub passing_score: i32,
    #[validate(range(min = 1, message = "Time limit must be at least 1 minute."))]
    pub time_limit_minutes: Option<i32>,
    #[serde(default = "default_max_attempts")]
    #[validate(range(min = 1, message = "Max attempts must be at least 1."))]
    pub max_attempts: i32,
    #[serde(default)]
    pub randomize_questions: bool,
    #[serde(default)]
    pub randomize_options: bool,
    #[serde(default = "default_true")]
    pub show_correct_answers: bool,
    #[serde(default)]
    pub feedback_timing: FeedbackTiming,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTestPayload {
    pub name: Option<String>,

    #[serde(default, deserialize_with = "trim_optional_string")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "trim_optional_string")]
    pub category: Option<String>,

    pub difficulty: Option<Difficulty>,

    #[validate(range(min = 0, max = 100, message = "Passing score must be between 0 and 100."))]
    pub passing_score: Option<i32>,

    #[validate(range(min = 1, message = "Time limit must be at least 1 minute."))]
    pub time_limit_minutes: Option<i32>,

    #[validate(range(min = 1, message = "Max attempts must be at least 1."))]
    pub max_attempts: Option<i32>,

    pub randomize_questions: Option<bool>,
    pub randomize_options: Option<bool>,
    pub show_correct_answers: Option<bool>,
    pub feedback_timing: Option<FeedbackTiming>,
}

// Trims strings and turns empty ones into None
fn trim_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionPayload {
    #[serde(default)]
    pub option_text: String,
    #[serde(default)]
    pub is_correct: bool,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextConfigPayload {
    pub expected_answer_guidelines: Option<String>,
    pub min_characters: Option<i32>,
    pub max_characters: Option<i32>,
}

/// The question type stays a raw string so unknown values surface as a
/// validation error instead of a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateQuestionPayload {
    #[serde(rename = "type", alias = "question_type")]
    pub question_type: String,
    #[serde(default)]
    pub question_text: String,
    #[serde(default = "default_points")]
    #[validate(range(min = 1, message = "Points must be at least 1."))]
    pub points: i32,
    #[serde(default)]
    pub options: Vec<OptionPayload>,
    pub text_config: Option<TextConfigPayload>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateQuestionPayload {
    pub question_text: Option<String>,
    #[validate(range(min = 1, message = "Points must be at least 1."))]
    pub points: Option<i32>,
    /// Replaces every existing option when present.
    pub options: Option<Vec<OptionPayload>>,
    /// Upserted field by field.
    pub text_config: Option<TextConfigPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestListQuery {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReorderQuestionsPayload {
    pub question_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DuplicateQuestionPayload {
    pub target_test_id: Uuid,
}
