use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

fn default_points() -> i32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "question_type", rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    SingleAnswer,
    Text,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Mcq => "mcq",
            QuestionType::SingleAnswer => "single_answer",
            QuestionType::Text => "text",
        }
    }

    pub fn uses_options(&self) -> bool {
        !matches!(self, QuestionType::Text)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mcq" => Ok(QuestionType::Mcq),
            "single_answer" => Ok(QuestionType::SingleAnswer),
            "text" => Ok(QuestionType::Text),
            _ => Err(Error::validation("Invalid question type.")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: Uuid,
    pub option_text: String,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextQuestionConfig {
    pub expected_answer_guidelines: String,
    pub min_characters: Option<i32>,
    pub max_characters: Option<i32>,
}

/// The type-dependent part of a question. Choice questions own options, text
/// questions own (at most) one config; never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionBody {
    Mcq { options: Vec<QuestionOption> },
    SingleAnswer { options: Vec<QuestionOption> },
    Text { text_config: Option<TextQuestionConfig> },
}

impl QuestionBody {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionBody::Mcq { .. } => QuestionType::Mcq,
            QuestionBody::SingleAnswer { .. } => QuestionType::SingleAnswer,
            QuestionBody::Text { .. } => QuestionType::Text,
        }
    }

    pub fn options(&self) -> &[QuestionOption] {
        match self {
            QuestionBody::Mcq { options } | QuestionBody::SingleAnswer { options } => options,
            QuestionBody::Text { .. } => &[],
        }
    }

    pub fn text_config(&self) -> Option<&TextQuestionConfig> {
        match self {
            QuestionBody::Text { text_config } => text_config.as_ref(),
            _ => None,
        }
    }

    /// Same shape with fresh option identifiers.
    pub fn clone_detached(&self) -> Self {
        fn fresh(options: &[QuestionOption]) -> Vec<QuestionOption> {
            options
                .iter()
                .map(|o| QuestionOption {
                    id: Uuid::new_v4(),
                    ..o.clone()
                })
                .collect()
        }
        match self {
            QuestionBody::Mcq { options } => QuestionBody::Mcq {
                options: fresh(options),
            },
            QuestionBody::SingleAnswer { options } => QuestionBody::SingleAnswer {
                options: fresh(options),
            },
            QuestionBody::Text { text_config } => QuestionBody::Text {
                text_config: text_config.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub test_id: Uuid,
    pub question_text: String,
    #[serde(default = "default_points")]
    pub points: i32,
    pub order: i32,
    #[serde(flatten)]
    pub body: QuestionBody,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Question {
    pub fn question_type(&self) -> QuestionType {
        self.body.question_type()
    }
}
