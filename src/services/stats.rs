use crate::models::question::{Question, QuestionType};
use crate::models::skill_test::SkillTest;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestStats {
    pub test_id: Uuid,
    pub name: String,
    pub question_count: usize,
    pub total_points: i64,
    pub passing_score: i32,
    pub max_attempts: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionStats {
    pub question_id: Uuid,
    pub question_type: QuestionType,
    pub option_count: usize,
    pub correct_option_count: usize,
}

pub fn test_stats(test: &SkillTest, questions: &[Question]) -> TestStats {
    TestStats {
        test_id: test.id,
        name: test.name.clone(),
        question_count: questions.len(),
        total_points: questions.iter().map(|q| i64::from(q.points)).sum(),
        passing_score: test.passing_score,
        max_attempts: test.max_attempts,
    }
}

pub fn question_stats(question: &Question) -> QuestionStats {
    let options = question.body.options();
    QuestionStats {
        question_id: question.id,
        question_type: question.question_type(),
        option_count: options.len(),
        correct_option_count: options.iter().filter(|o| o.is_correct).count(),
    }
}
