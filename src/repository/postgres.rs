use super::SkillTestRepository;
use crate::error::{Error, Result};
use crate::models::question::{
    Question, QuestionBody, QuestionOption, QuestionType, TextQuestionConfig,
};
use crate::models::skill_test::{SkillTest, TestStatus};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

const TEST_COLUMNS: &str = "id, name, description, category, difficulty, passing_score, \
    time_limit_minutes, max_attempts, randomize_questions, randomize_options, \
    show_correct_answers, feedback_timing, status, created_by, published_at, archived_at, \
    deleted_at, created_at, updated_at";

const QUESTION_COLUMNS: &str =
    "id, test_id, question_type, question_text, points, sort_order, created_at, updated_at";

#[derive(Debug, FromRow)]
struct QuestionRow {
    id: Uuid,
    test_id: Uuid,
    question_type: QuestionType,
    question_text: String,
    points: i32,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct OptionRow {
    id: Uuid,
    question_id: Uuid,
    option_text: String,
    is_correct: bool,
    explanation: Option<String>,
}

#[derive(Debug, FromRow)]
struct TextConfigRow {
    question_id: Uuid,
    expected_answer_guidelines: String,
    min_characters: Option<i32>,
    max_characters: Option<i32>,
}

#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn lock_test(conn: &mut PgConnection, id: Uuid) -> Result<SkillTest> {
    sqlx::query_as::<_, SkillTest>(&format!(
        "SELECT {} FROM skill_tests WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        TEST_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| Error::NotFound("Test not found".to_string()))
}

async fn save_test(conn: &mut PgConnection, test: &SkillTest) -> Result<SkillTest> {
    let saved = sqlx::query_as::<_, SkillTest>(&format!(
        r#"
        UPDATE skill_tests
        SET
            name = $1,
            description = $2,
            category = $3,
            difficulty = $4,
            passing_score = $5,
            time_limit_minutes = $6,
            max_attempts = $7,
            randomize_questions = $8,
            randomize_options = $9,
            show_correct_answers = $10,
            feedback_timing = $11,
            status = $12,
            published_at = $13,
            archived_at = $14,
            deleted_at = $15,
            updated_at = $16
        WHERE id = $17
        RETURNING {}
        "#,
        TEST_COLUMNS
    ))
    .bind(&test.name)
    .bind(&test.description)
    .bind(&test.category)
    .bind(test.difficulty)
    .bind(test.passing_score)
    .bind(test.time_limit_minutes)
    .bind(test.max_attempts)
    .bind(test.randomize_questions)
    .bind(test.randomize_options)
    .bind(test.show_correct_answers)
    .bind(test.feedback_timing)
    .bind(test.status)
    .bind(test.published_at)
    .bind(test.archived_at)
    .bind(test.deleted_at)
    .bind(test.updated_at)
    .bind(test.id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(saved)
}

async fn load_questions(conn: &mut PgConnection, test_id: Uuid) -> Result<Vec<Question>> {
    let rows = sqlx::query_as::<_, QuestionRow>(&format!(
        "SELECT {} FROM skill_test_questions WHERE test_id = $1 ORDER BY sort_order, id",
        QUESTION_COLUMNS
    ))
    .bind(test_id)
    .fetch_all(&mut *conn)
    .await?;
    hydrate(conn, rows).await
}

/// A question whose test has been soft-deleted counts as missing.
async fn load_question(conn: &mut PgConnection, id: Uuid) -> Result<Option<Question>> {
    let rows = sqlx::query_as::<_, QuestionRow>(&format!(
        r#"
        SELECT {} FROM skill_test_questions AS q
        WHERE q.id = $1
          AND EXISTS (
              SELECT 1 FROM skill_tests AS t
              WHERE t.id = q.test_id AND t.deleted_at IS NULL
          )
        "#,
        QUESTION_COLUMNS
    ))
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(hydrate(conn, rows).await?.into_iter().next())
}

/// Attaches options and text configs to question rows.
async fn hydrate(conn: &mut PgConnection, rows: Vec<QuestionRow>) -> Result<Vec<Question>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

    let option_rows = sqlx::query_as::<_, OptionRow>(
        r#"
        SELECT id, question_id, option_text, is_correct, explanation
        FROM skill_test_question_options
        WHERE question_id = ANY($1)
        ORDER BY question_id, position
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let config_rows = sqlx::query_as::<_, TextConfigRow>(
        r#"
        SELECT question_id, expected_answer_guidelines, min_characters, max_characters
        FROM skill_test_text_configs
        WHERE question_id = ANY($1)
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut options: HashMap<Uuid, Vec<QuestionOption>> = HashMap::new();
    for row in option_rows {
        options.entry(row.question_id).or_default().push(QuestionOption {
            id: row.id,
            option_text: row.option_text,
            is_correct: row.is_correct,
            explanation: row.explanation,
        });
    }
    let mut configs: HashMap<Uuid, TextQuestionConfig> = config_rows
        .into_iter()
        .map(|row| {
            (
                row.question_id,
                TextQuestionConfig {
                    expected_answer_guidelines: row.expected_answer_guidelines,
                    min_characters: row.min_characters,
                    max_characters: row.max_characters,
                },
            )
        })
        .collect();

    Ok(rows
        .into_iter()
        .map(|row| {
            let body = match row.question_type {
                QuestionType::Mcq => QuestionBody::Mcq {
                    options: options.remove(&row.id).unwrap_or_default(),
                },
                QuestionType::SingleAnswer => QuestionBody::SingleAnswer {
                    options: options.remove(&row.id).unwrap_or_default(),
                },
                QuestionType::Text => QuestionBody::Text {
                    text_config: configs.remove(&row.id),
                },
            };
            Question {
                id: row.id,
                test_id: row.test_id,
                question_text: row.question_text,
                points: row.points,
                order: row.sort_order,
                body,
                created_at: row.created_at,
                updated_at: row.updated_at,
            }
        })
        .collect())
}

/// Replaces whatever options or text config the question had.
async fn write_body(conn: &mut PgConnection, question_id: Uuid, body: &QuestionBody) -> Result<()> {
    sqlx::query("DELETE FROM skill_test_question_options WHERE question_id = $1")
        .bind(question_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM skill_test_text_configs WHERE question_id = $1")
        .bind(question_id)
        .execute(&mut *conn)
        .await?;

    match body {
        QuestionBody::Mcq { options } | QuestionBody::SingleAnswer { options } => {
            for (position, option) in options.iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO skill_test_question_options
                        (id, question_id, option_text, is_correct, explanation, position)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(option.id)
                .bind(question_id)
                .bind(&option.option_text)
                .bind(option.is_correct)
                .bind(&option.explanation)
                .bind(position as i32)
                .execute(&mut *conn)
                .await?;
            }
        }
        QuestionBody::Text {
            text_config: Some(config),
        } => {
            sqlx::query(
                r#"
                INSERT INTO skill_test_text_configs
                    (question_id, expected_answer_guidelines, min_characters, max_characters)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(question_id)
            .bind(&config.expected_answer_guidelines)
            .bind(config.min_characters)
            .bind(config.max_characters)
            .execute(&mut *conn)
            .await?;
        }
        QuestionBody::Text { text_config: None } => {}
    }
    Ok(())
}

impl SkillTestRepository for PgRepository {
    async fn name_in_use(&self, name: &str, exclude: Option<Uuid>) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM skill_tests
                WHERE name = $1 AND deleted_at IS NULL
                  AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(name)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn insert_test(&self, test: SkillTest) -> Result<SkillTest> {
        let created = sqlx::query_as::<_, SkillTest>(&format!(
            r#"
            INSERT INTO skill_tests (
                id, name, description, category, difficulty, passing_score,
                time_limit_minutes, max_attempts, randomize_questions, randomize_options,
                show_correct_answers, feedback_timing, status, created_by,
                published_at, archived_at, deleted_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING {}
            "#,
            TEST_COLUMNS
        ))
        .bind(test.id)
        .bind(&test.name)
        .bind(&test.description)
        .bind(&test.category)
        .bind(test.difficulty)
        .bind(test.passing_score)
        .bind(test.time_limit_minutes)
        .bind(test.max_attempts)
        .bind(test.randomize_questions)
        .bind(test.randomize_options)
        .bind(test.show_correct_answers)
        .bind(test.feedback_timing)
        .bind(test.status)
        .bind(test.created_by)
        .bind(test.published_at)
        .bind(test.archived_at)
        .bind(test.deleted_at)
        .bind(test.created_at)
        .bind(test.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn find_test(&self, id: Uuid) -> Result<Option<SkillTest>> {
        let test = sqlx::query_as::<_, SkillTest>(&format!(
            "SELECT {} FROM skill_tests WHERE id = $1 AND deleted_at IS NULL",
            TEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(test)
    }

    async fn tests_by_status(&self, status: TestStatus) -> Result<Vec<SkillTest>> {
        let tests = sqlx::query_as::<_, SkillTest>(&format!(
            r#"
            SELECT {} FROM skill_tests
            WHERE status = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC, name
            "#,
            TEST_COLUMNS
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(tests)
    }

    async fn modify_test<F>(&self, id: Uuid, apply: F) -> Result<SkillTest>
    where
        F: FnOnce(&mut SkillTest, &[Question]) -> Result<()> + Send,
    {
        let mut tx = self.pool.begin().await?;
        let mut test = lock_test(&mut tx, id).await?;
        let questions = load_questions(&mut tx, id).await?;
        apply(&mut test, &questions)?;
        let saved = save_test(&mut tx, &test).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn purge_test(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM skill_tests WHERE id = $1 AND deleted_at IS NOT NULL")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn questions_for_test(&self, test_id: Uuid) -> Result<Vec<Question>> {
        let mut conn = self.pool.acquire().await?;
        load_questions(&mut conn, test_id).await
    }

    async fn find_question(&self, id: Uuid) -> Result<Option<Question>> {
        let mut conn = self.pool.acquire().await?;
        load_question(&mut conn, id).await
    }

    async fn insert_question<F>(&self, question: Question, guard: F) -> Result<Question>
    where
        F: FnOnce(&SkillTest) -> Result<()> + Send,
    {
        let mut tx = self.pool.begin().await?;
        let test = lock_test(&mut tx, question.test_id).await?;
        guard(&test)?;

        let order: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(sort_order), 0) + 1 FROM skill_test_questions WHERE test_id = $1",
        )
        .bind(test.id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO skill_test_questions
                (id, test_id, question_type, question_text, points, sort_order, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(question.id)
        .bind(test.id)
        .bind(question.question_type())
        .bind(&question.question_text)
        .bind(question.points)
        .bind(order)
        .bind(question.created_at)
        .bind(question.updated_at)
        .execute(&mut *tx)
        .await?;
        write_body(&mut tx, question.id, &question.body).await?;

        tx.commit().await?;
        Ok(Question { order, ..question })
    }

    async fn modify_question<F>(&self, id: Uuid, apply: F) -> Result<Question>
    where
        F: FnOnce(&SkillTest, &mut Question) -> Result<()> + Send,
    {
        let mut tx = self.pool.begin().await?;
        let test_id: Uuid = sqlx::query_scalar("SELECT test_id FROM skill_test_questions WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::NotFound("Question not found".to_string()))?;
        let test = lock_test(&mut tx, test_id).await?;
        let current = load_question(&mut tx, id)
            .await?
            .ok_or_else(|| Error::NotFound("Question not found".to_string()))?;

        let mut updated = current.clone();
        apply(&test, &mut updated)?;

        sqlx::query(
            r#"
            UPDATE skill_test_questions
            SET question_text = $1, points = $2, updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(&updated.question_text)
        .bind(updated.points)
        .bind(updated.updated_at)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if updated.body != current.body {
            write_body(&mut tx, id, &updated.body).await?;
        }

        tx.commit().await?;
        Ok(Question {
            id: current.id,
            test_id: current.test_id,
            order: current.order,
            ..updated
        })
    }

    async fn delete_question<F>(&self, id: Uuid, guard: F) -> Result<bool>
    where
        F: FnOnce(&SkillTest) -> Result<()> + Send,
    {
        let mut tx = self.pool.begin().await?;
        let test_id: Option<Uuid> =
            sqlx::query_scalar("SELECT test_id FROM skill_test_questions WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(test_id) = test_id else {
            return Ok(false);
        };
        let test = lock_test(&mut tx, test_id).await?;
        guard(&test)?;

        // Options and text config go with it through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM skill_test_questions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn renumber_questions<F>(&self, test_id: Uuid, plan: F) -> Result<Vec<Question>>
    where
        F: FnOnce(&SkillTest, &[Question]) -> Result<Vec<Uuid>> + Send,
    {
        let mut tx = self.pool.begin().await?;
        let test = lock_test(&mut tx, test_id).await?;
        let current = load_questions(&mut tx, test_id).await?;
        let sequence = plan(&test, &current)?;
        let orders: Vec<i32> = (1..=sequence.len() as i32).collect();

        sqlx::query(
            r#"
            UPDATE skill_test_questions AS q
            SET sort_order = v.sort_order, updated_at = NOW()
            FROM UNNEST($1::uuid[], $2::int4[]) AS v(id, sort_order)
            WHERE q.id = v.id AND q.test_id = $3
            "#,
        )
        .bind(&sequence)
        .bind(&orders)
        .bind(test_id)
        .execute(&mut *tx)
        .await?;

        let renumbered = load_questions(&mut tx, test_id).await?;
        tx.commit().await?;
        Ok(renumbered)
    }
}
