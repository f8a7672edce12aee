use crate::dto::skill_test_dto::{CreateTestPayload, UpdateTestPayload};
use crate::error::{Error, Result, DUPLICATE_NAME_MESSAGE};
use crate::models::actor::Actor;
use crate::models::skill_test::{SkillTest, TestStatus};
use crate::policy::{ensure_can_author, ensure_can_manage, AuthoringPolicy};
use crate::repository::SkillTestRepository;
use crate::services::question_validator::{publish_readiness, PublishReadiness};
use crate::services::stats::{test_stats, TestStats};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub const NAME_REQUIRED: &str = "Test name is required.";

/// Creates skill tests and walks them through draft -> published -> archived.
#[derive(Clone)]
pub struct TestService<R> {
    repo: R,
    policy: Arc<dyn AuthoringPolicy>,
}

impl<R: SkillTestRepository> TestService<R> {
    pub fn new(repo: R, policy: Arc<dyn AuthoringPolicy>) -> Self {
        Self { repo, policy }
    }

    pub async fn create_test(&self, actor: &Actor, payload: CreateTestPayload) -> Result<SkillTest> {
        ensure_can_author(self.policy.as_ref(), actor)?;

        let name = payload.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::validation(NAME_REQUIRED));
        }
        if self.repo.name_in_use(&name, None).await? {
            return Err(Error::validation(DUPLICATE_NAME_MESSAGE));
        }
        payload.validate()?;

        let now = Utc::now();
        let test = SkillTest {
            id: Uuid::new_v4(),
            name,
            description: payload.description,
            category: payload.category,
            difficulty: payload.difficulty,
            passing_score: payload.passing_score,
            time_limit_minutes: payload.time_limit_minutes,
            max_attempts: payload.max_attempts,
            randomize_questions: payload.randomize_questions,
            randomize_options: payload.randomize_options,
            show_correct_answers: payload.show_correct_answers,
            feedback_timing: payload.feedback_timing,
            status: TestStatus::Draft,
            created_by: actor.id,
            published_at: None,
            archived_at: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        let test = self.repo.insert_test(test).await?;
        tracing::info!(test_id = %test.id, created_by = %actor.id, "Skill test created");
        Ok(test)
    }

    pub async fn get_test(&self, id: Uuid) -> Result<SkillTest> {
        self.repo
            .find_test(id)
            .await?
            .ok_or_else(|| Error::NotFound("Test not found".to_string()))
    }

    pub async fn update_test(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateTestPayload,
    ) -> Result<SkillTest> {
        payload.validate()?;

        let name = match payload.name.as_deref().map(str::trim) {
            Some("") => return Err(Error::validation(NAME_REQUIRED)),
            Some(name) => {
                if self.repo.name_in_use(name, Some(id)).await? {
                    return Err(Error::validation(DUPLICATE_NAME_MESSAGE));
                }
                Some(name.to_string())
            }
            None => None,
        };

        let policy = self.policy.as_ref();
        let test = self
            .repo
            .modify_test(id, move |test, _| {
                ensure_can_manage(policy, actor, test)?;
                test.ensure_editable()?;

                if let Some(name) = name {
                    test.name = name;
                }
                if let Some(description) = payload.description {
                    test.description = Some(description);
                }
                if let Some(category) = payload.category {
                    test.category = Some(category);
                }
                if let Some(difficulty) = payload.difficulty {
                    test.difficulty = difficulty;
                }
                if let Some(score) = payload.passing_score {
                    test.passing_score = score;
                }
                if let Some(limit) = payload.time_limit_minutes {
                    test.time_limit_minutes = Some(limit);
                }
                if let Some(attempts) = payload.max_attempts {
                    test.max_attempts = attempts;
                }
                if let Some(flag) = payload.randomize_questions {
                    test.randomize_questions = flag;
                }
                if let Some(flag) = payload.randomize_options {
                    test.randomize_options = flag;
                }
                if let Some(flag) = payload.show_correct_answers {
                    test.show_correct_answers = flag;
                }
                if let Some(timing) = payload.feedback_timing {
                    test.feedback_timing = timing;
                }
                test.updated_at = Utc::now();
                Ok(())
            })
            .await?;

        tracing::info!(test_id = %test.id, "Skill test updated");
        Ok(test)
    }

    /// Publishes a draft once it has questions and every one of them is
    /// structurally valid. Fails with the first problem found.
    pub async fn publish_test(&self, actor: &Actor, id: Uuid) -> Result<SkillTest> {
        let policy = self.policy.as_ref();
        let test = self
            .repo
            .modify_test(id, move |test, questions| {
                ensure_can_manage(policy, actor, test)?;
                if !test.is_draft() {
                    return Err(Error::validation("Only draft tests can be published."));
                }

                let report = publish_readiness(questions);
                if let Some(message) = report.first_error() {
                    tracing::warn!(
                        test_id = %test.id,
                        report = ?report,
                        "Skill test is not ready to be published"
                    );
                    return Err(Error::validation(message));
                }
                test.transition_to(TestStatus::Published, Utc::now())
            })
            .await?;

        tracing::info!(test_id = %test.id, "Skill test published");
        Ok(test)
    }

    pub async fn archive_test(&self, actor: &Actor, id: Uuid) -> Result<SkillTest> {
        let policy = self.policy.as_ref();
        let test = self
            .repo
            .modify_test(id, move |test, _| {
                ensure_can_manage(policy, actor, test)?;
                if test.status != TestStatus::Published {
                    return Err(Error::validation("Only published tests can be archived."));
                }
                test.transition_to(TestStatus::Archived, Utc::now())
            })
            .await?;

        tracing::info!(test_id = %test.id, "Skill test archived");
        Ok(test)
    }

    /// Soft delete. The rows stay until [`TestService::purge_test`].
    pub async fn delete_test(&self, actor: &Actor, id: Uuid) -> Result<bool> {
        let policy = self.policy.as_ref();
        let test = self
            .repo
            .modify_test(id, move |test, _| {
                ensure_can_manage(policy, actor, test)?;
                if !test.is_draft() {
                    return Err(Error::validation("Only draft tests can be deleted."));
                }
                let now = Utc::now();
                test.deleted_at = Some(now);
                test.updated_at = now;
                Ok(())
            })
            .await?;

        tracing::info!(test_id = %test.id, "Skill test deleted");
        Ok(test.is_deleted())
    }

    /// Permanently removes a soft-deleted test together with its questions,
    /// options and text configs.
    pub async fn purge_test(&self, actor: &Actor, id: Uuid) -> Result<bool> {
        if !self.policy.can_purge(actor) {
            return Err(Error::Forbidden(
                "You are not allowed to purge skill tests.".to_string(),
            ));
        }
        if self.repo.find_test(id).await?.is_some() {
            return Err(Error::validation("Only deleted tests can be purged."));
        }
        let purged = self.repo.purge_test(id).await?;
        if purged {
            tracing::info!(test_id = %id, "Skill test purged");
        }
        Ok(purged)
    }

    pub async fn tests_by_status(&self, status: &str) -> Result<Vec<SkillTest>> {
        let status: TestStatus = status.parse()?;
        self.repo.tests_by_status(status).await
    }

    pub async fn test_stats(&self, id: Uuid) -> Result<TestStats> {
        let test = self.get_test(id).await?;
        let questions = self.repo.questions_for_test(id).await?;
        Ok(test_stats(&test, &questions))
    }

    /// Everything that would stop the test from being published, without
    /// changing anything.
    pub async fn publish_readiness(&self, id: Uuid) -> Result<PublishReadiness> {
        self.get_test(id).await?;
        let questions = self.repo.questions_for_test(id).await?;
        Ok(publish_readiness(&questions))
    }
}
