//! Storage for skill tests and their questions.
//!
//! Writes that depend on a test's current state take a closure which runs
//! while the owning test is locked, so each read-validate-write step is one
//! transaction. Returning an error from the closure rolls the write back.

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

use crate::error::Result;
use crate::models::question::Question;
use crate::models::skill_test::{SkillTest, TestStatus};
use std::future::Future;
use uuid::Uuid;

pub trait SkillTestRepository: Clone + Send + Sync + 'static {
    /// Whether a non-deleted test other than `exclude` already uses `name`.
    fn name_in_use(
        &self,
        name: &str,
        exclude: Option<Uuid>,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn insert_test(&self, test: SkillTest) -> impl Future<Output = Result<SkillTest>> + Send;

    /// Non-deleted test by id.
    fn find_test(&self, id: Uuid) -> impl Future<Output = Result<Option<SkillTest>>> + Send;

    fn tests_by_status(
        &self,
        status: TestStatus,
    ) -> impl Future<Output = Result<Vec<SkillTest>>> + Send;

    /// Locks the test, hands it and its ordered questions to `apply`, then
    /// persists the test's columns.
    fn modify_test<F>(&self, id: Uuid, apply: F) -> impl Future<Output = Result<SkillTest>> + Send
    where
        F: FnOnce(&mut SkillTest, &[Question]) -> Result<()> + Send;

    /// Removes a soft-deleted test for good, with all questions, options and
    /// text configs it owns.
    fn purge_test(&self, id: Uuid) -> impl Future<Output = Result<bool>> + Send;

    /// Questions ordered by `order`, sub-entities loaded.
    fn questions_for_test(
        &self,
        test_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Question>>> + Send;

    /// Missing when the owning test has been soft-deleted.
    fn find_question(&self, id: Uuid) -> impl Future<Output = Result<Option<Question>>> + Send;

    /// Appends `question` to its test (`order = max + 1`) once `guard`
    /// accepts the locked test.
    fn insert_question<F>(
        &self,
        question: Question,
        guard: F,
    ) -> impl Future<Output = Result<Question>> + Send
    where
        F: FnOnce(&SkillTest) -> Result<()> + Send;

    /// Locks the owning test, lets `apply` edit the question, then replaces
    /// the stored question including its options or text config.
    fn modify_question<F>(
        &self,
        id: Uuid,
        apply: F,
    ) -> impl Future<Output = Result<Question>> + Send
    where
        F: FnOnce(&SkillTest, &mut Question) -> Result<()> + Send;

    /// Deletes the question with its options or text config. `Ok(false)`
    /// when it does not exist.
    fn delete_question<F>(&self, id: Uuid, guard: F) -> impl Future<Output = Result<bool>> + Send
    where
        F: FnOnce(&SkillTest) -> Result<()> + Send;

    /// Reads every question of the test, asks `plan` for the new sequence and
    /// writes order values 1..N in one go.
    fn renumber_questions<F>(
        &self,
        test_id: Uuid,
        plan: F,
    ) -> impl Future<Output = Result<Vec<Question>>> + Send
    where
        F: FnOnce(&SkillTest, &[Question]) -> Result<Vec<Uuid>> + Send;
}
