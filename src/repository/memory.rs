use super::SkillTestRepository;
use crate::error::{Error, Result, DUPLICATE_NAME_MESSAGE};
use crate::models::question::Question;
use crate::models::skill_test::{SkillTest, TestStatus};
use crate::services::ordering::{apply_order, next_order};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Default)]
struct MemoryState {
    tests: HashMap<Uuid, SkillTest>,
    questions: HashMap<Uuid, Question>,
}

impl MemoryState {
    fn active_test(&self, id: Uuid) -> Result<SkillTest> {
        self.tests
            .get(&id)
            .filter(|t| !t.is_deleted())
            .cloned()
            .ok_or_else(|| Error::NotFound("Test not found".to_string()))
    }

    fn name_taken(&self, name: &str, exclude: Option<Uuid>) -> bool {
        self.tests
            .values()
            .any(|t| !t.is_deleted() && t.name == name && Some(t.id) != exclude)
    }

    fn ordered_questions(&self, test_id: Uuid) -> Vec<Question> {
        let mut questions: Vec<Question> = self
            .questions
            .values()
            .filter(|q| q.test_id == test_id)
            .cloned()
            .collect();
        questions.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        questions
    }
}

/// Process-local repository. The mutex plays the role of the transaction:
/// each call holds it from the first read to the last write.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SkillTestRepository for MemoryRepository {
    async fn name_in_use(&self, name: &str, exclude: Option<Uuid>) -> Result<bool> {
        let state = self.state.lock().await;
        Ok(state.name_taken(name, exclude))
    }

    async fn insert_test(&self, test: SkillTest) -> Result<SkillTest> {
        let mut state = self.state.lock().await;
        if state.name_taken(&test.name, None) {
            return Err(Error::validation(DUPLICATE_NAME_MESSAGE));
        }
        state.tests.insert(test.id, test.clone());
        Ok(test)
    }

    async fn find_test(&self, id: Uuid) -> Result<Option<SkillTest>> {
        let state = self.state.lock().await;
        Ok(state.tests.get(&id).filter(|t| !t.is_deleted()).cloned())
    }

    async fn tests_by_status(&self, status: TestStatus) -> Result<Vec<SkillTest>> {
        let state = self.state.lock().await;
        let mut tests: Vec<SkillTest> = state
            .tests
            .values()
            .filter(|t| !t.is_deleted() && t.status == status)
            .cloned()
            .collect();
        tests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.name.cmp(&b.name)));
        Ok(tests)
    }

    async fn modify_test<F>(&self, id: Uuid, apply: F) -> Result<SkillTest>
    where
        F: FnOnce(&mut SkillTest, &[Question]) -> Result<()> + Send,
    {
        let mut state = self.state.lock().await;
        let mut test = state.active_test(id)?;
        let questions = state.ordered_questions(id);
        apply(&mut test, &questions)?;
        if !test.is_deleted() && state.name_taken(&test.name, Some(id)) {
            return Err(Error::validation(DUPLICATE_NAME_MESSAGE));
        }
        state.tests.insert(id, test.clone());
        Ok(test)
    }

    async fn purge_test(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().await;
        let deleted = state.tests.get(&id).is_some_and(SkillTest::is_deleted);
        if !deleted {
            return Ok(false);
        }
        state.tests.remove(&id);
        state.questions.retain(|_, q| q.test_id != id);
        Ok(true)
    }

    async fn questions_for_test(&self, test_id: Uuid) -> Result<Vec<Question>> {
        let state = self.state.lock().await;
        Ok(state.ordered_questions(test_id))
    }

    async fn find_question(&self, id: Uuid) -> Result<Option<Question>> {
        let state = self.state.lock().await;
        Ok(state
            .questions
            .get(&id)
            .filter(|q| state.active_test(q.test_id).is_ok())
            .cloned())
    }

    async fn insert_question<F>(&self, mut question: Question, guard: F) -> Result<Question>
    where
        F: FnOnce(&SkillTest) -> Result<()> + Send,
    {
        let mut state = self.state.lock().await;
        let test = state.active_test(question.test_id)?;
        guard(&test)?;
        question.order = next_order(&state.ordered_questions(test.id));
        state.questions.insert(question.id, question.clone());
        Ok(question)
    }

    async fn modify_question<F>(&self, id: Uuid, apply: F) -> Result<Question>
    where
        F: FnOnce(&SkillTest, &mut Question) -> Result<()> + Send,
    {
        let mut state = self.state.lock().await;
        let current = state
            .questions
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound("Question not found".to_string()))?;
        let test = state.active_test(current.test_id)?;

        let mut updated = current.clone();
        apply(&test, &mut updated)?;
        // Identity and position are not editable through this path.
        updated.id = current.id;
        updated.test_id = current.test_id;
        updated.order = current.order;

        state.questions.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_question<F>(&self, id: Uuid, guard: F) -> Result<bool>
    where
        F: FnOnce(&SkillTest) -> Result<()> + Send,
    {
        let mut state = self.state.lock().await;
        let Some(test_id) = state.questions.get(&id).map(|q| q.test_id) else {
            return Ok(false);
        };
        let test = state.active_test(test_id)?;
        guard(&test)?;
        Ok(state.questions.remove(&id).is_some())
    }

    async fn renumber_questions<F>(&self, test_id: Uuid, plan: F) -> Result<Vec<Question>>
    where
        F: FnOnce(&SkillTest, &[Question]) -> Result<Vec<Uuid>> + Send,
    {
        let mut state = self.state.lock().await;
        let test = state.active_test(test_id)?;
        let mut questions = state.ordered_questions(test_id);
        let sequence = plan(&test, &questions)?;
        apply_order(&mut questions, &sequence);
        for question in &questions {
            state.questions.insert(question.id, question.clone());
        }
        Ok(questions)
    }
}
