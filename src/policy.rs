use crate::error::{Error, Result};
use crate::models::actor::{Actor, Role};
use crate::models::skill_test::SkillTest;

/// Who may author and manage skill tests. The services ask this before every
/// mutating call; lifecycle state is checked separately.
#[cfg_attr(test, mockall::automock)]
pub trait AuthoringPolicy: Send + Sync {
    /// May create new tests.
    fn can_author(&self, actor: &Actor) -> bool;

    /// May edit, publish, archive or delete this particular test.
    fn can_manage(&self, actor: &Actor, test: &SkillTest) -> bool;

    /// May permanently remove soft-deleted tests.
    fn can_purge(&self, actor: &Actor) -> bool;
}

/// Admins manage everything; HR staff manage the tests they created.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePolicy;

impl AuthoringPolicy for RolePolicy {
    fn can_author(&self, actor: &Actor) -> bool {
        matches!(actor.role, Role::Admin | Role::Hr)
    }

    fn can_manage(&self, actor: &Actor, test: &SkillTest) -> bool {
        match actor.role {
            Role::Admin => true,
            Role::Hr => test.created_by == actor.id,
            Role::Manager | Role::Employee => false,
        }
    }

    fn can_purge(&self, actor: &Actor) -> bool {
        actor.role == Role::Admin
    }
}

pub fn ensure_can_author(policy: &dyn AuthoringPolicy, actor: &Actor) -> Result<()> {
    if policy.can_author(actor) {
        Ok(())
    } else {
        Err(Error::Forbidden("You are not allowed to create skill tests.".to_string()))
    }
}

pub fn ensure_can_manage(policy: &dyn AuthoringPolicy, actor: &Actor, test: &SkillTest) -> Result<()> {
    if policy.can_manage(actor, test) {
        Ok(())
    } else {
        Err(Error::Forbidden("You are not allowed to manage this skill test.".to_string()))
    }
}
