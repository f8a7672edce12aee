use crate::error::{Error, Result};
use crate::models::question::Question;
use std::collections::HashSet;
use uuid::Uuid;

/// Decides the new sequence of question ids for a test.
///
/// Without `requested`, the current order is kept (ties broken by id) and
/// simply compacted. With it, every id must belong to the test; the listed
/// questions come first in the given sequence and any unlisted ones follow in
/// their previous relative order.
pub fn plan_order(current: &[Question], requested: Option<&[Uuid]>) -> Result<Vec<Uuid>> {
    let mut existing: Vec<&Question> = current.iter().collect();
    existing.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));

    let Some(requested) = requested else {
        return Ok(existing.into_iter().map(|q| q.id).collect());
    };

    let owned: HashSet<Uuid> = current.iter().map(|q| q.id).collect();
    let foreign: Vec<String> = requested
        .iter()
        .filter(|id| !owned.contains(*id))
        .map(Uuid::to_string)
        .collect();
    if !foreign.is_empty() {
        return Err(Error::Validation(format!(
            "Questions {} do not belong to this test.",
            foreign.join(", ")
        )));
    }

    let mut seen = HashSet::with_capacity(requested.len());
    if let Some(dup) = requested.iter().find(|id| !seen.insert(**id)) {
        return Err(Error::Validation(format!(
            "Question {} appears more than once in the requested order.",
            dup
        )));
    }

    let mut plan: Vec<Uuid> = requested.to_vec();
    plan.extend(existing.into_iter().map(|q| q.id).filter(|id| !seen.contains(id)));
    Ok(plan)
}

/// Applies `plan` to `questions`, numbering 1..N. Questions missing from the
/// plan keep their order value.
pub fn apply_order(questions: &mut [Question], plan: &[Uuid]) {
    for (idx, id) in plan.iter().enumerate() {
        if let Some(q) = questions.iter_mut().find(|q| q.id == *id) {
            q.order = (idx as i32) + 1;
        }
    }
    questions.sort_by_key(|q| q.order);
}

pub fn next_order(current: &[Question]) -> i32 {
    current.iter().map(|q| q.order).max().unwrap_or(0) + 1
}
