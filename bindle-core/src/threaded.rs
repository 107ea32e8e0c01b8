use crate::StatementId;
use std::{cell::RefCell, collections::HashMap, marker::PhantomData};

thread_local! {
    static REWINDABLE_OVERRIDES: RefCell<HashMap<StatementId, bool>> = RefCell::new(HashMap::new());
}

pub(crate) fn rewindable_override(id: StatementId) -> Option<bool> {
    REWINDABLE_OVERRIDES.with(|overrides| overrides.borrow().get(&id).copied())
}

/// Scoped per-thread override of a statement `rewindable_result` flag.
///
/// While alive, executions started on this thread use the overridden value,
/// other threads keep seeing the statement setting. Dropping the guard
/// restores whatever was in effect before. The guard cannot leave the thread.
#[must_use = "the override ends when the guard is dropped"]
pub struct RewindableOverride {
    id: StatementId,
    previous: Option<bool>,
    _not_send: PhantomData<*const ()>,
}

impl RewindableOverride {
    pub(crate) fn new(id: StatementId, value: bool) -> Self {
        let previous =
            REWINDABLE_OVERRIDES.with(|overrides| overrides.borrow_mut().insert(id, value));
        Self {
            id,
            previous,
            _not_send: PhantomData,
        }
    }
}

impl Drop for RewindableOverride {
    fn drop(&mut self) {
        // try_with: the guard may outlive the table during thread teardown
        let _ = REWINDABLE_OVERRIDES.try_with(|overrides| {
            let mut overrides = overrides.borrow_mut();
            match self.previous {
                Some(previous) => overrides.insert(self.id, previous),
                None => overrides.remove(&self.id),
            };
        });
    }
}
