use crate::{Driver, Statement};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

/// Process unique identity of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatementId(u64);

impl StatementId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Display for StatementId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of the statements a session has open.
///
/// Holds weak references only: a statement nobody else references is dropped
/// (and finishes itself) even while it is listed here.
pub struct StatementRegistry<D: Driver> {
    statements: Mutex<HashMap<StatementId, Weak<Statement<D>>>>,
}

impl<D: Driver> StatementRegistry<D> {
    pub(crate) fn new() -> Self {
        Self {
            statements: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn insert(&self, id: StatementId, statement: Weak<Statement<D>>) {
        self.statements.lock().insert(id, statement);
    }

    pub(crate) fn remove(&self, id: StatementId) -> bool {
        self.statements.lock().remove(&id).is_some()
    }

    pub fn contains(&self, id: StatementId) -> bool {
        self.statements.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.statements.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.lock().is_empty()
    }

    pub fn ids(&self) -> Vec<StatementId> {
        let mut ids = self.statements.lock().keys().copied().collect::<Vec<_>>();
        ids.sort();
        ids
    }

    pub fn get(&self, id: StatementId) -> Option<Arc<Statement<D>>> {
        let statement = self.statements.lock().get(&id)?.upgrade();
        statement
    }

    /// Statements still alive, in creation order.
    ///
    /// The registry lock is released before returning. Dropping one of these
    /// handles can finish the statement, which removes it from the registry.
    pub fn live(&self) -> Vec<Arc<Statement<D>>> {
        let mut statements = {
            let entries = self.statements.lock();
            entries.values().filter_map(Weak::upgrade).collect::<Vec<_>>()
        };
        statements.sort_by_key(|s| s.id());
        statements
    }
}
