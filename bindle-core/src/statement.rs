use crate::{
    Binds, Connection, Driver, Execution, Prepared, Result, ResultSet, RewindableOverride,
    RowsAffected, Session, StatementError, StatementId, TypeMap, rewindable_override,
    truncate_long,
};
use parking_lot::Mutex;
use std::{
    fmt::{self, Debug, Formatter},
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, Ordering},
    },
};

/// Driver state type of the statements of `D`.
pub type PreparedOf<D> = <<D as Driver>::Connection as Connection>::Prepared;

type Finalizer = Box<dyn FnOnce() + Send>;

/// A query bound to a session, executable any number of times until finished.
///
/// Executions of the same statement are serialized, distinct statements run
/// independently. Every execution first converts its binds through the input
/// type map of the driver.
pub struct Statement<D: Driver> {
    id: StatementId,
    query: Arc<str>,
    session: Weak<Session<D>>,
    this: Weak<Statement<D>>,
    prepared: Mutex<PreparedOf<D>>,
    input_type_map: Arc<TypeMap>,
    rewindable_result: AtomicBool,
    finished: AtomicBool,
    last_result: Mutex<Option<Arc<ResultSet<D>>>>,
    finalizer: Mutex<Option<Finalizer>>,
}

impl<D: Driver> Statement<D> {
    pub(crate) fn new(query: Arc<str>, session: &Arc<Session<D>>) -> Arc<Self> {
        let prepared = session.connection().new_prepared(&query);
        let statement = Arc::new_cyclic(|this| Self {
            id: StatementId::next(),
            query,
            session: Arc::downgrade(session),
            this: this.clone(),
            prepared: Mutex::new(prepared),
            input_type_map: TypeMap::resolve::<PreparedOf<D>>(),
            rewindable_result: AtomicBool::new(session.rewindable_result()),
            finished: AtomicBool::new(false),
            last_result: Mutex::new(None),
            finalizer: Mutex::new(None),
        });
        session
            .open_statements()
            .insert(statement.id, Arc::downgrade(&statement));
        statement
    }

    pub fn id(&self) -> StatementId {
        self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// The owning session, `None` once it was dropped.
    pub fn session(&self) -> Option<Arc<Session<D>>> {
        self.session.upgrade()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Whether the results of this statement can be rewound.
    ///
    /// An override installed on the current thread wins over the statement setting.
    pub fn rewindable_result(&self) -> bool {
        rewindable_override(self.id)
            .unwrap_or_else(|| self.rewindable_result.load(Ordering::Acquire))
    }

    pub fn set_rewindable_result(&self, value: bool) {
        self.rewindable_result.store(value, Ordering::Release);
    }

    /// Use `value` as `rewindable_result` on this thread until the guard drops.
    pub fn override_rewindable_result(&self, value: bool) -> RewindableOverride {
        RewindableOverride::new(self.id, value)
    }

    pub fn input_type_map(&self) -> &Arc<TypeMap> {
        &self.input_type_map
    }

    /// Result of the most recent successful `execute`.
    pub fn last_result(&self) -> Option<Arc<ResultSet<D>>> {
        self.last_result.lock().clone()
    }

    /// Register a callback to run when the statement is finished.
    ///
    /// Replaces the pending one. When the statement is already finished the
    /// callback runs right away.
    pub fn set_finalizer(&self, finalizer: impl FnOnce() + Send + 'static) {
        let mut slot = self.finalizer.lock();
        if self.is_finished() {
            drop(slot);
            finalizer();
        } else {
            *slot = Some(Box::new(finalizer));
        }
    }

    /// Execute the query with `binds` and return its rows.
    pub fn execute(&self, binds: impl Into<Binds>) -> Result<Arc<ResultSet<D>>> {
        let binds = self.pre_execute(binds.into())?;
        let mut prepared = self.prepared.lock();
        self.ensure_live()?;
        let Execution {
            mut cursor,
            schema,
            type_map,
        } = prepared.new_execution(&binds).map_err(|e| {
            log::error!(
                "While executing statement {} on {}: {}\n{:#}",
                self.id,
                D::NAME,
                truncate_long(&self.query),
                e
            );
            e
        })?;
        cursor.set_rewindable_result(self.rewindable_result());
        let result = Arc::new(ResultSet::new(
            self.this.clone(),
            self.id,
            binds,
            cursor,
            schema,
            type_map,
        ));
        *self.last_result.lock() = Some(result.clone());
        Ok(result)
    }

    /// Execute the query with `binds` as a data modification.
    pub fn execute_modification(&self, binds: impl Into<Binds>) -> Result<RowsAffected> {
        let binds = self.pre_execute(binds.into())?;
        let mut prepared = self.prepared.lock();
        self.ensure_live()?;
        prepared.new_modification(&binds).map_err(|e| {
            log::error!(
                "While executing modification {} on {}: {}\n{:#}",
                self.id,
                D::NAME,
                truncate_long(&self.query),
                e
            );
            e
        })
    }

    /// Release the statement. Safe to call any number of times, from any thread.
    ///
    /// Runs the finalizer, leaves the session registry, then waits for an
    /// execution in flight before letting the driver release its state.
    pub fn finish(&self) {
        let finalizer = {
            let mut slot = self.finalizer.lock();
            if self.finished.swap(true, Ordering::AcqRel) {
                return;
            }
            slot.take()
        };
        if let Some(finalizer) = finalizer {
            finalizer();
        }
        if let Some(session) = self.session.upgrade() {
            session.open_statements().remove(self.id);
        }
        if let Err(e) = self.prepared.lock().finish() {
            log::error!(
                "{:#}",
                e.context(format!("While finishing statement {} on {}", self.id, D::NAME))
            );
        }
        log::debug!("Finished statement {}", self.id);
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_finished() {
            return Err(StatementError::LifecycleViolation {
                statement: self.id,
                query: truncate_long(&self.query).into_owned(),
            }
            .into());
        }
        Ok(())
    }

    fn pre_execute(&self, binds: Binds) -> Result<Binds> {
        self.ensure_live()?;
        log::debug!(
            "Executing statement {} on {} with {} binds",
            self.id,
            D::NAME,
            binds.len()
        );
        binds.convert(&self.input_type_map).map_err(|e| {
            log::error!("{:#}", e);
            e
        })
    }
}

impl<D: Driver> Debug for Statement<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("id", &self.id)
            .field("driver", &D::NAME)
            .field("query", &truncate_long(&self.query))
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl<D: Driver> Drop for Statement<D> {
    fn drop(&mut self) {
        if !self.is_finished() {
            log::warn!(
                "Statement {} was dropped without being finished: {}",
                self.id,
                truncate_long(&self.query)
            );
            self.finish();
        }
    }
}
