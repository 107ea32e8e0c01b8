use crate::{
    Binds, ConnectOptions, Connection, Driver, Result, ResultSet, RowsAffected, Statement,
    StatementError, StatementRegistry, truncate_long,
};
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Session handle: one connection of a driver and the statements prepared on it.
///
/// Statements keep a weak back-reference to their session, the session keeps
/// a weak index of its statements. Neither keeps the other alive.
pub struct Session<D: Driver> {
    driver: D,
    connection: D::Connection,
    options: ConnectOptions,
    open_statements: StatementRegistry<D>,
    rewindable_result: AtomicBool,
    connected: AtomicBool,
    last_query: Mutex<Option<Arc<str>>>,
}

impl<D: Driver> Session<D> {
    pub fn new(driver: D, connection: D::Connection, options: ConnectOptions) -> Arc<Self> {
        Arc::new(Self {
            driver,
            connection,
            rewindable_result: AtomicBool::new(options.rewindable_result()),
            options,
            open_statements: StatementRegistry::new(),
            connected: AtomicBool::new(true),
            last_query: Mutex::new(None),
        })
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn connection(&self) -> &D::Connection {
        &self.connection
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    pub fn open_statements(&self) -> &StatementRegistry<D> {
        &self.open_statements
    }

    /// Default `rewindable_result` of the statements prepared from now on.
    pub fn rewindable_result(&self) -> bool {
        self.rewindable_result.load(Ordering::Acquire)
    }

    pub fn set_rewindable_result(&self, value: bool) {
        self.rewindable_result.store(value, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Query of the most recent `prepare`.
    pub fn last_query(&self) -> Option<Arc<str>> {
        self.last_query.lock().clone()
    }

    /// Create a statement for `query`. No I/O happens until it is executed.
    pub fn prepare(self: &Arc<Self>, query: impl Into<Arc<str>>) -> Result<Arc<Statement<D>>> {
        if !self.is_connected() {
            return Err(StatementError::Disconnected.into());
        }
        let query = query.into();
        *self.last_query.lock() = Some(query.clone());
        let statement = Statement::new(query, self);
        // A disconnect that started after the first check may have missed the registration
        if !self.is_connected() {
            statement.finish();
            return Err(StatementError::Disconnected.into());
        }
        log::debug!(
            "Prepared statement {} on {}: {}",
            statement.id(),
            D::NAME,
            truncate_long(statement.query())
        );
        Ok(statement)
    }

    /// Prepare `query`, execute it once and finish the statement.
    ///
    /// The returned result stays readable: cursors own their rows.
    pub fn execute(
        self: &Arc<Self>,
        query: impl Into<Arc<str>>,
        binds: impl Into<Binds>,
    ) -> Result<Arc<ResultSet<D>>> {
        let statement = self.prepare(query)?;
        let result = statement.execute(binds);
        statement.finish();
        result
    }

    /// Prepare `query`, run it once as a modification and finish the statement.
    pub fn execute_modification(
        self: &Arc<Self>,
        query: impl Into<Arc<str>>,
        binds: impl Into<Binds>,
    ) -> Result<RowsAffected> {
        let statement = self.prepare(query)?;
        let result = statement.execute_modification(binds);
        statement.finish();
        result
    }

    pub fn ping(&self) -> Result<u64> {
        if !self.is_connected() {
            return Err(StatementError::Disconnected.into());
        }
        self.connection.ping()
    }

    /// Finish every open statement and release the connection.
    ///
    /// Calling it again does nothing.
    pub fn disconnect(&self) -> Result<()> {
        if !self.connected.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        let statements = self.open_statements.live();
        if !statements.is_empty() {
            log::debug!(
                "Finishing {} open statements before disconnecting from {}",
                statements.len(),
                D::NAME
            );
        }
        for statement in statements {
            statement.finish();
        }
        self.connection.disconnect()
    }
}

impl<D: Driver> Drop for Session<D> {
    fn drop(&mut self) {
        if let Err(e) = self.disconnect() {
            log::error!("{:#}", e.context(format!("While disconnecting from {}", D::NAME)));
        }
    }
}
