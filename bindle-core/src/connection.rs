use crate::{Prepared, Result, StatementError};

/// Driver side of a session.
pub trait Connection: Send + Sync + 'static {
    type Prepared: Prepared;

    /// Create the driver state of a new statement.
    ///
    /// Called while the statement is being constructed: it must not perform
    /// any I/O. Drivers that need a server round trip to prepare do it lazily
    /// on the first execution.
    fn new_prepared(&self, query: &str) -> Self::Prepared;

    /// Check the connection is alive.
    fn ping(&self) -> Result<u64> {
        Err(StatementError::unimplemented::<Self>("ping"))
    }

    /// Release the connection. Open statements are finished before this is called.
    fn disconnect(&self) -> Result<()> {
        Ok(())
    }
}
