use crate::{Binds, Cursor, Result, RowsAffected, Schema, StatementError, TypeMap};

/// What a driver hands back from [`Prepared::new_execution`].
pub struct Execution {
    /// Rows of the result.
    pub cursor: Box<dyn Cursor>,
    /// Shape of the rows.
    pub schema: Schema,
    /// Conversions applied to every fetched cell, by category.
    pub type_map: TypeMap,
}

impl Execution {
    pub fn new(cursor: impl Cursor + 'static, schema: Schema) -> Self {
        Self {
            cursor: Box::new(cursor),
            schema,
            type_map: TypeMap::new(),
        }
    }

    pub fn with_type_map(mut self, type_map: TypeMap) -> Self {
        self.type_map = type_map;
        self
    }
}

/// Driver state of a single statement: the extension point drivers implement.
///
/// The statement owns it behind its mutex, so every method runs with exclusive
/// access and at most one execution per statement is in flight. The lock is
/// not reentrant: calling back into the same statement from here deadlocks.
///
/// Binds arrive already converted through the statement input type map.
/// The default implementations of the two execution operations fail with
/// [`StatementError::UnimplementedDriverOperation`].
pub trait Prepared: Send + 'static {
    /// Add driver specific input conversions.
    ///
    /// Runs once per implementing type, the result is shared by every
    /// statement of that type. Must not prepare statements itself.
    fn input_type_map(map: &mut TypeMap)
    where
        Self: Sized,
    {
        let _ = map;
    }

    /// Run the query and return its rows.
    fn new_execution(&mut self, binds: &Binds) -> Result<Execution> {
        let _ = binds;
        Err(StatementError::unimplemented::<Self>("new_execution"))
    }

    /// Run a data modification and return what it affected.
    fn new_modification(&mut self, binds: &Binds) -> Result<RowsAffected> {
        let _ = binds;
        Err(StatementError::unimplemented::<Self>("new_modification"))
    }

    /// Release the driver resources of the statement. Called once, by `finish`.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
