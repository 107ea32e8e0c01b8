use crate::{
    Binds, Cursor, Driver, Result, Row, RowLabeled, RowNames, Schema, Statement, StatementId,
    TypeMap,
};
use parking_lot::Mutex;
use std::{
    fmt::{self, Debug, Formatter},
    sync::{Arc, Weak},
};

/// Rows of one execution of a statement.
///
/// Owns its cursor, it stays readable after the statement is finished.
pub struct ResultSet<D: Driver> {
    statement: Weak<Statement<D>>,
    statement_id: StatementId,
    binds: Binds,
    cursor: Mutex<Box<dyn Cursor>>,
    schema: Schema,
    names: RowNames,
    type_map: TypeMap,
}

impl<D: Driver> ResultSet<D> {
    pub(crate) fn new(
        statement: Weak<Statement<D>>,
        statement_id: StatementId,
        binds: Binds,
        cursor: Box<dyn Cursor>,
        schema: Schema,
        type_map: TypeMap,
    ) -> Self {
        let names = schema.column_names().map(str::to_owned).collect();
        Self {
            statement,
            statement_id,
            binds,
            cursor: Mutex::new(cursor),
            schema,
            names,
            type_map,
        }
    }

    /// The statement that produced these rows, `None` once it was dropped.
    pub fn statement(&self) -> Option<Arc<Statement<D>>> {
        self.statement.upgrade()
    }

    pub fn statement_id(&self) -> StatementId {
        self.statement_id
    }

    /// Binds of the execution, after the input conversion.
    pub fn binds(&self) -> &Binds {
        &self.binds
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn type_map(&self) -> &TypeMap {
        &self.type_map
    }

    pub fn rewindable_result(&self) -> bool {
        self.cursor.lock().rewindable_result()
    }

    /// Next row, with the output type map applied to each cell.
    pub fn next_row(&self) -> Option<Result<RowLabeled>> {
        let row = self.cursor.lock().next_row()?;
        Some(row.and_then(|row| self.labeled(row)))
    }

    /// Every remaining row.
    pub fn fetch_all(&self) -> Result<Vec<RowLabeled>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row() {
            rows.push(row?);
        }
        Ok(rows)
    }

    /// Go back to the first row. Only rewindable results support it.
    pub fn rewind(&self) -> Result<()> {
        self.cursor.lock().rewind()
    }

    /// Release the rows still held by the cursor.
    pub fn finish(&self) -> Result<()> {
        self.cursor.lock().finish()
    }

    fn labeled(&self, row: Row) -> Result<RowLabeled> {
        let values = row
            .into_vec()
            .into_iter()
            .map(|v| self.type_map.convert(v))
            .collect::<Result<Row>>()?;
        let names = if self.names.len() == values.len() {
            self.names.clone()
        } else {
            (0..values.len()).map(|i| i.to_string()).collect()
        };
        Ok(RowLabeled::new(names, values))
    }
}

impl<D: Driver> Debug for ResultSet<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSet")
            .field("statement", &self.statement_id)
            .field("binds", &self.binds)
            .field("schema", &self.schema)
            .field("type_map", &self.type_map)
            .finish()
    }
}
