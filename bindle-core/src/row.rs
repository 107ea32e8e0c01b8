use crate::{AsValue, Error, Result, Value};
use std::sync::Arc;

/// Outcome of a modification.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAffected {
    pub rows_affected: u64,
    /// Identifier of the last row touched, for drivers that report one.
    pub last_affected_id: Option<i64>,
}

impl RowsAffected {
    pub fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            last_affected_id: None,
        }
    }

    pub fn with_last_affected_id(mut self, id: i64) -> Self {
        self.last_affected_id = Some(id);
        self
    }
}

impl Extend<RowsAffected> for RowsAffected {
    fn extend<T: IntoIterator<Item = RowsAffected>>(&mut self, iter: T) {
        for other in iter {
            self.rows_affected += other.rows_affected;
            self.last_affected_id = other.last_affected_id.or(self.last_affected_id);
        }
    }
}

/// Column labels, shared by every row of a result.
pub type RowNames = Arc<[String]>;
/// Cells of a row, in column order.
pub type Row = Box<[Value]>;

/// A fetched row together with its column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    pub labels: RowNames,
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }

    pub fn names(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get_column(&self, name: &str) -> Option<&Value> {
        let index = self.labels.iter().position(|label| label == name)?;
        self.values.get(index)
    }

    /// Typed value of the column `name`.
    pub fn get<T: AsValue>(&self, name: &str) -> Result<T> {
        let value = self
            .get_column(name)
            .ok_or_else(|| Error::msg(format!("The row has no column named `{name}`")))?;
        T::try_from_value(value.clone())
    }
}

impl From<RowLabeled> for Row {
    fn from(row: RowLabeled) -> Self {
        row.values
    }
}
