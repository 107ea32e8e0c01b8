use crate::{Error, Result, Row};

/// Rows produced by an execution, handed out one at a time.
///
/// A rewindable cursor can go back to its first row, at the cost of keeping
/// every row around. The flag is set by the statement before the cursor
/// reaches the caller.
pub trait Cursor: Send {
    fn next_row(&mut self) -> Option<Result<Row>>;
    fn rewindable_result(&self) -> bool;
    fn set_rewindable_result(&mut self, value: bool);
    /// Restart from the first row. Fails unless the cursor is rewindable.
    fn rewind(&mut self) -> Result<()>;
    /// Release the rows. Further calls to `next_row` return `None`.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Cursor over rows already held in memory.
#[derive(Debug, Default)]
pub struct MemoryCursor {
    rows: Vec<Row>,
    position: usize,
    rewindable: bool,
}

impl MemoryCursor {
    pub fn new(rows: impl IntoIterator<Item = Row>) -> Self {
        Self {
            rows: rows.into_iter().collect(),
            position: 0,
            rewindable: false,
        }
    }

    /// Rows not yet returned.
    pub fn remaining(&self) -> usize {
        self.rows.len() - self.position
    }
}

impl Cursor for MemoryCursor {
    fn next_row(&mut self) -> Option<Result<Row>> {
        let row = self.rows.get_mut(self.position)?;
        self.position += 1;
        Some(Ok(if self.rewindable {
            row.clone()
        } else {
            std::mem::take(row)
        }))
    }

    fn rewindable_result(&self) -> bool {
        self.rewindable
    }

    fn set_rewindable_result(&mut self, value: bool) {
        self.rewindable = value;
    }

    fn rewind(&mut self) -> Result<()> {
        if !self.rewindable {
            return Err(Error::msg(
                "Cannot rewind a result that was not requested as rewindable",
            ));
        }
        self.position = 0;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.rows.clear();
        self.position = 0;
        Ok(())
    }
}
