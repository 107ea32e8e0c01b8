use crate::{MockCallKind, MockRows, connection::MockState};
use bindle_core::{
    BindKey, Binds, ColumnDef, Execution, MemoryCursor, Prepared, Result, Row, RowsAffected,
    Schema, TypeMap, Value, ValueCategory,
};
use std::{
    fmt::{self, Display, Formatter},
    sync::Arc,
};

pub struct MockPrepared {
    query: String,
    state: Arc<MockState>,
    executions: u64,
}

impl MockPrepared {
    pub(crate) fn new(query: &str, state: Arc<MockState>) -> Self {
        Self {
            query: query.to_owned(),
            state,
            executions: 0,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Executions and modifications run so far.
    pub fn executions(&self) -> u64 {
        self.executions
    }

    fn call(&mut self, kind: MockCallKind, binds: &Binds) -> Result<()> {
        self.state.wait();
        self.state.record(kind, &self.query, binds);
        self.executions += 1;
        match self.state.failure(&self.query) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// One row holding the binds, columns named after their index or key.
fn echo(binds: &Binds) -> MockRows {
    let (columns, values): (Vec<_>, Vec<_>) = binds
        .iter()
        .map(|(key, value)| {
            let name = match key {
                BindKey::Index(i) => i.to_string(),
                BindKey::Name(name) => name,
            };
            (ColumnDef::new(name, value.clone()), value.clone())
        })
        .unzip();
    MockRows {
        schema: Schema::new(columns),
        rows: vec![Row::from(values)],
    }
}

impl Prepared for MockPrepared {
    fn input_type_map(map: &mut TypeMap) {
        map.register(ValueCategory::Uuid, |value| {
            Ok(match value {
                Value::Uuid(Some(v)) => Value::Varchar(Some(v.hyphenated().to_string())),
                v => v,
            })
        });
    }

    fn new_execution(&mut self, binds: &Binds) -> Result<Execution> {
        self.call(MockCallKind::Execution, binds)?;
        let MockRows { schema, rows } = self
            .state
            .stubbed(&self.query)
            .unwrap_or_else(|| echo(binds));
        Ok(Execution::new(MemoryCursor::new(rows), schema))
    }

    fn new_modification(&mut self, binds: &Binds) -> Result<RowsAffected> {
        self.call(MockCallKind::Modification, binds)?;
        Ok(RowsAffected::new(binds.len() as u64))
    }

    fn finish(&mut self) -> Result<()> {
        self.state
            .record(MockCallKind::Finish, &self.query, &Binds::default());
        Ok(())
    }
}

impl Display for MockPrepared {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "MockPrepared({})", self.query)
    }
}
