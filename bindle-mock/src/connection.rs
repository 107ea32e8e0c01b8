use crate::MockPrepared;
use bindle_core::{Binds, Connection, Error, Result, Row, Schema, StatementError};
use parking_lot::{Mutex, RwLock};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockCallKind {
    Execution,
    Modification,
    Finish,
}

/// One call that reached the mock driver.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub kind: MockCallKind,
    pub query: String,
    /// Binds as the driver received them, after the input conversion.
    pub binds: Binds,
}

/// Rows returned by every execution of a stubbed query.
#[derive(Debug, Clone, Default)]
pub struct MockRows {
    pub schema: Schema,
    pub rows: Vec<Row>,
}

#[derive(Default)]
pub(crate) struct MockState {
    pub(crate) delay: Option<Duration>,
    calls: Mutex<Vec<MockCall>>,
    stubs: RwLock<HashMap<String, MockRows>>,
    failures: RwLock<HashMap<String, String>>,
}

impl MockState {
    pub(crate) fn record(&self, kind: MockCallKind, query: &str, binds: &Binds) {
        self.calls.lock().push(MockCall {
            kind,
            query: query.to_owned(),
            binds: binds.clone(),
        });
    }

    pub(crate) fn stubbed(&self, query: &str) -> Option<MockRows> {
        self.stubs.read().get(query).cloned()
    }

    pub(crate) fn failure(&self, query: &str) -> Option<Error> {
        self.failures.read().get(query).map(|m| Error::msg(m.clone()))
    }

    pub(crate) fn wait(&self) {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
    }
}

/// Connection of a mock session.
///
/// Holds no data: executions echo their binds unless rows were stubbed for the
/// query. Every call is recorded and can be inspected with [`MockConnection::calls`].
pub struct MockConnection {
    name: String,
    state: Arc<MockState>,
    disconnected: AtomicBool,
}

impl MockConnection {
    pub fn new(name: impl Into<String>, delay: Option<Duration>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(MockState {
                delay,
                ..Default::default()
            }),
            disconnected: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn delay(&self) -> Option<Duration> {
        self.state.delay
    }

    /// Return `rows` from every execution of `query`.
    pub fn stub(
        &self,
        query: impl Into<String>,
        schema: Schema,
        rows: impl IntoIterator<Item = Row>,
    ) {
        self.state.stubs.write().insert(
            query.into(),
            MockRows {
                schema,
                rows: rows.into_iter().collect(),
            },
        );
    }

    /// Make every execution and modification of `query` fail with `message`.
    pub fn fail(&self, query: impl Into<String>, message: impl Into<String>) {
        self.state
            .failures
            .write()
            .insert(query.into(), message.into());
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.state.calls.lock().clear();
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::Acquire)
    }
}

impl Connection for MockConnection {
    type Prepared = MockPrepared;

    fn new_prepared(&self, query: &str) -> MockPrepared {
        MockPrepared::new(query, self.state.clone())
    }

    fn ping(&self) -> Result<u64> {
        if self.is_disconnected() {
            return Err(StatementError::Disconnected.into());
        }
        self.state.wait();
        Ok(10)
    }

    fn disconnect(&self) -> Result<()> {
        self.disconnected.store(true, Ordering::Release);
        log::debug!("Mock connection `{}` closed", self.name);
        Ok(())
    }
}
