use crate::MockConnection;
use bindle_core::{ConnectOptions, Driver, Result};
use std::time::Duration;

/// Driver of in memory mock sessions: `mock://[name]?delay_ms=N&rewindable_result=B`.
#[derive(Clone, Copy, Default)]
pub struct MockDriver;
impl MockDriver {
    pub const fn new() -> Self {
        Self
    }
}

impl Driver for MockDriver {
    type Connection = MockConnection;
    const NAME: &'static str = "mock";

    fn connect(&self, options: &ConnectOptions) -> Result<MockConnection> {
        let delay = options
            .param_as::<u64>("delay_ms")?
            .filter(|v| *v > 0)
            .map(Duration::from_millis);
        Ok(MockConnection::new(options.name(), delay))
    }
}
