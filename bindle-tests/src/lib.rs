mod binding;
mod concurrency;
mod lifecycle;
mod rewindable;
mod session;

use crate::{
    binding::binding,
    concurrency::{concurrent_statements, serialized_statement},
    lifecycle::{finalizer, lifecycle, reclamation},
    rewindable::rewindable,
    session::{disconnect, one_shot},
};
use bindle::{Driver, Session};
use log::LevelFilter;
use std::{env, sync::Arc};

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Run the statement contract checks against `session`.
///
/// The driver must accept any query text and answer executions with at least
/// one row. The session is disconnected at the end.
pub fn execute_tests<D: Driver>(session: Arc<Session<D>>) {
    lifecycle(&session);
    finalizer(&session);
    reclamation(&session);
    binding(&session);
    rewindable(&session);
    serialized_statement(&session);
    concurrent_statements(&session);
    one_shot(&session);
    disconnect(&session);
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
