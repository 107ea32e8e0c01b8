use crate::{Error, StatementId};
use std::{
    any,
    fmt::{self, Display, Formatter},
};

/// Position of a bind parameter: index for positional binds, key for named ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindKey {
    Index(usize),
    Name(String),
}

impl Display for BindKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BindKey::Index(i) => write!(f, "#{i}"),
            BindKey::Name(name) => write!(f, "`{name}`"),
        }
    }
}

/// Failures raised by the statement layer itself.
///
/// They travel inside [`crate::Error`] like every other error, use
/// `error.downcast_ref::<StatementError>()` to tell them apart from driver errors.
#[derive(Debug, thiserror::Error)]
pub enum StatementError {
    #[error("Statement {statement} is finished and cannot be used (query: `{query}`)")]
    LifecycleViolation { statement: StatementId, query: String },
    #[error("Cannot convert bind parameter {parameter} with value {value}: {reason}")]
    ConversionFailure {
        parameter: BindKey,
        value: String,
        reason: String,
    },
    #[error("`{operation}` is not implemented by {component}")]
    UnimplementedDriverOperation {
        component: &'static str,
        operation: &'static str,
    },
    #[error("The session is disconnected")]
    Disconnected,
}

impl StatementError {
    /// Error returned by the default implementation of a driver extension point.
    pub fn unimplemented<T: ?Sized>(operation: &'static str) -> Error {
        StatementError::UnimplementedDriverOperation {
            component: any::type_name::<T>(),
            operation,
        }
        .into()
    }

    /// The statement error carried by `error`, if any.
    pub fn of(error: &Error) -> Option<&StatementError> {
        error.downcast_ref::<StatementError>()
    }
}
