use crate::silent_logs;
use bindle::{BindKey, Driver, Session, StatementError, Value, binds, named_binds};
use std::sync::Arc;

pub fn binding<D: Driver>(session: &Arc<Session<D>>) {
    let statement = session
        .prepare("SELECT ?, ?, ?")
        .expect("Could not prepare the statement");

    // Positional binds keep order and arity
    let result = statement
        .execute(binds![1, "two", None::<i64>])
        .expect("Could not execute with positional binds");
    let binds = result.binds();
    assert!(!binds.is_named());
    assert_eq!(binds.len(), 3);
    assert_eq!(binds.get(0), Some(&Value::Int32(Some(1))));
    assert_eq!(binds.get(1), Some(&Value::Varchar(Some("two".into()))));
    assert!(binds.get(2).is_some_and(Value::is_null));

    // Named binds keep their keys
    let result = statement
        .execute(named_binds! { "alpha" => 1.5f64, "bravo" => true })
        .expect("Could not execute with named binds");
    let binds = result.binds();
    assert!(binds.is_named());
    assert_eq!(binds.get_named("alpha"), Some(&Value::Float64(Some(1.5))));
    assert_eq!(binds.get_named("bravo"), Some(&Value::Boolean(Some(true))));

    // Failures name the parameter and leave the statement usable
    silent_logs! {
        let error = statement
            .execute(binds![1, f64::INFINITY, 3])
            .expect_err("Infinity cannot be bound");
        match StatementError::of(&error) {
            Some(StatementError::ConversionFailure { parameter, .. }) => {
                assert_eq!(*parameter, BindKey::Index(1));
            }
            _ => panic!("Expected a conversion failure, got: {error:#}"),
        }
        let error = statement
            .execute(named_binds! { "charlie" => "nul\0char" })
            .expect_err("NUL characters cannot be bound");
        match StatementError::of(&error) {
            Some(StatementError::ConversionFailure { parameter, .. }) => {
                assert_eq!(*parameter, BindKey::Name("charlie".into()));
            }
            _ => panic!("Expected a conversion failure, got: {error:#}"),
        }
    }
    assert!(!statement.is_finished());
    statement
        .execute(binds![1, 2, 3])
        .expect("The statement must survive a conversion failure");
    statement.finish();
}
