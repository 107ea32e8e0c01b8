use crate::silent_logs;
use bindle::{Driver, Session, StatementError, binds};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

pub fn lifecycle<D: Driver>(session: &Arc<Session<D>>) {
    let statement = session
        .prepare("SELECT ?")
        .expect("Could not prepare the statement");
    let id = statement.id();
    assert!(!statement.is_finished());
    assert!(session.open_statements().contains(id));
    assert_eq!(statement.query(), "SELECT ?");
    assert!(Arc::ptr_eq(
        &statement.session().expect("Missing session"),
        session
    ));

    // Execute any number of times
    for i in 0..3 {
        let result = statement
            .execute(binds![i])
            .expect("Could not execute the statement");
        assert_eq!(result.statement_id(), id);
        assert!(
            result
                .fetch_all()
                .expect("Could not fetch the rows")
                .len()
                > 0
        );
    }
    assert!(statement.last_result().is_some());

    // Finish
    statement.finish();
    assert!(statement.is_finished());
    assert!(!session.open_statements().contains(id));
    statement.finish();
    assert!(statement.is_finished());

    silent_logs! {
        let error = statement
            .execute(binds![5])
            .expect_err("A finished statement must not execute");
        assert!(matches!(
            StatementError::of(&error),
            Some(StatementError::LifecycleViolation { .. })
        ));
        let error = statement
            .execute_modification(binds![5])
            .expect_err("A finished statement must not execute");
        assert!(matches!(
            StatementError::of(&error),
            Some(StatementError::LifecycleViolation { .. })
        ));
    }
}

pub fn finalizer<D: Driver>(session: &Arc<Session<D>>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let statement = session
        .prepare("SELECT 1")
        .expect("Could not prepare the statement");
    {
        let calls = calls.clone();
        statement.set_finalizer(move || {
            calls.fetch_add(1, Ordering::SeqCst);
        });
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    statement.finish();
    statement.finish();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Late registration runs immediately
    {
        let calls = calls.clone();
        statement.set_finalizer(move || {
            calls.fetch_add(1, Ordering::SeqCst);
        });
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

pub fn reclamation<D: Driver>(session: &Arc<Session<D>>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let before = session.open_statements().len();
    let statement = session
        .prepare("SELECT 1")
        .expect("Could not prepare the statement");
    let id = statement.id();
    {
        let calls = calls.clone();
        statement.set_finalizer(move || {
            calls.fetch_add(1, Ordering::SeqCst);
        });
    }
    assert_eq!(session.open_statements().len(), before + 1);
    silent_logs! {
        drop(statement);
    }
    assert!(!session.open_statements().contains(id));
    assert_eq!(session.open_statements().len(), before);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
