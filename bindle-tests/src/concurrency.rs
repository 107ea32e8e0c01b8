use bindle::{Driver, Session, binds};
use std::{collections::BTreeSet, sync::Arc, thread};

/// Many threads sharing one statement.
pub fn serialized_statement<D: Driver>(session: &Arc<Session<D>>) {
    let statement = session
        .prepare("SELECT ?")
        .expect("Could not prepare the statement");
    thread::scope(|s| {
        for i in 0..8 {
            let statement = &statement;
            s.spawn(move || {
                let result = statement
                    .execute(binds![i])
                    .expect("Could not execute the shared statement");
                assert_eq!(result.binds().len(), 1);
            });
        }
    });
    assert!(statement.last_result().is_some());
    statement.finish();
}

/// Statements prepared, executed and finished from many threads at once.
pub fn concurrent_statements<D: Driver>(session: &Arc<Session<D>>) {
    let before = session.open_statements().len();
    let ids = thread::scope(|s| {
        let handles = (0..8)
            .map(|i| {
                s.spawn(move || {
                    let statement = session
                        .prepare(format!("SELECT {i}"))
                        .expect("Could not prepare the statement");
                    statement
                        .execute(())
                        .expect("Could not execute the statement");
                    statement.finish();
                    statement.id()
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|h| h.join().expect("A statement thread panicked"))
            .collect::<BTreeSet<_>>()
    });
    assert_eq!(ids.len(), 8);
    assert_eq!(session.open_statements().len(), before);
}
