use bindle::{Driver, Session, binds};
use std::{sync::Arc, thread};

pub fn rewindable<D: Driver>(session: &Arc<Session<D>>) {
    let default = session.rewindable_result();
    let statement = session
        .prepare("SELECT ?")
        .expect("Could not prepare the statement");
    assert_eq!(statement.rewindable_result(), default);

    statement.set_rewindable_result(true);
    let result = statement
        .execute(binds![1])
        .expect("Could not execute the statement");
    assert!(result.rewindable_result());
    let first = result.fetch_all().expect("Could not fetch the rows");
    result.rewind().expect("Could not rewind the result");
    let second = result.fetch_all().expect("Could not fetch the rows again");
    assert_eq!(first, second);

    // Thread scoped override
    {
        let _guard = statement.override_rewindable_result(false);
        assert!(!statement.rewindable_result());
        thread::scope(|s| {
            s.spawn(|| assert!(statement.rewindable_result()));
        });
        let result = statement
            .execute(binds![2])
            .expect("Could not execute the statement");
        assert!(!result.rewindable_result());
        result.fetch_all().expect("Could not fetch the rows");
        assert!(result.rewind().is_err());
    }
    assert!(statement.rewindable_result());
    statement.finish();

    // Session default applies to new statements only
    session.set_rewindable_result(!default);
    let other = session
        .prepare("SELECT 2")
        .expect("Could not prepare the statement");
    assert_eq!(other.rewindable_result(), !default);
    session.set_rewindable_result(default);
    other.finish();
}
