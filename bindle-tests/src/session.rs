use crate::silent_logs;
use bindle::{Driver, Session, StatementError, binds};
use indoc::indoc;
use std::sync::Arc;

pub fn one_shot<D: Driver>(session: &Arc<Session<D>>) {
    let before = session.open_statements().len();
    let query = indoc! {"
        SELECT ?
        FROM one_shot
    "};
    let result = session
        .execute(query, binds![42])
        .expect("Could not run the one shot query");
    assert_eq!(session.last_query().as_deref(), Some(query));
    assert!(
        !result
            .fetch_all()
            .expect("Could not fetch the rows")
            .is_empty()
    );
    session
        .execute_modification("UPDATE one_shot SET value = ?", binds![1])
        .expect("Could not run the one shot modification");
    assert_eq!(session.open_statements().len(), before);
}

pub fn disconnect<D: Driver>(session: &Arc<Session<D>>) {
    let first = session
        .prepare("SELECT 1")
        .expect("Could not prepare the statement");
    let second = session
        .prepare("SELECT 2")
        .expect("Could not prepare the statement");
    assert!(session.is_connected());
    session.disconnect().expect("Could not disconnect");
    assert!(!session.is_connected());
    assert!(first.is_finished());
    assert!(second.is_finished());
    assert!(session.open_statements().is_empty());
    session.disconnect().expect("A second disconnect must do nothing");
    silent_logs! {
        let error = session
            .prepare("SELECT 3")
            .expect_err("A disconnected session must not prepare");
        assert!(matches!(
            StatementError::of(&error),
            Some(StatementError::Disconnected)
        ));
    }
}
