//! Rejected actions leave no trace

use super::test_utils::{ask, current, reply, scheduler, unlock};
use quilt::{HypertextError, SchedulerError};

#[test]
fn test_asking_an_ancestor_question_is_an_infinite_loop() {
    let mut scheduler = scheduler();
    let mut session = scheduler.open_session("Root?").unwrap();
    session.act(ask("Sub?")).unwrap();
    session.act(unlock("$a1")).unwrap();
    let before = current(&session);
    let pages = session.db().len();

    let err = session.act(ask("Root?")).unwrap_err();
    assert_eq!(err, SchedulerError::InfiniteLoop("Root?".to_string()));
    assert!(!err.is_fatal());
    assert_eq!(current(&session), before);
    assert_eq!(session.db().len(), pages);

    assert!(matches!(
        session.act(ask("Sub?")),
        Err(SchedulerError::InfiniteLoop(_))
    ));

    // Still usable afterwards.
    session.act(reply("fine")).unwrap();
    assert!(current(&session).contains("[$a1: fine]"));
}

#[test]
fn test_unknown_pointer_inserts_nothing() {
    let mut scheduler = scheduler();
    let mut session = scheduler.open_session("Root?").unwrap();
    let before = current(&session);
    let pages = session.db().len();

    let err = session.act(ask("What about [this and $a4]?")).unwrap_err();
    assert_eq!(err, SchedulerError::UnknownPointer("$a4".to_string()));
    assert_eq!(session.db().len(), pages);
    assert_eq!(current(&session), before);
}

#[test]
fn test_syntax_error_in_reply() {
    let mut scheduler = scheduler();
    let mut session = scheduler.open_session("Root?").unwrap();
    let err = session.act(reply("[oops")).unwrap_err();
    assert!(matches!(
        err,
        SchedulerError::Hypertext(HypertextError::Syntax { offset: 5, .. })
    ));
    assert!(!session.is_fulfilled());
    assert!(!session.is_aborted());
}

#[test]
fn test_rolled_back_reply_keeps_promises_open() {
    let mut scheduler = scheduler();
    let mut session = scheduler.open_session("Root?").unwrap();
    session.act(ask("Sub?")).unwrap();
    let answer = session.current_context().unwrap().name_pointers()["$a1"];
    session.act(unlock("$a1")).unwrap();

    assert!(session.act(reply("see $9")).is_err());
    assert!(!session.db().is_resolved(answer).unwrap());
    assert!(session.db().has_promisees(answer));

    session.act(reply("ok")).unwrap();
    assert!(session.db().is_resolved(answer).unwrap());
}

#[test]
fn test_cancellation_is_recoverable() {
    let mut scheduler = scheduler();
    let token = scheduler.cancellation_token();
    let mut session = scheduler.open_session("Root?").unwrap();
    let before = current(&session);

    token.cancel();
    assert_eq!(
        session.act(ask("Sub?")).unwrap_err(),
        SchedulerError::Cancelled
    );
    assert_eq!(
        session.act(reply("x")).unwrap_err(),
        SchedulerError::Cancelled
    );
    assert_eq!(current(&session), before);

    token.reset();
    session.act(ask("Sub?")).unwrap();
    assert!(current(&session).contains("$q1: Sub?"));
}

#[test]
fn test_cancelled_replay_fails_open() {
    let mut scheduler = scheduler();
    {
        let mut session = scheduler.open_session("Root?").unwrap();
        session.act(reply("42")).unwrap();
    }
    let token = scheduler.cancellation_token();
    token.cancel();
    assert!(matches!(
        scheduler.open_session("Root?"),
        Err(SchedulerError::Cancelled)
    ));
}
