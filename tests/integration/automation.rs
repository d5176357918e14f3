//! Replaying recorded actions and reusing asked subquestions

use super::test_utils::{ask, current, reply, scheduler, scratch, unlock};
use quilt::scheduling::{Action, Scheduler};
use quilt::store::Datastore;
use quilt::{SchedulerConfig, SchedulerError};

#[test]
fn test_answer_replayed_in_later_session() {
    let mut scheduler = scheduler();

    {
        let mut session = scheduler
            .open_session("what is the sum of list [[6] []]")
            .unwrap();
        session.act(unlock("$3")).unwrap();
        session.act(reply("6")).unwrap();
        assert!(session.is_fulfilled());
    }
    assert_eq!(scheduler.cache_len(), 2);

    {
        let session = scheduler
            .open_session("what is the sum of list [[6] []]")
            .unwrap();
        assert!(session.is_fulfilled());
        assert_eq!(session.root_answer(), Some("The final answer is: 6"));
    }

    {
        let session = scheduler
            .open_session("what is the sum of list [[6] [[7] []]]")
            .unwrap();
        assert!(!session.is_fulfilled());
        assert!(session.current_context().is_some());
    }
}

#[test]
fn test_recorded_action_is_looked_up_by_display() {
    let mut scheduler = scheduler();
    let display = {
        let mut session = scheduler.open_session("Root?").unwrap();
        let display = current(&session);
        session.act(ask("Sub?")).unwrap();
        display
    };
    assert_eq!(
        scheduler.cached_action(&display),
        Some(&Action::AskSubquestion("Sub?".to_string()))
    );
}

#[test]
fn test_automation_can_be_disabled() {
    let config = SchedulerConfig {
        automation: false,
        ..Default::default()
    };
    let mut scheduler = Scheduler::with_config(Datastore::new(), config);
    {
        let mut session = scheduler.open_session("Root?").unwrap();
        session.act(reply("42")).unwrap();
    }
    let session = scheduler.open_session("Root?").unwrap();
    assert!(!session.is_fulfilled());
}

#[test]
fn test_memoized_subquestion() {
    let mut scheduler = scheduler();
    let mut session = scheduler.open_session("Root?").unwrap();
    session.act(ask("X?")).unwrap();
    let first = session.current_context().unwrap().clone();
    let open = session.open_contexts();

    let outcome = session.act(ask("X?")).unwrap();
    let again = outcome.context().unwrap();
    assert_eq!(again, &first);
    assert_eq!(again.workspace(), first.workspace());
    assert_eq!(session.open_contexts(), open);

    let data = again.to_data(session.db()).unwrap();
    assert_eq!(data.subquestions.len(), 1);
    assert!(!again.to_string().contains("$q2"));
}

#[test]
fn test_automation_budget() {
    let config = SchedulerConfig {
        max_automated_steps: 10,
        ..Default::default()
    };
    let mut scheduler = Scheduler::with_config(Datastore::new(), config);
    let mut session = scheduler.open_session("Root?").unwrap();

    // Three scratchpad states that cycle back to the start.
    session.act(scratch("a")).unwrap();
    session.act(scratch("b")).unwrap();
    let before = current(&session);

    let err = session.act(scratch("")).unwrap_err();
    assert_eq!(err, SchedulerError::BudgetExhausted(10));
    assert!(!err.is_fatal());
    assert_eq!(current(&session), before);
    drop(session);

    // The failed action was not recorded either.
    assert!(scheduler.cached_action(&before).is_none());
    assert_eq!(scheduler.cache_len(), 2);
}

#[test]
fn test_cleared_cache_replays_nothing() {
    let mut scheduler = scheduler();
    {
        let mut session = scheduler.open_session("Root?").unwrap();
        session.act(reply("42")).unwrap();
    }
    assert_eq!(scheduler.cache_len(), 1);

    scheduler.clear_cache();
    assert_eq!(scheduler.cache_len(), 0);
    let session = scheduler.open_session("Root?").unwrap();
    assert!(!session.is_fulfilled());
}
