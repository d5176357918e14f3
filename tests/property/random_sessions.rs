//! Arbitrary action sequences never hit an internal fault

use proptest::prelude::*;
use quilt::scheduling::{Action, Scheduler, Session};
use quilt::store::Datastore;
use quilt::SchedulerConfig;

#[derive(Debug, Clone)]
enum Step {
    Ask(usize, Option<usize>),
    Reply(usize, Option<usize>),
    Unlock(usize),
    Scratch(usize, Option<usize>),
}

const WORDS: &[&str] = &["Root?", "Sub?", "What next?", "done", "[nested [list]]", ""];

fn step() -> impl Strategy<Value = Step> {
    let word = 0..WORDS.len();
    let pointer = prop::option::of(0usize..16);
    prop_oneof![
        (word.clone(), pointer.clone()).prop_map(|(w, p)| Step::Ask(w, p)),
        (word.clone(), pointer.clone()).prop_map(|(w, p)| Step::Reply(w, p)),
        (0usize..16).prop_map(Step::Unlock),
        (word, pointer).prop_map(|(w, p)| Step::Scratch(w, p)),
    ]
}

/// Text built from a word and optionally one visible pointer
fn text(session: &Session<'_>, word: usize, pointer: Option<usize>) -> String {
    let word = WORDS[word];
    let Some(index) = pointer else {
        return word.to_string();
    };
    let Some(context) = session.current_context() else {
        return word.to_string();
    };
    let mut names: Vec<&String> = context.name_pointers().keys().collect();
    names.sort();
    match names.get(index % names.len().max(1)) {
        Some(name) => format!("{} {}", word, name),
        None => word.to_string(),
    }
}

fn action(session: &Session<'_>, step: &Step) -> Option<Action> {
    let context = session.current_context()?;
    Some(match step {
        Step::Ask(w, p) => Action::AskSubquestion(text(session, *w, *p)),
        Step::Reply(w, p) => Action::Reply(text(session, *w, *p)),
        Step::Scratch(w, p) => Action::Scratch(text(session, *w, *p)),
        Step::Unlock(index) => {
            let locked = context.locked_pointers();
            let name = locked.get(index % locked.len().max(1))?;
            Action::Unlock(name.to_string())
        }
    })
}

fn run(scheduler: &mut Scheduler, steps: &[Step]) -> Result<(), TestCaseError> {
    let mut session = match scheduler.open_session("Root?") {
        Ok(session) => session,
        Err(e) => {
            prop_assert!(!e.is_fatal(), "fatal error opening session: {}", e);
            return Ok(());
        }
    };

    for step in steps {
        let Some(action) = action(&session, step) else {
            break;
        };
        let before = session.current_context().map(|c| c.to_string());
        match session.act(action.clone()) {
            Ok(outcome) => {
                prop_assert_eq!(outcome.is_finished(), session.is_fulfilled());
            }
            Err(e) => {
                prop_assert!(!e.is_fatal(), "{} failed fatally: {}", action, e);
                let after = session.current_context().map(|c| c.to_string());
                prop_assert_eq!(before, after);
            }
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_random_actions_are_never_fatal(
        first in prop::collection::vec(step(), 0..40),
        second in prop::collection::vec(step(), 0..40),
    ) {
        let config = SchedulerConfig {
            max_automated_steps: 50,
            max_depth: Some(6),
            ..Default::default()
        };
        let mut scheduler = Scheduler::with_config(Datastore::new(), config);
        // The second run replays whatever the first one recorded.
        run(&mut scheduler, &first)?;
        run(&mut scheduler, &second)?;
    }
}
