//! Pointer names and unlocking

use super::test_utils::{ask, current, scheduler, unlock};

#[test]
fn test_subquestion_pointer_names() {
    let mut scheduler = scheduler();
    let mut session = scheduler.open_session("Root?").unwrap();
    for question in ["A?", "B?", "C?"] {
        session.act(ask(question)).unwrap();
    }

    let context = session.current_context().unwrap();
    let names = context.name_pointers();
    for i in 1..=3 {
        for prefix in ["$q", "$a", "$w"] {
            assert!(names.contains_key(&format!("{}{}", prefix, i)));
        }
    }
    assert!(!names.contains_key("$q4"));
    // Question and scratchpad are the only other visible pages.
    assert_eq!(names.len(), 11);
    assert_eq!(context.locked_pointers(), vec!["$a1", "$a2", "$a3", "$w1", "$w2", "$w3"]);
}

#[test]
fn test_naming_is_reproducible() {
    let run = || {
        let mut scheduler = scheduler();
        let mut session = scheduler.open_session("Sum of [1] [2] [[3] [4]]").unwrap();
        session.act(ask("First of [1]?")).unwrap();
        current(&session)
    };
    assert_eq!(run(), run());
}

#[test]
fn test_unlock_round_trip() {
    let mut scheduler = scheduler();
    let mut session = scheduler.open_session("Sum of [1] [[2] [3]]").unwrap();
    let before = session.current_context().unwrap().clone();
    assert!(before.to_string().starts_with("Question: [$1: Sum of $3 $4]"));
    let address = before.name_pointers()["$4"];
    assert!(!before.is_unlocked(&address));

    let outcome = session.act(unlock("$4")).unwrap();
    let after = outcome.context().unwrap();
    assert!(after.is_unlocked(&address));
    assert!(after.to_string().starts_with("Question: [$1: Sum of $3 [$4: $5 $6]]"));

    // Existing names keep pointing at the same pages.
    for (name, address) in before.name_pointers() {
        assert_eq!(after.name_pointers().get(name), Some(address));
    }
}

#[test]
fn test_unlocking_never_renames_visible_pointers() {
    let mut scheduler = scheduler();
    let mut session = scheduler.open_session("Q [x [a]] [y [b]]").unwrap();

    let outcome = session.act(unlock("$4")).unwrap();
    let context = outcome.context().unwrap();
    assert!(context.to_string().contains("[$4: y $5]"));
    let b = context.name_pointers()["$5"];

    // `x` comes before `y` in visiting order; its child must not take `$5`.
    let outcome = session.act(unlock("$3")).unwrap();
    let context = outcome.context().unwrap();
    assert_eq!(context.pointer_names()[&b], "$5");
    assert!(context
        .to_string()
        .starts_with("Question: [$1: Q [$3: x $6] [$4: y $5]]"));
}
