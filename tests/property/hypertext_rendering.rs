//! Parsing and rendering agree on pointer-free hypertext

use proptest::prelude::*;
use quilt::hypertext::{insert_raw_hypertext, parse, render_anonymous};
use quilt::store::Datastore;
use std::collections::HashMap;

/// Bracket-balanced text without pointers
fn hypertext() -> impl Strategy<Value = String> {
    let leaf = "[a-z ?.0-9]{0,8}";
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop::collection::vec(
            prop_oneof![
                "[a-z ?.0-9]{0,8}".boxed(),
                inner.prop_map(|text| format!("[{}]", text)).boxed(),
            ],
            0..4,
        )
        .prop_map(|parts| parts.concat())
    })
}

proptest! {
    #[test]
    fn test_anonymous_rendering_reproduces_input(text in hypertext()) {
        let mut db = Datastore::new();
        let address = insert_raw_hypertext(&text, &mut db, &HashMap::new()).unwrap();
        prop_assert_eq!(render_anonymous(address, &db).unwrap(), text);
    }

    #[test]
    fn test_unbalanced_brackets_rejected(text in hypertext()) {
        let trailing = format!("{}]", text);
        let leading = format!("[{}", text);
        prop_assert!(parse(&trailing).is_err());
        prop_assert!(parse(&leading).is_err());
    }

    #[test]
    fn test_parse_never_panics(text in "\\PC{0,60}") {
        let _ = parse(&text);
    }
}
