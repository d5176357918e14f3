//! Content addressing is a function of content

use proptest::prelude::*;
use quilt::hypertext::insert_raw_hypertext;
use quilt::store::Datastore;
use std::collections::HashMap;

fn literal() -> impl Strategy<Value = String> {
    "[^\\[\\]$]{0,40}"
}

proptest! {
    #[test]
    fn test_same_text_same_address(text in literal()) {
        let mut db = Datastore::new();
        let first = insert_raw_hypertext(&text, &mut db, &HashMap::new()).unwrap();
        let pages = db.len();
        let second = insert_raw_hypertext(&text, &mut db, &HashMap::new()).unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(db.len(), pages);
    }

    #[test]
    fn test_independent_stores_agree(text in literal()) {
        let mut left = Datastore::new();
        let mut right = Datastore::new();
        let a = insert_raw_hypertext(&text, &mut left, &HashMap::new()).unwrap();
        let b = insert_raw_hypertext(&text, &mut right, &HashMap::new()).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn test_different_text_different_address(a in literal(), b in literal()) {
        prop_assume!(a != b);
        let mut db = Datastore::new();
        let first = insert_raw_hypertext(&a, &mut db, &HashMap::new()).unwrap();
        let second = insert_raw_hypertext(&b, &mut db, &HashMap::new()).unwrap();
        prop_assert_ne!(first, second);
    }

    #[test]
    fn test_resolved_promise_reference_matches_value_reference(text in literal()) {
        let mut db = Datastore::new();
        let value = insert_raw_hypertext(&text, &mut db, &HashMap::new()).unwrap();
        let promise = db.make_promise();
        db.resolve_promise(promise, value).unwrap();

        let via_promise = insert_raw_hypertext(
            "see $1",
            &mut db,
            &HashMap::from([("$1".to_string(), promise)]),
        )
        .unwrap();
        let via_value = insert_raw_hypertext(
            "see $1",
            &mut db,
            &HashMap::from([("$1".to_string(), value)]),
        )
        .unwrap();
        prop_assert_eq!(via_promise, via_value);
    }
}
