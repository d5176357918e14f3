//! Walking the unlocked region of the page graph

use crate::error::StorageError;
use crate::store::Datastore;
use crate::types::Address;
use std::collections::{HashSet, VecDeque};

/// Breadth-first walk of everything visible through unlocked locations
///
/// `template` and `instance` are walked in lockstep: wherever the template
/// address is unlocked, the corresponding instance address is yielded and the
/// walk continues into the zipped links of both pages. With the same address
/// for both this is the ordinary reachability walk; with two versions of a
/// workspace it carries an unlock set over from the old version to the new.
///
/// `None` for `unlocked` treats every location as unlocked. Each instance
/// address is yielded at most once, in visitation order.
pub fn visit_unlocked_region(
    template: Address,
    instance: Address,
    db: &Datastore,
    unlocked: Option<&HashSet<Address>>,
) -> Result<Vec<Address>, StorageError> {
    let mut visited = Vec::new();
    let mut yielded = HashSet::new();
    let mut seen = HashSet::from([(template, instance)]);
    let mut frontier = VecDeque::from([(template, instance)]);

    while let Some((t, i)) = frontier.pop_front() {
        if let Some(unlocked) = unlocked {
            if !unlocked.contains(&t) {
                continue;
            }
        }
        if yielded.insert(i) {
            visited.push(i);
        }

        let template_links = db.dereference(t)?.links();
        let instance_links = db.dereference(i)?.links();
        for pair in template_links.into_iter().zip(instance_links) {
            if seen.insert(pair) {
                frontier.push_back(pair);
            }
        }
    }

    Ok(visited)
}
