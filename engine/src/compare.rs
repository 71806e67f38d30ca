//! Capability-set equivalence.
//!
//! Two sets are equivalent when they have the same number of entries and
//! every entry of one can be paired with a distinct entry of the other that
//! has the same acl kind, the same actions (sorted, duplicates kept) and the
//! same scope kind. For id-list scopes the sorted identifier lists must match
//! too; for other scope kinds the attached value is ignored.
//!
//! The pairing is a full multiset match. An older scan paired entries by acl
//! kind only, stopped at the first paired entry and returned its verdict, so
//! the remaining entries were never inspected. That scan could report sets
//! that differ past their first entry as equivalent; this implementation
//! does not.

use common::{Capability, Scope};

/// Whether `existing` grants exactly what `desired` asks for.
pub fn equivalent(existing: &[Capability], desired: &[Capability]) -> bool {
    if existing.len() != desired.len() {
        return false;
    }
    if existing.is_empty() {
        return true;
    }

    // Entry equivalence is an equivalence relation, so greedy pairing is exact.
    let mut unpaired: Vec<&Capability> = desired.iter().collect();
    for entry in existing {
        match unpaired
            .iter()
            .position(|candidate| entries_equivalent(entry, candidate))
        {
            Some(i) => {
                unpaired.swap_remove(i);
            }
            None => return false,
        }
    }
    true
}

pub fn entries_equivalent(a: &Capability, b: &Capability) -> bool {
    a.acl == b.acl
        && sorted(&a.actions) == sorted(&b.actions)
        && scopes_equivalent(&a.scope, &b.scope)
}

fn scopes_equivalent(a: &Scope, b: &Scope) -> bool {
    if a.kind != b.kind {
        return false;
    }
    if !a.is_id_list() {
        return true;
    }
    match (a.ids(), b.ids()) {
        (Ok(x), Ok(y)) => sorted(&x) == sorted(&y),
        _ => false,
    }
}

fn sorted<T: Ord + Clone>(items: &[T]) -> Vec<T> {
    let mut items = items.to_vec();
    items.sort();
    items
}
