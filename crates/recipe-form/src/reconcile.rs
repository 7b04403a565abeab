//! Save Reconciliation
//!
//! Merges the permanent ids minted by a save back into the editor's live
//! list, which may have moved on while the save was in flight.

use std::collections::{BTreeMap, HashSet};

use crate::editable::EditableArray;

/// Temporary id -> permanent id, scoped to one save request/response pair
pub type IdMap = BTreeMap<i64, i64>;

/// Outcome of reconciling one list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// The live list with resolved ids and committed deletions dropped
    pub current: EditableArray,
    /// The submitted list as the server now stores it
    pub saved: EditableArray,
}

/// Reconcile one list after a successful save.
///
/// Temporary entries of `requested` are resolved through `mapped`. Each
/// still-temporary entry of `current` carrying a resolved temporary id is
/// promoted in place (first match only). Deletions that were part of the
/// request are dropped from `current.deleted_ids`; later ones stay pending.
/// Entries are never added, removed or reordered, and ids missing from
/// `mapped` are left as they are.
pub fn reconcile(current: &EditableArray, requested: &EditableArray, mapped: &IdMap) -> Reconciled {
    let mut current = current.clone();
    let mut saved = requested.clone();

    for elem in saved.elems.iter_mut().filter(|e| e.is_temp) {
        let temp_id = elem.id;
        let Some(&permanent) = mapped.get(&temp_id) else {
            continue;
        };

        elem.is_temp = false;
        elem.id = permanent;

        if let Some(live) = current
            .elems
            .iter_mut()
            .find(|e| e.is_temp && e.id == temp_id)
        {
            live.is_temp = false;
            live.id = permanent;
        }
    }

    let committed: HashSet<i64> = requested.deleted_ids.iter().copied().collect();
    current.deleted_ids.retain(|id| !committed.contains(id));
    saved.deleted_ids.clear();

    Reconciled { current, saved }
}
