//! Editable List Model
//!
//! Ordered, selectable list of entries backing the ingredient and direction
//! editors. Every operation takes the current snapshot by reference and
//! returns the next one; snapshots are never mutated.
//!
//! Entries created in the editor carry a temporary (negative) id until the
//! server assigns a permanent one.

use serde::{Deserialize, Serialize};

use crate::field::normalize_line;

/// Mints temporary ids: -1, -2, -3, ...
///
/// Permanent ids are always positive, so the two ranges never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TempIds {
    last: i64,
}

impl TempIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter that continues below the temporary ids already in `lists`
    pub fn continuing<'a>(lists: impl IntoIterator<Item = &'a EditableArray>) -> Self {
        let last = lists
            .into_iter()
            .flat_map(|list| list.elems.iter())
            .filter(|e| e.is_temp)
            .map(|e| e.id)
            .min()
            .unwrap_or(0)
            .min(0);
        Self { last }
    }

    /// Next temporary id, strictly below every id minted before it
    pub fn next(&mut self) -> i64 {
        self.last -= 1;
        self.last
    }
}

/// One list entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EditableElem {
    pub id: i64,
    pub value: String,
    pub is_temp: bool,
}

impl EditableElem {
    pub fn saved(id: i64, value: impl Into<String>) -> Self {
        Self {
            id,
            value: value.into(),
            is_temp: false,
        }
    }

    pub fn temp(id: i64, value: impl Into<String>) -> Self {
        Self {
            id,
            value: value.into(),
            is_temp: true,
        }
    }
}

/// Ordered entries, pending deletions and the selected position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EditableArray {
    pub elems: Vec<EditableElem>,
    pub deleted_ids: Vec<i64>,
    pub selected_index: usize,
}

impl EditableArray {
    /// Build from stored entries in display order.
    ///
    /// An empty input yields a single blank temporary entry so the list is
    /// never empty.
    pub fn from_saved<I, S>(items: I, ids: &mut TempIds) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        let mut elems: Vec<EditableElem> = items
            .into_iter()
            .map(|(id, value)| EditableElem::saved(id, value))
            .collect();

        if elems.is_empty() {
            elems.push(EditableElem::temp(ids.next(), ""));
        }

        Self {
            elems,
            deleted_ids: Vec::new(),
            selected_index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn selected(&self) -> Option<&EditableElem> {
        self.elems.get(self.selected_index)
    }

    /// Values in display order
    pub fn values(&self) -> Vec<&str> {
        self.elems.iter().map(|e| e.value.as_str()).collect()
    }

    /// Select an entry. Out-of-range indexes clamp to the last entry.
    pub fn select(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.selected_index = index.min(self.elems.len().saturating_sub(1));
        next
    }

    /// Select the following entry, wrapping to the first
    pub fn select_next(&self) -> Self {
        let count = self.elems.len().max(1);
        self.select((self.selected_index + 1) % count)
    }

    /// Select the preceding entry, wrapping to the last
    pub fn select_previous(&self) -> Self {
        let count = self.elems.len().max(1);
        self.select((count + self.selected_index - 1) % count)
    }

    /// Insert a blank temporary entry after the selection and select it
    pub fn insert_after_selected(&self, ids: &mut TempIds) -> Self {
        let mut next = self.clone();
        let at = (self.selected_index + 1).min(next.elems.len());
        next.elems.insert(at, EditableElem::temp(ids.next(), ""));
        next.selected_index = at;
        next
    }

    /// Replace the selected entry's value verbatim
    pub fn set_selected_value(&self, value: &str) -> Self {
        let mut next = self.clone();
        if let Some(elem) = next.elems.get_mut(self.selected_index) {
            elem.value = value.to_string();
        }
        next
    }

    /// Replace the selected entry with the first line of `text`.
    ///
    /// The first line is kept verbatim. Each further line is normalized and,
    /// when non-empty, becomes a new temporary entry after the selection, in
    /// order. The selection does not move.
    pub fn set_selected_lines(&self, text: &str, ids: &mut TempIds) -> Self {
        let mut lines = text.split(['\n', '\r']);
        let first = lines.next().unwrap_or_default();
        let mut next = self.set_selected_value(first);

        let mut at = self.selected_index + 1;
        for line in lines {
            let line = normalize_line(line);
            if line.is_empty() {
                continue;
            }
            let at_clamped = at.min(next.elems.len());
            next.elems.insert(at_clamped, EditableElem::temp(ids.next(), line));
            at = at_clamped + 1;
        }
        next
    }

    /// Remove the selected entry.
    ///
    /// Permanent ids are queued in `deleted_ids`. The last remaining entry is
    /// blanked instead of removed.
    pub fn remove_selected(&self) -> Self {
        let mut next = self.clone();

        if next.elems.len() > 1 {
            let removed = next.elems.remove(self.selected_index.min(next.elems.len() - 1));
            if !removed.is_temp {
                next.deleted_ids.push(removed.id);
            }
            next.selected_index = self.selected_index.saturating_sub(1);
        } else if let Some(only) = next.elems.first_mut() {
            only.value.clear();
            next.selected_index = 0;
        }

        next
    }

    /// Move the entry at `from` to `to`; the selection follows it.
    ///
    /// Out-of-range indexes leave the list unchanged.
    pub fn move_elem(&self, from: usize, to: usize) -> Self {
        let len = self.elems.len();
        if from >= len || to >= len {
            return self.clone();
        }

        let mut next = self.clone();
        let elem = next.elems.remove(from);
        next.elems.insert(to, elem);
        next.selected_index = to;
        next
    }

    pub fn move_selected_up(&self) -> Self {
        if self.selected_index == 0 {
            return self.clone();
        }
        self.move_elem(self.selected_index, self.selected_index - 1)
    }

    pub fn move_selected_down(&self) -> Self {
        if self.selected_index + 1 >= self.elems.len() {
            return self.clone();
        }
        self.move_elem(self.selected_index, self.selected_index + 1)
    }

    /// Same entries and pending deletions, ignoring the selection
    pub fn same_content(&self, other: &EditableArray) -> bool {
        self.elems == other.elems && self.deleted_ids == other.deleted_ids
    }

    /// Structural invariants: non-empty, selection in range, unique ids,
    /// temporary ids negative and pending deletions positive.
    pub fn is_well_formed(&self) -> bool {
        if self.elems.is_empty() || self.selected_index >= self.elems.len() {
            return false;
        }

        let mut seen = std::collections::HashSet::new();
        for elem in &self.elems {
            if !seen.insert((elem.is_temp, elem.id)) {
                return false;
            }
            if elem.is_temp && elem.id >= 0 {
                return false;
            }
        }

        self.deleted_ids.iter().all(|id| *id > 0)
    }
}
