#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use arcadia_core::RecordId;

/// Ids marked for bulk action within the active kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<RecordId>,
}

impl SelectionSet {
    /// Flip one id; returns whether it is selected afterwards.
    pub fn toggle_one(&mut self, id: &RecordId) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        }
    }

    /// Replace the selection with exactly `ids`.
    pub fn select_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a RecordId>) {
        self.ids = ids.into_iter().cloned().collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn is_selected(&self, id: &RecordId) -> bool {
        self.ids.contains(id)
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.ids.iter().cloned().collect()
    }

    /// Header checkbox state: a non-empty list with every row selected.
    pub fn all_selected(&self, total: usize) -> bool {
        total > 0 && self.ids.len() == total
    }

    /// Drop ids that are no longer listed.
    pub fn retain<'a>(&mut self, existing: impl IntoIterator<Item = &'a RecordId>) {
        let keep: BTreeSet<&RecordId> = existing.into_iter().collect();
        self.ids.retain(|id| keep.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(xs: &[&str]) -> Vec<RecordId> {
        xs.iter().map(|s| RecordId::from(*s)).collect()
    }

    #[test]
    fn toggle_flips_membership() {
        let mut s = SelectionSet::default();
        let a = RecordId::from("a");
        assert!(s.toggle_one(&a));
        assert!(s.is_selected(&a));
        assert!(!s.toggle_one(&a));
        assert!(s.is_empty());
    }

    #[test]
    fn select_all_replaces_instead_of_union() {
        let mut s = SelectionSet::default();
        s.toggle_one(&RecordId::from("z"));
        let all = ids(&["a", "b"]);
        s.select_all(&all);
        assert_eq!(s.ids(), all);
        assert!(s.all_selected(2));
        assert!(!s.all_selected(3));
        s.clear();
        assert!(!s.all_selected(0));
    }

    #[test]
    fn retain_prunes_missing_ids() {
        let mut s = SelectionSet::default();
        s.select_all(&ids(&["a", "b", "c"]));
        s.retain(&ids(&["b", "c", "d"]));
        assert_eq!(s.ids(), ids(&["b", "c"]));
    }
}
