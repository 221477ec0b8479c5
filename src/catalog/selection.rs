//! Multi-select state for the file grid.

use std::collections::BTreeSet;

/// Set of selected file IDs. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an ID. Returns false if it was already selected.
    pub fn select(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    /// Remove an ID. Returns false if it was not selected.
    pub fn deselect(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    /// Flip an ID, returning whether it is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected IDs in sorted order.
    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    /// Drop every ID the predicate rejects.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.ids.retain(|id| keep(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_and_deselect() {
        let mut selection = Selection::new();
        assert!(selection.select("a"));
        assert!(!selection.select("a"));
        assert!(selection.contains("a"));
        assert_eq!(selection.len(), 1);

        assert!(selection.deselect("a"));
        assert!(!selection.deselect("a"));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_toggle() {
        let mut selection = Selection::new();
        assert!(selection.toggle("a"));
        assert!(selection.contains("a"));
        assert!(!selection.toggle("a"));
        assert!(!selection.contains("a"));
    }

    #[test]
    fn test_ids_sorted_and_clear() {
        let mut selection = Selection::new();
        selection.select("c");
        selection.select("a");
        selection.select("b");
        assert_eq!(selection.ids(), vec!["a", "b", "c"]);

        selection.retain(|id| id != "b");
        assert_eq!(selection.ids(), vec!["a", "c"]);

        selection.clear();
        assert!(selection.is_empty());
    }
}
