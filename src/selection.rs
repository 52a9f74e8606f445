//! Per-step selection of suggestions
//!
//! Items are raw suggestion strings. Once the user edits an entry, the edited
//! text is the entry's identity from then on.

use crate::suggest::normalize::{is_blank, NormalizePolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("No selected item at position {index} (have {len})")]
    OutOfRange { index: usize, len: usize },
}

/// Whether a step keeps many choices or exactly one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectMode {
    #[default]
    Multi,
    Single,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    mode: SelectMode,
    items: Vec<String>,
}

impl SelectionSet {
    pub fn new(mode: SelectMode) -> Self {
        Self {
            mode,
            items: Vec::new(),
        }
    }

    pub fn mode(&self) -> SelectMode {
        self.mode
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.items.iter().any(|item| item == raw)
    }

    /// Apply a click on a suggestion according to the step's mode
    pub fn select(&mut self, raw: &str) {
        match self.mode {
            SelectMode::Multi => self.toggle(raw),
            SelectMode::Single => self.replace_single(raw),
        }
    }

    /// Remove `raw` if present (keeping the order of the rest), else append it
    pub fn toggle(&mut self, raw: &str) {
        if let Some(pos) = self.items.iter().position(|item| item == raw) {
            self.items.remove(pos);
        } else {
            self.items.push(raw.to_string());
        }
    }

    pub fn replace_single(&mut self, raw: &str) {
        self.items.clear();
        self.items.push(raw.to_string());
    }

    /// Overwrite the entry at `index` with user-typed text
    pub fn edit_at(&mut self, index: usize, text: &str) -> Result<(), SelectionError> {
        let len = self.items.len();
        let slot = self
            .items
            .get_mut(index)
            .ok_or(SelectionError::OutOfRange { index, len })?;
        *slot = text.to_string();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Restore previously persisted items (e.g. when resuming a step)
    pub fn restore(&mut self, items: Vec<String>) {
        self.items = match self.mode {
            SelectMode::Multi => items,
            SelectMode::Single => items.into_iter().take(1).collect(),
        };
    }

    /// Proceeding is blocked when nothing is chosen or every choice is blank
    pub fn is_blocked(&self, policy: NormalizePolicy) -> bool {
        self.items.iter().all(|item| is_blank(item, policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_scenario_alpha_beta_alpha() {
        let mut set = SelectionSet::new(SelectMode::Multi);
        set.select("1. -Alpha");
        set.select("2. -Beta");
        set.select("1. -Alpha");
        assert_eq!(set.items(), ["2. -Beta".to_string()]);
    }

    #[test]
    fn test_toggle_twice_restores_contents_and_order() {
        let mut set = SelectionSet::new(SelectMode::Multi);
        set.toggle("1. -A");
        set.toggle("2. -B");
        set.toggle("3. -C");
        let before = set.clone();

        set.toggle("2. -B");
        assert_eq!(set.items(), ["1. -A".to_string(), "3. -C".to_string()]);
        set.toggle("2. -B");
        assert_eq!(set.len(), before.len());
        assert!(set.contains("2. -B"));

        // Toggling an absent item twice is a true no-op
        let mut set = before.clone();
        set.toggle("9. -Z");
        set.toggle("9. -Z");
        assert_eq!(set, before);
    }

    #[test]
    fn test_raw_identity_keeps_same_display_distinct() {
        let mut set = SelectionSet::new(SelectMode::Multi);
        set.toggle("1. -Alpha");
        set.toggle("2. -Alpha");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_single_mode_never_exceeds_one() {
        let mut set = SelectionSet::new(SelectMode::Single);
        set.select("1. -Alpha");
        set.select("2. -Beta");
        set.select("2. -Beta");
        assert_eq!(set.items(), ["2. -Beta".to_string()]);

        set.restore(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_edit_at_rewrites_identity() {
        let mut set = SelectionSet::new(SelectMode::Single);
        set.replace_single("1. -Checkout");
        set.edit_at(0, "Checkout Flow").expect("edit");
        assert!(set.contains("Checkout Flow"));
        assert!(!set.contains("1. -Checkout"));

        assert_eq!(
            set.edit_at(3, "x"),
            Err(SelectionError::OutOfRange { index: 3, len: 1 })
        );
    }

    #[test]
    fn test_blocked_iff_empty_or_all_blank() {
        let policy = NormalizePolicy::AllDashes;
        let mut set = SelectionSet::new(SelectMode::Multi);
        assert!(set.is_blocked(policy));

        set.toggle("1. -");
        assert!(set.is_blocked(policy));

        set.toggle("2. -Beta");
        assert!(!set.is_blocked(policy));

        set.toggle("2. -Beta");
        set.edit_at(0, "--").expect("edit");
        assert!(set.is_blocked(policy));
    }

    #[test]
    fn test_whitespace_only_edit_blocks() {
        let mut set = SelectionSet::new(SelectMode::Single);
        set.replace_single("2. -Beta");
        set.edit_at(0, "   ").expect("edit");
        assert!(set.is_blocked(NormalizePolicy::AllDashes));
        assert!(set.is_blocked(NormalizePolicy::LeadingDashes));

        set.edit_at(0, " Beta ").expect("edit");
        assert!(!set.is_blocked(NormalizePolicy::AllDashes));
    }
}
