//! Suggestions returned by the ML endpoints
//!
//! A suggestion keeps the raw string it arrived as. Selection, equality and
//! persistence all use that raw string; the display form is derived on demand.

pub mod client;
pub mod normalize;

pub use client::{GenerateOutcome, SuggestionClient};
pub use normalize::{normalize, NormalizePolicy};

use serde::{Deserialize, Serialize};

/// Maximum suggestions kept from one response
const MAX_SUGGESTIONS: usize = 25;

/// One candidate item from a Generate call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Exact string from the API (`"1. -Checkout flow"`)
    pub raw: String,
    /// Position in the response, for stable rendering
    pub position: usize,
}

impl Suggestion {
    pub fn new(raw: impl Into<String>, position: usize) -> Self {
        Self {
            raw: raw.into(),
            position,
        }
    }

    pub fn display(&self, policy: NormalizePolicy) -> String {
        normalize(&self.raw, policy)
    }
}

/// Turn a `predicted_items` array into suggestions.
///
/// Duplicates are kept: two entries with the same display text but different
/// numbering are separate choices.
pub fn from_predicted_items(items: Vec<String>) -> Vec<Suggestion> {
    items
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .enumerate()
        .map(|(position, raw)| Suggestion::new(raw, position))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_predicted_items_keeps_duplicates_in_order() {
        let list = from_predicted_items(vec![
            "1. -Alpha".to_string(),
            "2. -Alpha".to_string(),
            "3. -Beta".to_string(),
        ]);
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].display(NormalizePolicy::AllDashes), "Alpha");
        assert_eq!(list[1].display(NormalizePolicy::AllDashes), "Alpha");
        assert_ne!(list[0], list[1]);
        assert_eq!(list[2].position, 2);
    }

    #[test]
    fn test_from_predicted_items_caps_length() {
        let items = (0..40).map(|i| format!("{}. -Item", i + 1)).collect();
        assert_eq!(from_predicted_items(items).len(), MAX_SUGGESTIONS);
    }
}
