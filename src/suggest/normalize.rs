//! Display cleanup for raw suggestion strings
//!
//! The ML endpoints number their output (`"1. -Checkout flow"`). The raw
//! string stays the identity of a suggestion; this module only derives the
//! text a user sees.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// `1. -` style prefix, optionally followed by dashes.
static ORDINAL_WITH_DASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+\.\s*-*\s*)+").expect("ordinal pattern is valid"));

/// `1. ` style prefix only.
static ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+\.\s*)+").expect("ordinal pattern is valid"));

/// How a step turns a raw suggestion into display text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizePolicy {
    /// Strip the ordinal and any dashes right after it; keep interior dashes
    LeadingDashes,
    /// Strip the ordinal and every dash in the string
    #[default]
    AllDashes,
}

/// Derive display text from a raw suggestion.
///
/// Stacked prefixes (`"1. 2. -x"`) are removed in one call so the result is
/// stable under repeated application.
pub fn normalize(raw: &str, policy: NormalizePolicy) -> String {
    match policy {
        NormalizePolicy::LeadingDashes => ORDINAL_WITH_DASHES.replace(raw, "").into_owned(),
        NormalizePolicy::AllDashes => {
            let without_dashes = raw.replace('-', "");
            ORDINAL.replace(&without_dashes, "").into_owned()
        }
    }
}

/// True when nothing but numbering, dashes and whitespace is left
pub fn is_blank(raw: &str, policy: NormalizePolicy) -> bool {
    normalize(raw, policy).trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_dashes_strips_prefix_only() {
        let policy = NormalizePolicy::LeadingDashes;
        assert_eq!(normalize("1. -Order history", policy), "Order history");
        assert_eq!(normalize("12.   --  Cart total", policy), "Cart total");
        assert_eq!(normalize("3. Check-out time", policy), "Check-out time");
    }

    #[test]
    fn test_all_dashes_strips_interior_dashes() {
        let policy = NormalizePolicy::AllDashes;
        assert_eq!(normalize("1. -Alpha", policy), "Alpha");
        assert_eq!(normalize("2. One-Click Checkout", policy), "OneClick Checkout");
    }

    #[test]
    fn test_text_without_ordinal_is_untouched_by_leading_policy() {
        assert_eq!(
            normalize("-already clean", NormalizePolicy::LeadingDashes),
            "-already clean"
        );
        assert_eq!(normalize("Plain", NormalizePolicy::LeadingDashes), "Plain");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "1. -Alpha",
            "1. 2. -Beta",
            "1. -2. Gamma",
            "7.--",
            "10. Multi-word - thing",
            "",
            "   spaced",
        ];
        for policy in [NormalizePolicy::LeadingDashes, NormalizePolicy::AllDashes] {
            for raw in samples {
                let once = normalize(raw, policy);
                let twice = normalize(&once, policy);
                assert_eq!(once, twice, "policy {:?} raw {:?}", policy, raw);
            }
        }
    }

    #[test]
    fn test_blank_detection() {
        assert!(is_blank("1. -", NormalizePolicy::AllDashes));
        assert!(is_blank("---", NormalizePolicy::AllDashes));
        assert!(is_blank("4. --", NormalizePolicy::LeadingDashes));
        assert!(!is_blank("---", NormalizePolicy::LeadingDashes));
        assert!(!is_blank("1. x", NormalizePolicy::AllDashes));
    }
}
