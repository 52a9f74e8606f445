use super::{Destination, ProceedRule, SuggestionStep};
use crate::session::AuthState;

/// Where Next goes, and why
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Same successor for everyone
    Fixed(Destination),
    /// Successor chosen because the user is signed in (or not signed in at all)
    Identified(Destination),
    /// Successor chosen because the user is a guest
    Anonymous(Destination),
}

impl RouteDecision {
    pub fn destination(&self) -> Destination {
        match self {
            RouteDecision::Fixed(d) | RouteDecision::Identified(d) | RouteDecision::Anonymous(d) => *d,
        }
    }
}

/// Successor of `from`, decided only by the auth state right now.
///
/// Terminal pages have no successor.
pub fn next_route(from: Destination, auth: &AuthState) -> Option<RouteDecision> {
    match from {
        Destination::Suggest(SuggestionStep::DataElements) => {
            Some(RouteDecision::Fixed(Destination::Hypothesis))
        }
        Destination::Hypothesis => Some(RouteDecision::Fixed(Destination::Suggest(
            SuggestionStep::MarketingMaterial,
        ))),
        Destination::Suggest(SuggestionStep::MarketingMaterial) => Some(RouteDecision::Fixed(
            Destination::Suggest(SuggestionStep::FeatureName),
        )),
        Destination::Suggest(SuggestionStep::FeatureName) => Some(if auth.is_anonymous() {
            RouteDecision::Anonymous(Destination::Summary)
        } else {
            RouteDecision::Identified(Destination::ListOfFeatures)
        }),
        Destination::ListOfFeatures | Destination::Summary => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextButton {
    pub label: &'static str,
    pub enabled: bool,
}

/// Derive the Next button from the step's rule and the current selection
pub fn next_button(rule: ProceedRule, blocked: bool) -> NextButton {
    match rule {
        ProceedRule::Always => NextButton {
            label: "Next",
            enabled: true,
        },
        ProceedRule::Optional => NextButton {
            label: if blocked { "Skip" } else { "Next" },
            enabled: true,
        },
        ProceedRule::Required { blocked_label } if blocked => NextButton {
            label: blocked_label,
            enabled: false,
        },
        ProceedRule::Required { .. } => NextButton {
            label: "Next",
            enabled: true,
        },
    }
}

/// Page history for Back
#[derive(Debug, Clone)]
pub struct Navigator {
    history: Vec<Destination>,
}

impl Navigator {
    pub fn new(start: Destination) -> Self {
        Self {
            history: vec![start],
        }
    }

    pub fn current(&self) -> Destination {
        // history is never empty: back() refuses to pop the root
        self.history
            .last()
            .copied()
            .unwrap_or(Destination::FIRST)
    }

    pub fn can_go_back(&self) -> bool {
        self.history.len() > 1
    }

    /// Pop one page. No validation; a no-op on the first page.
    pub fn back(&mut self) -> Option<Destination> {
        if !self.can_go_back() {
            return None;
        }
        self.history.pop();
        Some(self.current())
    }

    pub fn go(&mut self, decision: RouteDecision) -> Destination {
        let dest = decision.destination();
        self.history.push(dest);
        dest
    }

    pub fn depth(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guest() -> AuthState {
        AuthState::Anonymous {
            uid: "g".to_string(),
        }
    }

    fn member() -> AuthState {
        AuthState::Identified {
            uid: "u".to_string(),
        }
    }

    #[test]
    fn test_feature_name_branches_on_auth() {
        let from = Destination::Suggest(SuggestionStep::FeatureName);
        assert_eq!(
            next_route(from, &guest()),
            Some(RouteDecision::Anonymous(Destination::Summary))
        );
        assert_eq!(
            next_route(from, &member()),
            Some(RouteDecision::Identified(Destination::ListOfFeatures))
        );
        assert_eq!(
            next_route(from, &AuthState::SignedOut),
            Some(RouteDecision::Identified(Destination::ListOfFeatures))
        );
    }

    #[test]
    fn test_linear_part_is_fixed() {
        let mut dest = Destination::FIRST;
        let mut seen = vec![dest];
        while let Some(RouteDecision::Fixed(next)) = next_route(dest, &guest()) {
            dest = next;
            seen.push(dest);
        }
        assert_eq!(
            seen,
            vec![
                Destination::Suggest(SuggestionStep::DataElements),
                Destination::Hypothesis,
                Destination::Suggest(SuggestionStep::MarketingMaterial),
                Destination::Suggest(SuggestionStep::FeatureName),
            ]
        );
        assert_eq!(next_route(Destination::Summary, &guest()), None);
    }

    #[test]
    fn test_route_ignores_history() {
        let mut nav = Navigator::new(Destination::Suggest(SuggestionStep::FeatureName));
        let first = next_route(nav.current(), &guest()).unwrap();
        nav.go(first);
        nav.back();
        let second = next_route(nav.current(), &member()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_back_pops_and_stops_at_root() {
        let mut nav = Navigator::new(Destination::FIRST);
        assert_eq!(nav.back(), None);
        nav.go(RouteDecision::Fixed(Destination::Hypothesis));
        assert_eq!(nav.current(), Destination::Hypothesis);
        assert_eq!(nav.back(), Some(Destination::FIRST));
        assert_eq!(nav.depth(), 1);
    }

    #[test]
    fn test_button_labels() {
        let required = ProceedRule::Required {
            blocked_label: "Feature Name Required",
        };
        assert_eq!(
            next_button(required, true),
            NextButton {
                label: "Feature Name Required",
                enabled: false
            }
        );
        assert_eq!(next_button(required, false).label, "Next");
        assert_eq!(next_button(ProceedRule::Optional, true).label, "Skip");
        assert!(next_button(ProceedRule::Optional, true).enabled);
        assert_eq!(next_button(ProceedRule::Optional, false).label, "Next");
        assert_eq!(next_button(ProceedRule::Always, true).label, "Next");
    }
}
