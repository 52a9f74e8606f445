//! Request lifecycle of one step
//!
//! `Idle → Loading → Loaded | Error`, and back to `Loading` on the next
//! Generate. Each Generate gets a request id; a response is applied only if
//! its id is still the one the step is waiting on.

use crate::suggest::{GenerateOutcome, Suggestion};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Loading {
        request_id: u64,
    },
    Loaded(Vec<Suggestion>),
    Error(String),
}

impl RequestState {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading { .. })
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        match self {
            RequestState::Loaded(items) => items,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RequestState::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Enter `Loading` unless a request is already in flight
    pub fn begin(&mut self, request_id: u64) -> bool {
        if self.is_loading() {
            return false;
        }
        *self = RequestState::Loading { request_id };
        true
    }

    /// Apply a response. Returns false (and changes nothing) for stale ids.
    pub fn finish(&mut self, request_id: u64, outcome: GenerateOutcome) -> bool {
        match self {
            RequestState::Loading { request_id: waiting } if *waiting == request_id => {
                *self = match outcome {
                    GenerateOutcome::Items(items) => RequestState::Loaded(items),
                    GenerateOutcome::Error(message) => RequestState::Error(message),
                };
                true
            }
            _ => false,
        }
    }

    /// Stop waiting on the in-flight request, if any
    pub fn abandon(&mut self) {
        if self.is_loading() {
            *self = RequestState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> GenerateOutcome {
        GenerateOutcome::Items(vec![Suggestion::new("1. -Alpha", 0)])
    }

    #[test]
    fn test_full_lifecycle() {
        let mut state = RequestState::default();
        assert!(state.begin(1));
        assert!(state.is_loading());
        assert!(state.finish(1, items()));
        assert_eq!(state.suggestions().len(), 1);

        // Loaded -> Loading again on a new Generate
        assert!(state.begin(2));
        assert!(state.finish(2, GenerateOutcome::Error("model unavailable".to_string())));
        assert_eq!(state.error(), Some("model unavailable"));
        assert!(state.suggestions().is_empty());
    }

    #[test]
    fn test_second_begin_while_loading_is_rejected() {
        let mut state = RequestState::default();
        assert!(state.begin(1));
        assert!(!state.begin(2));
        assert_eq!(state, RequestState::Loading { request_id: 1 });
    }

    #[test]
    fn test_stale_response_is_ignored() {
        let mut state = RequestState::default();
        state.begin(1);
        state.abandon();
        assert_eq!(state, RequestState::Idle);
        assert!(!state.finish(1, items()));
        assert_eq!(state, RequestState::Idle);

        state.begin(2);
        assert!(!state.finish(1, items()));
        assert!(state.is_loading());
    }
}
