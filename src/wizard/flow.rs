use super::navigator::{Navigator, RouteDecision};
use super::step::{HypothesisForm, StepController};
use super::{Destination, PersistTarget, SuggestionStep};
use crate::session::{Document, SessionContext, SessionStore, StoreError};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// A whole wizard run: the pages, their state and the history between them
#[derive(Debug, Clone)]
pub struct WizardFlow {
    pub ctx: SessionContext,
    navigator: Navigator,
    steps: BTreeMap<SuggestionStep, StepController>,
    pub hypothesis: HypothesisForm,
}

impl WizardFlow {
    pub fn new(ctx: SessionContext, start: Destination) -> Self {
        let steps = SuggestionStep::ALL
            .iter()
            .map(|step| (*step, StepController::new(*step)))
            .collect();
        Self {
            ctx,
            navigator: Navigator::new(start),
            steps,
            hypothesis: HypothesisForm::default(),
        }
    }

    pub fn current(&self) -> Destination {
        self.navigator.current()
    }

    /// Reopen the wizard on `start` with no history behind it
    pub fn start_at(&mut self, start: Destination) {
        self.leave_current();
        self.navigator = Navigator::new(start);
    }

    pub fn can_go_back(&self) -> bool {
        self.navigator.can_go_back()
    }

    pub fn step(&self, step: SuggestionStep) -> &StepController {
        // every SuggestionStep is inserted in new()
        &self.steps[&step]
    }

    pub fn step_mut(&mut self, step: SuggestionStep) -> &mut StepController {
        self.steps
            .entry(step)
            .or_insert_with(|| StepController::new(step))
    }

    /// Controller for the current page, if it is a suggestion step
    pub fn current_step(&self) -> Option<&StepController> {
        match self.current() {
            Destination::Suggest(step) => Some(self.step(step)),
            _ => None,
        }
    }

    pub fn current_step_mut(&mut self) -> Option<&mut StepController> {
        match self.current() {
            Destination::Suggest(step) => Some(self.step_mut(step)),
            _ => None,
        }
    }

    fn leave_current(&mut self) {
        if let Some(controller) = self.current_step_mut() {
            controller.abandon_request();
        }
    }

    /// Move forward after a successful submit
    pub fn advance(&mut self, decision: RouteDecision) -> Destination {
        self.leave_current();
        let dest = self.navigator.go(decision);
        info!(route = dest.route(), ?decision, "advanced");
        dest
    }

    /// Previous page, no validation. `None` on the first page.
    pub fn back(&mut self) -> Option<Destination> {
        if !self.navigator.can_go_back() {
            return None;
        }
        self.leave_current();
        let dest = self.navigator.back();
        debug!(route = dest.map(|d| d.route()), "went back");
        dest
    }

    /// Fill selections from documents a previous run left behind
    pub fn restore(&mut self, session_record: Option<&Document>, feature_doc: Option<&Document>) {
        if let Some(record) = session_record {
            self.hypothesis.restore_from(record);
        }
        for step in SuggestionStep::ALL {
            let source = match step.config().persist_to {
                PersistTarget::SessionRecord => session_record,
                PersistTarget::FeatureDocument => feature_doc,
            };
            if let Some(doc) = source {
                if self.step_mut(step).restore_from(doc) {
                    debug!(?step, "restored selection");
                }
            }
        }
    }

    /// Load both documents for this run and restore from them
    pub async fn resume(&mut self, store: &SessionStore) -> Result<(), StoreError> {
        let record = store.load_document(&self.ctx.session_record()).await?;
        let feature_path = self.ctx.feature_document();
        let feature = if feature_path == self.ctx.session_record() {
            record.clone()
        } else {
            store.load_document(&feature_path).await?
        };
        self.restore(record.as_ref(), feature.as_ref());
        Ok(())
    }

    /// First page whose data is still missing
    pub fn first_incomplete(&self) -> Destination {
        if self.step(SuggestionStep::DataElements).selection().is_empty() {
            return Destination::Suggest(SuggestionStep::DataElements);
        }
        if self.hypothesis.is_blocked() {
            return Destination::Hypothesis;
        }
        if self.step(SuggestionStep::MarketingMaterial).selection().is_empty() {
            return Destination::Suggest(SuggestionStep::MarketingMaterial);
        }
        Destination::Suggest(SuggestionStep::FeatureName)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{AuthState, FieldValue, Fields};
    use crate::suggest::{GenerateOutcome, Suggestion};

    fn ctx() -> SessionContext {
        SessionContext::new(
            "s1",
            "d1",
            AuthState::Identified {
                uid: "u1".to_string(),
            },
        )
    }

    #[test]
    fn test_back_abandons_in_flight_request() {
        let mut flow = WizardFlow::new(ctx(), Destination::Hypothesis);
        flow.advance(RouteDecision::Fixed(Destination::Suggest(
            SuggestionStep::MarketingMaterial,
        )));
        let ticket = flow
            .current_step_mut()
            .unwrap()
            .begin_generate("s1")
            .unwrap();

        assert_eq!(flow.back(), Some(Destination::Hypothesis));
        let applied = flow
            .step_mut(SuggestionStep::MarketingMaterial)
            .complete_generate(
                ticket.request_id,
                GenerateOutcome::Items(vec![Suggestion::new("1. -Late", 0)]),
            );
        assert!(!applied);
        assert_eq!(flow.back(), None);
    }

    #[tokio::test]
    async fn test_resume_restores_saved_pages() {
        let ctx = ctx();
        let store = SessionStore::in_memory();
        let mut intake = Fields::new();
        intake.insert(
            "dataElements".to_string(),
            FieldValue::List(vec!["1. -Clicks".to_string()]),
        );
        intake.insert("hypothesis".to_string(), "People want speed".into());
        store.create_record(&ctx, intake).await.unwrap();

        let mut feature = Fields::new();
        feature.insert(
            "marketingMaterial".to_string(),
            FieldValue::List(vec!["1. -Flyer".to_string()]),
        );
        store
            .merge_fields(&ctx.feature_document(), feature)
            .await
            .unwrap();

        let mut flow = WizardFlow::new(ctx, Destination::FIRST);
        flow.resume(&store).await.unwrap();
        assert_eq!(flow.hypothesis.text, "People want speed");
        assert_eq!(
            flow.step(SuggestionStep::MarketingMaterial).selection().items(),
            &["1. -Flyer".to_string()]
        );
        assert_eq!(
            flow.first_incomplete(),
            Destination::Suggest(SuggestionStep::FeatureName)
        );
    }

    #[test]
    fn test_first_incomplete_on_fresh_run() {
        let flow = WizardFlow::new(ctx(), Destination::FIRST);
        assert_eq!(flow.first_incomplete(), Destination::FIRST);
    }
}
