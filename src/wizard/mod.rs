//! Wizard step definitions
//!
//! ```text
//! DataElements ─▶ Hypothesis ─▶ MarketingMaterial ─▶ FeatureName ─┬▶ ListOfFeatures
//!                                                                 └▶ Summary (guest)
//! ```
//!
//! Every suggestion step follows the same Generate → Select → Next lifecycle;
//! what differs between them is data, captured in [`StepConfig`].

pub mod flow;
pub mod navigator;
pub mod state;
pub mod step;

pub use flow::WizardFlow;
pub use navigator::{next_button, next_route, Navigator, NextButton, RouteDecision};
pub use state::RequestState;
pub use step::{run_ticket, GenerateTicket, HypothesisForm, SaveTicket, StepController, StepError};

use crate::selection::SelectMode;
use crate::session::SessionField;
use crate::suggest::NormalizePolicy;

pub const DEFAULT_FAILURE_MESSAGE: &str = "Please generate responses again";

/// Steps that call the ML API for suggestions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SuggestionStep {
    DataElements,
    MarketingMaterial,
    FeatureName,
}

impl SuggestionStep {
    pub const ALL: [SuggestionStep; 3] = [
        SuggestionStep::DataElements,
        SuggestionStep::MarketingMaterial,
        SuggestionStep::FeatureName,
    ];

    pub fn config(&self) -> StepConfig {
        match self {
            SuggestionStep::DataElements => StepConfig {
                step: *self,
                title: "Generate the data elements that matter for measuring this feature",
                endpoint: "/dataElements",
                inputs: &[
                    SessionField::FinalProblemStatement,
                    SessionField::AcceptanceCriteria,
                    SessionField::TargetCustomer,
                ],
                mode: SelectMode::Multi,
                policy: NormalizePolicy::LeadingDashes,
                persist_field: "dataElements",
                persist_to: PersistTarget::SessionRecord,
                proceed: ProceedRule::Always,
                editable: false,
                failure_message: "Failed to get AI response.",
                hint: None,
            },
            SuggestionStep::MarketingMaterial => StepConfig {
                step: *self,
                title: "Generate marketing material for this feature",
                endpoint: "/marketing-material",
                inputs: &[
                    SessionField::FinalProblemStatement,
                    SessionField::TargetCustomer,
                    SessionField::MarketSize,
                    SessionField::Hypothesis,
                ],
                mode: SelectMode::Multi,
                policy: NormalizePolicy::AllDashes,
                persist_field: "marketingMaterial",
                persist_to: PersistTarget::FeatureDocument,
                proceed: ProceedRule::Optional,
                editable: false,
                failure_message: DEFAULT_FAILURE_MESSAGE,
                hint: Some("You can add items then generate again to add more"),
            },
            SuggestionStep::FeatureName => StepConfig {
                step: *self,
                title: "Finally, generate a feature name",
                endpoint: "/feature-name",
                inputs: &[
                    SessionField::FinalProblemStatement,
                    SessionField::TargetCustomer,
                    SessionField::Hypothesis,
                ],
                mode: SelectMode::Single,
                policy: NormalizePolicy::AllDashes,
                persist_field: "featureName",
                persist_to: PersistTarget::FeatureDocument,
                proceed: ProceedRule::Required {
                    blocked_label: "Feature Name Required",
                },
                editable: true,
                failure_message: DEFAULT_FAILURE_MESSAGE,
                hint: None,
            },
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().replace(['-', '_'], "").as_str() {
            "dataelements" | "data" => Some(SuggestionStep::DataElements),
            "marketingmaterial" | "marketing" => Some(SuggestionStep::MarketingMaterial),
            "featurename" | "name" => Some(SuggestionStep::FeatureName),
            _ => None,
        }
    }
}

/// Where a step's selection is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistTarget {
    /// `features/{documentId}`, alongside the session fields
    SessionRecord,
    /// `users/{uid}/feature/{documentId}` when a uid is known
    FeatureDocument,
}

/// How the Next button reacts to an empty or blank selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProceedRule {
    /// Always labelled "Next"
    Always,
    /// "Skip" until something is chosen
    Optional,
    /// Disabled with `blocked_label` until something is chosen
    Required { blocked_label: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepConfig {
    pub step: SuggestionStep,
    pub title: &'static str,
    pub endpoint: &'static str,
    /// Session fields joined into the prompt, in order
    pub inputs: &'static [SessionField],
    pub mode: SelectMode,
    pub policy: NormalizePolicy,
    pub persist_field: &'static str,
    pub persist_to: PersistTarget,
    pub proceed: ProceedRule,
    /// Selected entries can be rewritten by the user
    pub editable: bool,
    /// Shown when the request itself fails
    pub failure_message: &'static str,
    pub hint: Option<&'static str>,
}

/// Every page the wizard can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    Suggest(SuggestionStep),
    Hypothesis,
    ListOfFeatures,
    Summary,
}

impl Destination {
    pub const FIRST: Destination = Destination::Suggest(SuggestionStep::DataElements);

    /// Route path the web front end used for this page
    pub fn route(&self) -> &'static str {
        match self {
            Destination::Suggest(SuggestionStep::DataElements) => "/dataElements",
            Destination::Suggest(SuggestionStep::MarketingMaterial) => "/marketingMaterial",
            Destination::Suggest(SuggestionStep::FeatureName) => "/featureName",
            Destination::Hypothesis => "/hypothesis",
            Destination::ListOfFeatures => "/listOfFeatures",
            Destination::Summary => "/summary",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Destination::Suggest(SuggestionStep::DataElements) => "Data elements",
            Destination::Suggest(SuggestionStep::MarketingMaterial) => "Marketing material",
            Destination::Suggest(SuggestionStep::FeatureName) => "Feature name",
            Destination::Hypothesis => "Hypothesis",
            Destination::ListOfFeatures => "Your features",
            Destination::Summary => "Summary",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Destination::ListOfFeatures | Destination::Summary)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(step) = SuggestionStep::from_name(name) {
            return Some(Destination::Suggest(step));
        }
        match name.to_lowercase().as_str() {
            "hypothesis" => Some(Destination::Hypothesis),
            "summary" => Some(Destination::Summary),
            "features" | "listoffeatures" => Some(Destination::ListOfFeatures),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_configs_match_endpoints() {
        assert_eq!(SuggestionStep::DataElements.config().endpoint, "/dataElements");
        assert_eq!(
            SuggestionStep::MarketingMaterial.config().endpoint,
            "/marketing-material"
        );
        assert_eq!(SuggestionStep::FeatureName.config().endpoint, "/feature-name");
    }

    #[test]
    fn test_feature_name_is_single_select_and_required() {
        let config = SuggestionStep::FeatureName.config();
        assert_eq!(config.mode, SelectMode::Single);
        assert!(config.editable);
        assert!(matches!(config.proceed, ProceedRule::Required { .. }));
    }

    #[test]
    fn test_names_parse() {
        assert_eq!(
            Destination::from_name("feature-name"),
            Some(Destination::Suggest(SuggestionStep::FeatureName))
        );
        assert_eq!(
            Destination::from_name("data_elements"),
            Some(Destination::Suggest(SuggestionStep::DataElements))
        );
        assert_eq!(Destination::from_name("hypothesis"), Some(Destination::Hypothesis));
        assert_eq!(Destination::from_name("bogus"), None);
    }
}
