//! Terminal UI state for featurewiz
//!
//! [`App`] owns the wizard run and everything the screen needs. Rendering
//! lives in [`render`]; key handling is in `crate::app::input`.

pub mod render;
pub mod theme;

pub use render::render;

use crate::session::Document;
use crate::waitlist::PredictionForm;
use crate::wizard::{Destination, NextButton, WizardFlow};
use std::time::Instant;

/// Which screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Wizard,
    Predictor,
}

/// Input mode
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Rewriting the selected entry at `index`
    EditSelection { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredictorField {
    #[default]
    Age,
    Weight,
    Email,
}

impl PredictorField {
    pub fn next(self) -> Self {
        match self {
            PredictorField::Age => PredictorField::Weight,
            PredictorField::Weight => PredictorField::Email,
            PredictorField::Email => PredictorField::Age,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PredictorField::Age => "Age",
            PredictorField::Weight => "Weight",
            PredictorField::Email => "Email",
        }
    }
}

/// Spinner animation frames (braille pattern)
pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Toast notification kind - affects duration and styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Error,
}

impl ToastKind {
    /// Duration in seconds before toast expires
    pub fn duration_secs(&self) -> u64 {
        match self {
            ToastKind::Info => 3,
            ToastKind::Success => 4,
            ToastKind::Error => 8,
        }
    }
}

pub struct Toast {
    pub message: String,
    pub created_at: Instant,
    pub kind: ToastKind,
}

impl Toast {
    pub fn new(message: &str, kind: ToastKind) -> Self {
        Self {
            message: message.to_string(),
            created_at: Instant::now(),
            kind,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed().as_secs() >= self.kind.duration_secs()
    }
}

pub struct App {
    pub flow: WizardFlow,
    pub page: Page,
    pub input_mode: InputMode,
    pub edit_buffer: String,
    /// Highlighted suggestion on the current step
    pub cursor: usize,
    pub predictor: PredictionForm,
    pub predictor_field: PredictorField,
    pub predictor_busy: bool,
    /// A Next is being written
    pub saving: bool,
    /// Contents of the feature document, for the last pages
    pub feature_doc: Option<Document>,
    pub feature_doc_loading: bool,
    /// Where documents are going, for the header
    pub store_label: String,
    pub toast: Option<Toast>,
    pub loading_frame: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(flow: WizardFlow, store_label: impl Into<String>) -> Self {
        Self {
            flow,
            page: Page::Wizard,
            input_mode: InputMode::Normal,
            edit_buffer: String::new(),
            cursor: 0,
            predictor: PredictionForm::default(),
            predictor_field: PredictorField::Age,
            predictor_busy: false,
            saving: false,
            feature_doc: None,
            feature_doc_loading: false,
            store_label: store_label.into(),
            toast: None,
            loading_frame: 0,
            should_quit: false,
        }
    }

    pub fn current(&self) -> Destination {
        self.flow.current()
    }

    pub fn is_busy(&self) -> bool {
        self.saving
            || self.predictor_busy
            || self.feature_doc_loading
            || self
                .flow
                .current_step()
                .is_some_and(|step| step.state().is_loading())
    }

    /// Tick the loading animation
    pub fn tick_loading(&mut self) {
        if self.is_busy() {
            self.loading_frame = self.loading_frame.wrapping_add(1);
        }
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.loading_frame % SPINNER_FRAMES.len()]
    }

    pub fn clear_expired_toast(&mut self) {
        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }
    }

    pub fn show_toast(&mut self, message: &str, kind: ToastKind) {
        self.toast = Some(Toast::new(message, kind));
    }

    pub fn show_error(&mut self, message: &str) {
        self.show_toast(message, ToastKind::Error);
    }

    /// Next button for the current page
    pub fn next_button(&self) -> Option<NextButton> {
        match self.current() {
            Destination::Suggest(step) => Some(self.flow.step(step).next_button()),
            Destination::Hypothesis => Some(self.flow.hypothesis.next_button()),
            Destination::ListOfFeatures | Destination::Summary => None,
        }
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self
            .flow
            .current_step()
            .map(|step| step.suggestions().len())
            .unwrap_or(0);
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, len as isize - 1) as usize;
    }

    /// Called whenever the page changes
    pub fn on_page_changed(&mut self) {
        self.cursor = 0;
        self.input_mode = InputMode::Normal;
        self.edit_buffer.clear();
    }

    /// Start rewriting the selected feature name
    pub fn begin_edit(&mut self) -> bool {
        let Destination::Suggest(step) = self.current() else {
            return false;
        };
        let controller = self.flow.step(step);
        if !controller.config().editable {
            return false;
        }
        let Some(first) = controller.selection().items().first() else {
            return false;
        };
        self.edit_buffer = controller.display(first);
        self.input_mode = InputMode::EditSelection { index: 0 };
        true
    }

    pub fn predictor_input_mut(&mut self) -> &mut String {
        match self.predictor_field {
            PredictorField::Age => &mut self.predictor.age,
            PredictorField::Weight => &mut self.predictor.weight,
            PredictorField::Email => &mut self.predictor.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{AuthState, SessionContext};
    use crate::suggest::{GenerateOutcome, Suggestion};
    use crate::wizard::SuggestionStep;

    fn app_at(dest: Destination) -> App {
        let ctx = SessionContext::new("s", "d", AuthState::SignedOut);
        App::new(WizardFlow::new(ctx, dest), "memory")
    }

    #[test]
    fn test_cursor_clamps_to_suggestions() {
        let mut app = app_at(Destination::FIRST);
        app.move_cursor(1);
        assert_eq!(app.cursor, 0);

        let step = app.flow.step_mut(SuggestionStep::DataElements);
        let ticket = step.begin_generate("s").unwrap();
        step.complete_generate(
            ticket.request_id,
            GenerateOutcome::Items(vec![Suggestion::new("1. -A", 0), Suggestion::new("2. -B", 1)]),
        );
        app.move_cursor(5);
        assert_eq!(app.cursor, 1);
        app.move_cursor(-9);
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn test_edit_only_on_feature_name_with_selection() {
        let mut app = app_at(Destination::Suggest(SuggestionStep::FeatureName));
        assert!(!app.begin_edit());

        let step = app.flow.step_mut(SuggestionStep::FeatureName);
        let ticket = step.begin_generate("s").unwrap();
        step.complete_generate(
            ticket.request_id,
            GenerateOutcome::Items(vec![Suggestion::new("1. -QuickPay", 0)]),
        );
        step.choose(0).unwrap();
        assert!(app.begin_edit());
        assert_eq!(app.edit_buffer, "QuickPay");
        assert_eq!(app.input_mode, InputMode::EditSelection { index: 0 });

        let mut other = app_at(Destination::FIRST);
        assert!(!other.begin_edit());
    }

    #[test]
    fn test_terminal_pages_have_no_next_button() {
        assert!(app_at(Destination::Summary).next_button().is_none());
        assert_eq!(
            app_at(Destination::FIRST).next_button().map(|b| b.label),
            Some("Next")
        );
    }

    #[test]
    fn test_predictor_field_cycles() {
        let mut app = app_at(Destination::FIRST);
        app.predictor_input_mut().push_str("30");
        app.predictor_field = app.predictor_field.next();
        app.predictor_input_mut().push_str("70");
        assert_eq!(app.predictor.age, "30");
        assert_eq!(app.predictor.weight, "70");
        assert_eq!(app.predictor_field.next().next(), PredictorField::Age);
    }
}
