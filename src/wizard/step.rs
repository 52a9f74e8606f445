//! One suggestion step: Generate, Select, Next
//!
//! The controller is split so the TUI can hand the slow part to a background
//! task: [`StepController::begin_generate`] hands out a [`GenerateTicket`],
//! [`run_ticket`] performs the reads and the HTTP call, and
//! [`StepController::complete_generate`] applies the outcome if it is still
//! wanted.

use super::navigator::{next_button, next_route, NextButton, RouteDecision};
use super::state::RequestState;
use super::{Destination, PersistTarget, StepConfig, SuggestionStep};
use crate::selection::{SelectionError, SelectionSet};
use crate::session::{
    AuthState, Document, DocumentPath, FieldValue, Fields, SessionContext, SessionField,
    SessionStore, StoreError,
};
use crate::suggest::{GenerateOutcome, Suggestion, SuggestionClient};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum StepError {
    #[error("A request is already in progress")]
    InFlight,

    #[error("{0}")]
    Blocked(&'static str),

    #[error("No suggestion at position {0}")]
    NoSuchSuggestion(usize),

    #[error("{0} cannot be edited")]
    NotEditable(&'static str),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("Couldn't save your choices: {0}")]
    Store(#[from] StoreError),
}

/// Everything a background task needs to perform one Generate
#[derive(Debug, Clone)]
pub struct GenerateTicket {
    pub step: SuggestionStep,
    pub request_id: u64,
    pub session_id: String,
    pub endpoint: &'static str,
    pub inputs: &'static [SessionField],
    pub failure_message: &'static str,
}

/// Read the prompt fields and call the endpoint.
///
/// Never fails: anything that goes wrong becomes the step's failure message.
pub async fn run_ticket(
    ticket: &GenerateTicket,
    store: &SessionStore,
    client: &SuggestionClient,
) -> GenerateOutcome {
    let fields = match store.get_fields(&ticket.session_id, ticket.inputs).await {
        Ok(fields) => fields,
        Err(err) => {
            warn!(endpoint = ticket.endpoint, error = %err, "couldn't read session fields");
            return GenerateOutcome::Error(ticket.failure_message.to_string());
        }
    };
    match client.generate(ticket.endpoint, &fields).await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(endpoint = ticket.endpoint, error = %err, "suggestion request failed");
            GenerateOutcome::Error(ticket.failure_message.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepController {
    config: StepConfig,
    state: RequestState,
    selection: SelectionSet,
    next_request_id: u64,
    /// Last persistence failure, shown inline until the next attempt
    save_error: Option<String>,
}

impl StepController {
    pub fn new(step: SuggestionStep) -> Self {
        let config = step.config();
        Self {
            selection: SelectionSet::new(config.mode),
            config,
            state: RequestState::Idle,
            next_request_id: 1,
            save_error: None,
        }
    }

    pub fn config(&self) -> &StepConfig {
        &self.config
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        self.state.suggestions()
    }

    pub fn save_error(&self) -> Option<&str> {
        self.save_error.as_deref()
    }

    pub fn display(&self, raw: &str) -> String {
        crate::suggest::normalize(raw, self.config.policy)
    }

    pub fn is_selected(&self, suggestion: &Suggestion) -> bool {
        self.selection.contains(&suggestion.raw)
    }

    /// Start a Generate. Rejected while one is already in flight.
    pub fn begin_generate(&mut self, session_id: &str) -> Result<GenerateTicket, StepError> {
        let request_id = self.next_request_id;
        if !self.state.begin(request_id) {
            return Err(StepError::InFlight);
        }
        self.next_request_id += 1;
        debug!(step = ?self.config.step, request_id, "generate started");
        Ok(GenerateTicket {
            step: self.config.step,
            request_id,
            session_id: session_id.to_string(),
            endpoint: self.config.endpoint,
            inputs: self.config.inputs,
            failure_message: self.config.failure_message,
        })
    }

    /// Apply a finished Generate. Returns false when the response was stale.
    pub fn complete_generate(&mut self, request_id: u64, outcome: GenerateOutcome) -> bool {
        let applied = self.state.finish(request_id, outcome);
        if !applied {
            debug!(step = ?self.config.step, request_id, "discarding stale response");
        }
        applied
    }

    /// The user left the page; whatever is in flight no longer matters
    pub fn abandon_request(&mut self) {
        self.state.abandon();
    }

    /// Generate and wait for the result in one call
    pub async fn generate(
        &mut self,
        session_id: &str,
        store: &SessionStore,
        client: &SuggestionClient,
    ) -> Result<&RequestState, StepError> {
        let ticket = self.begin_generate(session_id)?;
        let outcome = run_ticket(&ticket, store, client).await;
        self.complete_generate(ticket.request_id, outcome);
        Ok(&self.state)
    }

    /// Click on the suggestion at `index` of the current list
    pub fn choose(&mut self, index: usize) -> Result<(), StepError> {
        let raw = self
            .suggestions()
            .get(index)
            .map(|s| s.raw.clone())
            .ok_or(StepError::NoSuchSuggestion(index))?;
        self.selection.select(&raw);
        Ok(())
    }

    /// Rewrite a selected entry; only steps marked editable allow it
    pub fn edit_selected(&mut self, index: usize, text: &str) -> Result<(), StepError> {
        if !self.config.editable {
            return Err(StepError::NotEditable(self.config.step.label()));
        }
        self.selection.edit_at(index, text)?;
        Ok(())
    }

    pub fn is_blocked(&self) -> bool {
        self.selection.is_blocked(self.config.policy)
    }

    pub fn next_button(&self) -> NextButton {
        next_button(self.config.proceed, self.is_blocked())
    }

    pub fn persist_path(&self, ctx: &SessionContext) -> DocumentPath {
        match self.config.persist_to {
            PersistTarget::SessionRecord => ctx.session_record(),
            PersistTarget::FeatureDocument => ctx.feature_document(),
        }
    }

    pub fn persist_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(
            self.config.persist_field.to_string(),
            FieldValue::List(self.selection.items().to_vec()),
        );
        fields
    }

    /// Take back a selection saved by an earlier run
    pub fn restore_from(&mut self, doc: &Document) -> bool {
        match doc.fields.get(self.config.persist_field) {
            Some(value) => {
                self.selection.restore(value.as_list());
                true
            }
            None => false,
        }
    }

    /// Check the Next button and package the write
    pub fn prepare_submit(&self, ctx: &SessionContext) -> Result<SaveTicket, StepError> {
        let button = self.next_button();
        if !button.enabled {
            return Err(StepError::Blocked(button.label));
        }
        Ok(SaveTicket {
            from: Destination::Suggest(self.config.step),
            path: self.persist_path(ctx),
            fields: self.persist_fields(),
        })
    }

    /// Record how the write went and pick the successor from `auth` as it is now
    pub fn finish_submit(
        &mut self,
        ticket: &SaveTicket,
        result: Result<(), StoreError>,
        auth: &AuthState,
    ) -> Result<RouteDecision, StepError> {
        if let Err(err) = result {
            warn!(step = ?self.config.step, path = %ticket.path, error = %err, "couldn't persist selection");
            self.save_error = Some(err.to_string());
            return Err(err.into());
        }
        self.save_error = None;
        info!(
            step = ?self.config.step,
            path = %ticket.path,
            count = self.selection.len(),
            "selection saved"
        );
        Ok(ticket.route(auth))
    }

    /// Save the selection and decide where to go.
    ///
    /// A failed write keeps the user on the page with the error recorded.
    pub async fn submit(
        &mut self,
        ctx: &SessionContext,
        store: &SessionStore,
    ) -> Result<RouteDecision, StepError> {
        let ticket = self.prepare_submit(ctx)?;
        let result = ticket.run(store).await;
        self.finish_submit(&ticket, result, &ctx.auth)
    }
}

/// A pending Next: which page it leaves and what it writes
#[derive(Debug, Clone)]
pub struct SaveTicket {
    pub from: Destination,
    pub path: DocumentPath,
    pub fields: Fields,
}

impl SaveTicket {
    pub async fn run(&self, store: &SessionStore) -> Result<(), StoreError> {
        store.merge_fields(&self.path, self.fields.clone()).await
    }

    fn route(&self, auth: &AuthState) -> RouteDecision {
        next_route(self.from, auth).unwrap_or(RouteDecision::Fixed(Destination::Summary))
    }
}

impl SuggestionStep {
    pub fn label(&self) -> &'static str {
        Destination::Suggest(*self).label()
    }
}

/// Free-text page between data elements and marketing material
#[derive(Debug, Clone, Default)]
pub struct HypothesisForm {
    pub text: String,
    save_error: Option<String>,
}

impl HypothesisForm {
    pub fn is_blocked(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn next_button(&self) -> NextButton {
        next_button(
            super::ProceedRule::Required {
                blocked_label: "Hypothesis Required",
            },
            self.is_blocked(),
        )
    }

    pub fn save_error(&self) -> Option<&str> {
        self.save_error.as_deref()
    }

    pub fn restore_from(&mut self, doc: &Document) {
        if let Some(value) = doc.fields.get(SessionField::Hypothesis.key()) {
            self.text = value.as_text();
        }
    }

    pub fn prepare_submit(&self, ctx: &SessionContext) -> Result<SaveTicket, StepError> {
        let button = self.next_button();
        if !button.enabled {
            return Err(StepError::Blocked(button.label));
        }
        let mut fields = Fields::new();
        fields.insert(
            SessionField::Hypothesis.key().to_string(),
            FieldValue::Text(self.text.clone()),
        );
        Ok(SaveTicket {
            from: Destination::Hypothesis,
            path: ctx.session_record(),
            fields,
        })
    }

    pub fn finish_submit(
        &mut self,
        ticket: &SaveTicket,
        result: Result<(), StoreError>,
        auth: &AuthState,
    ) -> Result<RouteDecision, StepError> {
        if let Err(err) = result {
            warn!(path = %ticket.path, error = %err, "couldn't persist hypothesis");
            self.save_error = Some(err.to_string());
            return Err(err.into());
        }
        self.save_error = None;
        Ok(ticket.route(auth))
    }

    /// Write `hypothesis` to the session record so later prompts can use it
    pub async fn submit(
        &mut self,
        ctx: &SessionContext,
        store: &SessionStore,
    ) -> Result<RouteDecision, StepError> {
        let ticket = self.prepare_submit(ctx)?;
        let result = ticket.run(store).await;
        self.finish_submit(&ticket, result, &ctx.auth)
    }
}
