use crate::session::{Document, StoreError};
use crate::suggest::GenerateOutcome;
use crate::waitlist::PredictionForm;
use crate::wizard::{SaveTicket, SuggestionStep};

/// Messages from background tasks to the main UI thread
pub enum BackgroundMessage {
    /// A Generate finished; applied only if `request_id` is still awaited
    SuggestionsReady {
        step: SuggestionStep,
        request_id: u64,
        outcome: GenerateOutcome,
    },
    /// A Next write finished
    SaveFinished {
        ticket: SaveTicket,
        result: Result<(), StoreError>,
    },
    /// Feature document for the last page
    FeatureDocLoaded(Result<Option<Document>, StoreError>),
    /// Predictor form after a predict or a waitlist sign-up
    PredictorFinished(PredictionForm),
    /// Generic error
    Error(String),
}
