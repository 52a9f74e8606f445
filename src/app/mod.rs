pub mod background;
pub mod input;
pub mod messages;
pub mod runtime;

pub use messages::BackgroundMessage;
pub use runtime::run_tui;

use crate::session::SessionStore;
use crate::suggest::SuggestionClient;
use std::sync::mpsc;

/// Handles the input layer needs to start background work
pub struct RuntimeContext<'a> {
    pub store: &'a SessionStore,
    pub client: &'a SuggestionClient,
    pub tx: &'a mpsc::Sender<BackgroundMessage>,
}
