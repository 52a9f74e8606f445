//! Input handling for the featurewiz TUI

use crate::app::RuntimeContext;
use crate::ui::{App, Page};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

mod predictor;
mod wizard;

use predictor::handle_predictor_input;
use wizard::handle_wizard_input;

/// Main key event handler - dispatches to page-specific handlers
pub fn handle_key_event(app: &mut App, key: KeyEvent, ctx: &RuntimeContext) -> Result<()> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return Ok(());
    }

    match app.page {
        Page::Wizard => handle_wizard_input(app, key, ctx),
        Page::Predictor => handle_predictor_input(app, key, ctx),
    }
}
