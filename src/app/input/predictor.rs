use crate::app::background::spawn_predictor;
use crate::app::RuntimeContext;
use crate::ui::{App, Page};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub(super) fn handle_predictor_input(
    app: &mut App,
    key: KeyEvent,
    ctx: &RuntimeContext,
) -> Result<()> {
    if key.code == KeyCode::Esc {
        app.page = Page::Wizard;
        return Ok(());
    }
    // The form is owned by the running task until it reports back
    if app.predictor_busy {
        return Ok(());
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Tab | KeyCode::Down => app.predictor_field = app.predictor_field.next(),
        KeyCode::Enter => spawn_predictor(ctx, app, false),
        KeyCode::Char('w') if ctrl => spawn_predictor(ctx, app, true),
        KeyCode::Char('r') if ctrl => app.predictor.reset(),
        KeyCode::Backspace => {
            app.predictor_input_mut().pop();
        }
        KeyCode::Char(c) if !ctrl => app.predictor_input_mut().push(c),
        _ => {}
    }
    Ok(())
}
