use crate::app::background::{spawn_feature_doc_load, spawn_generate, spawn_save};
use crate::app::RuntimeContext;
use crate::ui::{App, InputMode, Page, ToastKind};
use crate::wizard::{Destination, StepError, SuggestionStep};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub(super) fn handle_wizard_input(app: &mut App, key: KeyEvent, ctx: &RuntimeContext) -> Result<()> {
    if let InputMode::EditSelection { index } = app.input_mode {
        handle_edit(app, key, index);
        return Ok(());
    }
    // One Next at a time; the page may change when it lands
    if app.saving {
        return Ok(());
    }

    match app.current() {
        Destination::Suggest(step) => handle_step(app, step, key, ctx),
        Destination::Hypothesis => handle_hypothesis(app, key, ctx),
        Destination::ListOfFeatures | Destination::Summary => handle_finished(app, key, ctx),
    }
    Ok(())
}

fn go_back(app: &mut App, ctx: &RuntimeContext) {
    if let Some(dest) = app.flow.back() {
        app.on_page_changed();
        if dest.is_terminal() {
            spawn_feature_doc_load(ctx, app);
        }
    }
}

fn report(app: &mut App, err: StepError) {
    match err {
        StepError::Blocked(label) => app.show_toast(label, ToastKind::Info),
        StepError::InFlight => app.show_toast("Still generating…", ToastKind::Info),
        other => app.show_error(&other.to_string()),
    }
}

fn handle_step(app: &mut App, step: SuggestionStep, key: KeyEvent, ctx: &RuntimeContext) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.move_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_cursor(1),
        KeyCode::Char('g') => {
            let session_id = app.flow.ctx.session_id.clone();
            match app.flow.step_mut(step).begin_generate(&session_id) {
                Ok(ticket) => spawn_generate(ctx, ticket),
                Err(err) => report(app, err),
            }
        }
        KeyCode::Char(' ') => {
            let cursor = app.cursor;
            if let Err(err) = app.flow.step_mut(step).choose(cursor) {
                report(app, err);
            }
        }
        KeyCode::Char('e') => {
            if !app.begin_edit() && app.flow.step(step).config().editable {
                app.show_toast("Choose a name first, then edit it", ToastKind::Info);
            }
        }
        KeyCode::Enter | KeyCode::Char('n') => {
            match app.flow.step(step).prepare_submit(&app.flow.ctx) {
                Ok(ticket) => spawn_save(ctx, app, ticket),
                Err(err) => report(app, err),
            }
        }
        KeyCode::Esc | KeyCode::Char('b') => go_back(app, ctx),
        KeyCode::Char('p') => app.page = Page::Predictor,
        _ => {}
    }
}

fn handle_hypothesis(app: &mut App, key: KeyEvent, ctx: &RuntimeContext) {
    match key.code {
        KeyCode::Enter => match app.flow.hypothesis.prepare_submit(&app.flow.ctx) {
            Ok(ticket) => spawn_save(ctx, app, ticket),
            Err(err) => report(app, err),
        },
        KeyCode::Esc => go_back(app, ctx),
        KeyCode::Backspace => {
            app.flow.hypothesis.text.pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.flow.hypothesis.text.push(c);
        }
        _ => {}
    }
}

fn handle_finished(app: &mut App, key: KeyEvent, ctx: &RuntimeContext) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('r') if !app.feature_doc_loading => spawn_feature_doc_load(ctx, app),
        KeyCode::Esc | KeyCode::Char('b') => go_back(app, ctx),
        KeyCode::Char('p') => app.page = Page::Predictor,
        _ => {}
    }
}

fn handle_edit(app: &mut App, key: KeyEvent, index: usize) {
    match key.code {
        KeyCode::Enter => {
            let text = std::mem::take(&mut app.edit_buffer);
            app.input_mode = InputMode::Normal;
            if let Some(step) = app.flow.current_step_mut() {
                if let Err(err) = step.edit_selected(index, &text) {
                    report(app, err);
                }
            }
        }
        KeyCode::Esc => {
            app.edit_buffer.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            app.edit_buffer.pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.edit_buffer.push(c);
        }
        _ => {}
    }
}
