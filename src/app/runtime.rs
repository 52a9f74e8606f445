//! TUI runtime for featurewiz

use crate::app::messages::BackgroundMessage;
use crate::app::{background, input, RuntimeContext};
use crate::session::SessionStore;
use crate::suggest::SuggestionClient;
use crate::ui;
use crate::ui::App;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::sync::mpsc;
use std::time::Duration;
use tracing::info;

/// Run the wizard until the user quits
pub async fn run_tui(mut app: App, store: SessionStore, client: SuggestionClient) -> Result<App> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel::<BackgroundMessage>();
    let ctx = RuntimeContext {
        store: &store,
        client: &client,
        tx: &tx,
    };

    if app.current().is_terminal() {
        background::spawn_feature_doc_load(&ctx, &mut app);
    }

    info!(
        session_id = %app.flow.ctx.session_id,
        route = app.current().route(),
        "wizard started"
    );
    let result = run_loop(&mut terminal, &mut app, &rx, &ctx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result.map(|()| app)
}

/// Main event loop with background message handling
fn run_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: &mpsc::Receiver<BackgroundMessage>,
    ctx: &RuntimeContext,
) -> Result<()> {
    loop {
        app.clear_expired_toast();
        app.tick_loading();

        // Check for background messages (non-blocking)
        background::drain_messages(app, rx, ctx);

        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                input::handle_key_event(app, key, ctx)?;
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
