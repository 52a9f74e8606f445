//! Background task handling for featurewiz
//!
//! Every slow operation (ML calls, store reads and writes) runs on a tokio
//! task and reports back through the channel. Sends use `let _ =`: the
//! receiver only disappears on shutdown, when nobody wants the result.

use crate::app::messages::BackgroundMessage;
use crate::app::RuntimeContext;
use crate::session::DocumentPath;
use crate::ui::{App, ToastKind};
use crate::waitlist::PredictionForm;
use crate::wizard::{run_ticket, Destination, GenerateTicket, SaveTicket};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::mpsc;
use tracing::{debug, error};

pub fn drain_messages(app: &mut App, rx: &mpsc::Receiver<BackgroundMessage>, ctx: &RuntimeContext) {
    while let Ok(msg) = rx.try_recv() {
        match msg {
            BackgroundMessage::SuggestionsReady {
                step,
                request_id,
                outcome,
            } => {
                let applied = app.flow.step_mut(step).complete_generate(request_id, outcome);
                if applied && app.current() == Destination::Suggest(step) {
                    app.cursor = 0;
                }
            }
            BackgroundMessage::SaveFinished { ticket, result } => {
                app.saving = false;
                let auth = app.flow.ctx.auth.clone();
                let outcome = match ticket.from {
                    Destination::Suggest(step) => {
                        app.flow.step_mut(step).finish_submit(&ticket, result, &auth)
                    }
                    Destination::Hypothesis => {
                        app.flow.hypothesis.finish_submit(&ticket, result, &auth)
                    }
                    Destination::ListOfFeatures | Destination::Summary => continue,
                };
                match outcome {
                    Ok(decision) if app.current() == ticket.from => {
                        let dest = app.flow.advance(decision);
                        app.on_page_changed();
                        if dest.is_terminal() {
                            spawn_feature_doc_load(ctx, app);
                        }
                    }
                    Ok(_) => debug!(from = ticket.from.route(), "save finished after leaving page"),
                    Err(err) => app.show_error(&err.to_string()),
                }
            }
            BackgroundMessage::FeatureDocLoaded(result) => {
                app.feature_doc_loading = false;
                match result {
                    Ok(doc) => app.feature_doc = doc,
                    Err(err) => app.show_error(&format!("Couldn't load your feature: {}", err)),
                }
            }
            BackgroundMessage::PredictorFinished(form) => {
                app.predictor_busy = false;
                if form.waitlist_message().is_some() && app.predictor.waitlist_message().is_none() {
                    app.show_toast("Joined the waitlist", ToastKind::Success);
                }
                app.predictor = form;
            }
            BackgroundMessage::Error(e) => {
                app.saving = false;
                app.predictor_busy = false;
                app.feature_doc_loading = false;
                app.show_error(&e);
            }
        }
    }
}

pub fn spawn_generate(ctx: &RuntimeContext, ticket: GenerateTicket) {
    let tx = ctx.tx.clone();
    let store = ctx.store.clone();
    let client = ctx.client.clone();
    spawn_background(ctx.tx.clone(), "generate", async move {
        let outcome = run_ticket(&ticket, &store, &client).await;
        let _ = tx.send(BackgroundMessage::SuggestionsReady {
            step: ticket.step,
            request_id: ticket.request_id,
            outcome,
        });
    });
}

pub fn spawn_save(ctx: &RuntimeContext, app: &mut App, ticket: SaveTicket) {
    app.saving = true;
    let tx = ctx.tx.clone();
    let store = ctx.store.clone();
    spawn_background(ctx.tx.clone(), "save", async move {
        let result = ticket.run(&store).await;
        let _ = tx.send(BackgroundMessage::SaveFinished { ticket, result });
    });
}

pub fn spawn_feature_doc_load(ctx: &RuntimeContext, app: &mut App) {
    app.feature_doc_loading = true;
    let path: DocumentPath = app.flow.ctx.feature_document();
    let tx = ctx.tx.clone();
    let store = ctx.store.clone();
    spawn_background(ctx.tx.clone(), "feature_doc", async move {
        let result = store.load_document(&path).await;
        let _ = tx.send(BackgroundMessage::FeatureDocLoaded(result));
    });
}

/// Predict, or (with `join_only`) just sign the email up
pub fn spawn_predictor(ctx: &RuntimeContext, app: &mut App, join_only: bool) {
    app.predictor_busy = true;
    let mut form: PredictionForm = app.predictor.clone();
    let tx = ctx.tx.clone();
    let store = ctx.store.clone();
    let client = ctx.client.clone();
    spawn_background(ctx.tx.clone(), "predictor", async move {
        if join_only {
            form.join(&store).await;
        } else {
            form.submit(&client, &store).await;
        }
        let _ = tx.send(BackgroundMessage::PredictorFinished(form));
    });
}

pub fn spawn_background<F>(tx: mpsc::Sender<BackgroundMessage>, task_name: &'static str, fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
            let detail = if let Some(s) = panic.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_string()
            };
            error!(task_name, %detail, "background task panicked");
            let _ = tx.send(BackgroundMessage::Error(format!(
                "Background task '{}' crashed unexpectedly: {}",
                task_name, detail
            )));
        }
    });
}
