use crate::session::FieldValue;
use crate::ui::theme::Theme;
use crate::ui::{App, InputMode};
use crate::wizard::{Destination, RequestState, StepController};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph, Wrap},
    Frame,
};

pub(super) fn render_main(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Theme::border())
        .padding(Padding::horizontal(2))
        .title(Span::styled(
            format!(" {} ", app.current().label()),
            Theme::title(),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match app.current() {
        Destination::Suggest(step) => render_step(frame, inner, app, app.flow.step(step)),
        Destination::Hypothesis => render_hypothesis(frame, inner, app),
        Destination::ListOfFeatures | Destination::Summary => render_finished(frame, inner, app),
    }
}

fn render_step(frame: &mut Frame, area: Rect, app: &App, step: &StepController) {
    let config = step.config();
    let selected_rows = step.selection().len().max(1) as u16 + 1;
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                 // title + hint
            Constraint::Min(3),                    // suggestions
            Constraint::Length(selected_rows + 1), // current selection
            Constraint::Length(2),                 // status
        ])
        .split(area);

    let mut title = vec![
        Line::from(""),
        Line::from(Span::styled(config.title, Theme::bold())),
    ];
    if let Some(hint) = config.hint {
        title.push(Line::from(Span::styled(hint, Theme::text_dim())));
    }
    frame.render_widget(Paragraph::new(title), layout[0]);

    match step.state() {
        RequestState::Idle => {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    "Press g to generate suggestions",
                    Theme::text_muted(),
                ))),
                layout[1],
            );
        }
        RequestState::Loading { .. } => {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    format!("{} Generating…", app.spinner()),
                    Theme::text_muted(),
                ))),
                layout[1],
            );
        }
        RequestState::Error(message) => {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(message.as_str(), Theme::error())))
                    .wrap(Wrap { trim: true }),
                layout[1],
            );
        }
        RequestState::Loaded(items) => {
            let rows: Vec<ListItem> = items
                .iter()
                .map(|suggestion| {
                    let marker = if step.is_selected(suggestion) {
                        Theme::BULLET_FILLED
                    } else {
                        Theme::BULLET_EMPTY
                    };
                    ListItem::new(Line::from(vec![
                        Span::styled(format!("{} ", marker), Theme::text_muted()),
                        Span::styled(step.display(&suggestion.raw), Theme::text()),
                    ]))
                })
                .collect();
            let list = List::new(rows)
                .highlight_style(Theme::selected())
                .highlight_symbol("▸ ");
            let mut state = ListState::default();
            state.select(Some(app.cursor));
            frame.render_stateful_widget(list, layout[1], &mut state);
        }
    }

    let mut chosen = vec![Line::from(Span::styled(
        format!("Chosen ({})", step.selection().len()),
        Theme::text_muted(),
    ))];
    match &app.input_mode {
        InputMode::EditSelection { .. } => chosen.push(Line::from(vec![
            Span::styled(format!("  {} ", Theme::ARROW_RIGHT), Theme::text_muted()),
            Span::styled(app.edit_buffer.as_str(), Theme::bold()),
            Span::styled("█", Style::default().fg(Theme::GREY_300)),
        ])),
        InputMode::Normal if step.selection().is_empty() => {
            chosen.push(Line::from(Span::styled("  nothing yet", Theme::text_dim())));
        }
        InputMode::Normal => {
            for item in step.selection().items() {
                chosen.push(Line::from(vec![
                    Span::styled(format!("  {} ", Theme::CHECK_MARK), Style::default().fg(Theme::GREEN)),
                    Span::styled(step.display(item), Theme::text()),
                ]));
            }
        }
    }
    frame.render_widget(Paragraph::new(chosen), layout[2]);

    render_status(frame, layout[3], app, step.save_error());
}

fn render_hypothesis(frame: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "What do you believe this feature will change, and for whom?",
            Theme::bold(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(app.flow.hypothesis.text.as_str(), Theme::text()),
            Span::styled("█", Style::default().fg(Theme::GREY_300)),
        ]),
    ];
    if let Some(err) = app.flow.hypothesis.save_error() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(err, Theme::error())));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_finished(frame: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![Line::from("")];
    if app.current() == Destination::Summary {
        lines.push(Line::from(Span::styled(
            "Here's what you put together. Sign in to keep it with your account.",
            Theme::bold(),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "Saved to your features.",
            Theme::bold(),
        )));
    }
    lines.push(Line::from(""));

    if app.feature_doc_loading {
        lines.push(Line::from(Span::styled(
            format!("{} Loading…", app.spinner()),
            Theme::text_muted(),
        )));
    } else if let Some(doc) = &app.feature_doc {
        for (key, value) in &doc.fields {
            lines.push(Line::from(Span::styled(key.as_str(), Theme::text_muted())));
            match value {
                FieldValue::Text(text) => {
                    lines.push(Line::from(Span::styled(format!("  {}", text), Theme::text())))
                }
                FieldValue::List(items) => {
                    for item in items {
                        lines.push(Line::from(Span::styled(
                            format!("  {} {}", Theme::BULLET_FILLED, item),
                            Theme::text(),
                        )));
                    }
                }
            }
        }
    } else {
        lines.push(Line::from(Span::styled(
            "Nothing saved for this run yet.",
            Theme::text_dim(),
        )));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_status(frame: &mut Frame, area: Rect, app: &App, save_error: Option<&str>) {
    let line = if app.saving {
        Line::from(Span::styled(
            format!("{} Saving…", app.spinner()),
            Theme::text_muted(),
        ))
    } else if let Some(err) = save_error {
        Line::from(Span::styled(err, Theme::error()))
    } else {
        Line::from("")
    };
    frame.render_widget(Paragraph::new(line), area);
}
