use crate::ui::theme::Theme;
use crate::ui::{App, InputMode, Page};
use crate::wizard::Destination;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

fn hint<'a>(spans: &mut Vec<Span<'a>>, key: &'a str, label: &'a str) {
    spans.push(Span::styled(format!(" {} ", key), Theme::key()));
    spans.push(Span::styled(format!(" {} ", label), Theme::text_dim()));
}

pub(super) fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled("  ", Style::default())];

    match (app.page, &app.input_mode) {
        (Page::Predictor, _) => {
            hint(&mut spans, "Tab", "field");
            spans.push(Span::styled(" ↵ ", Theme::key_primary()));
            spans.push(Span::styled(" predict ", Theme::text_muted()));
            hint(&mut spans, "^W", "join waitlist");
            hint(&mut spans, "^R", "reset");
            hint(&mut spans, "Esc", "wizard");
        }
        (Page::Wizard, InputMode::EditSelection { .. }) => {
            spans.push(Span::styled(" ↵ ", Theme::key_primary()));
            spans.push(Span::styled(" save name ", Theme::text_muted()));
            hint(&mut spans, "Esc", "cancel");
        }
        (Page::Wizard, InputMode::Normal) => match app.current() {
            Destination::Suggest(step) => {
                hint(&mut spans, "g", "generate");
                hint(&mut spans, "␣", "choose");
                if app.flow.step(step).config().editable {
                    hint(&mut spans, "e", "edit");
                }
                if app.flow.can_go_back() {
                    hint(&mut spans, "Esc", "back");
                }
                hint(&mut spans, "p", "predictor");
                hint(&mut spans, "q", "quit");
            }
            Destination::Hypothesis => {
                if app.flow.can_go_back() {
                    hint(&mut spans, "Esc", "back");
                }
                hint(&mut spans, "^C", "quit");
            }
            Destination::ListOfFeatures | Destination::Summary => {
                hint(&mut spans, "r", "reload");
                if app.flow.can_go_back() {
                    hint(&mut spans, "Esc", "back");
                }
                hint(&mut spans, "p", "predictor");
                hint(&mut spans, "q", "quit");
            }
        },
    }

    if app.page == Page::Wizard && app.input_mode == InputMode::Normal {
        if let Some(button) = app.next_button() {
            spans.push(Span::styled("   ", Style::default()));
            if button.enabled {
                spans.push(Span::styled(" ↵ ", Theme::key_primary()));
                spans.push(Span::styled(format!(" {} ", button.label), Theme::bold()));
            } else {
                spans.push(Span::styled(
                    format!(" {} ", button.label),
                    Style::default().fg(Theme::GREY_400).bg(Theme::GREY_700),
                ));
            }
        }
    }

    let footer = Paragraph::new(vec![Line::from(""), Line::from(spans)])
        .style(Style::default().bg(Theme::BG));
    frame.render_widget(footer, area);
}
