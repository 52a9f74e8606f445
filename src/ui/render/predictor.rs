use crate::ui::theme::Theme;
use crate::ui::{App, PredictorField};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph},
    Frame,
};

pub(super) fn render_predictor(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Theme::border())
        .padding(Padding::horizontal(2))
        .title(Span::styled(" Salary predictor ", Theme::title()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let form = &app.predictor;
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Predict a salary, and join the waitlist while you're here",
            Theme::bold(),
        )),
        Line::from(""),
    ];

    for (field, value) in [
        (PredictorField::Age, &form.age),
        (PredictorField::Weight, &form.weight),
        (PredictorField::Email, &form.email),
    ] {
        let active = field == app.predictor_field;
        let label_style = if active {
            Theme::bold()
        } else {
            Theme::text_muted()
        };
        let mut spans = vec![
            Span::styled(
                if active {
                    format!("{} ", Theme::ARROW_RIGHT)
                } else {
                    "  ".to_string()
                },
                Theme::text_muted(),
            ),
            Span::styled(format!("{:<8}", field.label()), label_style),
            Span::styled(value.as_str(), Theme::text()),
        ];
        if active {
            spans.push(Span::styled("█", Style::default().fg(Theme::GREY_300)));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    if app.predictor_busy {
        lines.push(Line::from(Span::styled(
            format!("{} Predicting…", app.spinner()),
            Theme::text_muted(),
        )));
    } else if let Some(error) = form.error() {
        lines.push(Line::from(Span::styled(error, Theme::error())));
    } else if let Some(prediction) = form.prediction() {
        lines.push(Line::from(vec![
            Span::styled("Predicted salary  ", Theme::text_muted()),
            Span::styled(prediction, Style::default().fg(Theme::GREEN)),
            Span::styled(" each year", Theme::text_muted()),
        ]));
    }
    if let Some(message) = form.waitlist_message() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            message,
            Style::default().fg(Theme::GREEN),
        )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}
