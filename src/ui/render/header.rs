use crate::ui::theme::Theme;
use crate::ui::{App, Page};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub(super) fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let location = match app.page {
        Page::Wizard => app.current().label(),
        Page::Predictor => "Salary predictor",
    };

    let spans = vec![
        Span::styled(
            format!("   {}", Theme::LOGO),
            Style::default()
                .fg(Theme::WHITE)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(location, Theme::text_muted()),
        Span::styled(
            format!("   {} · {}", app.flow.ctx.auth.label(), app.store_label),
            Theme::text_dim(),
        ),
    ];

    let lines = vec![Line::from(""), Line::from(spans)];

    let header = Paragraph::new(lines).style(Style::default().bg(Theme::BG));
    frame.render_widget(header, area);
}
