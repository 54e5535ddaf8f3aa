//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::{App, Overlay, Screen};

/// Render the status bar at the bottom of the screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let help_text = match (app.screen, &app.overlay) {
        (Screen::Auth, _) => "Tab: next field | Enter: submit | Ctrl-T: switch mode | Esc: quit",
        (Screen::Dashboard, Some(Overlay::Form(_))) => {
            "Tab: switch field | Enter: save | Esc: cancel"
        }
        (Screen::Dashboard, Some(Overlay::ConfirmBulkDelete)) => "y: delete | n/Esc: cancel",
        (Screen::Dashboard, Some(Overlay::Help)) => "Esc: close",
        (Screen::Dashboard, None) => {
            "n: new | e: edit | x: done | d: delete | Space: select | ?: help | q: quit"
        }
    };

    let (dot_color, status_text) = match &app.user {
        Some(user) => (theme::SUCCESS, format!("Signed in as {}", user.email)),
        None => (theme::WARNING, "Signed out".to_string()),
    };

    let status_line = Line::from(vec![
        Span::styled(concat!("Taskdeck v", env!("CARGO_PKG_VERSION")), theme::bold()),
        Span::raw(" | "),
        Span::styled("\u{25cf}", theme::normal().fg(dot_color)),
        Span::raw(format!(" {status_text}")),
        Span::raw(" | "),
        Span::styled(help_text, theme::dimmed()),
    ]);

    let paragraph = Paragraph::new(status_line).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}
