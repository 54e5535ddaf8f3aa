//! Colours and text styles shared by the auth screen and the dashboard.

use ratatui::style::{Color, Modifier, Style};

use crate::tasks::NotificationKind;

/// Body text.
pub const TEXT: Color = Color::White;

/// Hints, descriptions and completed tasks.
pub const TEXT_MUTED: Color = Color::Gray;

/// Focused input, cursor row and active borders.
pub const HIGHLIGHT: Color = Color::Cyan;

/// Success toasts and the signed-in dot.
pub const SUCCESS: Color = Color::Green;

/// Signed-out dot and the bulk-delete prompt.
pub const WARNING: Color = Color::Yellow;

/// Failure toasts and inline errors.
pub const ERROR: Color = Color::Red;

/// Marker in front of multi-selected rows.
pub const SELECTED_MARK: Color = Color::LightMagenta;

/// Title of the task list block.
pub const TASKS_TITLE: Color = Color::Green;

const STATUS_BAR_BG: Color = Color::Rgb(30, 30, 50);

#[must_use]
pub fn normal() -> Style {
    Style::default().fg(TEXT)
}

#[must_use]
pub fn dimmed() -> Style {
    Style::default().fg(TEXT_MUTED)
}

#[must_use]
pub fn bold() -> Style {
    normal().add_modifier(Modifier::BOLD)
}

/// Focused form field or border.
#[must_use]
pub fn highlighted() -> Style {
    Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

/// Row under the cursor.
#[must_use]
pub fn selected() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

/// Title of a completed task: muted and struck through.
#[must_use]
pub fn completed() -> Style {
    dimmed().add_modifier(Modifier::CROSSED_OUT)
}

#[must_use]
pub fn error() -> Style {
    Style::default().fg(ERROR)
}

#[must_use]
pub fn status_bar_bg() -> Style {
    Style::default().fg(TEXT).bg(STATUS_BAR_BG)
}

/// Bold block title in `color`.
#[must_use]
pub fn panel_title(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Border and title colour of a toast.
#[must_use]
pub const fn toast_color(kind: NotificationKind) -> Color {
    match kind {
        NotificationKind::Success => SUCCESS,
        NotificationKind::Error => ERROR,
    }
}
