//! Modals and toasts drawn over the dashboard.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::{centered, theme};
use crate::app::{App, FormField, Overlay, TaskForm};

const SHORTCUTS: &[(&str, &str)] = &[
    ("n", "New task"),
    ("e", "Edit task"),
    ("Enter / x", "Toggle complete"),
    ("d", "Delete task"),
    ("Space", "Select / deselect task"),
    ("a", "Select all / deselect all"),
    ("c / u", "Mark selected complete / incomplete"),
    ("D", "Delete selected"),
    ("J / K", "Move task down / up"),
    ("j / k", "Move cursor"),
    ("r", "Reload"),
    ("L", "Sign out"),
    ("?", "Toggle this help"),
    ("Esc", "Close form or overlay"),
    ("q / Ctrl-C", "Quit"),
];

/// Render whichever overlay is open.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    match &app.overlay {
        Some(Overlay::Form(form)) => render_form(frame, area, form),
        Some(Overlay::ConfirmBulkDelete) => render_confirm(frame, area, &app.confirm_prompt()),
        Some(Overlay::Help) => render_help(frame, area),
        None => {}
    }
}

fn render_form(frame: &mut Frame, area: Rect, form: &TaskForm) {
    let popup = centered(area, 60, 12);
    frame.render_widget(Clear, popup);

    let title = if form.editing.is_some() {
        " Edit task "
    } else {
        " New task "
    };
    let block = Block::default()
        .title(Span::styled(title, theme::panel_title(theme::HIGHLIGHT)))
        .borders(Borders::ALL)
        .border_style(theme::highlighted());
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(1),
        ])
        .split(inner);

    let field_block = |label: &'static str, focused: bool| {
        Block::default()
            .title(label)
            .borders(Borders::ALL)
            .border_style(if focused {
                theme::highlighted()
            } else {
                theme::dimmed()
            })
    };

    frame.render_widget(
        Paragraph::new(form.title.as_str())
            .block(field_block("Title", form.field == FormField::Title)),
        rows[0],
    );
    frame.render_widget(
        Paragraph::new(form.description.as_str())
            .wrap(Wrap { trim: false })
            .block(field_block(
                "Description (optional)",
                form.field == FormField::Description,
            )),
        rows[1],
    );

    let status = if form.submitting {
        Line::from(Span::styled("Saving...", theme::dimmed()))
    } else if let Some(err) = &form.error {
        Line::from(Span::styled(err.as_str(), theme::error()))
    } else {
        Line::default()
    };
    frame.render_widget(Paragraph::new(status), rows[2]);
}

fn render_confirm(frame: &mut Frame, area: Rect, prompt: &str) {
    let popup = centered(area, 44, 5);
    frame.render_widget(Clear, popup);
    let body = Paragraph::new(vec![
        Line::from(Span::styled(prompt, theme::bold())),
        Line::from(Span::styled("This cannot be undone.", theme::dimmed())),
        Line::from(vec![
            Span::styled("y", theme::normal().fg(theme::ERROR)),
            Span::styled(": delete  ", theme::dimmed()),
            Span::styled("n", theme::bold()),
            Span::styled(": cancel", theme::dimmed()),
        ]),
    ])
    .block(
        Block::default()
            .title(" Confirm ")
            .borders(Borders::ALL)
            .border_style(theme::normal().fg(theme::WARNING)),
    );
    frame.render_widget(body, popup);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let height = u16::try_from(SHORTCUTS.len() + 2).unwrap_or(u16::MAX);
    let popup = centered(area, 52, height);
    frame.render_widget(Clear, popup);

    let lines: Vec<Line> = SHORTCUTS
        .iter()
        .map(|(keys, action)| {
            Line::from(vec![
                Span::styled(format!("{keys:>12}"), theme::highlighted()),
                Span::raw("  "),
                Span::styled(*action, theme::normal()),
            ])
        })
        .collect();
    let help = Paragraph::new(lines).block(
        Block::default()
            .title(" Keyboard shortcuts ")
            .borders(Borders::ALL)
            .border_style(theme::highlighted()),
    );
    frame.render_widget(help, popup);
}

/// Render toasts stacked in the top-right corner, newest at the bottom.
pub fn render_toasts(frame: &mut Frame, area: Rect, app: &App) {
    let width = area.width.min(48);
    let mut y = area.y + 1;
    for toast in &app.toasts {
        let note = &toast.notification;
        let height = if note.description.is_some() { 4 } else { 3 };
        if y + height > area.y + area.height {
            break;
        }
        let rect = Rect {
            x: area.x + area.width.saturating_sub(width + 1),
            y,
            width,
            height,
        };

        let color = theme::toast_color(note.kind);
        let mut lines = vec![Line::from(Span::styled(
            note.title.as_str(),
            theme::normal().fg(color),
        ))];
        if let Some(description) = &note.description {
            lines.push(Line::from(Span::styled(description.as_str(), theme::dimmed())));
        }

        frame.render_widget(Clear, rect);
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme::normal().fg(color)),
            ),
            rect,
        );
        y += height;
    }
}
