//! Dashboard task list rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use super::theme;
use crate::app::App;
use crate::tasks::count_label;

/// Render the header line: user, task count and selection count.
pub fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let snapshot = &app.snapshot;
    let mut spans = vec![
        Span::styled("Taskdeck", theme::bold()),
        Span::raw("  "),
        Span::raw(count_label(snapshot.tasks.len())),
    ];
    if !snapshot.selected.is_empty() {
        spans.push(Span::styled(
            format!(" \u{2022} {} selected", snapshot.selected.len()),
            theme::normal().fg(theme::SELECTED_MARK),
        ));
    }
    if let Some(user) = &app.user {
        spans.push(Span::styled(format!("  ({})", user.name), theme::dimmed()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the task list, or its loading / error / empty state.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let snapshot = &app.snapshot;
    let block = Block::default()
        .title(Span::styled("Tasks", theme::panel_title(theme::TASKS_TITLE)))
        .borders(Borders::ALL)
        .border_style(theme::normal());

    if snapshot.tasks.is_empty() {
        let message = if snapshot.loading {
            Line::from(Span::styled("Loading tasks...", theme::dimmed()))
        } else if let Some(err) = &snapshot.last_error {
            Line::from(vec![
                Span::styled(format!("Failed to load tasks: {err}"), theme::error()),
                Span::styled("  (r to retry)", theme::dimmed()),
            ])
        } else {
            Line::from(Span::styled(
                "No tasks yet. Press n to create one.",
                theme::dimmed(),
            ))
        };
        let body = Paragraph::new(message).block(block).wrap(Wrap { trim: true });
        frame.render_widget(body, area);
        return;
    }

    let items: Vec<ListItem> = snapshot
        .tasks
        .iter()
        .map(|task| {
            let checkbox = if task.is_completed { "[\u{2713}]" } else { "[ ]" };
            let marker = if snapshot.selected.contains(&task.id) {
                Span::styled("\u{25cf} ", theme::normal().fg(theme::SELECTED_MARK))
            } else {
                Span::raw("  ")
            };
            let title_style = if task.is_completed {
                theme::completed()
            } else {
                theme::normal()
            };

            let mut spans = vec![
                marker,
                Span::styled(checkbox, title_style),
                Span::raw(" "),
                Span::styled(task.title.as_str(), title_style),
            ];
            if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
                spans.push(Span::styled(format!("  {description}"), theme::dimmed()));
            }
            if let Some(created) = task.created_at {
                spans.push(Span::styled(
                    format!("  {}", created.format("%Y-%m-%d")),
                    theme::dimmed(),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(theme::selected());
    let mut state = ListState::default().with_selected(Some(app.cursor));
    frame.render_stateful_widget(list, area, &mut state);

    if snapshot.loading {
        let hint = Rect {
            y: area.y,
            x: area.x + area.width.saturating_sub(14),
            width: area.width.min(12),
            height: 1,
        };
        frame.render_widget(Paragraph::new(Span::styled("Loading...", theme::dimmed())), hint);
    }
}
