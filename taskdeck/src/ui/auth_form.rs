//! Sign-in / sign-up screen.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::{centered, theme};
use crate::app::{App, AuthField, AuthMode};

/// Render the auth form centred on the screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let form = &app.auth;
    let fields: &[AuthField] = match form.mode {
        AuthMode::SignIn => &[AuthField::Email, AuthField::Password],
        AuthMode::SignUp => &[AuthField::Name, AuthField::Email, AuthField::Password],
    };

    let height = u16::try_from(fields.len() * 3 + 6).unwrap_or(u16::MAX);
    let popup = centered(area, 50, height);

    let title = match form.mode {
        AuthMode::SignIn => " Sign in ",
        AuthMode::SignUp => " Create account ",
    };
    let block = Block::default()
        .title(Span::styled(title, theme::panel_title(theme::HIGHLIGHT)))
        .borders(Borders::ALL)
        .border_style(theme::highlighted());
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let mut constraints: Vec<Constraint> = fields.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Length(1));
    constraints.push(Constraint::Min(1));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (field, row) in fields.iter().zip(rows.iter()) {
        let (label, value) = match field {
            AuthField::Name => ("Name", form.name.clone()),
            AuthField::Email => ("Email", form.email.clone()),
            AuthField::Password => ("Password", "*".repeat(form.password.chars().count())),
        };
        let focused = *field == form.field;
        let input = Paragraph::new(value).block(
            Block::default()
                .title(label)
                .borders(Borders::ALL)
                .border_style(if focused {
                    theme::highlighted()
                } else {
                    theme::dimmed()
                }),
        );
        frame.render_widget(input, *row);
    }

    let status = if form.submitting {
        Line::from(Span::styled("Please wait...", theme::dimmed()))
    } else if let Some(err) = &form.error {
        Line::from(Span::styled(err.as_str(), theme::error()))
    } else {
        Line::default()
    };
    frame.render_widget(Paragraph::new(status), rows[fields.len()]);

    let switch = match form.mode {
        AuthMode::SignIn => "No account? Ctrl-T to sign up",
        AuthMode::SignUp => "Have an account? Ctrl-T to sign in",
    };
    let hint = Line::from(vec![
        Span::styled("Tab", theme::bold()),
        Span::styled(": next field | ", theme::dimmed()),
        Span::styled("Enter", theme::bold()),
        Span::styled(": submit | ", theme::dimmed()),
        Span::styled(switch, theme::dimmed()),
    ]);
    frame.render_widget(Paragraph::new(hint), rows[fields.len() + 1]);
}
