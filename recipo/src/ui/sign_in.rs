//! Sign-in modal: email step, then the six-digit code step.
//!
//! Drawn over the panels with `Clear`, like the help overlay.

use ratatui::{
    Frame,
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::app::{AppState, Mode};
use crate::theme::Theme;

pub fn render_sign_in(frame: &mut Frame, state: &AppState, theme: &Theme) {
    if frame.area().width < 40 || frame.area().height < 9 {
        return;
    }
    let area = frame.area().centered(Constraint::Length(52), Constraint::Length(9));
    frame.render_widget(Clear, area);

    let block = Block::bordered()
        .title(" Sign in · Enter to continue, Esc to cancel ")
        .border_style(Style::default().fg(theme.border_active));

    let muted = Style::default().fg(theme.muted);
    let cursor = Span::styled("▏", Style::default().fg(theme.border_active));
    let form = &state.sign_in;

    let mut lines = match state.mode {
        Mode::SignInCode => vec![
            Line::styled(format!("We sent a code to {}", form.email.trim()), muted),
            Line::raw(""),
            Line::from(vec![
                Span::styled("Code   ", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(format!("{:_<6}", form.code)),
                cursor,
            ]),
            Line::styled("It expires in 5 minutes.", muted),
        ],
        _ => vec![
            Line::styled("We'll email you a one-time code.", muted),
            Line::raw(""),
            Line::from(vec![
                Span::styled("Email  ", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(form.email.clone()),
                cursor,
            ]),
        ],
    };
    if form.busy {
        lines.push(Line::raw(""));
        lines.push(Line::styled("Working…", muted));
    }

    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}
