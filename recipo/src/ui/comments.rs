//! Comment panel (right): rating summary, review list, and the draft box.
//!
//! The draft box sits at the bottom with a row of five stars. Its screen
//! position is written back into `AppState::stars_rect` so mouse hover and
//! click can preview and pick a rating.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use recipo_core::comments::{rating_label, CommentSection, MAX_BODY_CHARS};

use crate::app::{AppState, Mode, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{clamp_scroll, inner_rect, panel_block};

/// Height of the draft box: stars row, separator, two lines of text.
const DRAFT_HEIGHT: u16 = 5;

pub fn render_comments(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Comments;
    let count = state.page.as_ref().map_or(0, |p| p.comments.comments().len());
    let title = if count > 0 { format!("Reviews ({count})") } else { "Reviews".to_owned() };
    frame.render_widget(panel_block(title, is_focused, theme), area);
    let inner = inner_rect(area);

    let Some(page) = &state.page else {
        state.stars_rect = Rect::default();
        return;
    };
    let section = &page.comments;

    let [list_area, draft_area] =
        inner.layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(DRAFT_HEIGHT)]));

    let text = review_text(section, theme);
    state.comments_scroll = clamp_scroll(state.comments_scroll, text.lines.len(), list_area.height);
    let list = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .scroll((state.comments_scroll, 0));
    frame.render_widget(list, list_area);

    let editing = state.mode == Mode::Insert;
    let stars_rect = render_draft(frame, draft_area, section, editing, theme);
    state.stars_rect = stars_rect;
}

fn stars(n: u8, theme: &Theme) -> Vec<Span<'static>> {
    (1..=5u8)
        .map(|i| {
            if i <= n {
                Span::styled("★", Style::default().fg(theme.star))
            } else {
                Span::styled("☆", Style::default().fg(theme.star_empty))
            }
        })
        .collect()
}

fn review_text(section: &CommentSection, theme: &Theme) -> Text<'static> {
    let muted = Style::default().fg(theme.muted);
    let mut lines = Vec::new();

    match section.average_rating() {
        Some(avg) => {
            let mut summary = stars(avg.round() as u8, theme);
            summary.push(Span::styled(format!(" {avg:.1} average"), muted));
            lines.push(Line::from(summary));
        }
        None => lines.push(Line::styled("No ratings yet", muted)),
    }
    lines.push(Line::raw(""));

    if section.comments().is_empty() {
        lines.push(Line::styled("Be the first to leave a review.", muted));
    }
    for c in section.comments() {
        let mut head = vec![Span::styled(
            c.author_name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )];
        if let Some(r) = c.rating {
            head.push(Span::raw(" "));
            head.extend(stars(r, theme));
        }
        lines.push(Line::from(head));
        lines.extend(c.body.lines().map(|l| Line::raw(l.to_owned())));
        lines.push(Line::raw(""));
    }
    Text::from(lines)
}

/// Draws the draft box and returns the rect of the five star glyphs.
fn render_draft(
    frame: &mut Frame,
    area: Rect,
    section: &CommentSection,
    editing: bool,
    theme: &Theme,
) -> Rect {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(theme.border_inactive))
        .title(if section.is_submitting() { "Posting…" } else { "Your review" });
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [stars_row, body_area] =
        inner.layout(&Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]));

    let shown = section.shown_rating().unwrap_or(0);
    let mut row = stars(shown, theme);
    let label = match section.shown_rating() {
        Some(n) => format!("  {}", rating_label(n)),
        None => "  rate 1-5".to_owned(),
    };
    row.push(Span::styled(label, Style::default().fg(theme.muted)));
    frame.render_widget(Paragraph::new(Line::from(row)), stars_row);

    let body = &section.draft().body;
    let mut text = if body.is_empty() && !editing {
        Line::styled("press i to write a review", Style::default().fg(theme.muted))
    } else {
        Line::raw(body.clone())
    };
    if editing {
        text.push_span(Span::styled("▏", Style::default().fg(theme.border_active)));
        let used = body.chars().count();
        if used > MAX_BODY_CHARS {
            text.push_span(Span::styled(
                format!("  {used}/{MAX_BODY_CHARS}"),
                Style::default().fg(theme.status_error),
            ));
        }
    }
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), body_area);

    Rect { width: stars_row.width.min(5), ..stars_row }
}
