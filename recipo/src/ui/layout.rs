//! Responsive 3-panel layout for recipo.
//!
//! Pure layout arithmetic, recomputed inside every `terminal.draw()` so each
//! frame reflects the live terminal size.
//!
//! At `>= 110` columns the recipe feed, detail, and comment panels sit side by
//! side with widths from `AppState.left_pct / center_pct / right_pct`. Narrower
//! terminals show only the focused panel at full width.
//!
//! `Spacing::Overlap(1)` with `MergeStrategy::Fuzzy` lets adjacent borders share
//! one column and merge their junction glyphs.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use crate::app::{AppState, Mode, PanelFocus, StatusKind};
use crate::theme::Theme;

const WIDE_MIN_COLS: u16 = 110;

/// Returns `[recipes, detail, comments, status_bar]` for the current frame.
///
/// Collapsed panels come back with zero width and must not be drawn.
pub fn compute_layout(frame: &Frame, state: &AppState) -> [Rect; 4] {
    let [main_area, status_bar] =
        frame.area().layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));

    let constraints = if frame.area().width >= WIDE_MIN_COLS {
        [
            Constraint::Percentage(state.left_pct),
            Constraint::Percentage(state.center_pct),
            Constraint::Percentage(state.right_pct),
        ]
    } else {
        let slot = |panel: PanelFocus| {
            if state.focus == panel { Constraint::Fill(1) } else { Constraint::Length(0) }
        };
        [slot(PanelFocus::Recipes), slot(PanelFocus::Detail), slot(PanelFocus::Comments)]
    };

    let horizontal = Layout::horizontal(constraints).spacing(Spacing::Overlap(1));
    let [left, center, right] = main_area.layout(&horizontal);

    [left, center, right, status_bar]
}

/// The panel area inside its 1-cell border.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Keeps a paragraph offset within its content so `G` lands on the last page.
///
/// Counts unwrapped lines, so a heavily wrapped paragraph may stop a little early.
pub fn clamp_scroll(scroll: u16, lines: usize, height: u16) -> u16 {
    let max = u16::try_from(lines).unwrap_or(u16::MAX).saturating_sub(height);
    scroll.min(max)
}

/// Bordered panel block; thick border when focused.
///
/// `Fuzzy` merging is needed because `Exact` draws wrong junctions where
/// `Thick` meets `Plain`.
pub fn panel_block<'a>(title: impl Into<Line<'a>>, is_focused: bool, theme: &Theme) -> Block<'a> {
    let (border_type, color) = if is_focused {
        (BorderType::Thick, theme.border_active)
    } else {
        (BorderType::Plain, theme.border_inactive)
    };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(Style::default().fg(color))
        .merge_borders(MergeStrategy::Fuzzy)
}

/// Renders the 1-row status bar: mode, signed-in user, then the latest message.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::Insert => (" COMMENT ", theme.status_mode_insert),
        Mode::SignInEmail | Mode::SignInCode => (" SIGN IN ", theme.status_mode_insert),
        Mode::Normal | Mode::HelpOverlay => (" NORMAL ", theme.status_mode_normal),
    };

    let mut spans = vec![Span::styled(
        mode_text,
        Style::default().fg(mode_fg).add_modifier(Modifier::BOLD),
    )];

    let who = match &state.session {
        Some(s) => format!(" {} ", s.name),
        None => " guest ".to_owned(),
    };
    spans.push(Span::raw(who));

    if state.recipes_loading || state.page_loading {
        spans.push(Span::raw(" loading… "));
    }

    match &state.status {
        Some(status) => {
            let fg = match status.kind {
                StatusKind::Info => theme.status_info,
                StatusKind::Error => theme.status_error,
            };
            spans.push(Span::styled(format!(" {} ", status.text), Style::default().fg(fg)));
        }
        None => spans.push(Span::raw(" ? for help")),
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}
