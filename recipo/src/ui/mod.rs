//! UI rendering for recipo.
//!
//! `render()` is the single entry point, called from the event loop's
//! `terminal.draw()` closure. Layout arithmetic lives in `layout.rs`; each
//! panel has its own module.

mod comments;
mod detail;
mod help;
pub mod keybindings;
mod layout;
mod recipe_list;
mod sign_in;

use ratatui::Frame;

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use layout::{compute_layout, inner_rect, render_status_bar};

/// Renders one complete frame.
///
/// Viewport heights and panel rects are written back into `state` so the next
/// keypress or mouse event can use them. The one-frame lag is not visible.
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    let [left, center, right, status_bar] = compute_layout(frame, state);

    state.recipes_viewport_height = inner_rect(left).height;
    state.detail_viewport_height = inner_rect(center).height;
    state.comments_viewport_height = inner_rect(right).height;
    state.panel_rects = [left, center, right];

    if left.width > 0 {
        recipe_list::render_recipe_list(frame, left, state, theme);
    }
    if center.width > 0 {
        detail::render_detail(frame, center, state, theme);
    }
    if right.width > 0 {
        comments::render_comments(frame, right, state, theme);
    } else {
        state.stars_rect = ratatui::layout::Rect::default();
    }

    render_status_bar(frame, status_bar, state, theme);

    // Overlays last so they sit on top.
    match state.mode {
        Mode::HelpOverlay => help::render_help_overlay(frame, theme, state.help_scroll),
        Mode::SignInEmail | Mode::SignInCode => sign_in::render_sign_in(frame, state, theme),
        Mode::Normal | Mode::Insert => {}
    }
}
