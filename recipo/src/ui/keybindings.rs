//! Keybinding dispatcher for recipo.
//!
//! Translates crossterm key and mouse events into `AppState` mutations and
//! returns a `KeyAction` telling the event loop whether to continue or quit.
//! Dispatch branches on `state.mode` first so text-entry modes never trigger
//! Normal-mode shortcuts.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;

use crate::app::{AppState, Mode, PanelFocus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::Normal => handle_normal(key, state),
        Mode::Insert => handle_insert(key, state),
        Mode::SignInEmail | Mode::SignInCode => handle_sign_in(key, state),
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if let Some(action) = handle_scroll_key(key, state) {
        return action;
    }

    match key.code {
        KeyCode::Char('H') => state.focus = state.focus.prev(),
        KeyCode::Char('L') => state.focus = state.focus.next(),
        KeyCode::Char('<') => state.shrink_detail_panel(),
        KeyCode::Char('>') => state.grow_detail_panel(),

        KeyCode::Enter | KeyCode::Char('l') if state.focus == PanelFocus::Recipes => {
            state.open_selected()
        }
        KeyCode::Enter if state.focus == PanelFocus::Comments => state.submit_comment(),
        KeyCode::Tab => state.cycle_country(),
        KeyCode::Char('m') => state.load_more(),
        KeyCode::Char('r') => state.reload(),

        KeyCode::Char('f') => state.toggle_like(),
        KeyCode::Char('i') => state.begin_comment(),
        KeyCode::Char(c @ '1'..='5') => state.set_rating(i64::from(c as u8 - b'0')),
        KeyCode::Char('0') => state.clear_rating(),

        KeyCode::Char('s') => state.start_sign_in(),
        KeyCode::Char('o') => state.sign_out(),

        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
        }
        KeyCode::Char('q') | KeyCode::Esc => return KeyAction::Quit,
        _ => {}
    }
    KeyAction::Continue
}

/// j / k / g / G and Ctrl-d / Ctrl-u. Returns `None` when the key is not a scroll key.
fn handle_scroll_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => state.scroll_up(1),
        KeyCode::Char('g') => state.scroll_top(),
        KeyCode::Char('G') => state.scroll_bottom(),
        KeyCode::Char('d') if ctrl => state.half_page_down(),
        KeyCode::Char('u') if ctrl => state.half_page_up(),
        _ => return None,
    }
    Some(KeyAction::Continue)
}

// ---------------------------------------------------------------------------
// Text entry
// ---------------------------------------------------------------------------

/// Typing into the review draft. Esc leaves the draft in place.
fn handle_insert(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Esc => state.mode = Mode::Normal,
        KeyCode::Enter => state.submit_comment(),
        KeyCode::Backspace => state.comment_backspace(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.comment_input(c)
        }
        _ => {}
    }
    KeyAction::Continue
}

fn handle_sign_in(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Esc => state.cancel_sign_in(),
        KeyCode::Enter => state.sign_in_submit(),
        KeyCode::Backspace => state.sign_in_backspace(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.sign_in_input(c)
        }
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// HelpOverlay mode
// ---------------------------------------------------------------------------

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') => state.help_scroll = state.help_scroll.saturating_add(1),
        KeyCode::Char('k') => state.help_scroll = state.help_scroll.saturating_sub(1),
        KeyCode::Char('g') => state.help_scroll = 0,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Click-to-focus, wheel scrolling, and star hover/click in the review box.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) -> KeyAction {
    let pos = Position { x: mouse.column, y: mouse.row };
    let star = star_at(pos, state);

    match mouse.kind {
        MouseEventKind::Moved => state.hover_star(star),
        MouseEventKind::Down(MouseButton::Left) => match star {
            Some(n) => state.set_rating(i64::from(n)),
            None => focus_at(pos, state),
        },
        MouseEventKind::ScrollUp if state.mode == Mode::HelpOverlay => {
            state.help_scroll = state.help_scroll.saturating_sub(3)
        }
        MouseEventKind::ScrollDown if state.mode == Mode::HelpOverlay => {
            state.help_scroll = state.help_scroll.saturating_add(3)
        }
        MouseEventKind::ScrollUp => state.scroll_up(3),
        MouseEventKind::ScrollDown => state.scroll_down(3),
        _ => {}
    }
    KeyAction::Continue
}

/// Which star (1..=5) sits under `pos`, if any.
fn star_at(pos: Position, state: &AppState) -> Option<u8> {
    let rect = state.stars_rect;
    if state.page.is_none() || rect.width == 0 || !rect.contains(pos) {
        return None;
    }
    Some((pos.x - rect.x + 1) as u8)
}

/// Collapsed (zero-width) panels cannot take focus.
fn focus_at(pos: Position, state: &mut AppState) {
    let [left, center, right] = state.panel_rects;
    if left.width > 0 && left.contains(pos) {
        state.focus = PanelFocus::Recipes;
    } else if center.width > 0 && center.contains(pos) {
        state.focus = PanelFocus::Detail;
    } else if right.width > 0 && right.contains(pos) {
        state.focus = PanelFocus::Comments;
    }
}
