//! Recipe feed panel (left).
//!
//! One row per recipe: heart, title, then cuisine, difficulty and rating. The
//! heart reads from the optimistic like toggle, so it flips the moment the key
//! is pressed.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
};
use recipo_core::types::{Difficulty, Recipe};

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::panel_block;

pub fn render_recipe_list(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Recipes;
    let filter = state
        .country_filter
        .as_ref()
        .and_then(|slug| state.countries.iter().find(|c| &c.slug == slug))
        .map(|c| c.name.as_str())
        .unwrap_or("All cuisines");
    let more = if state.has_more { "+" } else { "" };
    let title = format!("Recipes ({}{more}) · {filter}", state.recipes.len());
    let block = panel_block(title, is_focused, theme);

    let items: Vec<ListItem> = if state.recipes.is_empty() {
        let msg = if state.recipes_loading { "Loading..." } else { "No recipes" };
        vec![ListItem::new(Line::raw(msg))]
    } else {
        state
            .recipes
            .iter()
            .map(|r| recipe_item(r, state.is_liked(r), theme))
            .collect()
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(theme.border_active).add_modifier(Modifier::BOLD));

    frame.render_stateful_widget(list, area, &mut state.recipe_list_state);
}

/// Two lines: `♥ Title` and `  Italy · easy · 25 min · ★ 4.5 (2)`.
fn recipe_item(r: &Recipe, liked: bool, theme: &Theme) -> ListItem<'static> {
    let heart = if liked {
        Span::styled("♥ ", Style::default().fg(theme.heart))
    } else {
        Span::styled("♡ ", Style::default().fg(theme.muted))
    };
    let title = Line::from(vec![heart, Span::styled(r.title.clone(), Style::default().fg(theme.text))]);

    let muted = Style::default().fg(theme.muted);
    let mut meta = vec![
        Span::styled(format!("  {} · ", r.country_name), muted),
        Span::styled(r.difficulty.as_str(), Style::default().fg(difficulty_color(r.difficulty, theme))),
    ];
    if !r.time.is_empty() {
        meta.push(Span::styled(format!(" · {}", r.time), muted));
    }
    if let Some(avg) = r.rating_avg {
        meta.push(Span::styled(format!(" · ★ {avg:.1}"), Style::default().fg(theme.star)));
        meta.push(Span::styled(format!(" ({})", r.rating_count), muted));
    }

    ListItem::new(vec![title, Line::from(meta)])
}

pub fn difficulty_color(d: Difficulty, theme: &Theme) -> ratatui::style::Color {
    match d {
        Difficulty::Easy => theme.difficulty_easy,
        Difficulty::Medium => theme.difficulty_medium,
        Difficulty::Hard => theme.difficulty_hard,
    }
}
