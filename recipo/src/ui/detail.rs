//! Recipe detail panel (centre): header, ingredients, instructions, related.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
};

use crate::app::{AppState, OpenRecipe, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{clamp_scroll, inner_rect, panel_block};
use crate::ui::recipe_list::difficulty_color;

pub fn render_detail(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Detail;
    let title = state.page.as_ref().map_or("Recipe".to_owned(), |p| p.recipe.title.clone());
    frame.render_widget(panel_block(title, is_focused, theme), area);
    let inner = inner_rect(area);

    let Some(page) = &state.page else {
        let msg = if state.page_loading { "Loading..." } else { "Select a recipe and press Enter." };
        frame.render_widget(Paragraph::new(Line::raw(msg)), inner);
        return;
    };

    let text = detail_text(page, state, theme);
    state.detail_scroll = clamp_scroll(state.detail_scroll, text.lines.len(), inner.height);
    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .scroll((state.detail_scroll, 0));
    frame.render_widget(paragraph, inner);
}

fn detail_text(page: &OpenRecipe, state: &AppState, theme: &Theme) -> Text<'static> {
    let r = &page.recipe;
    let heading = Style::default().fg(theme.heading).add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(theme.muted);
    let mut lines = Vec::new();

    let heart = if state.is_liked(r) {
        Span::styled("♥ liked", Style::default().fg(theme.heart))
    } else {
        Span::styled("♡ like (f)", muted)
    };
    lines.push(Line::from(vec![
        Span::styled(format!("{} · ", r.country_name), muted),
        Span::styled(r.difficulty.as_str(), Style::default().fg(difficulty_color(r.difficulty, theme))),
        Span::styled(format!(" · {}   ", r.time), muted),
        heart,
    ]));
    let rating = match r.rating_avg {
        Some(avg) => format!("★ {avg:.1} from {} ratings", r.rating_count),
        None => "No ratings yet".to_owned(),
    };
    lines.push(Line::styled(rating, Style::default().fg(theme.star)));
    if !r.description.is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::raw(r.description.clone()));
    }

    lines.push(Line::raw(""));
    lines.push(Line::styled("Ingredients", heading));
    lines.extend(r.ingredients.iter().map(|i| Line::raw(format!("  • {i}"))));

    lines.push(Line::raw(""));
    lines.push(Line::styled("Instructions", heading));
    lines.extend(
        r.instructions
            .iter()
            .enumerate()
            .map(|(n, step)| Line::raw(format!("  {}. {step}", n + 1))),
    );

    if !page.related.is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::styled(format!("More from {}", r.country_name), heading));
        for rel in &page.related {
            let rating = rel.rating_avg.map(|a| format!("  ★ {a:.1}")).unwrap_or_default();
            lines.push(Line::from(vec![
                Span::raw(format!("  {}", rel.title)),
                Span::styled(rating, Style::default().fg(theme.star)),
            ]));
        }
    }

    Text::from(lines)
}
