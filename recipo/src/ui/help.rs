//! Help overlay for recipo.
//!
//! Draws a centred modal over the panel layout. `Clear` erases the area first,
//! inside the same `terminal.draw()` closure as the panels.

use ratatui::{
    Frame,
    layout::Constraint,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;

/// Renders the keybinding reference, scrolled by `help_scroll` rows.
///
/// Skipped below 60 columns, where the overlay would have no usable height.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));
    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help · j/k scroll, ? or Esc to dismiss ")
        .border_style(ratatui::style::Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn help_text() -> Text<'static> {
    Text::from(vec![
        Line::from("Navigation"),
        Line::from("  j / k         Scroll down / up"),
        Line::from("  g / G         Jump to top / bottom"),
        Line::from("  Ctrl-d / u    Half page down / up"),
        Line::from("  H / L         Move panel focus left / right"),
        Line::from("  < / >         Shrink / grow the detail panel"),
        Line::from(""),
        Line::from("Recipes"),
        Line::from("  Enter / l     Open the selected recipe"),
        Line::from("  Tab           Cycle cuisine filter"),
        Line::from("  m             Load more recipes"),
        Line::from("  r             Reload"),
        Line::from("  f             Like / unlike (selected or open recipe)"),
        Line::from(""),
        Line::from("Reviews"),
        Line::from("  i             Write a review (Enter posts, Esc leaves the draft)"),
        Line::from("  1-5 / 0       Set / clear your rating"),
        Line::from("  mouse         Hover the stars to preview, click to rate"),
        Line::from(""),
        Line::from("Account"),
        Line::from("  s             Sign in with an emailed code"),
        Line::from("  o             Sign out"),
        Line::from(""),
        Line::from("General"),
        Line::from("  ?             Open / close this help"),
        Line::from("  q / Esc       Quit"),
    ])
}
