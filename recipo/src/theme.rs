//! Color theme system for recipo.
//!
//! Two built-in themes are provided:
//!
//! - `dark` uses ANSI 16 colors so it works on any terminal, including
//!   256-color SSH sessions without truecolor.
//! - `catppuccin_mocha` is the Catppuccin Mocha palette in RGB; requires truecolor.

use ratatui::style::Color;

/// All color values used across recipo's UI surfaces.
#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    pub border_active: Color,
    pub border_inactive: Color,

    // Content
    pub text: Color,
    /// Secondary text: cuisine, timings, comment dates.
    pub muted: Color,
    pub heading: Color,
    /// Filled heart.
    pub heart: Color,
    /// Filled rating star.
    pub star: Color,
    pub star_empty: Color,
    pub difficulty_easy: Color,
    pub difficulty_medium: Color,
    pub difficulty_hard: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_mode_normal: Color,
    pub status_mode_insert: Color,
    pub status_info: Color,
    pub status_error: Color,
}

impl Theme {
    /// The built-in dark theme using ANSI 16 colors.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            text: Color::Reset,
            muted: Color::DarkGray,
            heading: Color::Cyan,
            heart: Color::Red,
            star: Color::Yellow,
            star_empty: Color::DarkGray,
            difficulty_easy: Color::Green,
            difficulty_medium: Color::Yellow,
            difficulty_hard: Color::Red,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,
            status_info: Color::Green,
            status_error: Color::LightRed,
        }
    }

    /// The Catppuccin Mocha theme using RGB truecolor values.
    ///
    /// Palette source: <https://github.com/catppuccin/catppuccin> Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161); // #a6e3a1
        let red = Color::Rgb(243, 139, 168); // #f38ba8
        let yellow = Color::Rgb(249, 226, 175); // #f9e2af
        let peach = Color::Rgb(250, 179, 135); // #fab387
        let teal = Color::Rgb(148, 226, 213); // #94e2d5
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface1 = Color::Rgb(69, 71, 90); // #45475a
        let text = Color::Rgb(205, 214, 244); // #cdd6f4

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            text,
            muted: overlay1,
            heading: teal,
            heart: red,
            star: yellow,
            star_empty: surface1,
            difficulty_easy: green,
            difficulty_medium: peach,
            difficulty_hard: red,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_insert: green,
            status_info: green,
            status_error: red,
        }
    }

    /// Resolves a theme name from config. Unknown names fall back to `dark()`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }
}
