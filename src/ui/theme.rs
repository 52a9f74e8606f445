//! Greyscale theme for featurewiz
//! A high-contrast monochrome palette with a little green and red for state

use ratatui::style::{Color, Modifier, Style};

pub struct Theme;

impl Theme {
    pub const LOGO: &'static str = "f e a t u r e w i z";

    // ─────────────────────────────────────────────────────────────────────
    // Core greyscale palette - from brightest to darkest
    // ─────────────────────────────────────────────────────────────────────

    /// Pure white - maximum emphasis
    pub const WHITE: Color = Color::Rgb(255, 255, 255);

    /// Near white - headers, selected items
    pub const GREY_50: Color = Color::Rgb(250, 250, 250);

    /// Bright grey - primary text
    pub const GREY_100: Color = Color::Rgb(220, 220, 220);

    /// Medium grey - muted text
    pub const GREY_300: Color = Color::Rgb(140, 140, 140);

    pub const GREY_400: Color = Color::Rgb(100, 100, 100);

    /// Darker grey - borders, separators
    pub const GREY_500: Color = Color::Rgb(70, 70, 70);

    pub const GREY_600: Color = Color::Rgb(45, 45, 45);

    /// Dark grey - overlay backgrounds
    pub const GREY_700: Color = Color::Rgb(35, 35, 35);

    /// True black - deepest background
    pub const GREY_900: Color = Color::Rgb(18, 18, 18);

    pub const BG: Color = Self::GREY_900;

    // ─────────────────────────────────────────────────────────────────────
    // Accents
    // ─────────────────────────────────────────────────────────────────────

    pub const GREEN: Color = Color::Rgb(100, 200, 100);

    pub const RED: Color = Color::Rgb(200, 100, 100);

    pub const CHECK_MARK: char = '✓';
    pub const BULLET_FILLED: char = '●';
    pub const BULLET_EMPTY: char = '○';
    pub const ARROW_RIGHT: char = '▸';

    pub fn text() -> Style {
        Style::default().fg(Self::GREY_100)
    }

    pub fn text_muted() -> Style {
        Style::default().fg(Self::GREY_300)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::GREY_400)
    }

    pub fn bold() -> Style {
        Style::default()
            .fg(Self::GREY_50)
            .add_modifier(Modifier::BOLD)
    }

    /// Highlighted row under the cursor
    pub fn selected() -> Style {
        Style::default()
            .fg(Self::WHITE)
            .bg(Self::GREY_600)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::GREY_500)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Self::GREY_100)
            .add_modifier(Modifier::BOLD)
    }

    /// Key badge in the footer (` g `)
    pub fn key() -> Style {
        Style::default().fg(Self::GREY_900).bg(Self::GREY_500)
    }

    /// Primary action badge
    pub fn key_primary() -> Style {
        Style::default().fg(Self::GREY_900).bg(Self::GREEN)
    }

    pub fn error() -> Style {
        Style::default().fg(Self::RED)
    }
}
