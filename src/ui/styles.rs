use crate::config::{ColorConfig, Rgb};
use crossterm::style::Stylize;

/// Paint `text` with a foreground and background color
pub fn paint(text: &str, fg: Rgb, bg: Rgb) -> String {
    text.with(fg.into()).on(bg.into()).to_string()
}

/// Which pair of colors a side-by-side cell is drawn with
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tone {
    Context,
    Added,
    Removed,
    Filler,
    Hunk,
    Title,
}

// ── Composed styles ──

/// Margin (line number) colors for a tone, as (fg, bg)
pub fn margin(colors: &ColorConfig, tone: Tone) -> (Rgb, Rgb) {
    match tone {
        Tone::Context => (colors.margin_fg, colors.margin_bg),
        Tone::Added => (colors.margin_fg, colors.added_margin_bg),
        Tone::Removed => (colors.margin_fg, colors.removed_margin_bg),
        Tone::Filler => (colors.margin_fg, colors.filler_bg),
        Tone::Hunk => (colors.margin_fg, colors.hunk_margin_bg),
        Tone::Title => (colors.title_fg, colors.title_bg),
    }
}

/// Text colors for a tone, as (fg, bg)
pub fn text(colors: &ColorConfig, tone: Tone) -> (Rgb, Rgb) {
    match tone {
        Tone::Context => (colors.foreground, colors.background),
        Tone::Added => (colors.foreground, colors.added_bg),
        Tone::Removed => (colors.foreground, colors.removed_bg),
        Tone::Filler => (colors.foreground, colors.filler_bg),
        Tone::Hunk => (colors.margin_fg, colors.hunk_bg),
        Tone::Title => (colors.title_fg, colors.title_bg),
    }
}
