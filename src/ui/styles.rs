use std::borrow::Cow;

use ratatui::prelude::Stylize;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::app::quotes::QuoteStatus;

/// Accent color used for prompts, highlights, and status badges.
pub const ACCENT: Color = Color::Indexed(208);

/// Bold accent line for pane titles.
pub fn header_line<'a>(text: impl Into<Cow<'a, str>>) -> Line<'a> {
    let owned = text.into().into_owned();
    Line::from(owned.bold().fg(ACCENT))
}

/// Produce a dimmed line for secondary descriptions and hints.
pub fn secondary_line<'a>(text: impl Into<Cow<'a, str>>) -> Line<'a> {
    let owned = text.into().into_owned();
    Line::from(owned.dim())
}

/// Dimmed text chunk for inline usage.
pub fn secondary_span<'a>(text: impl Into<Cow<'a, str>>) -> Span<'a> {
    let owned = text.into().into_owned();
    Span::from(owned).dim()
}

/// Apply the accent and bold modifiers for list selections.
pub fn selection_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn error_style() -> Style {
    Style::default().fg(Color::Red)
}

/// Green for gains, red for losses, plain for flat or unparsable values.
pub fn change_style(change: &str) -> Style {
    let trimmed = change.trim().trim_end_matches('%');
    match trimmed.parse::<f64>() {
        Ok(value) if value > 0.0 => Style::default().fg(Color::Green),
        Ok(value) if value < 0.0 => Style::default().fg(Color::Red),
        _ => Style::default(),
    }
}

pub fn status_style(status: QuoteStatus) -> Style {
    match status {
        QuoteStatus::Idle => Style::default().add_modifier(Modifier::DIM),
        QuoteStatus::Loading => Style::default().fg(Color::Yellow),
        QuoteStatus::Success => Style::default().fg(Color::Green),
        QuoteStatus::Error => error_style(),
    }
}
