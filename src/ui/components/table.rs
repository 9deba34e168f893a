use chrono::{DateTime, Local};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Row, Table},
};

use crate::app::quotes::{QuoteEntry, QuoteStatus};
use crate::ui::styles::{change_style, selection_style, status_style};
use crate::utils::format_age;

const PLACEHOLDER: &str = "—";

/// Watchlist table: one row per symbol, coloured by fetch status.
pub fn quote_table<'a>(
    rows: &[(&'a str, &'a QuoteEntry)],
    now: DateTime<Local>,
    title: impl Into<String>,
    focused: bool,
) -> Table<'a> {
    let header = Row::new(["Symbol", "Price", "Change", "Change %", "Updated"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let body: Vec<Row<'a>> = rows
        .iter()
        .map(|(symbol, entry)| quote_row(symbol, entry, now))
        .collect();

    let widths = vec![
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Min(10),
    ];

    let mut block = Block::default().borders(Borders::ALL).title(title.into());
    if focused {
        block = block.border_style(selection_style());
    }

    Table::new(body, widths)
        .header(header)
        .block(block)
        .column_spacing(2)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
}

fn quote_row<'a>(symbol: &'a str, entry: &'a QuoteEntry, now: DateTime<Local>) -> Row<'a> {
    let symbol_cell = Span::styled(symbol, status_style(entry.status));

    match (entry.status, entry.quote.as_ref()) {
        (QuoteStatus::Error, _) => {
            let message = entry.error_message.as_deref().unwrap_or("Fetch failed");
            Row::new(vec![
                Line::from(symbol_cell),
                Line::from(Span::styled(message, status_style(QuoteStatus::Error))),
            ])
        }
        (QuoteStatus::Success, Some(quote)) => Row::new(vec![
            Line::from(symbol_cell),
            Line::from(quote.price.as_str()),
            Line::from(Span::styled(quote.change.as_str(), change_style(&quote.change))),
            Line::from(Span::styled(
                quote.change_percent.as_str(),
                change_style(&quote.change_percent),
            )),
            Line::from(
                entry
                    .seconds_since_update(now)
                    .map(format_age)
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
            ),
        ]),
        (QuoteStatus::Loading, _) => Row::new(vec![
            Line::from(symbol_cell),
            Line::from(Span::styled("loading…", status_style(QuoteStatus::Loading))),
        ]),
        _ => Row::new(vec![Line::from(symbol_cell), Line::from(PLACEHOLDER)]),
    }
}
