use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{prelude::*, widgets::*};
use unicode_width::UnicodeWidthStr;

use crate::app::quotes::QuoteEntry;
use crate::app::search::SearchSnapshot;
use crate::fetch::SearchResult;
use crate::ui::components::quote_table;
use crate::ui::styles::{
    error_style, header_line, secondary_line, secondary_span, selection_style,
};
use crate::utils::format_clock;

const SEARCH_HELP: &str = "type to search · ↑/↓ move · Enter add · Tab watchlist · Esc quit";
const WATCH_HELP: &str = "↑/↓ move · d remove · r refresh · R refresh all · Tab search · Esc quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    Watchlist,
}

/// What the controller should do in response to a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenAction {
    QueryChanged(String),
    Add(String),
    Remove(String),
    Refresh(String),
    RefreshAll,
    Quit,
}

/// Local view state for the single watch screen. Data lives in the app state;
/// this only tracks focus, the edit buffer, and cursor positions.
#[derive(Debug)]
pub struct WatchScreen {
    focus: Focus,
    input: String,
    result_selected: usize,
    watch_selected: usize,
    status: Option<String>,
}

impl Default for WatchScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchScreen {
    pub fn new() -> Self {
        Self {
            focus: Focus::Search,
            input: String::new(),
            result_selected: 0,
            watch_selected: 0,
            status: None,
        }
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn handle_key(
        &mut self,
        key: KeyEvent,
        results: &[SearchResult],
        watchlist: &[String],
    ) -> Option<ScreenAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match key.code {
            KeyCode::Esc => return Some(ScreenAction::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Some(ScreenAction::Quit)
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Search => Focus::Watchlist,
                    Focus::Watchlist => Focus::Search,
                };
                return None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Search => self.handle_search_key(key, results),
            Focus::Watchlist => self.handle_watch_key(key, watchlist),
        }
    }

    fn handle_search_key(
        &mut self,
        key: KeyEvent,
        results: &[SearchResult],
    ) -> Option<ScreenAction> {
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c);
                self.result_selected = 0;
                Some(ScreenAction::QueryChanged(self.input.clone()))
            }
            KeyCode::Backspace => {
                self.input.pop()?;
                self.result_selected = 0;
                Some(ScreenAction::QueryChanged(self.input.clone()))
            }
            KeyCode::Up => {
                self.result_selected = step_back(self.result_selected, results.len());
                None
            }
            KeyCode::Down => {
                self.result_selected = step_forward(self.result_selected, results.len());
                None
            }
            KeyCode::Enter => {
                let index = clamp(self.result_selected, results.len())?;
                Some(ScreenAction::Add(results[index].symbol.clone()))
            }
            _ => None,
        }
    }

    fn handle_watch_key(&mut self, key: KeyEvent, watchlist: &[String]) -> Option<ScreenAction> {
        match key.code {
            KeyCode::Up => {
                self.watch_selected = step_back(self.watch_selected, watchlist.len());
                None
            }
            KeyCode::Down => {
                self.watch_selected = step_forward(self.watch_selected, watchlist.len());
                None
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                let index = clamp(self.watch_selected, watchlist.len())?;
                Some(ScreenAction::Remove(watchlist[index].clone()))
            }
            KeyCode::Char('r') => {
                let index = clamp(self.watch_selected, watchlist.len())?;
                Some(ScreenAction::Refresh(watchlist[index].clone()))
            }
            KeyCode::Char('R') => {
                if watchlist.is_empty() {
                    None
                } else {
                    Some(ScreenAction::RefreshAll)
                }
            }
            _ => None,
        }
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        snapshot: &SearchSnapshot,
        rows: &[(&str, &QuoteEntry)],
        now: DateTime<Local>,
    ) {
        let [search_area, body_area, status_area] = screen_areas(frame.size());
        let [results_area, watch_area] = body_panes(body_area);

        self.render_input(frame, search_area);
        self.render_results(frame, results_area, snapshot);
        self.render_watchlist(frame, watch_area, rows, now);
        self.render_status(frame, status_area, now);
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let focused = self.focus == Focus::Search;
        let mut block = Block::default()
            .borders(Borders::ALL)
            .title(header_line("Search symbols"));
        if focused {
            block = block.border_style(selection_style());
        }

        let input = Paragraph::new(self.input.as_str()).block(block);
        frame.render_widget(input, area);

        if focused {
            let (x, y) = cursor_position(area, &self.input);
            frame.set_cursor(x, y);
        }
    }

    fn render_results(&self, frame: &mut Frame, area: Rect, snapshot: &SearchSnapshot) {
        let title = if snapshot.searching {
            "Results (searching…)"
        } else {
            "Results"
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        if let Some(error) = &snapshot.error {
            let message = Paragraph::new(Span::styled(error.as_str(), error_style()))
                .wrap(Wrap { trim: true })
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        if snapshot.results.is_empty() {
            let hint = if snapshot.query.trim().is_empty() {
                "Start typing a company or ticker."
            } else if snapshot.searching {
                ""
            } else {
                "No results yet."
            };
            frame.render_widget(Paragraph::new(secondary_line(hint)).block(block), area);
            return;
        }

        let items: Vec<ListItem> = snapshot
            .results
            .iter()
            .map(|result| {
                ListItem::new(Line::from(vec![
                    Span::from(format!("{:<8}", result.symbol)).bold(),
                    Span::from(" "),
                    secondary_span(result.name.clone()),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("› ");
        let mut state = ListState::default()
            .with_selected(clamp(self.result_selected, snapshot.results.len()));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_watchlist(
        &self,
        frame: &mut Frame,
        area: Rect,
        rows: &[(&str, &QuoteEntry)],
        now: DateTime<Local>,
    ) {
        let focused = self.focus == Focus::Watchlist;
        let title = format!("Watchlist ({})", rows.len());
        let table = quote_table(rows, now, title, focused);
        let selected = if focused {
            clamp(self.watch_selected, rows.len())
        } else {
            None
        };
        let mut state = TableState::default().with_selected(selected);
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, now: DateTime<Local>) {
        let help = match self.focus {
            Focus::Search => SEARCH_HELP,
            Focus::Watchlist => WATCH_HELP,
        };
        let mut spans = vec![secondary_span(format!("{} ", format_clock(now)))];
        match &self.status {
            Some(status) => spans.push(Span::from(status.as_str())),
            None => spans.push(secondary_span(help)),
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

/// Search box on top, results and watchlist side by side, one status row.
fn screen_areas(area: Rect) -> [Rect; 3] {
    let rows = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(5),
        Constraint::Length(1),
    ])
    .split(area);
    [rows[0], rows[1], rows[2]]
}

fn body_panes(area: Rect) -> [Rect; 2] {
    let panes = Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);
    [panes[0], panes[1]]
}

/// Cursor cell after the typed text, pinned inside the box border.
fn cursor_position(area: Rect, input: &str) -> (u16, u16) {
    let width = u16::try_from(input.width()).unwrap_or(u16::MAX);
    let max_x = area.x.saturating_add(area.width.saturating_sub(2));
    let x = area.x.saturating_add(1).saturating_add(width).min(max_x);
    (x, area.y.saturating_add(1))
}

fn clamp(index: usize, len: usize) -> Option<usize> {
    if len == 0 {
        None
    } else {
        Some(index.min(len - 1))
    }
}

fn step_back(index: usize, len: usize) -> usize {
    match clamp(index, len) {
        None => 0,
        Some(0) => len - 1,
        Some(i) => i - 1,
    }
}

fn step_forward(index: usize, len: usize) -> usize {
    match clamp(index, len) {
        None => 0,
        Some(i) => (i + 1) % len,
    }
}
