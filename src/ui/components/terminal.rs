use std::io::{self, Stdout};

use crossterm::{
    cursor,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};

use crate::error::Result;

type Backend = CrosstermBackend<Stdout>;

/// Owns the terminal for the lifetime of the watch screen.
///
/// Raw mode and the alternate screen are entered on construction and left
/// either by [`TerminalGuard::restore`] or on drop, whichever comes first.
pub struct TerminalGuard {
    terminal: Terminal<Backend>,
    active: bool,
}

impl TerminalGuard {
    pub fn enter() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(err) = stdout.execute(EnterAlternateScreen) {
            let _ = terminal::disable_raw_mode();
            return Err(err.into());
        }

        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;
        Ok(Self {
            terminal,
            active: true,
        })
    }

    /// Render one frame. The cursor is shown only when the frame places it.
    pub fn draw(&mut self, render: impl FnOnce(&mut Frame)) -> Result<()> {
        self.terminal.draw(render)?;
        Ok(())
    }

    pub fn restore(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        let backend = self.terminal.backend_mut();
        backend.execute(LeaveAlternateScreen)?;
        backend.execute(cursor::Show)?;
        terminal::disable_raw_mode()?;
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}
