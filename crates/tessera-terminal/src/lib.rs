//! Terminal I/O: raw-mode/alternate-screen lifecycle, size tracking, and a
//! retrying buffered writer.

mod size;
mod writer;

use std::io::{self, Write};

use crossterm::cursor::{Hide, Show};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use thiserror::Error;
use tracing::{debug, warn};

pub use size::{ResizeWatcher, terminal_size};
pub use writer::BufferedWriter;

#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("terminal write failed after {attempts} attempts: {source}")]
    WriteFailed {
        attempts: u32,
        #[source]
        source: io::Error,
    },
    #[error("terminal enter/leave failed: {0}")]
    Io(#[from] io::Error),
}

/// What a terminal backend must provide to host the renderer.
pub trait TerminalBackend {
    fn enter(&mut self) -> Result<(), TerminalError>;
    fn leave(&mut self) -> Result<(), TerminalError>;
    fn set_title(&mut self, title: &str) -> Result<(), TerminalError>;
}

/// Raw-mode + alternate-screen + hidden-cursor backend over `crossterm`.
pub struct CrosstermBackend {
    entered: bool,
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self { entered: false }
    }

    /// Enter, returning an RAII guard that leaves on drop even across a
    /// panic unwind, so teardown is guaranteed after fatal errors.
    pub fn enter_guard(&mut self) -> Result<TerminalGuard<'_>, TerminalError> {
        self.enter()?;
        Ok(TerminalGuard { backend: self })
    }
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enter(&mut self) -> Result<(), TerminalError> {
        if self.entered {
            return Ok(());
        }
        enable_raw_mode()?;
        crossterm::execute!(io::stdout(), EnterAlternateScreen, Hide)?;
        self.entered = true;
        debug!("entered raw mode and alternate screen");
        Ok(())
    }

    fn leave(&mut self) -> Result<(), TerminalError> {
        if !self.entered {
            return Ok(());
        }
        crossterm::execute!(io::stdout(), Show, LeaveAlternateScreen)?;
        disable_raw_mode()?;
        self.entered = false;
        debug!("left raw mode and alternate screen");
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<(), TerminalError> {
        crossterm::execute!(io::stdout(), crossterm::terminal::SetTitle(title))?;
        Ok(())
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        if self.entered {
            if let Err(err) = self.leave() {
                warn!(error = %err, "failed to restore terminal state on drop");
            }
        }
    }
}

/// Guarantees [`TerminalBackend::leave`] runs once the guard goes out of
/// scope, including during panic unwinding.
pub struct TerminalGuard<'a> {
    backend: &'a mut CrosstermBackend,
}

impl Drop for TerminalGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.backend.leave() {
            warn!(error = %err, "failed to leave terminal on guard drop");
        }
    }
}

/// Flush `writer` after writing `bytes`; convenience wrapper used by tests
/// and call sites that don't need a persistent `BufferedWriter`.
pub fn write_all_and_flush<W: Write>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    writer.write_all(bytes)?;
    writer.flush()
}
