//! Console output sink
//!
//! Everything the user sees goes through an [`OutputSink`]: child output, the
//! changed-notice and spawn failures. The console adapter owns colors and the
//! cursor so the rest of the crate never touches them.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use is_terminal::IsTerminal;
use parking_lot::Mutex;

use crate::terminal::{TerminalState, TERMINAL};

/// How a line should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    /// Child stdout, default color
    Normal,
    /// Child stderr and failures
    Error,
    /// Messages from watch itself
    Notice,
}

impl LineStyle {
    fn color(self) -> Option<Color> {
        match self {
            LineStyle::Normal => None,
            LineStyle::Error => Some(Color::Red),
            LineStyle::Notice => Some(Color::Cyan),
        }
    }
}

/// Destination for user-visible output. Shared between drain threads.
pub trait OutputSink: Send + Sync {
    fn write_line(&self, text: &str, style: LineStyle);

    fn clear(&self);
}

/// Writes to stdout through crossterm.
#[derive(Debug)]
pub struct ConsoleSink {
    color: bool,
    terminal: &'static TerminalState,
}

impl ConsoleSink {
    pub fn new(color: bool) -> Self {
        Self::with_terminal(color, &TERMINAL)
    }

    pub fn with_terminal(color: bool, terminal: &'static TerminalState) -> Self {
        Self { color, terminal }
    }

    /// Color only on a terminal, and never when `NO_COLOR` is set.
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some();
        Self::new(io::stdout().is_terminal() && !no_color)
    }

    fn render_line(&self, out: &mut impl Write, text: &str, style: LineStyle) -> io::Result<()> {
        // Raw mode drops the implicit carriage return.
        let eol = self.terminal.line_ending();
        match style.color().filter(|_| self.color) {
            Some(color) => queue!(
                out,
                SetForegroundColor(color),
                Print(text),
                ResetColor,
                Print(eol)
            )?,
            None => queue!(out, Print(text), Print(eol))?,
        }
        out.flush()
    }

    fn try_write_line(&self, text: &str, style: LineStyle) -> io::Result<()> {
        let mut out = io::stdout().lock();
        self.render_line(&mut out, text, style)
    }

    fn try_clear(&self) -> io::Result<()> {
        let mut out = io::stdout().lock();
        queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
        out.flush()
    }
}

impl OutputSink for ConsoleSink {
    fn write_line(&self, text: &str, style: LineStyle) {
        if let Err(e) = self.try_write_line(text, style) {
            tracing::debug!(error = %e, "console write failed");
        }
    }

    fn clear(&self) {
        if let Err(e) = self.try_clear() {
            tracing::debug!(error = %e, "console clear failed");
        }
    }
}

/// One recorded sink call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEntry {
    Line(String, LineStyle),
    Clear,
}

/// Records output in memory instead of printing it.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<SinkEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<SinkEntry> {
        self.entries.lock().clone()
    }

    /// Text of every line written with `style`, in order
    pub fn lines(&self, style: LineStyle) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter_map(|e| match e {
                SinkEntry::Line(text, s) if *s == style => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_count(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|e| matches!(e, SinkEntry::Clear))
            .count()
    }
}

impl OutputSink for MemorySink {
    fn write_line(&self, text: &str, style: LineStyle) {
        self.entries
            .lock()
            .push(SinkEntry::Line(text.to_string(), style));
    }

    fn clear(&self) {
        self.entries.lock().push(SinkEntry::Clear);
    }
}
