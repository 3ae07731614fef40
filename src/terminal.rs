//! Terminal mode tracking
//!
//! Raw mode and the keyboard-enhancement push are process-wide, so their
//! state lives in one static. Output adapters read it to pick line endings,
//! and teardown reads it to undo only what was actually set up.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::event::PopKeyboardEnhancementFlags;
use crossterm::{execute, terminal};

/// State of the process's controlling terminal
pub static TERMINAL: TerminalState = TerminalState::new();

#[derive(Debug)]
pub struct TerminalState {
    raw: AtomicBool,
    enhanced: AtomicBool,
}

impl TerminalState {
    pub const fn new() -> Self {
        Self {
            raw: AtomicBool::new(false),
            enhanced: AtomicBool::new(false),
        }
    }

    pub fn set_raw(&self, raw: bool) {
        self.raw.store(raw, Ordering::SeqCst);
    }

    pub fn set_enhanced(&self, enhanced: bool) {
        self.enhanced.store(enhanced, Ordering::SeqCst);
    }

    pub fn is_raw(&self) -> bool {
        self.raw.load(Ordering::SeqCst)
    }

    /// `\r\n` in raw mode, where the terminal no longer adds the carriage return.
    pub fn line_ending(&self) -> &'static str {
        if self.is_raw() {
            "\r\n"
        } else {
            "\n"
        }
    }

    /// Undo raw mode and the enhancement push, each at most once.
    ///
    /// Escape sequences go to `out`; nothing is written when nothing was pushed.
    pub fn restore(&self, out: &mut impl Write) -> io::Result<()> {
        if self.enhanced.swap(false, Ordering::SeqCst) {
            execute!(out, PopKeyboardEnhancementFlags)?;
        }
        if self.raw.swap(false, Ordering::SeqCst) {
            terminal::disable_raw_mode()?;
        }
        Ok(())
    }
}

impl Default for TerminalState {
    fn default() -> Self {
        Self::new()
    }
}

/// Writer that turns `\n` into `\r\n` while the terminal is raw.
///
/// Used for log output, which is written behind the console's back.
pub struct RawAwareWriter<W> {
    inner: W,
    state: &'static TerminalState,
}

impl<W: Write> RawAwareWriter<W> {
    pub fn new(inner: W) -> Self {
        Self::with_state(inner, &TERMINAL)
    }

    pub fn with_state(inner: W, state: &'static TerminalState) -> Self {
        Self { inner, state }
    }
}

impl<W: Write> Write for RawAwareWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.state.is_raw() {
            return self.inner.write(buf);
        }

        let mut start = 0;
        for (i, b) in buf.iter().enumerate() {
            if *b == b'\n' && (i == 0 || buf[i - 1] != b'\r') {
                self.inner.write_all(&buf[start..i])?;
                self.inner.write_all(b"\r\n")?;
                start = i + 1;
            }
        }
        self.inner.write_all(&buf[start..])?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
