//! Keyboard relay
//!
//! Reads keys from the terminal in raw mode. Two combinations are reserved
//! (Ctrl+Enter runs now, Ctrl+D terminates); everything else is encoded and
//! forwarded to the running command's stdin.

use std::io;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};

use crate::coordinator::Coordinator;
use crate::error::WatchResult;
use crate::terminal::TERMINAL;

/// Exit status used when the user interrupts with Ctrl+C
pub const INTERRUPT_EXIT_CODE: i32 = 130;

/// What a key press asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    RunNow,
    Terminate,
    /// Ctrl+C; raw mode swallows SIGINT so the key stands in for it
    Interrupt,
    Forward(Vec<u8>),
    Ignore,
}

pub fn classify(key: &KeyEvent) -> KeyAction {
    if key.kind != KeyEventKind::Press {
        return KeyAction::Ignore;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        // Without keyboard enhancement most terminals report Ctrl+Enter as Ctrl+J.
        KeyCode::Enter | KeyCode::Char('j') if ctrl => KeyAction::RunNow,
        KeyCode::Char('d') if ctrl => KeyAction::Terminate,
        KeyCode::Char('c') if ctrl => KeyAction::Interrupt,
        _ => match key_bytes(key) {
            Some(bytes) => KeyAction::Forward(bytes),
            None => KeyAction::Ignore,
        },
    }
}

/// Bytes a terminal would send for `key`, or `None` for keys with no encoding.
pub fn key_bytes(key: &KeyEvent) -> Option<Vec<u8>> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let bytes = match key.code {
        KeyCode::Char(c) if ctrl && c.is_ascii_alphabetic() => {
            vec![(c.to_ascii_lowercase() as u8) & 0x1f]
        }
        KeyCode::Char(c) => c.to_string().into_bytes(),
        KeyCode::Enter => b"\n".to_vec(),
        KeyCode::Tab => b"\t".to_vec(),
        KeyCode::Backspace => vec![0x7f],
        KeyCode::Esc => vec![0x1b],
        KeyCode::Up => b"\x1b[A".to_vec(),
        KeyCode::Down => b"\x1b[B".to_vec(),
        KeyCode::Right => b"\x1b[C".to_vec(),
        KeyCode::Left => b"\x1b[D".to_vec(),
        KeyCode::Home => b"\x1b[H".to_vec(),
        KeyCode::End => b"\x1b[F".to_vec(),
        _ => return None,
    };
    Some(bytes)
}

/// Puts the terminal in raw mode for as long as it lives.
pub struct RawModeGuard {
    _private: (),
}

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        TERMINAL.set_raw(true);

        // Lets the terminal tell Ctrl+Enter apart from Enter.
        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            let mut stdout = io::stdout();
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
            )?;
            TERMINAL.set_enhanced(true);
        }

        Ok(Self { _private: () })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

/// Put the terminal back after an interrupt. Safe to call from a signal
/// handler thread while a guard is still alive, and a no-op when no guard
/// ever changed the terminal.
pub fn restore_terminal() {
    let mut stdout = io::stdout();
    if let Err(e) = TERMINAL.restore(&mut stdout) {
        tracing::debug!(error = %e, "terminal restore failed");
    }
}

/// Dispatch key presses until the user interrupts. Never returns `Ok`.
///
/// There is no quit command: Ctrl+C terminates the child and exits the
/// process, just like an external interrupt.
pub fn run_keyboard_loop(coordinator: &Coordinator) -> WatchResult<()> {
    let guard = RawModeGuard::enable()?;

    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };

        match classify(&key) {
            KeyAction::RunNow => {
                tracing::debug!("run now requested");
                coordinator.run_now();
            }
            KeyAction::Terminate => {
                tracing::debug!("terminate requested");
                coordinator.terminate();
            }
            KeyAction::Interrupt => {
                coordinator.terminate();
                drop(guard);
                std::process::exit(INTERRUPT_EXIT_CODE);
            }
            KeyAction::Forward(bytes) => coordinator.send_input(&bytes),
            KeyAction::Ignore => {}
        }
    }
}
