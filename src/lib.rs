//! watch - rerun a build command on file changes
//!
//! Watches a directory, and whenever a file with a relevant extension changes,
//! kills the previous run of the command and starts a new one. The child's
//! stdout and stderr are streamed to the console; keystrokes are forwarded to
//! its stdin.
//!
//! The pieces, leaf first:
//! - [`filter`]: is a changed path relevant?
//! - [`debounce`]: collapse bursts of notifications
//! - [`supervisor`]: the single tracked child process
//! - [`coordinator`]: notifications and user commands to supervisor calls
//! - [`input`]: keyboard relay
//! - [`terminal`]: raw-mode state shared by console output and logging

pub mod config;
pub mod coordinator;
pub mod debounce;
pub mod error;
pub mod filter;
pub mod input;
pub mod sink;
pub mod supervisor;
pub mod terminal;

// Re-exports for convenience
pub use config::{WatchConfig, DEFAULT_EXTENSIONS};
pub use coordinator::{ChangeOutcome, Coordinator};
pub use debounce::{Debouncer, COOLDOWN};
pub use error::{WatchError, WatchResult};
pub use filter::{extension_of, ExtensionFilter};
pub use sink::{ConsoleSink, LineStyle, MemorySink, OutputSink, SinkEntry};
pub use supervisor::{Drains, ProcessSupervisor};
pub use terminal::{RawAwareWriter, TerminalState, TERMINAL};
