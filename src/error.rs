//! Error types for watch
//!
//! Uses `thiserror` for library errors; the binary wraps them in `anyhow`.

use thiserror::Error;

/// Result type alias for watch operations
pub type WatchResult<T> = Result<T, WatchError>;

/// Main error type for watch operations
#[derive(Error, Debug)]
pub enum WatchError {
    /// No command to run was given
    #[error("expected at least one argument: the command to run on change")]
    MissingCommand,

    /// The child process could not be started
    #[error("failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The file system watcher could not be created or attached
    #[error("file watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
