//! Watch configuration
//!
//! A `WatchConfig` is built once at startup and never mutated afterwards.
//! There is no config file; library callers override the defaults through the
//! `with_*` builders.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{WatchError, WatchResult};


/// Extensions that qualify a change when the caller does not override them.
///
/// The empty string matches files without an extension (`Makefile`).
pub const DEFAULT_EXTENSIONS: &[&str] = &["cpp", "c", "h", ""];

/// Immutable settings for one watch session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    command: String,
    args: String,
    root: PathBuf,
    extensions: BTreeSet<String>,
    recursive: bool,
}

impl WatchConfig {
    /// Create a config for `command` with a space-separated argument string.
    pub fn new(
        command: impl Into<String>,
        args: impl Into<String>,
        root: impl Into<PathBuf>,
    ) -> WatchResult<Self> {
        let command = command.into();
        if command.trim().is_empty() {
            return Err(WatchError::MissingCommand);
        }

        Ok(Self {
            command,
            args: args.into(),
            root: root.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            recursive: false,
        })
    }

    /// Build from positional CLI arguments: `<command> [args...]`.
    ///
    /// The remaining arguments are joined with single spaces.
    pub fn from_args<I, S>(args: I, root: impl Into<PathBuf>) -> WatchResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let command = args.next().ok_or(WatchError::MissingCommand)?;
        let rest: Vec<String> = args.collect();
        Self::new(command, rest.join(" "), root)
    }

    /// Replace the relevant extension set. Matching is case-sensitive.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Watch subdirectories of the root as well
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// The literal argument string, as joined from the command line
    pub fn args(&self) -> &str {
        &self.args
    }

    /// Arguments handed to the child, split on whitespace.
    ///
    /// No shell quoting is interpreted.
    pub fn argv(&self) -> Vec<&str> {
        self.args.split_whitespace().collect()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    /// Command line as shown to the user
    pub fn display_command(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args)
        }
    }
}
