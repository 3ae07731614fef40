//! Event coordinator
//!
//! Wires change notifications through the extension filter and the debouncer
//! into the supervisor. User commands skip both and go straight to the
//! supervisor.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::WatchConfig;
use crate::debounce::Debouncer;
use crate::error::WatchResult;
use crate::filter::ExtensionFilter;
use crate::sink::{LineStyle, OutputSink};
use crate::supervisor::{Drains, ProcessSupervisor};


/// What happened to one change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// Extension not in the relevant set
    Ignored,
    /// Within the cooldown of an earlier accepted change
    Debounced,
    Restarted,
    /// Accepted, but the command could not be started
    SpawnFailed,
}

pub struct Coordinator {
    config: Arc<WatchConfig>,
    filter: ExtensionFilter,
    debouncer: Debouncer,
    supervisor: ProcessSupervisor,
    sink: Arc<dyn OutputSink>,
}

impl Coordinator {
    pub fn new(config: WatchConfig, sink: Arc<dyn OutputSink>) -> Self {
        Self::with_debouncer(config, sink, Debouncer::new())
    }

    pub(crate) fn with_debouncer(
        config: WatchConfig,
        sink: Arc<dyn OutputSink>,
        debouncer: Debouncer,
    ) -> Self {
        let config = Arc::new(config);
        Self {
            filter: ExtensionFilter::new(config.extensions().clone()),
            supervisor: ProcessSupervisor::new(config.clone(), sink.clone()),
            config,
            debouncer,
            sink,
        }
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    pub fn supervisor(&self) -> &ProcessSupervisor {
        &self.supervisor
    }

    /// Handle one changed path observed at `now`.
    pub fn on_change(&self, path: &Path, now: Instant) -> ChangeOutcome {
        if !self.filter.is_relevant(path) {
            return ChangeOutcome::Ignored;
        }
        if !self.debouncer.should_trigger(now) {
            tracing::trace!(path = %path.display(), "debounced");
            return ChangeOutcome::Debounced;
        }

        self.sink.clear();
        self.sink
            .write_line(&format!("Changed: {}", path.display()), LineStyle::Notice);
        tracing::debug!(path = %path.display(), "change accepted");

        match self.restart() {
            Some(_) => ChangeOutcome::Restarted,
            None => ChangeOutcome::SpawnFailed,
        }
    }

    /// Restart immediately, ignoring filter and cooldown.
    pub fn run_now(&self) -> Option<Drains> {
        self.restart()
    }

    pub fn terminate(&self) {
        self.supervisor.terminate();
    }

    pub fn send_input(&self, bytes: &[u8]) {
        self.supervisor.send_input(bytes);
    }

    /// Print what is being watched and which keys are reserved.
    pub fn banner(&self) {
        let mut extensions: Vec<String> = self
            .config
            .extensions()
            .iter()
            .map(|e| if e.is_empty() { "(none)".to_string() } else { format!(".{e}") })
            .collect();
        extensions.sort();

        self.sink.write_line(
            &format!(
                "Watching {} for {} changes; running '{}'",
                self.config.root().display(),
                extensions.join(" "),
                self.config.display_command()
            ),
            LineStyle::Notice,
        );
        self.sink.write_line(
            "Ctrl+Enter: run now  Ctrl+D: terminate  other keys go to the command",
            LineStyle::Notice,
        );
    }

    /// Attach a file system watcher to the root that feeds `on_change`.
    ///
    /// Events stop as soon as the returned watcher is dropped.
    pub fn watch(self: &Arc<Self>) -> WatchResult<RecommendedWatcher> {
        let coordinator = Arc::clone(self);
        let mut watcher = notify::recommended_watcher(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                        return;
                    }
                    for path in &event.paths {
                        coordinator.on_change(path, Instant::now());
                    }
                }
                Err(e) => tracing::warn!(error = %e, "file watcher error"),
            },
        )?;

        let mode = if self.config.recursive() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(self.config.root(), mode)?;
        tracing::info!(root = %self.config.root().display(), ?mode, "watching");

        Ok(watcher)
    }

    fn restart(&self) -> Option<Drains> {
        match self.supervisor.restart() {
            Ok(drains) => Some(drains),
            Err(e) => {
                tracing::error!(error = %e, "restart failed");
                self.sink.write_line(&e.to_string(), LineStyle::Error);
                None
            }
        }
    }
}
