//! Process supervisor
//!
//! Owns the single tracked child process. Every operation on the slot goes
//! through one mutex, so a restart can never interleave with a terminate or a
//! keystroke write. Drain threads never take that lock.

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use crate::config::WatchConfig;
use crate::error::{WatchError, WatchResult};
use crate::sink::{LineStyle, OutputSink};


/// Runs the configured command, at most one instance at a time.
pub struct ProcessSupervisor {
    config: Arc<WatchConfig>,
    sink: Arc<dyn OutputSink>,
    slot: Mutex<Option<TrackedChild>>,
}

struct TrackedChild {
    child: Child,
    stdin: Option<ChildStdin>,
    exited: bool,
}

impl TrackedChild {
    fn has_exited(&mut self) -> bool {
        if self.exited {
            return true;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!(pid = self.child.id(), %status, "child exited");
                self.exited = true;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(pid = self.child.id(), error = %e, "cannot query child state");
                self.exited = true;
            }
        }
        self.exited
    }

    /// Kill and reap. Failures mean the process is already gone.
    fn terminate(&mut self) {
        self.stdin = None;
        if self.has_exited() {
            return;
        }

        let pid = self.child.id();
        if let Err(e) = self.child.kill() {
            tracing::debug!(pid, error = %e, "kill failed");
        }
        match self.child.wait() {
            Ok(status) => tracing::debug!(pid, %status, "child terminated"),
            Err(e) => tracing::debug!(pid, error = %e, "wait after kill failed"),
        }
        self.exited = true;
    }
}

/// Handles on the two drain threads of one spawned process.
///
/// Dropping it detaches the threads; they still stop on their own once the
/// pipes reach end-of-stream.
#[derive(Debug)]
pub struct Drains {
    pid: u32,
    handles: Vec<JoinHandle<()>>,
}

impl Drains {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Block until stdout and stderr have both been drained.
    pub fn join(self) {
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}

impl ProcessSupervisor {
    pub fn new(config: Arc<WatchConfig>, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            config,
            sink,
            slot: Mutex::new(None),
        }
    }

    /// Terminate the tracked process, then start a fresh one.
    pub fn restart(&self) -> WatchResult<Drains> {
        let mut slot = self.slot.lock();
        if let Some(mut previous) = slot.take() {
            previous.terminate();
        }

        let mut child = Command::new(self.config.command())
            .args(self.config.argv())
            .current_dir(self.config.root())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| WatchError::Spawn {
                command: self.config.command().to_string(),
                source,
            })?;

        let pid = child.id();
        tracing::info!(pid, command = %self.config.display_command(), "started");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        *slot = Some(TrackedChild {
            stdin: child.stdin.take(),
            child,
            exited: false,
        });
        drop(slot);

        let mut handles = Vec::with_capacity(2);
        if let Some(stdout) = stdout {
            handles.push(spawn_drain(stdout, self.sink.clone(), LineStyle::Normal, pid)?);
        }
        if let Some(stderr) = stderr {
            handles.push(spawn_drain(stderr, self.sink.clone(), LineStyle::Error, pid)?);
        }

        Ok(Drains { pid, handles })
    }

    /// Kill the tracked process if it is still running.
    pub fn terminate(&self) {
        if let Some(tracked) = self.slot.lock().as_mut() {
            tracked.terminate();
        }
    }

    /// Write raw bytes to the running process's stdin.
    ///
    /// Does nothing when no process is running. If the child has closed its
    /// stdin the write error is dropped, and so is the handle.
    pub fn send_input(&self, bytes: &[u8]) {
        let mut slot = self.slot.lock();
        let Some(tracked) = slot.as_mut() else {
            return;
        };
        if tracked.has_exited() {
            return;
        }
        let Some(stdin) = tracked.stdin.as_mut() else {
            return;
        };

        let written = stdin.write_all(bytes).and_then(|()| stdin.flush());
        if let Err(e) = written {
            tracing::debug!(pid = tracked.child.id(), error = %e, "child stdin closed");
            tracked.stdin = None;
        }
    }

    pub fn is_running(&self) -> bool {
        self.slot
            .lock()
            .as_mut()
            .is_some_and(|tracked| !tracked.has_exited())
    }

    /// Pid of the running process, if any
    pub fn pid(&self) -> Option<u32> {
        let mut slot = self.slot.lock();
        let tracked = slot.as_mut()?;
        if tracked.has_exited() {
            None
        } else {
            Some(tracked.child.id())
        }
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        if let Some(tracked) = self.slot.get_mut().as_mut() {
            tracked.terminate();
        }
    }
}

/// Relay `pipe` to `sink` line by line until end-of-stream or a read error.
fn spawn_drain<R>(
    pipe: R,
    sink: Arc<dyn OutputSink>,
    style: LineStyle,
    pid: u32,
) -> WatchResult<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    let name = match style {
        LineStyle::Error => format!("stderr-{pid}"),
        _ => format!("stdout-{pid}"),
    };

    let handle = thread::Builder::new().name(name).spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    sink.write_line(line.trim_end_matches(['\n', '\r']), style);
                }
                Err(e) => {
                    tracing::debug!(pid, error = %e, "pipe read failed");
                    break;
                }
            }
        }
    })?;

    Ok(handle)
}
