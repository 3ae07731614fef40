//! End-to-end tests for the watch loop
//!
//! A real file system watcher drives a real child process. The child is a
//! shell script that records each start in a log outside the watched root.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tempfile::{tempdir, TempDir};
use watch::{Coordinator, MemorySink, WatchConfig};

struct Fixture {
    root: TempDir,
    _scripts: TempDir,
    spawn_log: PathBuf,
    coordinator: Arc<Coordinator>,
}

/// Coordinator watching a fresh root for `extensions`.
fn setup(extensions: &[&str]) -> Fixture {
    let root = tempdir().unwrap();
    let scripts = tempdir().unwrap();
    let spawn_log = scripts.path().join("spawns.log");
    let script = scripts.path().join("build.sh");
    fs::write(
        &script,
        format!("echo $$ >> {}\nexec sleep 30\n", spawn_log.display()),
    )
    .unwrap();

    let config = WatchConfig::new("sh", script.display().to_string(), root.path())
        .unwrap()
        .with_extensions(extensions.iter().copied());
    let coordinator = Arc::new(Coordinator::new(config, Arc::new(MemorySink::new())));

    Fixture {
        root,
        _scripts: scripts,
        spawn_log,
        coordinator,
    }
}

fn spawned_pids(log: &Path) -> Vec<u32> {
    fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .filter_map(|l| l.trim().parse().ok())
        .collect()
}

/// Poll until `count` spawns are logged or the deadline passes.
fn wait_for_spawns(log: &Path, count: usize) -> Vec<u32> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let pids = spawned_pids(log);
        if pids.len() >= count || Instant::now() > deadline {
            return pids;
        }
        thread::sleep(Duration::from_millis(25));
    }
}

fn is_alive(pid: u32) -> bool {
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[test]
fn touches_within_cooldown_spawn_once_then_again_after_it() {
    let fx = setup(&["txt"]);
    let _watcher = fx.coordinator.watch().unwrap();
    let file = fx.root.path().join("a.txt");

    let first_touch = Instant::now();
    fs::write(&file, "1").unwrap();
    thread::sleep(Duration::from_millis(150));
    fs::write(&file, "2").unwrap();

    let pids = wait_for_spawns(&fx.spawn_log, 1);
    thread::sleep(Duration::from_millis(300));
    assert_eq!(spawned_pids(&fx.spawn_log).len(), 1, "burst should spawn once");
    let first_pid = pids[0];
    assert!(is_alive(first_pid));

    let resume = first_touch + Duration::from_millis(1200);
    thread::sleep(resume.saturating_duration_since(Instant::now()));
    fs::write(&file, "3").unwrap();

    let pids = wait_for_spawns(&fx.spawn_log, 2);
    assert_eq!(pids.len(), 2, "change after the cooldown should spawn again");
    assert!(!is_alive(first_pid), "first run must be terminated");
    assert!(is_alive(pids[1]));

    fx.coordinator.terminate();
    assert!(!is_alive(pids[1]));
}

#[test]
fn irrelevant_extension_spawns_nothing() {
    let fx = setup(&["txt"]);
    let _watcher = fx.coordinator.watch().unwrap();

    fs::write(fx.root.path().join("b.bin"), "data").unwrap();
    thread::sleep(Duration::from_millis(600));

    assert!(spawned_pids(&fx.spawn_log).is_empty());
    assert!(!fx.coordinator.supervisor().is_running());
}

#[test]
fn extensionless_file_triggers_with_empty_sentinel() {
    let fx = setup(&["c", ""]);
    let _watcher = fx.coordinator.watch().unwrap();

    fs::write(fx.root.path().join("Makefile"), "all:\n").unwrap();

    assert_eq!(wait_for_spawns(&fx.spawn_log, 1).len(), 1);
    fx.coordinator.terminate();
}

#[test]
fn subdirectories_are_not_watched_by_default() {
    let fx = setup(&["txt"]);
    let nested = fx.root.path().join("nested");
    fs::create_dir(&nested).unwrap();
    let _watcher = fx.coordinator.watch().unwrap();

    fs::write(nested.join("a.txt"), "x").unwrap();
    thread::sleep(Duration::from_millis(600));

    assert!(spawned_pids(&fx.spawn_log).is_empty());
}

#[test]
fn dropping_the_watcher_stops_triggers() {
    let fx = setup(&["txt"]);
    let watcher = fx.coordinator.watch().unwrap();
    drop(watcher);

    fs::write(fx.root.path().join("a.txt"), "x").unwrap();
    thread::sleep(Duration::from_millis(600));

    assert!(spawned_pids(&fx.spawn_log).is_empty());
}
