//! watch - rerun a command whenever a relevant file changes
//!
//! Usage: watch <COMMAND> [ARGS]...
//!
//! Keys:
//!   Ctrl+Enter  run the command now
//!   Ctrl+D      terminate the running command
//!   anything else is forwarded to the command's stdin

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use is_terminal::IsTerminal;
use tracing_subscriber::EnvFilter;

use watch::coordinator::Coordinator;
use watch::input::{restore_terminal, run_keyboard_loop, INTERRUPT_EXIT_CODE};
use watch::sink::ConsoleSink;
use watch::terminal::RawAwareWriter;
use watch::WatchConfig;

/// Environment variable holding the log filter directive
const LOG_ENV: &str = "WATCH_LOG";

/// Rerun a build command whenever a source file in the current directory changes
#[derive(Parser, Debug)]
#[command(name = "watch")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Command to run, followed by its arguments (joined with spaces)
    #[arg(value_name = "COMMAND", trailing_var_arg = true)]
    command: Vec<String>,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let root = std::env::current_dir().context("cannot determine the current directory")?;
    let config = WatchConfig::from_args(cli.command, root)?;

    cmd_watch(config)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(|| RawAwareWriter::new(std::io::stderr()))
        .init();
}

fn cmd_watch(config: WatchConfig) -> Result<()> {
    let root = config.root().to_path_buf();
    let coordinator = Arc::new(Coordinator::new(config, Arc::new(ConsoleSink::detect())));

    let _watcher = coordinator
        .watch()
        .with_context(|| format!("cannot watch {}", root.display()))?;

    let on_interrupt = Arc::clone(&coordinator);
    ctrlc::set_handler(move || {
        on_interrupt.terminate();
        restore_terminal();
        std::process::exit(INTERRUPT_EXIT_CODE);
    })
    .context("Error setting Ctrl+C handler")?;

    coordinator.banner();

    if std::io::stdin().is_terminal() {
        run_keyboard_loop(&coordinator)?;
    } else {
        // No keyboard to relay; keep watching until killed.
        tracing::info!("stdin is not a terminal, keyboard commands disabled");
        loop {
            std::thread::park();
        }
    }

    Ok(())
}
