//! dged: a small keyboard-driven terminal text editor.
//!
//! Startup: configure logging, install a panic hook that logs before the
//! default one runs, enter the terminal, build the editor state, then
//! hand off to the frame loop. Exit codes follow this crate's own
//! contract rather than clap's defaults, since `--help` normally exits 0
//! and this editor reserves 0 for a normal quit.

mod cli;
mod frame_loop;
mod keymap;

use std::path::Path;
use std::sync::Once;

use anyhow::Result;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

use core_buffer::Buffer;
use core_terminal::{CrosstermBackend, TerminalBackend};

const EXIT_OK: i32 = 0;
const EXIT_HELP: i32 = 1;
const EXIT_USAGE_OR_DISPLAY: i32 = 2;
const EXIT_SETTINGS: i32 = 3;

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let args = match cli::parse(std::env::args()) {
        cli::Parsed::Run(args) => args,
        cli::Parsed::Help => {
            cli::print_help();
            return EXIT_HELP;
        }
        cli::Parsed::Error => return EXIT_USAGE_OR_DISPLAY,
    };

    let _log_guard = configure_logging();
    install_panic_hook();
    info!(target: "runtime", "startup");

    let config = match core_config::load_from(None) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("settings error: {err}");
            return EXIT_SETTINGS;
        }
    };

    let mut backend = CrosstermBackend::new();
    if let Err(err) = backend.set_title("dged") {
        eprintln!("terminal error: {err}");
        return EXIT_USAGE_OR_DISPLAY;
    }
    let guard = match backend.enter_guard() {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("terminal error: {err}");
            return EXIT_USAGE_OR_DISPLAY;
        }
    };
    let (width, height) = backend.size().unwrap_or((80, 24));

    let buffer = load_initial_buffer(args.filename.as_deref());

    let mut editor = match frame_loop::Editor::new(config, buffer, width, height) {
        Ok(editor) => editor,
        Err(err) => {
            error!(?err, "failed to initialize reactor");
            eprintln!("reactor error: {err}");
            drop(guard);
            return EXIT_USAGE_OR_DISPLAY;
        }
    };
    editor.position_initial_dot(args.line, args.end);

    let mut exit_code = EXIT_OK;
    loop {
        match editor.tick(&mut backend) {
            Ok(true) => continue,
            Ok(false) => break,
            Err(err) => {
                error!(?err, "tick failed");
                exit_code = EXIT_USAGE_OR_DISPLAY;
                break;
            }
        }
    }

    drop(guard);
    exit_code
}

fn load_initial_buffer(filename: Option<&Path>) -> Buffer {
    match filename {
        Some(path) => match Buffer::from_file(path) {
            Ok(buffer) => buffer,
            Err(err) => {
                error!(?err, path = %path.display(), "failed to open file; starting an empty buffer");
                let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("untitled");
                Buffer::create(name)
            }
        },
        None => Buffer::create("*scratch*"),
    }
}

/// Non-blocking file-backed logging. The log file from a previous run is
/// removed so each run starts with a fresh one, and a second `try_init`
/// (e.g. under `cargo test` where a subscriber is already installed) is
/// tolerated by simply dropping its guard.
fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = core_config::log_dir();
    if let Err(err) = std::fs::create_dir_all(&log_dir) {
        eprintln!("could not create log directory {}: {err}", log_dir.display());
        return None;
    }
    let log_path = log_dir.join("dged.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(&log_dir, "dged.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(_) => Some(guard),
        Err(_err) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}
