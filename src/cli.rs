use std::cell::RefCell;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;

use crate::audio::{AudioOutput, RecordingOutput, RodioOutput};
use crate::config::ConsoleConfig;
use crate::console::Console;
use crate::intro::play_intro;
use crate::platform::NativePlatform;
use crate::script_log::fatal;
use crate::scripting::{RunOutcome, ScriptHost};

/// Extension appended to entry names given without one.
pub const SCRIPT_EXTENSION: &str = "rhai";

/// Entry file looked up inside a directory argument.
pub const DIRECTORY_ENTRY: &str = "init.rhai";

#[derive(Parser, Debug)]
#[command(name = "vgame", author, version, about = "A tiny fantasy console", long_about = None)]
struct Cli {
    /// Script to run: a file, a name without extension, or a directory with init.rhai
    path: Option<PathBuf>,

    /// Start in borderless fullscreen
    #[arg(short, long)]
    fullscreen: bool,

    /// Skip the startup animation
    #[arg(short, long)]
    cut_intro: bool,
}

/// Map the positional argument onto the script file to load.
pub fn resolve_entry(path: &Path) -> PathBuf {
    if path.is_dir() {
        return path.join(DIRECTORY_ENTRY);
    }
    if path.extension().map_or(false, |ext| ext == SCRIPT_EXTENSION) {
        return path.to_path_buf();
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(SCRIPT_EXTENSION);
    PathBuf::from(name)
}

/// Parse arguments, run the console, and return the process exit status.
pub fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version land here too.
            print!("{}", e);
            return if e.use_stderr() { 1 } else { 0 };
        }
    };

    let Some(path) = cli.path.as_deref() else {
        println!("Nothing to run!");
        return 1;
    };

    match launch(&resolve_entry(path), cli.fullscreen, cli.cut_intro) {
        Ok(code) => code,
        Err(e) => {
            fatal(&format!("{:#}", e));
            1
        }
    }
}

fn open_audio() -> Box<dyn AudioOutput> {
    match RodioOutput::try_default() {
        Ok(output) => Box::new(output),
        Err(e) => {
            log::warn!("{}; continuing without sound", e);
            Box::new(RecordingOutput::new())
        }
    }
}

fn launch(entry: &Path, fullscreen: bool, cut_intro: bool) -> Result<i32> {
    let mut config = ConsoleConfig::load_beside(entry)?;
    config.window.fullscreen |= fullscreen;

    let platform = NativePlatform::new(&config.window).context("Failed to start the console window")?;
    let console = Rc::new(RefCell::new(Console::new(config, Box::new(platform), open_audio())));

    if !cut_intro {
        let intro = play_intro(&mut console.borrow_mut());
        if let Err(halt) = intro {
            console.borrow_mut().teardown();
            return Ok(halt.exit_code());
        }
    }

    let mut host = ScriptHost::new(Rc::clone(&console));
    let outcome = match host.run_file(entry) {
        Ok(outcome) => outcome,
        Err(e) => {
            host.shutdown();
            return Err(e.into());
        }
    };

    if let RunOutcome::Failed(diag) = &outcome {
        fatal(&diag.summary());
    }
    let code = outcome.exit_code();
    host.shutdown();
    log::info!("Exiting with status {}", code);
    Ok(code)
}
