//! Script-facing output.
//!
//! Everything a script prints (`system.log/warn/error`, `print`, `debug`) and
//! the fatal error banner goes through here. Output is stdout with ANSI
//! colour for warnings and errors, rate limited per frame.

use std::cell::{Cell, RefCell};

/// Maximum number of log messages allowed per frame to prevent spam.
const MAX_LOGS_PER_FRAME: u32 = 100;

const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

thread_local! {
    /// Messages emitted since the last interrupt.
    static LOG_COUNT: Cell<u32> = const { Cell::new(0) };
    /// Whether the limit warning has been printed this frame.
    static WARNED_LIMIT: Cell<bool> = const { Cell::new(false) };
    /// When set, lines are collected here instead of printed.
    static CAPTURE: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn decorate(&self, message: &str) -> String {
        match self {
            LogLevel::Info => message.to_string(),
            LogLevel::Warn => format!("{YELLOW}WARNING: {message}{RESET}"),
            LogLevel::Error => format!("{RED}ERROR: {message}{RESET}"),
        }
    }
}

/// Reset the per-frame log counter. Called by the scheduler after every frame.
pub fn reset_frame_log_count() {
    LOG_COUNT.with(|c| c.set(0));
    WARNED_LIMIT.with(|w| w.set(false));
}

/// Check if we can log another message this frame.
fn can_log() -> bool {
    let count = LOG_COUNT.with(|c| {
        let count = c.get();
        c.set(count.saturating_add(1));
        count
    });
    if count < MAX_LOGS_PER_FRAME {
        return true;
    }
    // Only warn once per frame about exceeding limit
    if !WARNED_LIMIT.with(|w| w.replace(true)) {
        emit_line(LogLevel::Warn.decorate(&format!(
            "Script log limit exceeded ({} messages/frame). Further logs dropped.",
            MAX_LOGS_PER_FRAME
        )));
    }
    false
}

fn emit_line(line: String) {
    let captured = CAPTURE.with(|capture| match capture.borrow_mut().as_mut() {
        Some(lines) => {
            lines.push(line.clone());
            true
        }
        None => false,
    });
    if !captured {
        println!("{}", line);
    }
}

/// Log a message from a script, respecting the per-frame limit.
pub fn script_log(level: LogLevel, message: &str) {
    if can_log() {
        emit_line(level.decorate(message));
    }
}

/// Report an uncaught script error. Never rate limited.
pub fn fatal(message: &str) {
    emit_line(format_fatal(message));
}

pub fn format_fatal(message: &str) -> String {
    format!("{RED}FATAL ERROR: {message}{RESET}")
}

/// Run `f` with script output collected on this thread instead of printed.
pub fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    let previous = CAPTURE.with(|c| c.replace(Some(Vec::new())));
    let result = f();
    let lines = CAPTURE.with(|c| c.replace(previous)).unwrap_or_default();
    (result, lines)
}
