//! Host error types.
//!
//! Script-level failures are reported as [`ScriptDiagnostic`](crate::script_diagnostics::ScriptDiagnostic)s;
//! the errors here cover everything that happens around the script: reading
//! the entry file, configuration, and bringing up window, GPU and audio devices.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("cannot read script '{path}': {source}")]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in '{path}': {message}")]
    Config { path: PathBuf, message: String },

    #[error("window unavailable: {0}")]
    Window(String),

    #[error("graphics device unavailable: {0}")]
    Gpu(String),

    #[error("audio device unavailable: {0}")]
    Audio(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_read_message_names_path() {
        let err = ConsoleError::ScriptRead {
            path: PathBuf::from("games/missing.rhai"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let message = err.to_string();
        assert!(message.contains("games/missing.rhai"));
        assert!(message.contains("not found"));
    }
}
