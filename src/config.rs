//! Console configuration.
//!
//! Every field has a default matching the stock console (800x600 resizable
//! window at 60 FPS, 16-bit audio, 255-slot command buffer). A `console.json`
//! placed next to the entry script may override any subset of fields:
//!
//! ```json
//! { "window": { "width": 640, "height": 480 }, "audio": { "fidelity": "low" } }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::audio::Fidelity;
use crate::error::ConsoleError;

/// File name looked up beside the entry script.
pub const CONFIG_FILE_NAME: &str = "console.json";

/// Default draw-command buffer capacity (one slot is always kept free).
pub const DEFAULT_COMMAND_CAPACITY: usize = 255;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub window: WindowConfig,
    pub audio: AudioConfig,
    pub command_capacity: usize,
    pub sandbox: SandboxLimits,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            audio: AudioConfig::default(),
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            sandbox: SandboxLimits::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub target_fps: u32,
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "V-Game".to_string(),
            target_fps: 60,
            fullscreen: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub fidelity: Fidelity,
}

/// Interpreter resource limits.
///
/// No operation limit: a game loop runs until the player closes the window.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SandboxLimits {
    pub max_expr_depth: usize,
    pub max_function_expr_depth: usize,
    pub max_call_levels: usize,
    pub max_string_size: usize,
    pub max_array_size: usize,
    pub max_map_size: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            max_expr_depth: 64,
            max_function_expr_depth: 64,
            max_call_levels: 64,
            max_string_size: 65_536,
            max_array_size: 65_536,
            max_map_size: 4_096,
        }
    }
}

impl ConsoleConfig {
    /// Parse a configuration document. `origin` is only used in error messages.
    pub fn from_json(text: &str, origin: &Path) -> Result<Self, ConsoleError> {
        serde_json::from_str(text).map_err(|e| ConsoleError::Config {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load `console.json` from the directory containing `entry`.
    /// A missing file yields the defaults.
    pub fn load_beside(entry: &Path) -> Result<Self, ConsoleError> {
        let path = config_path_for(entry);
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                log::info!("Loading console configuration from {}", path.display());
                Self::from_json(&text, &path)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConsoleError::Config {
                path,
                message: e.to_string(),
            }),
        }
    }
}

fn config_path_for(entry: &Path) -> PathBuf {
    entry
        .parent()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConsoleConfig::default();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.window.title, "V-Game");
        assert_eq!(config.command_capacity, 255);
        assert_eq!(config.audio.fidelity, Fidelity::High);
    }

    #[test]
    fn test_partial_override() {
        let text = r#"{ "window": { "width": 320 }, "audio": { "fidelity": "low" } }"#;
        let config = ConsoleConfig::from_json(text, Path::new("console.json")).unwrap();
        assert_eq!(config.window.width, 320);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.audio.fidelity, Fidelity::Low);
        assert_eq!(config.sandbox, SandboxLimits::default());
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let err = ConsoleConfig::from_json("{ window: ", Path::new("game/console.json")).unwrap_err();
        assert!(err.to_string().contains("game/console.json"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = ConsoleConfig::load_beside(Path::new("/nonexistent-dir/init.rhai")).unwrap();
        assert_eq!(config, ConsoleConfig::default());
    }
}
