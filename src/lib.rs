pub mod error;
pub mod config;
pub mod framebuffer;
pub mod graphics;
pub mod input;
pub mod platform;
pub mod gpu;
pub mod scheduler;
pub mod console;
pub mod intro;

// Audio
pub mod audio;

// Scripting
pub mod scripting;
pub mod script_log;
pub mod script_diagnostics;
pub mod script_introspection;
pub mod table_format;
pub mod base_rhai;
pub mod graphics_rhai;
pub mod audio_rhai;
pub mod input_rhai;
pub mod system_rhai;
pub mod string_rhai;
pub mod math_rhai;

pub mod cli;
