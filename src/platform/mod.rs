//! Host platform boundary: display surface, raw input and window lifetime.
//!
//! The scheduler pumps the platform once per frame; everything else queries
//! state latched by that pump.

pub mod headless;
pub mod native;

pub use headless::{HeadlessHandle, HeadlessPlatform};
pub use native::NativePlatform;

use crate::error::ConsoleError;
use crate::framebuffer::Framebuffer;
use crate::input::InputSource;

/// Drawable area in physical pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

pub trait Platform: InputSource {
    fn surface_size(&self) -> SurfaceSize;

    /// Process pending window and device events without blocking.
    fn pump_events(&mut self);

    /// Set once the user asked to close the console (window close, Escape).
    fn close_requested(&self) -> bool;

    /// Show a completed frame, pacing to the target frame rate.
    fn present(&mut self, frame: &Framebuffer) -> Result<(), ConsoleError>;

    /// Release the surface and window. Called exactly once, last.
    fn teardown(&mut self);
}
