//! In-memory platform with no window.
//!
//! Tests drive it through a [`HeadlessHandle`]: hold keys for a range of
//! frames, resize the surface, request a close after N frames, and inspect
//! what was presented.

use std::cell::RefCell;
use std::collections::HashSet;
use std::ops::Range;
use std::rc::Rc;

use super::{Platform, SurfaceSize};
use crate::error::ConsoleError;
use crate::framebuffer::Framebuffer;
use crate::input::{InputSource, Key, PadButton};

#[derive(Debug, Default)]
struct HeadlessState {
    size: SurfaceSize,
    pumps: u64,
    close_requested: bool,
    close_after_pumps: Option<u64>,
    held_keys: Vec<(Key, Range<u64>)>,
    held_pad_buttons: Vec<(usize, PadButton, Range<u64>)>,
    keys_down: HashSet<Key>,
    pad_buttons_down: HashSet<(usize, PadButton)>,
    presented: u64,
    last_frame: Option<Framebuffer>,
    torn_down: bool,
}

pub struct HeadlessPlatform {
    state: Rc<RefCell<HeadlessState>>,
}

/// Test-side control of a [`HeadlessPlatform`].
#[derive(Clone)]
pub struct HeadlessHandle {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessPlatform {
    pub fn new(size: SurfaceSize) -> (Self, HeadlessHandle) {
        let state = Rc::new(RefCell::new(HeadlessState {
            size,
            ..Default::default()
        }));
        (
            Self {
                state: Rc::clone(&state),
            },
            HeadlessHandle { state },
        )
    }
}

impl HeadlessHandle {
    /// Hold `key` while the pump counter is within `frames`.
    /// Pump `n` (1-based) is the one performed by the `n`th interrupt.
    pub fn hold_key(&self, key: Key, frames: Range<u64>) {
        self.state.borrow_mut().held_keys.push((key, frames));
    }

    /// Like [`hold_key`](Self::hold_key) for a zero-based gamepad.
    pub fn hold_pad_button(&self, pad: usize, button: PadButton, frames: Range<u64>) {
        self.state.borrow_mut().held_pad_buttons.push((pad, button, frames));
    }

    pub fn request_close(&self) {
        self.state.borrow_mut().close_requested = true;
    }

    /// Request a close during pump number `pumps + 1`.
    pub fn close_after(&self, pumps: u64) {
        self.state.borrow_mut().close_after_pumps = Some(pumps);
    }

    pub fn resize(&self, size: SurfaceSize) {
        self.state.borrow_mut().size = size;
    }

    pub fn presented(&self) -> u64 {
        self.state.borrow().presented
    }

    pub fn last_frame(&self) -> Option<Framebuffer> {
        self.state.borrow().last_frame.clone()
    }

    pub fn is_torn_down(&self) -> bool {
        self.state.borrow().torn_down
    }
}

impl InputSource for HeadlessPlatform {
    fn key_down(&self, key: Key) -> bool {
        self.state.borrow().keys_down.contains(&key)
    }

    fn pad_button_down(&self, pad: usize, button: PadButton) -> bool {
        self.state.borrow().pad_buttons_down.contains(&(pad, button))
    }
}

impl Platform for HeadlessPlatform {
    fn surface_size(&self) -> SurfaceSize {
        self.state.borrow().size
    }

    fn pump_events(&mut self) {
        let mut state = self.state.borrow_mut();
        state.pumps += 1;
        let pump = state.pumps;

        if state.close_after_pumps.is_some_and(|limit| pump > limit) {
            state.close_requested = true;
        }

        let keys: HashSet<Key> = state
            .held_keys
            .iter()
            .filter(|(_, frames)| frames.contains(&pump))
            .map(|(key, _)| *key)
            .collect();
        let pads: HashSet<(usize, PadButton)> = state
            .held_pad_buttons
            .iter()
            .filter(|(_, _, frames)| frames.contains(&pump))
            .map(|(pad, button, _)| (*pad, *button))
            .collect();
        state.keys_down = keys;
        state.pad_buttons_down = pads;
    }

    fn close_requested(&self) -> bool {
        self.state.borrow().close_requested
    }

    fn present(&mut self, frame: &Framebuffer) -> Result<(), ConsoleError> {
        let mut state = self.state.borrow_mut();
        state.presented += 1;
        state.last_frame = Some(frame.clone());
        Ok(())
    }

    fn teardown(&mut self) {
        self.state.borrow_mut().torn_down = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduled_keys_follow_pumps() {
        let (mut platform, handle) = HeadlessPlatform::new(SurfaceSize::new(10, 10));
        handle.hold_key(Key::Z, 2..4);

        platform.pump_events();
        assert!(!platform.key_down(Key::Z));
        platform.pump_events();
        assert!(platform.key_down(Key::Z));
        platform.pump_events();
        assert!(platform.key_down(Key::Z));
        platform.pump_events();
        assert!(!platform.key_down(Key::Z));
    }

    #[test]
    fn test_close_after() {
        let (mut platform, handle) = HeadlessPlatform::new(SurfaceSize::new(10, 10));
        handle.close_after(1);
        platform.pump_events();
        assert!(!platform.close_requested());
        platform.pump_events();
        assert!(platform.close_requested());
    }

    #[test]
    fn test_present_records_frame() {
        let (mut platform, handle) = HeadlessPlatform::new(SurfaceSize::new(10, 10));
        platform.present(&Framebuffer::new(10, 10)).unwrap();
        assert_eq!(handle.presented(), 1);
        assert_eq!(handle.last_frame().map(|f| f.width()), Some(10));
    }
}
