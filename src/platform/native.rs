//! Desktop platform: winit window, wgpu presentation, gilrs gamepads.
//!
//! The event loop is never handed control. Instead it is pumped from inside
//! every scheduler interrupt, so the script keeps the main thread between
//! frames.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gilrs::Gilrs;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Fullscreen, Window, WindowBuilder};

use super::{Platform, SurfaceSize};
use crate::config::WindowConfig;
use crate::error::ConsoleError;
use crate::framebuffer::Framebuffer;
use crate::gpu::presenter::Presenter;
use crate::input::{InputSource, Key, PadButton};

pub struct NativePlatform {
    event_loop: EventLoop<()>,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
    gamepads: Option<Gilrs>,
    keys_down: HashSet<Key>,
    close_requested: bool,
    frame_interval: Duration,
    last_present: Instant,
}

impl NativePlatform {
    pub fn new(config: &WindowConfig) -> Result<Self, ConsoleError> {
        let event_loop = EventLoop::new().map_err(|e| ConsoleError::Window(e.to_string()))?;

        let mut builder = WindowBuilder::new()
            .with_title(config.title.clone())
            .with_inner_size(LogicalSize::new(config.width, config.height))
            .with_resizable(true);
        if config.fullscreen {
            builder = builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        let window = Arc::new(
            builder
                .build(&event_loop)
                .map_err(|e| ConsoleError::Window(e.to_string()))?,
        );

        let presenter = pollster::block_on(Presenter::new(Arc::clone(&window)))?;

        let gamepads = match Gilrs::new() {
            Ok(gilrs) => Some(gilrs),
            Err(e) => {
                log::warn!("Gamepad support unavailable: {}", e);
                None
            }
        };

        let fps = config.target_fps.max(1);
        Ok(Self {
            event_loop,
            window: Some(window),
            presenter: Some(presenter),
            gamepads,
            keys_down: HashSet::new(),
            close_requested: false,
            frame_interval: Duration::from_secs(1) / fps,
            last_present: Instant::now(),
        })
    }
}

impl InputSource for NativePlatform {
    fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    fn pad_button_down(&self, pad: usize, button: PadButton) -> bool {
        self.gamepads
            .as_ref()
            .and_then(|gilrs| gilrs.gamepads().nth(pad))
            .map(|(_, gamepad)| gamepad.is_pressed(gilrs_button(button)))
            .unwrap_or(false)
    }
}

impl Platform for NativePlatform {
    fn surface_size(&self) -> SurfaceSize {
        self.window
            .as_ref()
            .map(|w| {
                let size = w.inner_size();
                SurfaceSize::new(size.width, size.height)
            })
            .unwrap_or_default()
    }

    fn pump_events(&mut self) {
        // Drain gilrs so its cached gamepad state is current.
        if let Some(gilrs) = self.gamepads.as_mut() {
            while gilrs.next_event().is_some() {}
        }

        let Self {
            event_loop,
            presenter,
            keys_down,
            close_requested,
            ..
        } = self;

        let status = event_loop.pump_events(Some(Duration::ZERO), |event, _target| {
            let Event::WindowEvent { event, .. } = event else {
                return;
            };
            match event {
                WindowEvent::CloseRequested => *close_requested = true,
                WindowEvent::Resized(size) => {
                    if let Some(presenter) = presenter.as_mut() {
                        presenter.resize(size.width, size.height);
                    }
                }
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(code),
                            state,
                            ..
                        },
                    ..
                } => {
                    if code == KeyCode::Escape && state == ElementState::Pressed {
                        *close_requested = true;
                    }
                    if let Some(key) = console_key(code) {
                        match state {
                            ElementState::Pressed => keys_down.insert(key),
                            ElementState::Released => keys_down.remove(&key),
                        };
                    }
                }
                _ => {}
            }
        });
        if let PumpStatus::Exit(code) = status {
            log::debug!("Event loop exited with {}", code);
            *close_requested = true;
        }
    }

    fn close_requested(&self) -> bool {
        self.close_requested
    }

    fn present(&mut self, frame: &Framebuffer) -> Result<(), ConsoleError> {
        let deadline = self.last_present + self.frame_interval;
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        self.last_present = Instant::now();

        match self.presenter.as_mut() {
            Some(presenter) => presenter.render(frame),
            None => Ok(()),
        }
    }

    fn teardown(&mut self) {
        // The surface must go before the window it was created from.
        self.presenter = None;
        self.window = None;
        self.gamepads = None;
        log::debug!("Window closed");
    }
}

fn console_key(code: KeyCode) -> Option<Key> {
    Some(match code {
        KeyCode::Enter => Key::Enter,
        KeyCode::Space => Key::Space,
        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::KeyZ => Key::Z,
        KeyCode::KeyX => Key::X,
        KeyCode::KeyC => Key::C,
        KeyCode::KeyV => Key::V,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyD => Key::D,
        _ => return None,
    })
}

fn gilrs_button(button: PadButton) -> gilrs::Button {
    match button {
        PadButton::Start => gilrs::Button::Start,
        PadButton::Select => gilrs::Button::Select,
        PadButton::DPadUp => gilrs::Button::DPadUp,
        PadButton::DPadRight => gilrs::Button::DPadRight,
        PadButton::DPadDown => gilrs::Button::DPadDown,
        PadButton::DPadLeft => gilrs::Button::DPadLeft,
        PadButton::South => gilrs::Button::South,
        PadButton::East => gilrs::Button::East,
        PadButton::North => gilrs::Button::North,
        PadButton::West => gilrs::Button::West,
        PadButton::LeftTrigger => gilrs::Button::LeftTrigger,
        PadButton::RightTrigger => gilrs::Button::RightTrigger,
    }
}
