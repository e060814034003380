//! Frame scheduler.
//!
//! Owns the tick counter and the single present point. Every suspension a
//! script performs (`sleep`, `graphics.draw`) ends up in [`FrameScheduler::interrupt`],
//! which is also the only place a close request is observed. A script that
//! loops without yielding therefore cannot be closed from the window.

use crate::framebuffer::Framebuffer;
use crate::input::InputMapper;
use crate::platform::Platform;
use crate::script_log::reset_frame_log_count;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    /// Terminal. Every further interrupt halts again.
    ShuttingDown,
}

/// Why the frame loop stopped returning control to the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// The user closed the window or pressed Escape.
    Close,
    /// The script called `system.exit(code)`.
    Exit(i32),
}

impl Halt {
    pub fn exit_code(self) -> i32 {
        match self {
            Halt::Close => 0,
            Halt::Exit(code) => code,
        }
    }
}

#[derive(Debug)]
pub struct FrameScheduler {
    tick: u64,
    state: SchedulerState,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            tick: 0,
            state: SchedulerState::Running,
        }
    }

    /// Completed frames since startup.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Enter `ShuttingDown` on behalf of `system.exit`.
    pub fn request_exit(&mut self, code: i32) -> Halt {
        self.state = SchedulerState::ShuttingDown;
        Halt::Exit(code)
    }

    /// End the current frame.
    ///
    /// Pumps platform events, then either halts (close requested) or presents
    /// `frame`, latches input and advances the tick by one.
    pub fn interrupt(
        &mut self,
        platform: &mut dyn Platform,
        frame: Option<&Framebuffer>,
        input: &mut InputMapper,
    ) -> Result<(), Halt> {
        if self.state == SchedulerState::ShuttingDown {
            return Err(Halt::Close);
        }

        platform.pump_events();
        if platform.close_requested() {
            log::info!("Close requested at tick {}", self.tick);
            self.state = SchedulerState::ShuttingDown;
            return Err(Halt::Close);
        }

        if let Some(frame) = frame {
            if let Err(e) = platform.present(frame) {
                log::warn!("Present failed: {}", e);
            }
        }
        input.latch(&*platform);
        self.tick += 1;
        reset_frame_log_count();
        Ok(())
    }
}
