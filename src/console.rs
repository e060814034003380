//! The console context: one owner for every piece of per-run state.
//!
//! Scripts never see this type directly. The scripting layer holds it behind
//! an `Rc<RefCell<_>>` and each namespace call borrows it for the duration of
//! that call only.

use crate::audio::{AudioOutput, ChannelPool, WaveformParams};
use crate::config::ConsoleConfig;
use crate::graphics::{FlushReport, GraphicsPipeline};
use crate::input::InputMapper;
use crate::platform::{Platform, SurfaceSize};
use crate::scheduler::{FrameScheduler, Halt, SchedulerState};

pub struct Console {
    config: ConsoleConfig,
    pipeline: GraphicsPipeline,
    scheduler: FrameScheduler,
    audio: ChannelPool,
    input: InputMapper,
    platform: Box<dyn Platform>,
    torn_down: bool,
}

impl Console {
    pub fn new(config: ConsoleConfig, platform: Box<dyn Platform>, output: Box<dyn AudioOutput>) -> Self {
        let pipeline = GraphicsPipeline::new(config.command_capacity, platform.surface_size());
        let audio = ChannelPool::new(output, config.audio.fidelity);
        log::debug!(
            "Console ready: {}x{}, {} command slots, {:?} audio",
            platform.surface_size().width,
            platform.surface_size().height,
            config.command_capacity,
            config.audio.fidelity
        );
        Self {
            config,
            pipeline,
            scheduler: FrameScheduler::new(),
            audio,
            input: InputMapper::new(),
            platform,
            torn_down: false,
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn graphics(&self) -> &GraphicsPipeline {
        &self.pipeline
    }

    pub fn graphics_mut(&mut self) -> &mut GraphicsPipeline {
        &mut self.pipeline
    }

    pub fn audio(&self) -> &ChannelPool {
        &self.audio
    }

    pub fn input(&self) -> &InputMapper {
        &self.input
    }

    pub fn tick(&self) -> u64 {
        self.scheduler.tick()
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn surface_size(&self) -> SurfaceSize {
        self.platform.surface_size()
    }

    /// Replay the pending commands, then end the frame.
    pub fn draw(&mut self) -> Result<FlushReport, Halt> {
        if self.scheduler.state() == SchedulerState::ShuttingDown {
            return Err(Halt::Close);
        }
        let report = self.pipeline.flush(self.platform.surface_size());
        self.interrupt()?;
        Ok(report)
    }

    /// End the frame without replaying; the last flushed image is shown again.
    pub fn interrupt(&mut self) -> Result<(), Halt> {
        self.scheduler
            .interrupt(self.platform.as_mut(), self.pipeline.framebuffer(), &mut self.input)
    }

    /// Yield `frames` frames. Zero or negative returns immediately.
    pub fn sleep(&mut self, frames: i64) -> Result<(), Halt> {
        for _ in 0..frames.max(0) {
            self.interrupt()?;
        }
        Ok(())
    }

    /// Zero-based slot that was replaced.
    pub fn blip(&mut self, params: WaveformParams) -> usize {
        self.audio.blip(params)
    }

    pub fn exit(&mut self, code: i32) -> Halt {
        log::info!("Script requested exit with status {}", code);
        self.scheduler.request_exit(code)
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Release pipeline, audio and platform, in that order. Runs once.
    ///
    /// The script environment must already be gone; the scripting layer drops
    /// its engine before calling this.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.pipeline.release();
        self.audio.release();
        self.platform.teardown();
        log::debug!("Console torn down after {} frames", self.scheduler.tick());
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{PlaybackEvent, RecordingOutput, Waveform};
    use crate::graphics::PaletteColor;
    use crate::platform::{HeadlessHandle, HeadlessPlatform};

    fn console() -> (Console, HeadlessHandle) {
        let (platform, handle) = HeadlessPlatform::new(SurfaceSize::new(64, 48));
        let console = Console::new(ConsoleConfig::default(), Box::new(platform), Box::new(RecordingOutput::new()));
        (console, handle)
    }

    #[test]
    fn test_sleep_counts_frames() {
        let (mut console, handle) = console();
        console.sleep(0).unwrap();
        console.sleep(-3).unwrap();
        assert_eq!(console.tick(), 0);
        assert_eq!(handle.presented(), 0);

        console.sleep(5).unwrap();
        assert_eq!(console.tick(), 5);
        assert_eq!(handle.presented(), 5);
    }

    #[test]
    fn test_draw_flushes_before_present() {
        let (mut console, handle) = console();
        let gfx = console.graphics_mut();
        gfx.clear();
        gfx.set_color(3);
        gfx.move_to(0.0, 0.0);
        gfx.line_to(1.0, 1.0);

        let report = console.draw().unwrap();
        assert_eq!(report.strokes.len(), 1);
        assert_eq!(report.strokes[0].color, PaletteColor::Orange);
        assert_eq!(console.graphics().pending_count(), 0);

        let frame = handle.last_frame().unwrap();
        assert_eq!(frame.pixel(32, 24), Some(PaletteColor::Orange.rgba()));
    }

    #[test]
    fn test_draw_picks_up_resize() {
        let (mut console, handle) = console();
        handle.resize(SurfaceSize::new(32, 32));
        let report = console.draw().unwrap();
        assert!(report.resized);
        assert_eq!(console.graphics().framebuffer().map(|f| f.width()), Some(32));
    }

    #[test]
    fn test_close_halts_sleep() {
        let (mut console, handle) = console();
        handle.close_after(2);
        assert_eq!(console.sleep(10), Err(Halt::Close));
        assert_eq!(console.tick(), 2);
        assert_eq!(console.draw(), Err(Halt::Close));
    }

    #[test]
    fn test_teardown_releases_once() {
        let (platform, handle) = HeadlessPlatform::new(SurfaceSize::new(8, 8));
        let output = RecordingOutput::new();
        let log = output.log();
        let mut console = Console::new(ConsoleConfig::default(), Box::new(platform), Box::new(output));

        console.blip(WaveformParams::new(Waveform::Sine, 0, 0.5, 0.01));
        console.teardown();
        console.teardown();
        drop(console);

        assert!(handle.is_torn_down());
        let releases = log.borrow().iter().filter(|e| matches!(e, PlaybackEvent::Release)).count();
        assert_eq!(releases, 1);
    }
}
