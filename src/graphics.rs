//! Deferred turtle-graphics pipeline.
//!
//! Script calls push [`DrawCommand`]s into a bounded [`CommandBuffer`]; nothing
//! touches the framebuffer until [`GraphicsPipeline::flush`] replays the buffer
//! through the turtle state machine. Coordinates are normalized (0..1) with the
//! origin at the bottom-left of the display.

use crate::framebuffer::{Framebuffer, Rgba};
use crate::platform::SurfaceSize;

/// Line weight in output pixels.
pub const LINE_WEIGHT: f32 = 3.0;

/// The eight-entry console palette. Index 1 and anything outside 1..8 is white.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaletteColor {
    #[default]
    White,
    Red,
    Orange,
    Yellow,
    Green,
    SkyBlue,
    Blue,
    Pink,
}

impl PaletteColor {
    pub fn from_index(index: i64) -> Self {
        match index {
            2 => PaletteColor::Red,
            3 => PaletteColor::Orange,
            4 => PaletteColor::Yellow,
            5 => PaletteColor::Green,
            6 => PaletteColor::SkyBlue,
            7 => PaletteColor::Blue,
            8 => PaletteColor::Pink,
            _ => PaletteColor::White,
        }
    }

    pub fn rgba(self) -> Rgba {
        match self {
            PaletteColor::White => Rgba::rgb(255, 255, 255),
            PaletteColor::Red => Rgba::rgb(230, 41, 55),
            PaletteColor::Orange => Rgba::rgb(255, 161, 0),
            PaletteColor::Yellow => Rgba::rgb(253, 249, 0),
            PaletteColor::Green => Rgba::rgb(0, 228, 48),
            PaletteColor::SkyBlue => Rgba::rgb(102, 191, 255),
            PaletteColor::Blue => Rgba::rgb(0, 121, 241),
            PaletteColor::Pink => Rgba::rgb(255, 109, 194),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    Clear,
    /// Raw palette index as given by the caller; resolved during replay.
    SetColor(i64),
    MoveTo(f32, f32),
    LineTo(f32, f32),
}

/// Fixed-capacity, insertion-ordered command queue.
///
/// One slot is always left unused: once `len() == capacity - 1` further pushes
/// are dropped silently.
#[derive(Debug, Clone)]
pub struct CommandBuffer {
    commands: Vec<DrawCommand>,
    capacity: usize,
}

impl CommandBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            commands: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns false if the command was dropped.
    pub fn push(&mut self, command: DrawCommand) -> bool {
        if self.commands.len() >= self.capacity - 1 {
            return false;
        }
        self.commands.push(command);
        true
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

/// Pen position and color. Position survives `Clear` and flushes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TurtleState {
    pub x: f32,
    pub y: f32,
    pub color: PaletteColor,
}

/// A line produced during replay, in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub color: PaletteColor,
}

/// What a flush did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushReport {
    pub replayed: usize,
    pub clears: usize,
    pub strokes: Vec<Stroke>,
    /// The framebuffer was recreated because the surface changed size.
    pub resized: bool,
}

pub struct GraphicsPipeline {
    buffer: CommandBuffer,
    turtle: TurtleState,
    framebuffer: Option<Framebuffer>,
    dropped: u64,
}

impl GraphicsPipeline {
    pub fn new(capacity: usize, surface: SurfaceSize) -> Self {
        Self {
            buffer: CommandBuffer::new(capacity),
            turtle: TurtleState::default(),
            framebuffer: Some(Framebuffer::new(surface.width, surface.height)),
            dropped: 0,
        }
    }

    pub fn clear(&mut self) {
        self.push(DrawCommand::Clear);
    }

    pub fn set_color(&mut self, index: i64) {
        self.push(DrawCommand::SetColor(index));
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.push(DrawCommand::MoveTo(x, y));
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        self.push(DrawCommand::LineTo(x, y));
    }

    fn push(&mut self, command: DrawCommand) {
        if !self.buffer.push(command) {
            self.dropped += 1;
            if self.dropped == 1 {
                log::debug!(
                    "Draw command buffer full ({} slots); dropping further commands until flush",
                    self.buffer.capacity()
                );
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn pending(&self) -> impl Iterator<Item = &DrawCommand> {
        self.buffer.iter()
    }

    pub fn turtle(&self) -> TurtleState {
        self.turtle
    }

    /// `None` once the pipeline has been released at teardown.
    pub fn framebuffer(&self) -> Option<&Framebuffer> {
        self.framebuffer.as_ref()
    }

    /// Replay every pending command into the framebuffer and empty the buffer.
    ///
    /// If `surface` differs from the framebuffer's size the framebuffer is
    /// recreated first. Never fails; an empty buffer is a no-op replay.
    pub fn flush(&mut self, surface: SurfaceSize) -> FlushReport {
        let mut report = FlushReport::default();

        let stale = match &self.framebuffer {
            Some(frame) => frame.width() != surface.width.max(1) || frame.height() != surface.height.max(1),
            None => true,
        };
        if stale {
            log::debug!("Recreating framebuffer at {}x{}", surface.width, surface.height);
            self.framebuffer = Some(Framebuffer::new(surface.width, surface.height));
            report.resized = true;
        }

        if let Some(frame) = self.framebuffer.as_mut() {
            let (w, h) = (frame.width() as f32, frame.height() as f32);
            let to_pixels = |x: f32, y: f32| (x * w, (1.0 - y) * h);

            for command in self.buffer.iter() {
                match *command {
                    DrawCommand::Clear => {
                        frame.fill(Rgba::BLACK);
                        self.turtle.color = PaletteColor::White;
                        report.clears += 1;
                    }
                    DrawCommand::SetColor(index) => {
                        self.turtle.color = PaletteColor::from_index(index);
                    }
                    DrawCommand::MoveTo(x, y) => {
                        self.turtle.x = x;
                        self.turtle.y = y;
                    }
                    DrawCommand::LineTo(x, y) => {
                        let from = (self.turtle.x, self.turtle.y);
                        frame.draw_line(
                            to_pixels(from.0, from.1),
                            to_pixels(x, y),
                            LINE_WEIGHT,
                            self.turtle.color.rgba(),
                        );
                        report.strokes.push(Stroke {
                            from,
                            to: (x, y),
                            color: self.turtle.color,
                        });
                        self.turtle.x = x;
                        self.turtle.y = y;
                    }
                }
                report.replayed += 1;
            }
        }

        self.buffer.clear();
        self.dropped = 0;
        report
    }

    /// Drop the framebuffer. Pending commands are discarded.
    pub fn release(&mut self) {
        self.buffer.clear();
        self.framebuffer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> SurfaceSize {
        SurfaceSize::new(100, 100)
    }

    #[test]
    fn test_palette_out_of_range_is_white() {
        for index in [-5, -1, 0, 1, 9, 100, i64::MIN, i64::MAX] {
            assert_eq!(PaletteColor::from_index(index), PaletteColor::White, "index {index}");
        }
        assert_eq!(PaletteColor::from_index(3), PaletteColor::Orange);
        assert_eq!(PaletteColor::from_index(8), PaletteColor::Pink);
    }

    #[test]
    fn test_buffer_drops_past_capacity_minus_one() {
        let mut pipeline = GraphicsPipeline::new(255, surface());
        for i in 0..1000 {
            pipeline.move_to(i as f32 / 1000.0, 0.0);
        }
        assert_eq!(pipeline.pending_count(), 254);
    }

    #[test]
    fn test_flush_empties_buffer() {
        let mut pipeline = GraphicsPipeline::new(255, surface());
        let report = pipeline.flush(surface());
        assert_eq!(report.replayed, 0);
        assert_eq!(pipeline.pending_count(), 0);

        for _ in 0..300 {
            pipeline.line_to(0.5, 0.5);
        }
        pipeline.flush(surface());
        assert_eq!(pipeline.pending_count(), 0);
    }

    #[test]
    fn test_clear_keeps_position_and_resets_color() {
        let mut pipeline = GraphicsPipeline::new(255, surface());
        pipeline.set_color(5);
        pipeline.move_to(0.25, 0.75);
        pipeline.flush(surface());
        assert_eq!(pipeline.turtle().color, PaletteColor::Green);

        pipeline.clear();
        pipeline.flush(surface());
        let turtle = pipeline.turtle();
        assert_eq!((turtle.x, turtle.y), (0.25, 0.75));
        assert_eq!(turtle.color, PaletteColor::White);
    }

    #[test]
    fn test_orange_line_scenario() {
        let mut pipeline = GraphicsPipeline::new(255, surface());
        pipeline.clear();
        pipeline.set_color(3);
        pipeline.move_to(0.0, 0.0);
        pipeline.line_to(1.0, 1.0);
        let report = pipeline.flush(surface());

        assert_eq!(
            report.strokes,
            vec![Stroke {
                from: (0.0, 0.0),
                to: (1.0, 1.0),
                color: PaletteColor::Orange,
            }]
        );
        let turtle = pipeline.turtle();
        assert_eq!((turtle.x, turtle.y), (1.0, 1.0));
        assert_eq!(turtle.color, PaletteColor::Orange);

        // The diagonal crosses the centre of the frame.
        let frame = pipeline.framebuffer().unwrap();
        assert_eq!(frame.pixel(50, 49), Some(PaletteColor::Orange.rgba()));
    }

    #[test]
    fn test_position_persists_across_flushes() {
        let mut pipeline = GraphicsPipeline::new(255, surface());
        pipeline.move_to(0.1, 0.2);
        pipeline.flush(surface());
        pipeline.line_to(0.3, 0.4);
        let report = pipeline.flush(surface());
        assert_eq!(report.strokes[0].from, (0.1, 0.2));
    }

    #[test]
    fn test_resize_recreates_framebuffer() {
        let mut pipeline = GraphicsPipeline::new(255, surface());
        let report = pipeline.flush(surface());
        assert!(!report.resized);

        let report = pipeline.flush(SurfaceSize::new(200, 50));
        assert!(report.resized);
        let frame = pipeline.framebuffer().unwrap();
        assert_eq!((frame.width(), frame.height()), (200, 50));
    }

    #[test]
    fn test_origin_is_bottom_left() {
        let mut pipeline = GraphicsPipeline::new(255, surface());
        pipeline.set_color(2);
        pipeline.move_to(0.0, 0.05);
        pipeline.line_to(1.0, 0.05);
        pipeline.flush(surface());
        let frame = pipeline.framebuffer().unwrap();
        assert_eq!(frame.pixel(50, 95), Some(PaletteColor::Red.rgba()));
        assert_eq!(frame.pixel(50, 5), Some(Rgba::BLACK));
    }
}
