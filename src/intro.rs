//! Startup logo animation, played before the entry script unless cut.

use crate::audio::{Waveform, WaveformParams};
use crate::console::Console;
use crate::scheduler::Halt;

pub const INTRO_FRAMES: u64 = 180;

/// Frames showing the alignment grid before the letters appear.
const GRID_FRAMES: u64 = 4;

/// After this frame the first letter stops cycling and stays white.
const CYCLE_UNTIL: u64 = 90;

type Stroke = &'static [(f32, f32)];

/// "V-GAME" as polylines. Each stroke starts with a move.
const LOGO: &[&[Stroke]] = &[
    // V
    &[&[(0.05, 0.6), (0.125, 0.45), (0.2, 0.6), (0.05, 0.6)]],
    // -
    &[&[(0.2, 0.5), (0.2825, 0.5), (0.2825, 0.535), (0.2, 0.535), (0.2, 0.5)]],
    // G
    &[&[(0.45, 0.6), (0.3125, 0.6), (0.3125, 0.45), (0.45, 0.45), (0.45, 0.525), (0.4, 0.525)]],
    // A
    &[&[(0.475, 0.45), (0.625, 0.45), (0.55, 0.6), (0.475, 0.45)]],
    // M
    &[&[(0.65, 0.45), (0.8, 0.45), (0.8, 0.6), (0.725, 0.45), (0.65, 0.6), (0.65, 0.45)]],
    // E
    &[
        &[(0.95, 0.45), (0.825, 0.45), (0.825, 0.525), (0.95, 0.525)],
        &[(0.825, 0.525), (0.825, 0.6), (0.95, 0.6)],
    ],
];

/// Palette colour of the first letter on `frame`.
fn first_letter_color(frame: u64) -> i64 {
    if frame > CYCLE_UNTIL {
        1
    } else {
        (frame / 3 % 8 + 1) as i64
    }
}

fn draw_grid(console: &mut Console) {
    let graphics = console.graphics_mut();
    graphics.set_color(1);
    for step in 1..=9 {
        let i = step as f32 / 10.0;
        graphics.move_to(i, 0.0);
        graphics.line_to(i, 1.0);
        graphics.move_to(0.0, i);
        graphics.line_to(1.0, i);
    }
}

fn draw_logo(console: &mut Console, frame: u64) {
    let graphics = console.graphics_mut();
    let mut color = first_letter_color(frame);
    for letter in LOGO {
        graphics.set_color(color);
        for stroke in letter.iter() {
            let Some((&(x, y), rest)) = stroke.split_first() else {
                continue;
            };
            graphics.move_to(x, y);
            for &(x, y) in rest {
                graphics.line_to(x, y);
            }
        }
        color = color % 8 + 1;
    }
}

/// Play the jingle and the logo animation. A close request stops it early.
pub fn play_intro(console: &mut Console) -> Result<(), Halt> {
    log::debug!("Playing intro");
    console.blip(WaveformParams::new(Waveform::Triangle, 15, 0.5, 0.1));
    for frame in 0..INTRO_FRAMES {
        console.graphics_mut().clear();
        if frame < GRID_FRAMES {
            draw_grid(console);
        } else {
            draw_logo(console, frame);
        }
        console.draw()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RecordingOutput;
    use crate::config::ConsoleConfig;
    use crate::platform::{HeadlessPlatform, SurfaceSize};

    fn console() -> (Console, crate::platform::HeadlessHandle) {
        let (platform, handle) = HeadlessPlatform::new(SurfaceSize::new(80, 60));
        let console = Console::new(ConsoleConfig::default(), Box::new(platform), Box::new(RecordingOutput::new()));
        (console, handle)
    }

    #[test]
    fn test_color_cycle() {
        assert_eq!(first_letter_color(4), 2);
        assert_eq!(first_letter_color(23), 8);
        assert_eq!(first_letter_color(24), 1);
        assert_eq!(first_letter_color(91), 1);
    }

    #[test]
    fn test_intro_runs_full_length() {
        let (mut console, handle) = console();
        play_intro(&mut console).unwrap();
        assert_eq!(console.tick(), INTRO_FRAMES);
        assert_eq!(handle.presented(), INTRO_FRAMES);
        assert_eq!(console.graphics().pending_count(), 0);
    }

    #[test]
    fn test_intro_stops_on_close() {
        let (mut console, handle) = console();
        handle.close_after(10);
        assert_eq!(play_intro(&mut console), Err(Halt::Close));
        assert_eq!(console.tick(), 10);
    }
}
