//! `audio` namespace.

use rhai::{Dynamic, Engine, EvalAltResult, Map};

use crate::audio::{Waveform, WaveformParams};
use crate::scripting::SharedConsole;
use crate::script_introspection::{bad_argument, int_arg, number_arg, runtime_error};

const DEFAULT_SEMITONE: i64 = 3;
const DEFAULT_VOLUME: f32 = 0.5;
const DEFAULT_DURATION: f32 = 0.2;

#[derive(Clone)]
pub struct AudioApi {
    console: SharedConsole,
}

impl AudioApi {
    pub fn new(console: SharedConsole) -> Self {
        Self { console }
    }
}

/// Read `audio.blip` arguments. Missing or nil fields take their defaults.
fn blip_params(channel: &Dynamic, options: &Dynamic) -> Result<WaveformParams, Box<EvalAltResult>> {
    let id = int_arg(channel, 1, "blip")?;
    let waveform = Waveform::from_id(id)
        .ok_or_else(|| runtime_error(format!("bad argument #1 to 'blip' (channel must be 1-4, got {})", id)))?;

    let Some(options) = options.read_lock::<Map>() else {
        return Err(bad_argument(2, "blip", "table", options));
    };
    let field = |name: &str| options.get(name).filter(|v| !v.is_unit());

    let semitone = match field("Semitone") {
        Some(v) => int_arg(v, 2, "blip")?,
        None => DEFAULT_SEMITONE,
    };
    let volume = match field("Volume") {
        Some(v) => number_arg(v, 2, "blip")? as f32,
        None => DEFAULT_VOLUME,
    };
    let duration = match field("Duration") {
        Some(v) => number_arg(v, 2, "blip")? as f32,
        None => DEFAULT_DURATION,
    };

    let semitone = semitone.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
    Ok(WaveformParams::new(waveform, semitone, volume, duration))
}

pub fn register_audio_api(engine: &mut Engine) {
    engine.register_type_with_name::<AudioApi>("audio");

    engine.register_fn(
        "blip",
        |api: AudioApi, channel: Dynamic, options: Dynamic| -> Result<(), Box<EvalAltResult>> {
            let params = blip_params(&channel, &options)?;
            api.console.borrow_mut().blip(params);
            Ok(())
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{PlaybackEvent, SAMPLE_RATE};
    use crate::scripting::tests::harness_with_audio;

    #[test]
    fn test_defaults() {
        let params = blip_params(&Dynamic::from(1_i64), &Dynamic::from_map(Map::new())).unwrap();
        assert_eq!(params.waveform, Waveform::Square);
        assert_eq!(params.semitone, 3);
        assert_eq!(params.volume, 0.5);
        assert_eq!(params.duration, 0.2);
    }

    #[test]
    fn test_channel_two_blip() {
        let (mut host, _handle, log) = harness_with_audio();
        host.eval::<()>("audio.blip(2, #{ Semitone: 15, Volume: 0.5, Duration: 0.1 });")
            .unwrap();

        let console = host.console();
        let console = console.borrow();
        let slot = console.audio().channel(1).unwrap();
        assert_eq!(slot.params.waveform, Waveform::Triangle);
        assert_eq!(slot.params.semitone, 15);
        assert_eq!(slot.pcm.len(), (0.1 * SAMPLE_RATE as f32) as usize);
        for untouched in [0, 2, 3] {
            assert_eq!(console.audio().channel(untouched).unwrap().plays, 0);
        }

        let events = log.borrow();
        assert!(events.contains(&PlaybackEvent::Stop { channel: 1 }));
        assert!(events.contains(&PlaybackEvent::Play {
            channel: 1,
            samples: slot.pcm.len()
        }));
    }

    #[test]
    fn test_invalid_channel_is_catchable() {
        let (mut host, _handle, _log) = harness_with_audio();
        let message: String = host
            .eval(r#"let m = ""; try { audio.blip(5, #{}); } catch (e) { m = e; } m"#)
            .unwrap();
        assert!(message.contains("channel must be 1-4"));

        let message: String = host
            .eval(r#"let m = ""; try { audio.blip(1, 3); } catch (e) { m = e; } m"#)
            .unwrap();
        assert_eq!(message, "bad argument #2 to 'blip' (table expected, got number)");
    }
}
