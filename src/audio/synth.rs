//! Procedural waveform synthesis.
//!
//! A blip is generated on demand from [`WaveformParams`]: a phase accumulator
//! steps at `ROOT_NOTE_FREQUENCY * 2^(semitone / 12) / SAMPLE_RATE` per sample
//! and is mapped to an amplitude by the waveform shape.

use std::f32::consts::PI;

use rand::Rng;
use serde::Deserialize;

pub const SAMPLE_RATE: u32 = 44_100;

/// Frequency of semitone 0 (A4).
pub const ROOT_NOTE_FREQUENCY: f32 = 440.0;

/// Noise re-randomizes its phase every this many samples.
const NOISE_RESEED_INTERVAL: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Waveform {
    Square,
    Triangle,
    Sine,
    Noise,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [Waveform::Square, Waveform::Triangle, Waveform::Sine, Waveform::Noise];

    /// 1-based waveform id, as used by `audio.blip`.
    pub fn from_id(id: i64) -> Option<Waveform> {
        match id {
            1 => Some(Waveform::Square),
            2 => Some(Waveform::Triangle),
            3 => Some(Waveform::Sine),
            4 => Some(Waveform::Noise),
            _ => None,
        }
    }

    pub fn id(self) -> i64 {
        match self {
            Waveform::Square => 1,
            Waveform::Triangle => 2,
            Waveform::Sine => 3,
            Waveform::Noise => 4,
        }
    }

    /// Amplitude in -1..=1 at the given phase.
    fn amplitude(self, phase: f32) -> f32 {
        match self {
            Waveform::Square => {
                if phase < 0.5 {
                    -1.0
                } else {
                    1.0
                }
            }
            Waveform::Triangle => {
                if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    1.0 - 4.0 * (phase - 0.5)
                }
            }
            Waveform::Sine => (2.0 * PI * phase).sin(),
            Waveform::Noise => (2.0 * PI * phase).powf(3.0).sin(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformParams {
    pub waveform: Waveform,
    pub semitone: i32,
    pub volume: f32,
    /// Seconds.
    pub duration: f32,
}

impl WaveformParams {
    pub fn new(waveform: Waveform, semitone: i32, volume: f32, duration: f32) -> Self {
        Self {
            waveform,
            semitone,
            volume,
            duration,
        }
    }

    pub fn sample_count(&self) -> usize {
        // Negative and NaN durations saturate to zero.
        (self.duration * SAMPLE_RATE as f32) as usize
    }

    fn phase_step(&self) -> f32 {
        ROOT_NOTE_FREQUENCY * 2f32.powf(self.semitone as f32 / 12.0) / SAMPLE_RATE as f32
    }
}

/// Output sample width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fidelity {
    /// Signed 16-bit samples.
    #[default]
    High,
    /// Signed 8-bit samples.
    Low,
}

/// Mono PCM at [`SAMPLE_RATE`].
#[derive(Debug, Clone, PartialEq)]
pub enum Pcm {
    Wide(Vec<i16>),
    Narrow(Vec<i8>),
}

impl Pcm {
    pub fn len(&self) -> usize {
        match self {
            Pcm::Wide(samples) => samples.len(),
            Pcm::Narrow(samples) => samples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn fidelity(&self) -> Fidelity {
        match self {
            Pcm::Wide(_) => Fidelity::High,
            Pcm::Narrow(_) => Fidelity::Low,
        }
    }

    /// Widen to 16-bit for devices that only take `i16`.
    pub fn to_i16(&self) -> Vec<i16> {
        match self {
            Pcm::Wide(samples) => samples.clone(),
            Pcm::Narrow(samples) => samples.iter().map(|&s| (s as i16) << 8).collect(),
        }
    }
}

/// Generate a blip using the thread-local RNG for noise.
pub fn synthesize(params: &WaveformParams, fidelity: Fidelity) -> Pcm {
    synthesize_with(params, fidelity, &mut rand::thread_rng())
}

pub fn synthesize_with<R: Rng + ?Sized>(params: &WaveformParams, fidelity: Fidelity, rng: &mut R) -> Pcm {
    let total = params.sample_count();
    let step = params.phase_step();
    let mut phase = 0.0f32;
    let mut amplitudes = Vec::with_capacity(total);

    for i in 0..total {
        amplitudes.push(params.waveform.amplitude(phase) * params.volume);

        phase += step;
        if phase > 1.0 {
            phase = 0.0;
        }
        if params.waveform == Waveform::Noise && i % NOISE_RESEED_INTERVAL == 0 {
            phase = rng.gen_range(0..128) as f32 / 128.0;
        }
    }

    match fidelity {
        Fidelity::High => Pcm::Wide(amplitudes.iter().map(|a| (a * 32767.0) as i16).collect()),
        Fidelity::Low => Pcm::Narrow(amplitudes.iter().map(|a| (a * 127.0) as i8).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn params(waveform: Waveform) -> WaveformParams {
        WaveformParams::new(waveform, 15, 0.5, 0.1)
    }

    #[test]
    fn test_sample_count() {
        let pcm = synthesize(&params(Waveform::Triangle), Fidelity::High);
        assert_eq!(pcm.len(), 4410);
    }

    #[test]
    fn test_non_positive_duration_is_empty() {
        let mut p = params(Waveform::Sine);
        p.duration = -1.0;
        assert!(synthesize(&p, Fidelity::High).is_empty());
        p.duration = 0.0;
        assert!(synthesize(&p, Fidelity::Low).is_empty());
    }

    #[test]
    fn test_tonal_waveforms_are_deterministic() {
        for waveform in [Waveform::Square, Waveform::Triangle, Waveform::Sine] {
            for fidelity in [Fidelity::High, Fidelity::Low] {
                let a = synthesize(&params(waveform), fidelity);
                let b = synthesize(&params(waveform), fidelity);
                assert_eq!(a, b, "{waveform:?} {fidelity:?}");
            }
        }
    }

    #[test]
    fn test_square_levels() {
        let Pcm::Wide(samples) = synthesize(&WaveformParams::new(Waveform::Square, 0, 1.0, 0.01), Fidelity::High) else {
            panic!("expected 16-bit samples");
        };
        assert_eq!(samples[0], -32767);
        assert!(samples.iter().all(|&s| s == -32767 || s == 32767));
        assert!(samples.contains(&32767));
    }

    #[test]
    fn test_triangle_starts_at_trough() {
        let Pcm::Narrow(samples) = synthesize(&params(Waveform::Triangle), Fidelity::Low) else {
            panic!("expected 8-bit samples");
        };
        // -1.0 * 0.5 * 127
        assert_eq!(samples[0], -63);
        assert!(samples.iter().all(|&s| (-64..=64).contains(&s)));
    }

    #[test]
    fn test_phase_step_follows_semitone() {
        let octave_up = WaveformParams::new(Waveform::Sine, 12, 1.0, 1.0);
        let root = WaveformParams::new(Waveform::Sine, 0, 1.0, 1.0);
        assert!((octave_up.phase_step() - 2.0 * root.phase_step()).abs() < 1e-6);
        assert!((root.phase_step() - 440.0 / 44_100.0).abs() < 1e-6);
    }

    #[test]
    fn test_noise_shape_cubes_the_angle() {
        for phase in [0.0f32, 0.1, 0.3, 0.75] {
            let expected = (2.0 * PI * phase).powf(3.0).sin();
            assert_eq!(Waveform::Noise.amplitude(phase), expected);
        }
    }

    #[test]
    fn test_noise_with_seeded_rng() {
        let p = params(Waveform::Noise);
        let a = synthesize_with(&p, Fidelity::High, &mut StdRng::seed_from_u64(7));
        let b = synthesize_with(&p, Fidelity::High, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert_eq!(a.len(), 4410);
    }

    #[test]
    fn test_narrow_widening() {
        let pcm = Pcm::Narrow(vec![-128, 0, 127]);
        assert_eq!(pcm.to_i16(), vec![-32768, 0, 32512]);
        assert_eq!(pcm.fidelity(), Fidelity::Low);
    }
}
