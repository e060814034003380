//! Four-channel blip player.
//!
//! Channel `n` (1..4) always plays waveform `n`; a new blip replaces and
//! restarts its channel. There is no queueing.

pub mod output;
pub mod synth;

pub use output::{AudioOutput, PlaybackEvent, PlaybackLog, RecordingOutput, RodioOutput};
pub use synth::{synthesize, Fidelity, Pcm, Waveform, WaveformParams, SAMPLE_RATE};

pub const CHANNEL_COUNT: usize = 4;

/// Longest blip accepted, in seconds.
pub const MAX_BLIP_DURATION: f32 = 10.0;

/// The sound currently loaded in a channel slot.
#[derive(Debug, Clone)]
pub struct AudioChannel {
    pub params: WaveformParams,
    pub pcm: Pcm,
    /// Number of times this slot has been started.
    pub plays: u64,
}

pub struct ChannelPool {
    channels: Vec<AudioChannel>,
    output: Box<dyn AudioOutput>,
    fidelity: Fidelity,
    released: bool,
}

impl ChannelPool {
    /// Load every slot with a 3 second full-volume tone of its waveform.
    /// Nothing plays until the first blip.
    pub fn new(output: Box<dyn AudioOutput>, fidelity: Fidelity) -> Self {
        let channels = Waveform::ALL
            .iter()
            .map(|&waveform| {
                let params = WaveformParams::new(waveform, 3, 1.0, 3.0);
                AudioChannel {
                    params,
                    pcm: synthesize(&params, fidelity),
                    plays: 0,
                }
            })
            .collect();
        Self {
            channels,
            output,
            fidelity,
            released: false,
        }
    }

    pub fn fidelity(&self) -> Fidelity {
        self.fidelity
    }

    /// Regenerate the waveform's slot from `params` and start it.
    /// Volume is clamped to 0..1 and duration to `0..=MAX_BLIP_DURATION`.
    pub fn blip(&mut self, params: WaveformParams) -> usize {
        let params = WaveformParams {
            volume: params.volume.clamp(0.0, 1.0),
            duration: params.duration.clamp(0.0, MAX_BLIP_DURATION),
            ..params
        };
        let slot = (params.waveform.id() - 1) as usize;
        if self.released {
            return slot;
        }

        self.output.stop(slot);
        let pcm = synthesize(&params, self.fidelity);
        self.output.play(slot, &pcm);

        let channel = &mut self.channels[slot];
        channel.params = params;
        channel.pcm = pcm;
        channel.plays += 1;
        slot
    }

    /// Zero-based slot lookup.
    pub fn channel(&self, slot: usize) -> Option<&AudioChannel> {
        self.channels.get(slot)
    }

    /// Stop all channels and close the output. Later blips are ignored.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.output.release();
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> (ChannelPool, PlaybackLog) {
        let output = RecordingOutput::new();
        let log = output.log();
        (ChannelPool::new(Box::new(output), Fidelity::High), log)
    }

    #[test]
    fn test_initial_slots_are_loaded_but_silent() {
        let (pool, log) = pool();
        for slot in 0..CHANNEL_COUNT {
            let channel = pool.channel(slot).unwrap();
            assert_eq!(channel.params.waveform.id(), slot as i64 + 1);
            assert_eq!(channel.params.semitone, 3);
            assert_eq!(channel.pcm.len(), 3 * SAMPLE_RATE as usize);
            assert_eq!(channel.plays, 0);
        }
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_blip_replaces_only_its_slot() {
        let (mut pool, log) = pool();
        let slot = pool.blip(WaveformParams::new(Waveform::Triangle, 15, 0.5, 0.1));
        assert_eq!(slot, 1);

        let channel = pool.channel(1).unwrap();
        assert_eq!(channel.pcm.len(), 4410);
        assert_eq!(channel.plays, 1);
        for untouched in [0, 2, 3] {
            assert_eq!(pool.channel(untouched).unwrap().plays, 0);
        }
        assert_eq!(
            *log.borrow(),
            vec![
                PlaybackEvent::Stop { channel: 1 },
                PlaybackEvent::Play { channel: 1, samples: 4410 },
            ]
        );
    }

    #[test]
    fn test_blip_clamps_parameters() {
        let (mut pool, _) = pool();
        pool.blip(WaveformParams::new(Waveform::Sine, 0, 4.0, 60.0));
        let channel = pool.channel(2).unwrap();
        assert_eq!(channel.params.volume, 1.0);
        assert_eq!(channel.params.duration, MAX_BLIP_DURATION);
    }

    #[test]
    fn test_release_is_idempotent() {
        let (mut pool, log) = pool();
        pool.release();
        pool.release();
        pool.blip(WaveformParams::new(Waveform::Square, 0, 1.0, 0.1));
        assert_eq!(*log.borrow(), vec![PlaybackEvent::Release]);
    }
}
