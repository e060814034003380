//! PCM playback backends.

use std::cell::RefCell;
use std::rc::Rc;

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};

use super::synth::{Pcm, SAMPLE_RATE};
use super::CHANNEL_COUNT;
use crate::error::ConsoleError;

/// A device that can play one PCM buffer per channel.
pub trait AudioOutput {
    /// Start playing `pcm` on `channel`, cutting off whatever it was playing.
    fn play(&mut self, channel: usize, pcm: &Pcm);
    fn stop(&mut self, channel: usize);
    /// Stop everything and close the device.
    fn release(&mut self);
}

/// Default output device via rodio, one sink per channel.
pub struct RodioOutput {
    /// Dropping the stream closes the device; `None` once released.
    stream: Option<OutputStream>,
    handle: OutputStreamHandle,
    sinks: [Option<Sink>; CHANNEL_COUNT],
}

impl RodioOutput {
    pub fn try_default() -> Result<Self, ConsoleError> {
        let (stream, handle) = OutputStream::try_default().map_err(|e| ConsoleError::Audio(e.to_string()))?;
        Ok(Self {
            stream: Some(stream),
            handle,
            sinks: Default::default(),
        })
    }
}

impl AudioOutput for RodioOutput {
    fn play(&mut self, channel: usize, pcm: &Pcm) {
        if channel >= CHANNEL_COUNT || self.stream.is_none() {
            return;
        }
        self.stop(channel);
        match Sink::try_new(&self.handle) {
            Ok(sink) => {
                sink.append(SamplesBuffer::new(1, SAMPLE_RATE, pcm.to_i16()));
                self.sinks[channel] = Some(sink);
            }
            Err(e) => log::warn!("Could not open audio channel {}: {}", channel + 1, e),
        }
    }

    fn stop(&mut self, channel: usize) {
        if let Some(sink) = self.sinks.get_mut(channel).and_then(Option::take) {
            sink.stop();
        }
    }

    fn release(&mut self) {
        for channel in 0..CHANNEL_COUNT {
            self.stop(channel);
        }
        if self.stream.take().is_some() {
            log::debug!("Audio device closed");
        }
    }
}

/// A playback request seen by [`RecordingOutput`].
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Play { channel: usize, samples: usize },
    Stop { channel: usize },
    Release,
}

/// Shared view of everything a [`RecordingOutput`] was asked to do.
pub type PlaybackLog = Rc<RefCell<Vec<PlaybackEvent>>>;

/// Silent output that records requests. Used headless and when no audio
/// device is available.
#[derive(Debug, Default)]
pub struct RecordingOutput {
    log: PlaybackLog,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> PlaybackLog {
        Rc::clone(&self.log)
    }
}

impl AudioOutput for RecordingOutput {
    fn play(&mut self, channel: usize, pcm: &Pcm) {
        self.log.borrow_mut().push(PlaybackEvent::Play {
            channel,
            samples: pcm.len(),
        });
    }

    fn stop(&mut self, channel: usize) {
        self.log.borrow_mut().push(PlaybackEvent::Stop { channel });
    }

    fn release(&mut self) {
        self.log.borrow_mut().push(PlaybackEvent::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{synthesize, Fidelity, Waveform, WaveformParams};

    #[test]
    fn test_rodio_release_closes_device() {
        // Machines without a sound device only exercise the open failure.
        let Ok(mut output) = RodioOutput::try_default() else {
            return;
        };
        let pcm = synthesize(&WaveformParams::new(Waveform::Sine, 0, 0.1, 0.01), Fidelity::High);
        output.play(0, &pcm);
        output.release();
        assert!(output.stream.is_none());
        assert!(output.sinks.iter().all(Option::is_none));

        output.play(0, &pcm);
        assert!(output.sinks[0].is_none());
    }

    #[test]
    fn test_recording_output_logs_requests() {
        let mut output = RecordingOutput::new();
        let log = output.log();
        output.stop(2);
        output.release();
        assert_eq!(*log.borrow(), vec![PlaybackEvent::Stop { channel: 2 }, PlaybackEvent::Release]);
    }
}
