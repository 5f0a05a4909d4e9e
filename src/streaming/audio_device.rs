//! Audio device integration using rodio
//!
//! Plays the speaker engine's output on the system audio device. The rodio
//! sink pulls samples from a [`SpeakerSource`], which renders from the
//! shared engine one emulated millisecond at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rodio::{OutputStream, Sink, Source};

use crate::config::SpeakerConfig;
use crate::speaker::SharedSpeaker;
use crate::{Result, SpeakerError};

/// Audio source that renders from the shared speaker engine.
///
/// Each refill locks the engine for exactly one render call, so the CPU
/// emulation side can interleave control writes between chunks.
pub struct SpeakerSource {
    speaker: SharedSpeaker,
    sample_rate: u32,
    finished: Arc<AtomicBool>,
    /// One emulated millisecond of rendered PCM
    chunk: Vec<i16>,
    chunk_pos: usize,
    /// Sub-millisecond sample remainder carried between chunks, in Hz units.
    /// Keeps emulated time locked to wall-clock audio for rates that are not
    /// a multiple of 1000.
    fraction: u32,
}

impl SpeakerSource {
    /// Create a source pulling from `speaker`.
    ///
    /// Setting `finished` terminates the stream on the next sample.
    pub fn new(speaker: SharedSpeaker, finished: Arc<AtomicBool>) -> Self {
        let sample_rate = speaker.lock().sample_rate();
        let chunk_capacity = (sample_rate / 1000) as usize + 1;
        SpeakerSource {
            speaker,
            sample_rate,
            finished,
            chunk: Vec::with_capacity(chunk_capacity), // empty: render on first pull
            chunk_pos: 0,
            fraction: 0,
        }
    }

    /// Length of the next chunk: the whole samples of one millisecond, plus
    /// one extra whenever the accumulated remainder amounts to a full sample
    fn next_chunk_len(&mut self) -> usize {
        let mut len = (self.sample_rate / 1000) as usize;
        self.fraction += self.sample_rate % 1000;
        if self.fraction >= 1000 {
            self.fraction -= 1000;
            len += 1;
        }
        len
    }
}

impl Source for SpeakerSource {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.chunk.len().max((self.sample_rate / 1000) as usize))
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        // The stream runs until finished() is signalled
        None
    }
}

impl Iterator for SpeakerSource {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        if self.finished.load(Ordering::Relaxed) {
            return None;
        }

        if self.chunk_pos >= self.chunk.len() {
            let len = self.next_chunk_len();
            self.chunk.resize(len, 0);
            // render never fails, so the stream never underruns
            self.speaker.lock().render(&mut self.chunk);
            self.chunk_pos = 0;
        }

        let sample = self.chunk[self.chunk_pos];
        self.chunk_pos += 1;
        Some(sample)
    }
}

/// Audio playback device using rodio
pub struct AudioDevice {
    _stream: OutputStream,
    sink: Sink,
    running: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

impl AudioDevice {
    /// Open the default audio device and start playing from `speaker`.
    ///
    /// Fails with [`SpeakerError::Config`] when the speaker is disabled in
    /// `config`, and with [`SpeakerError::AudioDevice`] when no output
    /// backend is available.
    pub fn open(config: &SpeakerConfig, speaker: SharedSpeaker) -> Result<Self> {
        if !config.enabled {
            return Err(SpeakerError::Config(
                "speaker audio output is disabled".into(),
            ));
        }

        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| SpeakerError::AudioDevice(format!("failed to create stream: {e}")))?;
        let sink = Sink::try_new(&stream_handle)
            .map_err(|e| SpeakerError::AudioDevice(format!("failed to create sink: {e}")))?;

        let finished = Arc::new(AtomicBool::new(false));
        let source = SpeakerSource::new(speaker, Arc::clone(&finished));
        tracing::info!(
            sample_rate = source.sample_rate(),
            "speaker audio stream started"
        );
        sink.append(source);

        Ok(AudioDevice {
            _stream: stream,
            sink,
            running: Arc::new(AtomicBool::new(true)),
            finished,
        })
    }

    /// Pause playback
    pub fn pause(&self) {
        self.sink.pause();
    }

    /// Resume playback
    pub fn play(&self) {
        self.sink.play();
    }

    /// Check if the device is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Signal that no more audio will be produced.
    ///
    /// The playback stream terminates instead of rendering silence forever.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Relaxed);
    }
}

impl Drop for AudioDevice {
    fn drop(&mut self) {
        self.pause();
        self.finished.store(true, Ordering::Relaxed);
        self.running.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speaker::PcSpeaker;

    fn try_audio_device() -> Option<(AudioDevice, SharedSpeaker)> {
        let config = SpeakerConfig::default();
        let speaker = PcSpeaker::shared(&config);

        match AudioDevice::open(&config, Arc::clone(&speaker)) {
            Ok(device) => Some((device, speaker)),
            Err(err) => {
                eprintln!(
                    "Skipping streaming::audio_device test (audio backend unavailable): {}",
                    err
                );
                None
            }
        }
    }

    #[test]
    fn test_disabled_config_is_rejected() {
        let config = SpeakerConfig {
            enabled: false,
            ..Default::default()
        };
        let speaker = PcSpeaker::shared(&config);

        match AudioDevice::open(&config, speaker) {
            Err(SpeakerError::Config(_)) => {}
            Err(other) => panic!("expected Config error, got {other}"),
            Ok(_) => panic!("disabled speaker must not open a device"),
        }
    }

    #[test]
    fn test_audio_device_creation() {
        let Some((device, _speaker)) = try_audio_device() else {
            return;
        };
        assert!(device.is_running());
    }

    #[test]
    fn test_pause_and_play() {
        let Some((device, _speaker)) = try_audio_device() else {
            return;
        };
        device.pause();
        assert!(device.is_running());
        device.play();
        assert!(device.is_running());
    }

    #[test]
    fn test_source_renders_chunks() {
        let speaker = PcSpeaker::shared(&SpeakerConfig::default());
        {
            let mut guard = speaker.lock();
            guard.set_counter(1193, 3, 0.0);
            guard.set_type(true, true, 0.0);
        }
        let finished = Arc::new(AtomicBool::new(false));
        let mut source = SpeakerSource::new(speaker, Arc::clone(&finished));

        assert_eq!(source.sample_rate(), 44_100);
        assert_eq!(source.channels(), 1);

        let mut heard = false;
        for _ in 0..44_100 {
            match source.next() {
                Some(sample) => heard |= sample.abs() > 1000,
                None => panic!("source must not terminate before the finish signal"),
            }
        }
        assert!(heard, "a programmed square wave should be audible");
    }

    #[test]
    fn test_chunk_lengths_carry_the_submillisecond_remainder() {
        let speaker = PcSpeaker::shared(&SpeakerConfig::default());
        let finished = Arc::new(AtomicBool::new(false));
        let mut source = SpeakerSource::new(speaker, finished);

        // one second of chunks yields exactly one second of samples
        let total: usize = (0..1000).map(|_| source.next_chunk_len()).sum();
        assert_eq!(total, 44_100);
    }

    #[test]
    fn test_source_finished_signal() {
        let speaker = PcSpeaker::shared(&SpeakerConfig::default());
        let finished = Arc::new(AtomicBool::new(false));
        let mut source = SpeakerSource::new(speaker, Arc::clone(&finished));

        assert!(source.next().is_some());
        finished.store(true, Ordering::Relaxed);
        assert_eq!(source.next(), None);
    }
}
