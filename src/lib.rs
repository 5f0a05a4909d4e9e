//! PC Speaker Emulator
//!
//! A hardware-accurate emulation of the classic PC speaker: an Intel 8254
//! PIT channel-2 state machine driving a one-bit speaker line, rendered to
//! band-limited 16-bit PCM through windowed-sinc impulse synthesis.
//!
//! # Features
//! - PIT modes 0 through 4 plus a constant-high fallback for
//!   unrepresentable periods
//! - Sub-millisecond edge timing with fractional-sample placement
//! - Band-limited synthesis (no aliasing from the raw square wave)
//! - One-pole DC-blocking high-pass on the output
//! - Graduated degradation: the render path never fails, it degrades
//!
//! # Crate feature flags
//! - `streaming` (opt-in): Real-time audio output (enables optional `rodio` dep)
//! - `export-wav` (opt-in): WAV file export (enables optional `hound` dep)
//!
//! # Quick start
//! ```
//! use pcspeaker::PcSpeaker;
//!
//! let mut speaker = PcSpeaker::with_sample_rate(44_100);
//! speaker.set_counter(1193, 3, 0.0); // ~1 kHz square wave
//! speaker.set_type(true, true, 0.0); // gate on, output on
//!
//! let mut pcm = vec![0i16; speaker.samples_per_tick()];
//! for _ in 0..10 {
//!     speaker.render(&mut pcm);
//! }
//! ```
//!
//! ## Real-time streaming
//! ```no_run
//! # #[cfg(feature = "streaming")]
//! # {
//! use pcspeaker::{AudioDevice, PcSpeaker, SpeakerConfig};
//!
//! let config = SpeakerConfig::default();
//! let speaker = PcSpeaker::shared(&config);
//! let device = AudioDevice::open(&config, speaker.clone()).unwrap();
//! speaker.lock().set_counter(1193, 3, 0.0);
//! speaker.lock().set_type(true, true, 0.0);
//! std::thread::sleep(std::time::Duration::from_secs(1));
//! device.finish();
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod constants;
pub mod edge;
#[cfg(feature = "export-wav")]
pub mod export;
pub mod kernel;
pub mod speaker;
#[cfg(feature = "streaming")]
pub mod streaming;
pub mod synth;
pub mod timer;

/// Error types for speaker engine operations
#[derive(thiserror::Error, Debug)]
pub enum SpeakerError {
    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    /// Error writing audio file
    #[error("Audio file write error: {0}")]
    AudioFile(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for SpeakerError {
    /// Converts a String into `SpeakerError::Other`.
    ///
    /// Convenience conversion for generic string errors. Prefer the specific
    /// variant constructors where the error type is known.
    fn from(msg: String) -> Self {
        SpeakerError::Other(msg)
    }
}

impl From<&str> for SpeakerError {
    /// Converts a string slice into `SpeakerError::Other`.
    fn from(msg: &str) -> Self {
        SpeakerError::Other(msg.to_string())
    }
}

/// Result type for speaker engine operations
pub type Result<T> = std::result::Result<T, SpeakerError>;

// Public API exports
pub use config::SpeakerConfig;
pub use speaker::{PcSpeaker, SharedSpeaker};
pub use timer::PitMode;

#[cfg(feature = "export-wav")]
pub use export::write_wav;
#[cfg(feature = "streaming")]
pub use streaming::{AudioDevice, SpeakerSource};
