//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SAMPLE_RATE, MIN_SAMPLE_RATE};

/// Configuration for the PC speaker engine.
///
/// Deserializes from the emulator's config file; all fields have sensible
/// defaults so a missing section yields a working speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeakerConfig {
    /// Whether speaker audio output is enabled at all
    pub enabled: bool,
    /// Requested output sample rate in Hz
    pub sample_rate: u32,
}

impl SpeakerConfig {
    /// The sample rate the engine will actually run at.
    ///
    /// Rates below the supported floor are clamped rather than rejected.
    pub fn effective_sample_rate(&self) -> u32 {
        if self.sample_rate < MIN_SAMPLE_RATE {
            tracing::warn!(
                requested = self.sample_rate,
                floor = MIN_SAMPLE_RATE,
                "sample rate below supported floor, clamping"
            );
            MIN_SAMPLE_RATE
        } else {
            self.sample_rate
        }
    }
}

impl Default for SpeakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}
