//! Real-time audio output
//!
//! Bridges the pull-based speaker engine to the system audio device through
//! rodio. The device owns a [`SpeakerSource`] that locks the shared engine
//! once per emulated millisecond and renders the next chunk of PCM.

mod audio_device;

pub use audio_device::{AudioDevice, SpeakerSource};
