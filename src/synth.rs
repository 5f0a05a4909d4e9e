//! Impulse synthesis and the PCM output stage
//!
//! Every logged edge deposits a scaled, phase-interpolated copy of the
//! precomputed kernel into a float accumulation buffer. Draining the buffer
//! integrates those band-limited steps into a running output level, applies
//! a one-pole DC-blocking decay and quantizes to signed 16-bit PCM.
//!
//! Nothing here allocates after construction; the drain shifts the buffer in
//! place so the same storage serves every render call.

use crate::constants::{FILTER_QUALITY, HIGHPASS_COEFFICIENT, OVERSAMPLING};
use crate::kernel::ImpulseKernel;

/// Band-limited impulse mixer with its accumulation buffer
#[derive(Debug)]
pub struct ImpulseSynth {
    kernel: ImpulseKernel,
    /// Not-yet-emitted audio energy, one float per future output sample
    buffer: Box<[f32]>,
    rate_per_ms: f32,
    /// Running output level, decayed each sample (DC blocking)
    level: f32,
}

impl ImpulseSynth {
    /// Build the kernel and size the buffer for `sample_rate`.
    ///
    /// The buffer holds one tick's worth of samples plus the kernel tail,
    /// which guarantees any edge within the tick fits entirely.
    pub fn new(sample_rate: u32) -> Self {
        let kernel = ImpulseKernel::build(sample_rate);
        let buffer_len = FILTER_QUALITY + (sample_rate / 1000) as usize + 1;
        tracing::debug!(sample_rate, buffer_len, "accumulation buffer sized");
        Self {
            kernel,
            buffer: vec![0.0f32; buffer_len].into_boxed_slice(),
            rate_per_ms: sample_rate as f32 / 1000.0,
            level: 0.0,
        }
    }

    /// Number of samples the accumulation buffer can hold
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Mix one edge at tick position `index` (milliseconds, 0.0..=1.0) with
    /// the given signed amplitude into the accumulation buffer.
    ///
    /// The position is split into a whole sample offset and one of
    /// [`OVERSAMPLING`] sub-sample phases; the kernel row for that phase is
    /// then added across [`FILTER_QUALITY`] taps.
    pub fn add_edge(&mut self, index: f32, amplitude: f32) {
        let samples_in_impulse = index * self.rate_per_ms;
        let mut offset = samples_in_impulse as usize;
        let mut phase = (samples_in_impulse * OVERSAMPLING as f32) as usize % OVERSAMPLING;
        if phase != 0 {
            offset += 1;
            phase = OVERSAMPLING - phase;
        }
        debug_assert!(
            offset + FILTER_QUALITY <= self.buffer.len(),
            "impulse tap past accumulation buffer"
        );
        for (tap, slot) in self.buffer[offset..offset + FILTER_QUALITY]
            .iter_mut()
            .enumerate()
        {
            *slot += amplitude * self.kernel.at(phase, tap);
        }
    }

    /// Drain samples into `out`, always filling the entire slice.
    ///
    /// A request longer than the buffer is a resource-exhaustion condition:
    /// the excess is emitted as leading silence and the drain is clamped,
    /// so the caller still receives exactly the length it asked for.
    pub fn drain(&mut self, out: &mut [i16]) {
        let mut len = out.len();
        let mut start = 0;
        if len > self.buffer.len() {
            tracing::warn!(
                requested = len,
                capacity = self.buffer.len(),
                "render request exceeds accumulation buffer, padding with silence"
            );
            start = len - self.buffer.len();
            out[..start].fill(0);
            len = self.buffer.len();
        }

        for i in 0..len {
            self.level += self.buffer[i];
            debug_assert!(
                self.level >= i16::MIN as f32 && self.level <= i16::MAX as f32,
                "output level {} exceeds PCM range",
                self.level
            );
            out[start + i] = self.level as i16;
            self.level *= HIGHPASS_COEFFICIENT;
        }

        // shift the unconsumed tail down and clear the vacated slots
        self.buffer.copy_within(len.., 0);
        let tail_start = self.buffer.len() - len;
        self.buffer[tail_start..].fill(0.0);
    }

    /// Accumulation buffer contents (diagnostics and tests)
    #[inline]
    pub(crate) fn accumulation(&self) -> &[f32] {
        &self.buffer
    }
}
