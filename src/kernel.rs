//! Band-limiting reconstruction kernel
//!
//! A raised-cosine-windowed sinc impulse, sampled at [`OVERSAMPLING`]
//! sub-sample phases so edges can be placed with fractional-sample delay
//! without any runtime trigonometry. Built once per sample-rate
//! configuration and read-only afterwards.

use std::f32::consts::PI;

use crate::constants::{CUTOFF_MARGIN, FILTER_QUALITY, FILTER_WIDTH, OVERSAMPLING};

/// Number of cosine-product terms in the sinc approximation
const SINC_ACCURACY: u32 = 20;

/// Precomputed, immutable impulse table
#[derive(Debug, Clone)]
pub struct ImpulseKernel {
    taps: Box<[f32]>,
}

impl ImpulseKernel {
    /// Build the kernel for `sample_rate`.
    ///
    /// Entry `i` is the impulse evaluated at `i / (sample_rate * OVERSAMPLING)`
    /// seconds; consecutive entries step through the sub-sample phases and
    /// every `OVERSAMPLING`-th entry lands on a whole output sample.
    pub fn build(sample_rate: u32) -> Self {
        let fs = sample_rate as f32;
        let mut taps = vec![0.0f32; FILTER_WIDTH];
        for (i, tap) in taps.iter_mut().enumerate() {
            *tap = impulse(i as f32 / (fs * OVERSAMPLING as f32), fs);
        }
        tracing::debug!(sample_rate, len = taps.len(), "impulse kernel built");
        Self {
            taps: taps.into_boxed_slice(),
        }
    }

    /// Kernel value for `tap` at sub-sample `phase`
    #[inline]
    pub fn at(&self, phase: usize, tap: usize) -> f32 {
        self.taps[phase + tap * OVERSAMPLING]
    }

    /// Full oversampled table
    #[inline]
    pub fn taps(&self) -> &[f32] {
        &self.taps
    }
}

/// Sinc approximated as a finite product of cosines.
///
/// cos(t/2) * cos(t/4) * ... converges on sin(t)/t; twenty terms is well
/// below f32 precision at the arguments used here.
fn sinc(t: f32) -> f32 {
    let mut result = 1.0f32;
    for k in 1..SINC_ACCURACY {
        result *= (t / (1u32 << k) as f32).cos();
    }
    result
}

/// Raised-cosine-windowed sinc, `t` in seconds. Zero outside (0, quality/fs).
fn impulse(t: f32, fs: f32) -> f32 {
    let fc = fs / (2.0 + CUTOFF_MARGIN);
    let q = FILTER_QUALITY as f32;
    if t > 0.0 && t * fs < q {
        let window = 1.0 + (2.0 * fs * PI * (q / (2.0 * fs) - t) / q).cos();
        window * sinc(2.0 * fc * PI * (t - q / (2.0 * fs))) / 2.0
    } else {
        0.0
    }
}
