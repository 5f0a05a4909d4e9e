//! PC speaker hardware constants
//!
//! Timing and synthesis constants shared across the emulation components.
//! The PIT values match the 8254 as wired on the IBM PC; the filter values
//! are the reconstruction parameters used by the impulse synthesizer.

/// PIT input clock in Hz (1.193182 MHz, one third of the 4.77 MHz CPU clock)
pub const PIT_TICK_RATE: u32 = 1_193_182;

/// Duration of a single PIT input clock in milliseconds
pub const MS_PER_PIT_TICK: f32 = 1000.0 / PIT_TICK_RATE as f32;

/// Speaker line amplitude when the PIT output is high
pub const POSITIVE_AMPLITUDE: i16 = 20_000;

/// Speaker line amplitude when the PIT output is low
pub const NEGATIVE_AMPLITUDE: i16 = -POSITIVE_AMPLITUDE;

/// Number of taps applied per impulse (one-sided kernel length in samples)
pub const FILTER_QUALITY: usize = 100;

/// Sub-sample phases the kernel is sampled at (fractional-delay resolution)
pub const OVERSAMPLING: usize = 32;

/// Total kernel table length
pub const FILTER_WIDTH: usize = FILTER_QUALITY * OVERSAMPLING;

/// Margin keeping the reconstruction cutoff below the Nyquist frequency.
/// Must be greater than 0.0.
pub const CUTOFF_MARGIN: f32 = 0.2;

/// One-pole DC-blocking decay applied per output sample
pub const HIGHPASS_COEFFICIENT: f32 = 0.999;

/// Maximum number of output transitions buffered between render calls.
/// Further edges within one tick are dropped (bounded-queue backpressure).
pub const EDGE_LOG_CAPACITY: usize = 1024;

/// Lowest sample rate the engine will configure itself for
pub const MIN_SAMPLE_RATE: u32 = 8000;

/// Sample rate used when none is configured
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Counter value the PIT powers on with (mode 3, ~903 Hz)
pub const POWER_ON_COUNTER: u32 = 1320;
