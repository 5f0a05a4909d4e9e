//! PC speaker engine facade
//!
//! [`PcSpeaker`] ties the PIT state machine, the edge log and the impulse
//! synthesizer together behind the two surfaces the emulator uses: the
//! I/O-port control entry points called from CPU emulation, and the
//! pull-based [`render`](PcSpeaker::render) contract called once per
//! emulated millisecond by the audio layer.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::SpeakerConfig;
use crate::edge::EdgeLog;
use crate::synth::ImpulseSynth;
use crate::timer::PitState;

/// A speaker engine shared between the CPU emulation context and the audio
/// rendering context.
///
/// Every public entry point mutates the same state, so when the two sides
/// run on different threads they must serialize through this single guard.
pub type SharedSpeaker = Arc<Mutex<PcSpeaker>>;

/// Emulated PC speaker driven by PIT channel 2
///
/// # Example
///
/// ```
/// use pcspeaker::PcSpeaker;
///
/// let mut speaker = PcSpeaker::with_sample_rate(44_100);
///
/// // program a 1 kHz square wave and open the gate
/// speaker.set_counter(1193, 3, 0.0);
/// speaker.set_type(true, true, 0.0);
///
/// // pull one emulated millisecond of PCM
/// let mut pcm = vec![0i16; speaker.samples_per_tick()];
/// speaker.render(&mut pcm);
/// ```
pub struct PcSpeaker {
    pit: PitState,
    edges: EdgeLog,
    synth: ImpulseSynth,
    sample_rate: u32,
}

impl PcSpeaker {
    /// Create an engine from a configuration
    pub fn new(config: &SpeakerConfig) -> Self {
        Self::with_sample_rate(config.effective_sample_rate())
    }

    /// Create an engine for a specific output sample rate.
    ///
    /// Rates below the supported floor are clamped. The impulse kernel and
    /// buffers are sized here and stay fixed for the engine's lifetime.
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        let rate = sample_rate.max(crate::constants::MIN_SAMPLE_RATE);
        Self {
            pit: PitState::new(rate),
            edges: EdgeLog::new(),
            synth: ImpulseSynth::new(rate),
            sample_rate: rate,
        }
    }

    /// Create an engine wrapped in the shared guard used across contexts
    pub fn shared(config: &SpeakerConfig) -> SharedSpeaker {
        Arc::new(Mutex::new(Self::new(config)))
    }

    /// Configured output sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples produced per emulated millisecond, truncated.
    ///
    /// For rates that are not a multiple of 1000 a caller pacing against
    /// wall-clock audio should distribute the sub-millisecond remainder
    /// across ticks, as the streaming source does.
    #[inline]
    pub fn samples_per_tick(&self) -> usize {
        (self.sample_rate / 1000) as usize
    }

    /// PIT command register write (port 43h) selecting a channel-2 mode.
    ///
    /// `tick_index` is the current position within the emulated millisecond.
    pub fn set_pit_control(&mut self, mode: u8, tick_index: f32) {
        self.pit.set_control(mode, tick_index, &mut self.edges);
    }

    /// PIT channel-2 counter load (port 42h) for the given mode
    pub fn set_counter(&mut self, count: u32, mode: u8, tick_index: f32) {
        self.pit.set_counter(count, mode, tick_index, &mut self.edges);
    }

    /// Keyboard-controller speaker bits (port 61h): PIT clock gate enable
    /// and speaker output enable
    pub fn set_type(&mut self, clock_gate_enabled: bool, output_enabled: bool, tick_index: f32) {
        self.pit
            .set_type(clock_gate_enabled, output_enabled, tick_index, &mut self.edges);
    }

    /// Render the next batch of samples, filling `out` completely.
    ///
    /// Advances the PIT to tick end, converts all pending edges into
    /// band-limited impulses, then drains the accumulation buffer. Never
    /// fails and never returns short: oversized requests degrade to leading
    /// silence instead.
    pub fn render(&mut self, out: &mut [i16]) {
        self.pit.forward(1.0, &mut self.edges);
        self.pit.reset_tick();

        for edge in self.edges.edges() {
            self.synth
                .add_edge(edge.index.clamp(0.0, 1.0), edge.level as f32);
        }
        self.edges.clear();

        self.synth.drain(out);
    }

    /// Read-only view of the PIT channel (diagnostics)
    #[inline]
    pub fn pit(&self) -> &PitState {
        &self.pit
    }

    #[cfg(test)]
    pub(crate) fn accumulation(&self) -> &[f32] {
        self.synth.accumulation()
    }

    #[cfg(test)]
    pub(crate) fn pending_edges(&self) -> usize {
        self.edges.len()
    }
}

impl std::fmt::Debug for PcSpeaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcSpeaker")
            .field("sample_rate", &self.sample_rate)
            .field("mode", &self.pit.mode())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_wave_speaker(rate: u32, count: u32) -> PcSpeaker {
        let mut speaker = PcSpeaker::with_sample_rate(rate);
        speaker.set_counter(count, 3, 0.0);
        speaker.set_type(true, true, 0.0);
        speaker
    }

    #[test]
    fn test_sample_rate_floor() {
        let speaker = PcSpeaker::with_sample_rate(4000);
        assert_eq!(speaker.sample_rate(), crate::constants::MIN_SAMPLE_RATE);
    }

    #[test]
    fn test_render_fills_requested_length() {
        let mut speaker = square_wave_speaker(44_100, 1193);
        for len in [0usize, 1, 7, 44, 45] {
            let mut out = vec![123i16; len];
            speaker.render(&mut out);
            assert_eq!(out.len(), len);
        }
    }

    #[test]
    fn test_oversized_render_degrades_but_returns_full_length() {
        let mut speaker = square_wave_speaker(8000, 1000);
        let capacity = speaker.synth.capacity();

        let mut out = vec![99i16; capacity + 32];
        speaker.render(&mut out);
        assert!(out[..32].iter().all(|&s| s == 0));
    }

    #[test]
    fn test_render_drains_edge_log() {
        let mut speaker = square_wave_speaker(44_100, 1193);
        let mut out = vec![0i16; speaker.samples_per_tick()];
        speaker.render(&mut out);
        assert_eq!(speaker.pending_edges(), 0);
    }

    #[test]
    fn test_zero_length_render_leaves_idle_state_untouched() {
        // no control calls: the power-on square wave is not counting
        let mut speaker = PcSpeaker::with_sample_rate(44_100);
        let before: Vec<f32> = speaker.accumulation().to_vec();

        speaker.render(&mut []);

        assert_eq!(speaker.accumulation(), &before[..]);
        assert_eq!(speaker.pending_edges(), 0);
    }

    #[test]
    fn test_square_wave_produces_audio() {
        let mut speaker = square_wave_speaker(44_100, 1193);
        let tick = speaker.samples_per_tick();
        let mut out = vec![0i16; tick];

        let mut heard = false;
        for _ in 0..20 {
            speaker.render(&mut out);
            heard |= out.iter().any(|&s| s.abs() > 1000);
        }
        assert!(heard, "a 1 kHz square wave must be audible");
    }

    #[test]
    fn test_output_swing_bounded_by_line_amplitude() {
        // ~500 Hz mode-3 square wave; each edge deposits the line's absolute
        // level, so the integrated output peaks near +-(amplitude * kernel
        // gain) and settles around half that once the high-pass centers it
        let mut speaker = square_wave_speaker(44_100, 2386);
        let tick = speaker.samples_per_tick();
        let mut out = vec![0i16; tick];

        let mut min = i16::MAX;
        let mut max = i16::MIN;
        for _ in 0..500 {
            speaker.render(&mut out);
            for &s in &out {
                min = min.min(s);
                max = max.max(s);
            }
        }
        assert!(max > 5000, "square wave should be audible, peak {max}");
        assert!(
            min >= -25_000 && max <= 25_000,
            "swing [{min}, {max}] exceeds the line amplitude plus ringing"
        );
    }

    #[test]
    fn test_dc_blocking_centers_square_wave() {
        // ~523 Hz square wave rendered for two seconds
        let mut speaker = square_wave_speaker(8000, 2280);
        let tick = speaker.samples_per_tick();
        let mut out = vec![0i16; tick];

        let mut sum: i64 = 0;
        let mut count: i64 = 0;
        for tick_no in 0..2000 {
            speaker.render(&mut out);
            // skip the settling time of the high-pass
            if tick_no >= 1500 {
                sum += out.iter().map(|&s| s as i64).sum::<i64>();
                count += out.len() as i64;
            }
        }
        let mean = sum as f64 / count as f64;
        assert!(
            mean.abs() < 500.0,
            "running mean should decay toward zero, got {mean}"
        );
    }

    #[test]
    fn test_constant_high_fallback_goes_silent() {
        let rate = 8000u32;
        let mut speaker = PcSpeaker::with_sample_rate(rate);
        speaker.set_type(false, true, 0.0);
        // far below the representable mode-3 period: degraded to constant high
        speaker.set_counter(10, 3, 0.0);

        let tick = speaker.samples_per_tick();
        let mut out = vec![0i16; tick];
        for _ in 0..3000 {
            speaker.render(&mut out);
        }
        assert!(
            out.iter().all(|&s| s.abs() < 50),
            "constant-high output must decay to silence"
        );
    }

    #[test]
    fn test_shared_speaker_serializes_both_surfaces() {
        let shared = PcSpeaker::shared(&SpeakerConfig::default());

        {
            let mut guard = shared.lock();
            guard.set_counter(1193, 3, 0.0);
            guard.set_type(true, true, 0.0);
        }

        let mut out = vec![0i16; shared.lock().samples_per_tick()];
        shared.lock().render(&mut out);
        assert_eq!(out.len(), 44);
    }
}
