//! 8254 PIT channel 2 state machine
//!
//! Advances a counter against elapsed fractional-tick time and records every
//! change of the timer output line into an [`EdgeLog`]. One emulated tick is
//! one millisecond; all positions handed to the entry points are fractions of
//! the active tick.
//!
//! Only the modes real software drives the speaker with are modeled
//! (0 through 4). Mode 3 requests too fast for the output sample rate
//! collapse into [`PitMode::Inactive`], a constant-high fallback.

use crate::constants::{
    MIN_SAMPLE_RATE, MS_PER_PIT_TICK, NEGATIVE_AMPLITUDE, PIT_TICK_RATE, POSITIVE_AMPLITUDE,
    POWER_ON_COUNTER,
};
use crate::edge::EdgeLog;

/// Operating mode of the speaker-driving PIT channel.
///
/// Mode-specific state lives in the variant payloads, so flags like the
/// mode-1 trigger wait or the mode-3 staged period cannot exist outside the
/// mode they belong to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PitMode {
    /// Mode 0: interrupt on terminal count (one-shot, output low while counting)
    InterruptOnTerminalCount,
    /// Mode 1: hardware retriggerable one-shot, armed by a gate rising edge
    HardwareOneShot {
        /// No counter has been written since the mode was selected
        waiting_for_counter: bool,
        /// The one-shot fired (or was never started) and awaits the next trigger
        waiting_for_trigger: bool,
        /// Period loaded on the next trigger, in milliseconds
        pending_max: f32,
    },
    /// Mode 2: rate generator (one low clock per period, high otherwise)
    RateGenerator,
    /// Mode 3: square wave generator
    SquareWave {
        /// Whether the counter is running (requires a gate trigger)
        counting: bool,
        /// Staged full period, applied at the next half-cycle boundary
        new_max: f32,
        /// Staged half period
        new_half: f32,
    },
    /// Mode 4: software triggered strobe (single falling edge, no re-arm)
    SoftwareStrobe,
    /// Constant-high fallback for square waves above the representable range
    Inactive,
}

/// Speaker-driving PIT channel state.
///
/// Periods and positions are in milliseconds. `index` is the position within
/// the current period; `last_index` is the position within the tick where
/// forwarding last stopped.
#[derive(Debug)]
pub struct PitState {
    mode: PitMode,
    max: f32,
    half: f32,
    index: f32,
    last_index: f32,
    output_level: i16,
    output_enabled: bool,
    clock_gate_enabled: bool,
    /// Shortest mode-3 period the output sample rate can represent
    minimum_period: f32,
}

impl PitState {
    /// Create a channel in its power-on state: mode 3 at ~903 Hz, output
    /// high, gate and speaker output disabled, not counting.
    pub fn new(sample_rate: u32) -> Self {
        let rate = sample_rate.max(MIN_SAMPLE_RATE);
        // Integer division first, matching the hardware-derived threshold
        let minimum_counter = 2 * PIT_TICK_RATE / rate;
        let max = POWER_ON_COUNTER as f32 * MS_PER_PIT_TICK;
        let half = max / 2.0;
        Self {
            mode: PitMode::SquareWave {
                counting: false,
                new_max: max,
                new_half: half,
            },
            max,
            half,
            index: 0.0,
            last_index: 0.0,
            output_level: POSITIVE_AMPLITUDE,
            output_enabled: false,
            clock_gate_enabled: false,
            minimum_period: minimum_counter as f32 * MS_PER_PIT_TICK,
        }
    }

    /// Current operating mode
    #[inline]
    pub fn mode(&self) -> PitMode {
        self.mode
    }

    /// Internal output level (ignores the output-enable bit)
    #[inline]
    pub fn output_level(&self) -> i16 {
        self.output_level
    }

    /// Whether the PIT output is allowed to drive the speaker line
    #[inline]
    pub fn output_enabled(&self) -> bool {
        self.output_enabled
    }

    /// Record the current level if the speaker output is enabled
    fn emit(&self, index: f32, log: &mut EdgeLog) {
        if self.output_enabled {
            log.push(index, self.output_level);
        }
    }

    /// Advance the channel to `new_index` within the current tick, emitting
    /// an edge at the exact crossing instant of every period boundary passed.
    ///
    /// Boundaries are closed: elapsed time landing exactly on a boundary
    /// produces the edge and continues into the next sub-period.
    pub fn forward(&mut self, new_index: f32, log: &mut EdgeLog) {
        let mut passed = new_index - self.last_index;
        let mut delay_base = self.last_index;
        self.last_index = new_index;

        match self.mode {
            PitMode::Inactive => {}

            PitMode::InterruptOnTerminalCount => {
                if self.index >= self.max {
                    // counter already expired before this call
                    return;
                }
                self.index += passed;
                if self.index >= self.max {
                    let delay = delay_base + self.max - self.index + passed;
                    self.output_level = POSITIVE_AMPLITUDE;
                    self.emit(delay, log);
                }
            }

            PitMode::HardwareOneShot {
                waiting_for_counter,
                waiting_for_trigger,
                ..
            } => {
                if waiting_for_counter || waiting_for_trigger {
                    return;
                }
                if self.index >= self.max {
                    return;
                }
                self.index += passed;
                if self.index >= self.max {
                    let delay = delay_base + self.max - self.index + passed;
                    self.output_level = POSITIVE_AMPLITUDE;
                    self.emit(delay, log);
                    // pulse complete, re-arm on the next gate trigger
                    if let PitMode::HardwareOneShot {
                        waiting_for_trigger,
                        ..
                    } = &mut self.mode
                    {
                        *waiting_for_trigger = true;
                    }
                }
            }

            PitMode::RateGenerator => {
                while passed > 0.0 {
                    if self.index >= self.half {
                        // high portion, next boundary starts the low clock
                        if self.index + passed >= self.max {
                            let delay = self.max - self.index;
                            delay_base += delay;
                            passed -= delay;
                            self.output_level = NEGATIVE_AMPLITUDE;
                            self.emit(delay_base, log);
                            self.index = 0.0;
                        } else {
                            self.index += passed;
                            return;
                        }
                    } else if self.index + passed >= self.half {
                        let delay = self.half - self.index;
                        delay_base += delay;
                        passed -= delay;
                        self.output_level = POSITIVE_AMPLITUDE;
                        self.emit(delay_base, log);
                        self.index = self.half;
                    } else {
                        self.index += passed;
                        return;
                    }
                }
            }

            PitMode::SquareWave {
                counting,
                new_max,
                new_half,
            } => {
                if !counting {
                    return;
                }
                while passed > 0.0 {
                    if self.index >= self.half {
                        if self.index + passed >= self.max {
                            let delay = self.max - self.index;
                            delay_base += delay;
                            passed -= delay;
                            self.output_level = POSITIVE_AMPLITUDE;
                            self.emit(delay_base, log);
                            self.index = 0.0;
                            // staged period takes effect at the cycle boundary
                            self.max = new_max;
                            self.half = new_half;
                        } else {
                            self.index += passed;
                            return;
                        }
                    } else if self.index + passed >= self.half {
                        let delay = self.half - self.index;
                        delay_base += delay;
                        passed -= delay;
                        self.output_level = NEGATIVE_AMPLITUDE;
                        self.emit(delay_base, log);
                        self.index = self.half;
                        self.max = new_max;
                        self.half = new_half;
                    } else {
                        self.index += passed;
                        return;
                    }
                }
            }

            PitMode::SoftwareStrobe => {
                if self.index < self.max {
                    if self.index + passed >= self.max {
                        let delay = self.max - self.index;
                        delay_base += delay;
                        self.output_level = NEGATIVE_AMPLITUDE;
                        // no further edges until reprogrammed
                        self.emit(delay_base, log);
                        self.index = self.max;
                    } else {
                        self.index += passed;
                    }
                }
            }
        }
    }

    /// Rewind `last_index` to the start of the next tick. Called by the
    /// output stage after forwarding to tick end.
    #[inline]
    pub fn reset_tick(&mut self) {
        self.last_index = 0.0;
    }

    /// Select a new operating mode (command register write).
    ///
    /// Only modes 1 and 3 are accepted here, matching the control words real
    /// software uses on the speaker channel; anything else is ignored.
    pub fn set_control(&mut self, mode: u8, new_index: f32, log: &mut EdgeLog) {
        self.forward(new_index, log);
        match mode {
            1 => {
                let pending_max = match self.mode {
                    PitMode::HardwareOneShot { pending_max, .. } => pending_max,
                    _ => 0.0,
                };
                self.mode = PitMode::HardwareOneShot {
                    waiting_for_counter: true,
                    waiting_for_trigger: false,
                    pending_max,
                };
                self.output_level = POSITIVE_AMPLITUDE;
            }
            3 => {
                let (new_max, new_half) = match self.mode {
                    PitMode::SquareWave {
                        new_max, new_half, ..
                    } => (new_max, new_half),
                    _ => (self.max, self.half),
                };
                self.mode = PitMode::SquareWave {
                    counting: false,
                    new_max,
                    new_half,
                };
                self.output_level = POSITIVE_AMPLITUDE;
            }
            other => {
                tracing::warn!(mode = other, "unsupported PIT control mode ignored");
                return;
            }
        }
        self.emit(new_index, log);
    }

    /// Load a new counter value for `mode` (data register write).
    ///
    /// Unsupported mode values leave the channel untouched apart from the
    /// forward to `new_index`.
    pub fn set_counter(&mut self, count: u32, mode: u8, new_index: f32, log: &mut EdgeLog) {
        let duration = count as f32 * MS_PER_PIT_TICK;
        self.forward(new_index, log);
        match mode {
            0 => {
                self.output_level = NEGATIVE_AMPLITUDE;
                self.index = 0.0;
                self.max = duration;
                self.emit(new_index, log);
                self.mode = PitMode::InterruptOnTerminalCount;
            }
            1 => {
                // takes effect on the next gate trigger, not now
                match &mut self.mode {
                    PitMode::HardwareOneShot {
                        waiting_for_counter,
                        waiting_for_trigger,
                        pending_max,
                    } => {
                        *pending_max = duration;
                        if *waiting_for_counter {
                            *waiting_for_counter = false;
                            *waiting_for_trigger = true;
                        }
                    }
                    _ => {
                        self.mode = PitMode::HardwareOneShot {
                            waiting_for_counter: false,
                            waiting_for_trigger: true,
                            pending_max: duration,
                        };
                    }
                }
            }
            2 => {
                self.index = 0.0;
                self.output_level = NEGATIVE_AMPLITUDE;
                self.emit(new_index, log);
                self.half = MS_PER_PIT_TICK;
                self.max = duration;
                self.mode = PitMode::RateGenerator;
            }
            3 => {
                if duration < self.minimum_period {
                    // too fast for the output rate, hold the line high
                    // instead of burning cycles on inaudible synthesis
                    self.output_level = POSITIVE_AMPLITUDE;
                    self.mode = PitMode::Inactive;
                    self.emit(new_index, log);
                    return;
                }
                let new_max = duration;
                let new_half = duration / 2.0;
                let mut counting = matches!(self.mode, PitMode::SquareWave { counting: true, .. });
                if !counting {
                    self.index = 0.0;
                    self.max = new_max;
                    self.half = new_half;
                    if self.clock_gate_enabled {
                        counting = true;
                        self.output_level = POSITIVE_AMPLITUDE;
                        self.emit(new_index, log);
                    }
                }
                self.mode = PitMode::SquareWave {
                    counting,
                    new_max,
                    new_half,
                };
            }
            4 => {
                self.output_level = POSITIVE_AMPLITUDE;
                self.emit(new_index, log);
                self.index = 0.0;
                self.max = duration;
                self.mode = PitMode::SoftwareStrobe;
            }
            other => {
                tracing::warn!(mode = other, count, "unsupported PIT counter mode ignored");
            }
        }
    }

    /// Update the clock gate and the speaker output-enable bit
    /// (port 61h write).
    ///
    /// A gate rising edge is a trigger: mode 1 loads its pending period and
    /// pulls the output low, mode 3 starts counting with the staged period.
    /// A low gate stops mode 3 and holds its output high; mode 1 ignores the
    /// gate level once armed. The recorded edge reflects the externally
    /// observable level: forced low whenever the output is disabled.
    pub fn set_type(
        &mut self,
        clock_gate_enabled: bool,
        output_enabled: bool,
        new_index: f32,
        log: &mut EdgeLog,
    ) {
        self.forward(new_index, log);
        let trigger = clock_gate_enabled && !self.clock_gate_enabled;
        self.clock_gate_enabled = clock_gate_enabled;
        self.output_enabled = output_enabled;

        if trigger {
            match &mut self.mode {
                PitMode::HardwareOneShot {
                    waiting_for_counter,
                    waiting_for_trigger,
                    pending_max,
                } => {
                    if !*waiting_for_counter {
                        let pending = *pending_max;
                        *waiting_for_trigger = false;
                        self.output_level = NEGATIVE_AMPLITUDE;
                        self.index = 0.0;
                        self.max = pending;
                    }
                }
                PitMode::SquareWave {
                    counting,
                    new_max,
                    new_half,
                } => {
                    *counting = true;
                    *new_half = *new_max / 2.0;
                    let (max, half) = (*new_max, *new_half);
                    self.index = 0.0;
                    self.max = max;
                    self.half = half;
                    self.output_level = POSITIVE_AMPLITUDE;
                }
                _ => {}
            }
        } else if !clock_gate_enabled {
            match &mut self.mode {
                // gate level does not affect mode 1
                PitMode::HardwareOneShot { .. } => {}
                PitMode::SquareWave { counting, .. } => {
                    // low gate holds the speaker line high
                    self.output_level = POSITIVE_AMPLITUDE;
                    *counting = false;
                }
                _ => {}
            }
        }

        if output_enabled {
            log.push(new_index, self.output_level);
        } else {
            log.push(new_index, NEGATIVE_AMPLITUDE);
        }
    }
}
