//! Bounded log of speaker output transitions
//!
//! The PIT state machine records every output-level change as an [`Edge`]
//! positioned within the current emulated millisecond. The impulse
//! synthesizer drains the log once per render call.

use crate::constants::{EDGE_LOG_CAPACITY, NEGATIVE_AMPLITUDE};

/// A single output transition within the active tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// Position within the tick, in milliseconds (0.0..=1.0)
    pub index: f32,
    /// Speaker line level after the transition
    pub level: i16,
}

/// Fixed-capacity, time-ordered queue of output transitions.
///
/// Pushes are deduplicated against the previously recorded level, so the log
/// only ever holds genuine transitions with alternating levels. When the log
/// is full further edges are silently dropped until the next drain; audio
/// degrades for one tick instead of the engine failing.
#[derive(Debug)]
pub struct EdgeLog {
    entries: Vec<Edge>,
    /// Level of the most recently recorded edge. Survives `clear` so
    /// deduplication works across render boundaries.
    last_level: i16,
}

impl EdgeLog {
    /// Create an empty log with the full capacity preallocated
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(EDGE_LOG_CAPACITY),
            last_level: NEGATIVE_AMPLITUDE,
        }
    }

    /// Record a transition to `level` at `index`.
    ///
    /// No-op when the level equals the previously recorded one, or when the
    /// log is full.
    pub fn push(&mut self, index: f32, level: i16) {
        if level == self.last_level {
            return;
        }
        self.last_level = level;
        if self.entries.len() == EDGE_LOG_CAPACITY {
            return;
        }
        self.entries.push(Edge { index, level });
    }

    /// Recorded edges, oldest first
    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.entries
    }

    /// Number of buffered edges
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log holds no edges
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all buffered edges. The deduplication level is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for EdgeLog {
    fn default() -> Self {
        Self::new()
    }
}
