//! Simulation clock.
//!
//! The clock is a plain event counter. It advances exactly once per allocation or page
//! access and never consults wall-clock time, so replaying the same command sequence
//! reproduces the same ticks, and therefore the same FIFO/LRU decisions.

use serde::{Deserialize, Serialize};

/// A point on the simulation clock.
pub type Tick = u64;

/// Monotonically increasing event counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimClock {
    now: Tick,
}

impl SimClock {
    /// Creates a clock positioned at `now`.
    pub const fn at(now: Tick) -> Self {
        Self { now }
    }

    /// Current tick (the tick of the most recent event, 0 before any event).
    #[inline(always)]
    pub const fn now(&self) -> Tick {
        self.now
    }

    /// Advances the clock by one event and returns the new tick.
    #[inline]
    pub fn advance(&mut self) -> Tick {
        self.now += 1;
        self.now
    }

    /// Rewinds the clock to zero.
    pub fn reset(&mut self) {
        self.now = 0;
    }
}
