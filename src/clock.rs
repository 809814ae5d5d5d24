//! Clock edge generation from wall-clock time.
//!
//! The simulator is advanced by discrete clock edges. The driver
//! accumulates elapsed host time and emits one edge each time the
//! accumulator crosses one clock period, so a paused-and-resumed host
//! produces a burst of catch-up edges instead of losing them.

use crate::config::MIN_CLOCK_HZ;

/// Accumulates elapsed wall-clock time and converts it to clock edges.
#[derive(Debug, Default, Clone)]
pub struct ClockDriver {
    accumulator: f64,
}

impl ClockDriver {
    /// Creates a driver with an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds `elapsed_seconds` of host time into the accumulator and
    /// returns the number of clock edges to process.
    ///
    /// Negative or non-finite elapsed time contributes nothing. At most
    /// `max_edges` edges are returned per call; if the backlog would
    /// exceed that, the remainder is discarded so a long pause cannot
    /// trigger an unbounded catch-up loop.
    pub fn tick(&mut self, elapsed_seconds: f64, clock_hz: f64, max_edges: u32) -> u32 {
        if elapsed_seconds.is_finite() && elapsed_seconds > 0.0 {
            self.accumulator += elapsed_seconds;
        }

        let period = 1.0 / clock_hz.max(MIN_CLOCK_HZ);
        let mut edges = 0;
        while self.accumulator >= period && edges < max_edges {
            self.accumulator -= period;
            edges += 1;
        }

        // Saturated: drop the backlog instead of carrying it forward.
        if edges == max_edges && self.accumulator >= period {
            self.accumulator = 0.0;
        }

        edges
    }

    /// Discards any accumulated partial period.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
