//! Tests for the clock driver's edge generation and catch-up behavior.

use pipesim::clock::ClockDriver;

/// One second at 4 Hz yields four edges.
#[test]
fn test_edges_per_second() {
    let mut clock = ClockDriver::new();
    assert_eq!(clock.tick(1.0, 4.0, 64), 4);
}

/// Partial periods accumulate across calls instead of being dropped.
#[test]
fn test_fractional_accumulation() {
    let mut clock = ClockDriver::new();
    assert_eq!(clock.tick(0.24, 4.0, 64), 0);
    assert_eq!(clock.tick(0.02, 4.0, 64), 1);
}

/// A long host pause produces a burst of catch-up edges in one call.
#[test]
fn test_pause_catch_up() {
    let mut clock = ClockDriver::new();
    assert_eq!(clock.tick(10.0, 4.0, 100), 40);
}

/// The per-call edge count is capped and the excess backlog is dropped.
#[test]
fn test_max_edges_cap_drops_backlog() {
    let mut clock = ClockDriver::new();
    assert_eq!(clock.tick(100.0, 4.0, 16), 16);
    assert_eq!(clock.tick(0.0, 4.0, 16), 0, "backlog must not carry over");
}

/// Negative and non-finite elapsed time contribute nothing.
#[test]
fn test_bad_elapsed_ignored() {
    let mut clock = ClockDriver::new();
    assert_eq!(clock.tick(-5.0, 4.0, 64), 0);
    assert_eq!(clock.tick(f64::NAN, 4.0, 64), 0);
    assert_eq!(clock.tick(f64::INFINITY, 4.0, 64), 0);
}

/// A non-positive clock rate is clamped instead of dividing by zero.
#[test]
fn test_zero_hz_clamped() {
    let mut clock = ClockDriver::new();
    // Clamped to 0.25 Hz: one edge per 4 seconds.
    assert_eq!(clock.tick(4.0, 0.0, 64), 1);
}

/// Reset discards any accumulated partial period.
#[test]
fn test_reset_clears_accumulator() {
    let mut clock = ClockDriver::new();
    assert_eq!(clock.tick(0.24, 4.0, 64), 0);
    clock.reset();
    assert_eq!(clock.tick(0.02, 4.0, 64), 0);
}
