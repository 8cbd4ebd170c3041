// Implements the rotation budget controller: counts half-revolution
// crossings toward a target rotation count, tapers the duty-scale as the
// target approaches, and signals completion.

// Key Features:
// - Half-revolution latch debounces the once-per-revolution count against
//   state oscillation near the sector boundary.
// - Quadratic deceleration profile over a window sized so that short
//   moves still glide to a stop.
// - Completion freezes the drive state instead of cutting power.

// Licensed under the Apache License, Version 2.0

use crate::commutation::rotor::RotorState;

/// Debounce latch for the once-per-revolution crossing signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum CrossingLatch {
    /// Waiting for the rotor to pass the midpoint of the cycle.
    Idle,
    /// Midpoint observed; the next return to the reference state counts.
    Armed,
}

pub struct RotationBudget {
    /// Half-revolution counts still to go; terminal at zero.
    remaining: i32,
    target: i32,
    latch: CrossingLatch,
    /// Counts over which the deceleration profile is shaped.
    taper_window: i32,
    complete: bool,
}

impl RotationBudget {
    pub const fn new(taper_window: i32) -> Self {
        Self {
            remaining: 0,
            target: 0,
            latch: CrossingLatch::Idle,
            taper_window,
            complete: true,
        }
    }

    /// Starts a bounded move of `target` half-revolution counts.
    pub fn reset(&mut self, target: i32) {
        self.target = target.max(0);
        self.remaining = self.target;
        self.latch = CrossingLatch::Idle;
        self.complete = self.target == 0;
    }

    /// Feeds one decoded rotor state. Returns an updated duty ceiling when
    /// a crossing lands, `None` otherwise.
    pub fn on_state(&mut self, state: RotorState) -> Option<f32> {
        if self.complete {
            return None;
        }
        match self.latch {
            CrossingLatch::Idle => {
                if state.past_midpoint() {
                    self.latch = CrossingLatch::Armed;
                }
                None
            }
            CrossingLatch::Armed => {
                if !state.at_reference() {
                    return None;
                }
                self.latch = CrossingLatch::Idle;
                self.remaining -= 1;
                if self.remaining <= 0 {
                    self.complete = true;
                    #[cfg(feature = "defmt")]
                    defmt::info!("ROTATION: target reached, holding drive state");
                    return Some(0.0);
                }
                Some(self.duty_ceiling())
            }
        }
    }

    /// Deceleration profile: full duty while far from the target, then a
    /// quadratic glide over the remaining fraction of the taper window.
    pub fn duty_ceiling(&self) -> f32 {
        if self.complete {
            return 0.0;
        }
        let window = self.target.min(self.taper_window);
        if window <= 0 || self.remaining >= window {
            return 1.0;
        }
        let fraction = self.remaining as f32 / window as f32;
        (fraction * fraction).clamp(0.0, 1.0)
    }

    pub fn remaining(&self) -> i32 {
        self.remaining
    }

    /// True once the counter has reached zero; the caller stops
    /// commutating and holds the current drive state.
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}
