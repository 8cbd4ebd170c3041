/// VelocityEstimator measures the elapsed time between successive visits
/// to a reference rotor state and publishes its reciprocal as angular
/// velocity, once per revolution.

use crate::commutation::rotor::RotorState;

pub struct VelocityEstimator {
    /// Rotor state whose crossings delimit one revolution.
    reference: RotorState,
    /// Free-running clock reading at the previous reference crossing.
    last_crossing: Option<u32>,
    /// Previous measured interval, guards against re-publishing a stale value.
    last_interval_us: u32,
    /// Latest estimate in revolutions per second.
    velocity: f32,
}

impl VelocityEstimator {
    pub const fn new(reference: RotorState) -> Self {
        Self {
            reference,
            last_crossing: None,
            last_interval_us: 0,
            velocity: 0.0,
        }
    }

    /// Feeds one decoded rotor state with its timestamp. Returns a new
    /// velocity estimate on a measurable reference crossing, `None`
    /// otherwise. A zero or unchanged interval publishes nothing.
    pub fn on_state(&mut self, state: RotorState, now_us: u32) -> Option<f32> {
        if state != self.reference {
            return None;
        }
        let started = match self.last_crossing {
            Some(t) => t,
            None => {
                // First crossing only starts the interval timer.
                self.last_crossing = Some(now_us);
                return None;
            }
        };
        let interval = now_us.wrapping_sub(started);
        // The interval timer restarts on every crossing; only publication
        // is guarded.
        self.last_crossing = Some(now_us);
        if interval == 0 || interval == self.last_interval_us {
            return None;
        }
        self.last_interval_us = interval;
        self.velocity = 1_000_000.0 / interval as f32;
        Some(self.velocity)
    }

    /// Latest published estimate in revolutions per second.
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Change the reference state and discard the running interval.
    pub fn rebase(&mut self, reference: RotorState) {
        self.reference = reference;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.last_crossing = None;
        self.last_interval_us = 0;
        self.velocity = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> RotorState {
        RotorState::decode(0b101).unwrap() // decodes to state 0
    }

    fn other_state() -> RotorState {
        RotorState::decode(0b010).unwrap() // decodes to state 3
    }

    #[test]
    fn first_crossing_starts_the_timer_without_publishing() {
        let mut est = VelocityEstimator::new(reference());
        assert_eq!(est.on_state(reference(), 1_000), None);
    }

    #[test]
    fn crossing_interval_yields_reciprocal_velocity() {
        let mut est = VelocityEstimator::new(reference());
        est.on_state(reference(), 0);
        // 100 ms per revolution -> 10 rev/s
        let v = est.on_state(reference(), 100_000).unwrap();
        assert!((v - 10.0).abs() < 1e-3);
        assert!((est.velocity() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn non_reference_states_are_ignored() {
        let mut est = VelocityEstimator::new(reference());
        est.on_state(reference(), 0);
        assert_eq!(est.on_state(other_state(), 50_000), None);
        let v = est.on_state(reference(), 100_000).unwrap();
        assert!((v - 10.0).abs() < 1e-3);
    }

    #[test]
    fn zero_interval_publishes_nothing() {
        let mut est = VelocityEstimator::new(reference());
        est.on_state(reference(), 5_000);
        assert_eq!(est.on_state(reference(), 5_000), None);
    }

    #[test]
    fn unchanged_interval_is_not_republished() {
        let mut est = VelocityEstimator::new(reference());
        est.on_state(reference(), 0);
        assert!(est.on_state(reference(), 100_000).is_some());
        assert_eq!(est.on_state(reference(), 200_000), None);
        // A different interval publishes again.
        let v = est.on_state(reference(), 250_000).unwrap();
        assert!((v - 20.0).abs() < 1e-3);
    }

    #[test]
    fn clock_wraparound_still_measures() {
        let mut est = VelocityEstimator::new(reference());
        est.on_state(reference(), u32::MAX - 50_000);
        let v = est.on_state(reference(), 50_000).unwrap();
        // 100_001 us across the wrap.
        assert!((v - 10.0).abs() < 0.1);
    }
}
