// Implements the lock-free handoff between the sensor-edge context and the
// background control context.

// Key Features:
// - AtomicF32 built on AtomicU32 bit storage, so multi-word tearing on
//   duty-scale and velocity values cannot occur.
// - Single-writer discipline per field: the edge path publishes rotor
//   observations, the background path publishes actuation.
// - A session epoch lets the edge path observe a target switch as one unit.

// Licensed under the Apache License, Version 2.0

use core::sync::atomic::{AtomicI32, AtomicU32, Ordering};

/// f32 cell with atomic load/store via its bit pattern.
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub const fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline(always)]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline(always)]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Shared state between the interrupt-style edge path and the background
/// control path.
///
/// Writers: the background path owns `duty` and `duty_ceiling`; the edge
/// path owns `velocity`, `velocity_seq`, and `half_revs_left`; the session
/// starter owns `session`. Readers may be in either context.
pub struct ControlSignals {
    /// Duty-scale applied on the next commutation step.
    duty: AtomicF32,
    /// Upper bound on duty imposed by the rotation budget.
    duty_ceiling: AtomicF32,
    /// Latest velocity estimate, revolutions per second.
    velocity: AtomicF32,
    /// Bumped once per published estimate; lets the control loop consume
    /// each estimate exactly once.
    velocity_seq: AtomicU32,
    /// Half-revolution counts still to go in a bounded move.
    half_revs_left: AtomicI32,
    /// Session epoch, bumped after a full controller reset.
    session: AtomicU32,
}

impl ControlSignals {
    pub const fn new() -> Self {
        Self {
            duty: AtomicF32::new(0.0),
            duty_ceiling: AtomicF32::new(1.0),
            velocity: AtomicF32::new(0.0),
            velocity_seq: AtomicU32::new(0),
            half_revs_left: AtomicI32::new(0),
            session: AtomicU32::new(0),
        }
    }

    #[inline(always)]
    pub fn duty(&self) -> f32 {
        self.duty.load().min(self.duty_ceiling.load())
    }

    #[inline(always)]
    pub fn set_duty(&self, duty: f32) {
        self.duty.store(duty.clamp(0.0, 1.0));
    }

    #[inline(always)]
    pub fn set_duty_ceiling(&self, ceiling: f32) {
        self.duty_ceiling.store(ceiling.clamp(0.0, 1.0));
    }

    /// Publishes a velocity estimate from the edge path.
    #[inline(always)]
    pub fn publish_velocity(&self, velocity: f32) {
        self.velocity.store(velocity);
        self.velocity_seq.fetch_add(1, Ordering::Release);
    }

    /// Latest estimate with its publication sequence number.
    #[inline(always)]
    pub fn velocity(&self) -> (f32, u32) {
        let seq = self.velocity_seq.load(Ordering::Acquire);
        (self.velocity.load(), seq)
    }

    #[inline(always)]
    pub fn set_half_revs_left(&self, counts: i32) {
        self.half_revs_left.store(counts, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn half_revs_left(&self) -> i32 {
        self.half_revs_left.load(Ordering::Relaxed)
    }

    /// Marks the completion of a full controller reset; every field written
    /// before the bump is visible to a reader that observes the new epoch.
    #[inline(always)]
    pub fn bump_session(&self) -> u32 {
        self.session.fetch_add(1, Ordering::Release) + 1
    }

    #[inline(always)]
    pub fn session(&self) -> u32 {
        self.session.load(Ordering::Acquire)
    }
}

impl Default for ControlSignals {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duty_is_bounded_by_the_ceiling() {
        let signals = ControlSignals::new();
        signals.set_duty(0.8);
        signals.set_duty_ceiling(0.25);
        assert_eq!(signals.duty(), 0.25);
        signals.set_duty_ceiling(1.0);
        assert_eq!(signals.duty(), 0.8);
    }

    #[test]
    fn stores_clamp_into_unit_range() {
        let signals = ControlSignals::new();
        signals.set_duty(3.0);
        assert_eq!(signals.duty(), 1.0);
        signals.set_duty(-1.0);
        assert_eq!(signals.duty(), 0.0);
    }

    #[test]
    fn velocity_publication_bumps_the_sequence() {
        let signals = ControlSignals::new();
        let (_, seq0) = signals.velocity();
        signals.publish_velocity(12.5);
        let (v, seq1) = signals.velocity();
        assert_eq!(v, 12.5);
        assert_eq!(seq1, seq0 + 1);
    }

    #[test]
    fn signals_are_usable_from_a_static() {
        static SIGNALS: ControlSignals = ControlSignals::new();
        SIGNALS.set_half_revs_left(7);
        assert_eq!(SIGNALS.half_revs_left(), 7);
    }
}
