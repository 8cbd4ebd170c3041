// Implements the velocity PID controller that trims the commutation
// duty-scale toward a target angular velocity.

// Key Features:
// - Incremental form: the output trims the previous duty-scale rather
//   than recomputing an absolute setpoint, so updates stay continuous.
// - Integral clamping for anti-windup.
// - Derivative term is skipped when no time elapsed between estimates.
// - Duty-scale is clamped to [0,1] after every update.

// Licensed under the Apache License, Version 2.0

/// Loop gains. Tunable configuration, not a behavioral contract.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 0.05,
            ki: 0.0,
            kd: 0.12,
        }
    }
}

/// PID controller whose actuator is the duty-scale applied to the
/// energized winding legs.
pub struct DutyPid {
    gains: PidGains,
    /// Current duty-scale in [0,1], read by the commutation path.
    duty: f32,
    /// Accumulated integral of error over time.
    integral: f32,
    /// Bound on the integral accumulator.
    integral_limit: f32,
    previous_error: f32,
    /// Clock reading of the previous update; None right after a reset.
    previous_stamp: Option<u32>,
}

impl DutyPid {
    pub const fn new(gains: PidGains) -> Self {
        Self {
            gains,
            duty: 0.0,
            integral: 0.0,
            integral_limit: 1.0,
            previous_error: 0.0,
            previous_stamp: None,
        }
    }

    /// Consumes one velocity estimate and returns the updated duty-scale.
    ///
    /// The first update after a reset carries no elapsed time, so it
    /// contributes only the proportional term.
    pub fn update(&mut self, target: f32, measured: f32, now_us: u32) -> f32 {
        let error = target - measured;

        let dt = match self.previous_stamp {
            Some(stamp) => now_us.wrapping_sub(stamp) as f32 / 1_000_000.0,
            None => 0.0,
        };

        self.integral += error * dt;
        self.integral = self.integral.clamp(-self.integral_limit, self.integral_limit);

        let derivative = if dt > 0.0 {
            (error - self.previous_error) / dt
        } else {
            0.0
        };

        let trim =
            self.gains.kp * error + self.gains.ki * self.integral + self.gains.kd * derivative;

        self.previous_error = error;
        self.previous_stamp = Some(now_us);

        self.duty = (self.duty + trim).clamp(0.0, 1.0);
        self.duty
    }

    /// Current duty-scale.
    pub fn duty(&self) -> f32 {
        self.duty
    }

    /// Clears integral, derivative, and timing state and re-seeds the
    /// duty-scale for a fresh control session.
    pub fn reset(&mut self, initial_duty: f32) {
        self.integral = 0.0;
        self.previous_error = 0.0;
        self.previous_stamp = None;
        self.duty = initial_duty.clamp(0.0, 1.0);
    }
}
