#![cfg_attr(not(feature = "std"), no_std)]

//! Hall-sensor six-step commutation for a three-phase brushless motor,
//! with a software velocity loop and bounded-rotation positioning closed
//! around it.

pub mod command;
pub mod commutation;
pub mod control;
pub mod signal;

pub use command::{parse_line, SessionCommand};
pub use commutation::drive::{DriveCommand, DriveLegs, Leg, LegDrive};
pub use commutation::rotor::RotorState;
pub use commutation::{Commutator, PositionSensors};
pub use control::{DutyPid, PidGains, RotationBudget, VelocityEstimator};
pub use signal::ControlSignals;

use embedded_hal::delay::DelayNs;

/// Recoverable error conditions. Nothing in the core is fatal: the motor
/// keeps commutating (or stops safely) rather than halting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The 3-bit sensor sample decoded to one of the reserved codes.
    InvalidSensorReading,
    /// Homing sampled an invalid rotor state; the caller retries.
    HomingFailed,
}

/// Controller configuration. The gains and shaping constants are tunable,
/// not part of the behavioral contract.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub gains: PidGains,
    /// Magnitude of the phase lead; the target sign selects direction.
    pub phase_lead: i8,
    /// Mechanical settling time of the homing routine.
    pub settle_ms: u32,
    /// Half-revolution counts over which a bounded move decelerates.
    pub taper_window: i32,
    /// Cruise velocity target for rotation-only sessions, rev/s.
    pub default_velocity: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gains: PidGains::default(),
            phase_lead: 2,
            settle_ms: 1000,
            taper_window: 43,
            default_velocity: 5.0,
        }
    }
}

/// Kind of control session currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Session {
    Idle,
    /// Hold a target velocity indefinitely.
    Velocity,
    /// Run toward a target rotation count, then hold.
    Bounded,
}

/// The main controller struct, owning commutation, estimation, and the
/// control loop state.
///
/// Two entry points map onto the two concurrency contexts: `on_sensor_edge`
/// is the interrupt-style path (bounded work, no allocation, no locks) and
/// `tick_control` is the background path. All state crossing between them
/// goes through the atomic [`ControlSignals`] block.
pub struct MotorController {
    config: Config,
    commutator: Commutator,
    estimator: VelocityEstimator,
    pid: DutyPid,
    budget: RotationBudget,
    signals: ControlSignals,
    session: Session,
    /// Velocity target magnitude fed to the PID.
    target_velocity: f32,
    /// Last velocity publication consumed by the control loop.
    consumed_seq: u32,
}

impl MotorController {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            commutator: Commutator::new(config.phase_lead),
            estimator: VelocityEstimator::new(RotorState::from_index(0)),
            pid: DutyPid::new(config.gains),
            budget: RotationBudget::new(config.taper_window),
            signals: ControlSignals::new(),
            session: Session::Idle,
            target_velocity: 0.0,
            consumed_seq: 0,
        }
    }

    /// Startup boundary. Forces drive state 0, waits out the settling
    /// time, and captures the alignment offset. Must succeed before the
    /// first commutation event can produce correct output.
    pub fn home<D, S, T>(
        &mut self,
        legs: &mut D,
        sensors: &mut S,
        delay: &mut T,
    ) -> Result<RotorState, Error>
    where
        D: DriveLegs,
        S: PositionSensors,
        T: DelayNs,
    {
        let origin = self
            .commutator
            .home(legs, sensors, delay, self.config.settle_ms)?;
        // Velocity is measured between successive visits to the origin.
        self.estimator.rebase(origin);
        Ok(origin)
    }

    /// Atomically switches to a new target. Integral and derivative state,
    /// the rotation counters, and the crossing latch are all reset as one
    /// unit before the new session becomes observable to the edge path.
    pub fn start_session(&mut self, cmd: SessionCommand) {
        let direction = match (cmd.velocity, cmd.rotations) {
            (Some(v), _) if v != 0.0 => v,
            (_, Some(r)) => r,
            _ => 0.0,
        };
        let lead = if direction < 0.0 {
            -self.config.phase_lead
        } else {
            self.config.phase_lead
        };

        self.target_velocity = match cmd.velocity {
            Some(v) => v.abs(),
            None => self.config.default_velocity,
        };

        let counts = match cmd.rotations {
            // Round the magnitude to whole half-revolution counts.
            Some(r) => (r.abs() + 0.5) as i32,
            None => 0,
        };

        self.session = match cmd.rotations {
            Some(_) => Session::Bounded,
            None if cmd.velocity.is_some() => Session::Velocity,
            None => Session::Idle,
        };

        self.commutator.set_phase_lead(lead);
        self.estimator.reset();
        self.pid.reset(1.0);
        self.budget.reset(counts);

        self.signals.set_duty(1.0);
        self.signals.set_duty_ceiling(1.0);
        self.signals.set_half_revs_left(counts);
        self.consumed_seq = self.signals.velocity().1;
        self.signals.bump_session();

        #[cfg(feature = "defmt")]
        defmt::info!(
            "SESSION: target {} rev/s, {} counts, lead {}",
            self.target_velocity,
            counts,
            lead
        );
    }

    /// Interrupt path, invoked once per rising or falling edge on any of
    /// the three sensor lines. Returns the fresh drive command, or `None`
    /// when the event carries no new information (glitch edge, invalid
    /// sample, unhomed controller, or a completed bounded move holding its
    /// drive state).
    #[inline(always)]
    pub fn on_sensor_edge(&mut self, sample: u8, now_us: u32) -> Option<DriveCommand> {
        if self.session == Session::Bounded && self.budget.is_complete() {
            // Hold the current drive state rather than coasting.
            return None;
        }

        let duty = self.signals.duty();
        let cmd = self.commutator.on_edge(sample, duty)?;
        let state = self.commutator.rotor_state()?;

        if let Some(velocity) = self.estimator.on_state(state, now_us) {
            self.signals.publish_velocity(velocity);
        }

        if self.session == Session::Bounded {
            if let Some(ceiling) = self.budget.on_state(state) {
                self.signals.set_duty_ceiling(ceiling);
                self.signals.set_half_revs_left(self.budget.remaining());
            }
        }

        Some(cmd)
    }

    /// Background path. Consumes each newly published velocity estimate
    /// exactly once, runs the PID, and publishes the trimmed duty-scale.
    /// Returns the effective duty-scale.
    pub fn tick_control(&mut self, now_us: u32) -> f32 {
        if self.session != Session::Idle {
            let (velocity, seq) = self.signals.velocity();
            if seq != self.consumed_seq {
                self.consumed_seq = seq;
                let duty = self.pid.update(self.target_velocity, velocity, now_us);
                self.signals.set_duty(duty);
            }
        }
        self.signals.duty()
    }

    /// Shared signal block, for wiring the two contexts together in an
    /// application (e.g. RTIC tasks).
    pub fn signals(&self) -> &ControlSignals {
        &self.signals
    }

    /// Drive state currently commanded to the windings.
    pub fn commanded_drive_state(&self) -> u8 {
        self.commutator.drive_state()
    }

    /// Latest velocity estimate in revolutions per second.
    pub fn velocity(&self) -> f32 {
        self.estimator.velocity()
    }

    /// Half-revolution counts still to go in the current bounded move.
    pub fn remaining_half_revs(&self) -> i32 {
        self.budget.remaining()
    }

    /// True once a bounded move has consumed its budget and the drive
    /// state is being held.
    pub fn is_session_complete(&self) -> bool {
        self.session == Session::Bounded && self.budget.is_complete()
    }

    pub fn is_homed(&self) -> bool {
        self.commutator.is_homed()
    }
}
