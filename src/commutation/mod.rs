// Implements the commutation controller: startup homing against drive
// state 0 and per-edge six-step commutation with a configurable phase lead.

// Key Features:
// - Blocking homing routine that discovers the alignment offset.
// - Edge handler that re-commutates only on a genuine state change.
// - Commanded drive state is (state - offset + lead) mod 6, always in 0..6.

// Licensed under the Apache License, Version 2.0

use embedded_hal::delay::DelayNs;

use crate::Error;

pub mod drive;
pub mod rotor;

use drive::{DriveCommand, DriveLegs};
use rotor::{RotorState, SECTOR_COUNT};

/// Hardware input boundary: the three position-sensor lines sampled
/// synchronously as one 3-bit value (bit0 + 2*bit1 + 4*bit2).
pub trait PositionSensors {
    fn sample(&mut self) -> u8;
}

/// Homing status of the commutation controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Alignment {
    Unhomed,
    /// Rotor state observed with the motor forced into drive state 0.
    Homed(RotorState),
}

pub struct Commutator {
    alignment: Alignment,
    /// Commutation steps of lead applied ahead of the aligned rotor state;
    /// sign selects the direction of rotation.
    phase_lead: i8,
    /// Last decoded state that was actually commutated.
    last_state: Option<RotorState>,
    /// Last commanded drive state, held on completion of a bounded move.
    drive_state: u8,
}

impl Commutator {
    pub const fn new(phase_lead: i8) -> Self {
        Self {
            alignment: Alignment::Unhomed,
            phase_lead,
            last_state: None,
            drive_state: 0,
        }
    }

    /// Forces drive state 0, blocks while the rotor settles mechanically,
    /// then samples the sensors to capture the alignment offset.
    ///
    /// Fails softly with `Error::HomingFailed` when the settled sample
    /// decodes as invalid; the caller retries.
    pub fn home<D, S, T>(
        &mut self,
        legs: &mut D,
        sensors: &mut S,
        delay: &mut T,
        settle_ms: u32,
    ) -> Result<RotorState, Error>
    where
        D: DriveLegs,
        S: PositionSensors,
        T: DelayNs,
    {
        DriveCommand::lookup(0, 1.0).apply(legs);
        delay.delay_ms(settle_ms);

        match RotorState::decode(sensors.sample()) {
            Some(origin) => {
                #[cfg(feature = "defmt")]
                defmt::info!("HOMING: rotor origin at state {}", origin.index());
                self.alignment = Alignment::Homed(origin);
                self.last_state = None;
                Ok(origin)
            }
            None => {
                #[cfg(feature = "defmt")]
                defmt::warn!("HOMING: invalid sensor reading, retry required");
                Err(Error::HomingFailed)
            }
        }
    }

    /// Handles one sensor edge. Returns the fresh drive command when the
    /// decoded state changed, or `None` for glitch edges, invalid samples,
    /// and calls before homing. Bounded work, no allocation.
    #[inline(always)]
    pub fn on_edge(&mut self, sample: u8, duty: f32) -> Option<DriveCommand> {
        let origin = match self.alignment {
            Alignment::Homed(origin) => origin,
            Alignment::Unhomed => return None,
        };
        let state = RotorState::decode(sample)?;
        if self.last_state == Some(state) {
            return None;
        }
        self.last_state = Some(state);

        let steps =
            state.index() as i16 - origin.index() as i16 + self.phase_lead as i16;
        self.drive_state = steps.rem_euclid(SECTOR_COUNT as i16) as u8;
        Some(DriveCommand::lookup(self.drive_state, duty))
    }

    /// Alignment offset captured by the last successful homing.
    pub fn origin(&self) -> Option<RotorState> {
        match self.alignment {
            Alignment::Homed(origin) => Some(origin),
            Alignment::Unhomed => None,
        }
    }

    /// The most recent decoded rotor state.
    pub fn rotor_state(&self) -> Option<RotorState> {
        self.last_state
    }

    /// The drive state currently commanded to the windings.
    pub fn drive_state(&self) -> u8 {
        self.drive_state
    }

    #[inline(always)]
    pub fn set_phase_lead(&mut self, lead: i8) {
        self.phase_lead = lead;
    }

    pub fn phase_lead(&self) -> i8 {
        self.phase_lead
    }

    pub fn is_homed(&self) -> bool {
        matches!(self.alignment, Alignment::Homed(_))
    }
}
