// Implements the six-step drive table, mapping a commutation state to the
// energization pattern of the three half-bridge legs.

// Key Features:
// - Canonical six-step sequence: one phase high, one low, one floating.
// - Drive states 6 and 7 map to the fully de-energized pattern.
// - Off transitions are applied before on transitions to forbid any
//   transient dual-drive of a leg.

// Licensed under the Apache License, Version 2.0

/// Mapping from sequential drive states to winding energization patterns.
///
/// State   L1  L2  L3
/// 0       H   -   L
/// 1       -   H   L
/// 2       L   H   -
/// 3       L   -   H
/// 4       -   L   H
/// 5       H   L   -
/// 6       -   -   -
/// 7       -   -   -
///
/// Bit 2k is the low side of leg k, bit 2k+1 its high side.
const DRIVE_TABLE: [u8; 8] = [0x12, 0x18, 0x09, 0x21, 0x24, 0x06, 0x00, 0x00];

/// One of the six winding driver legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Leg {
    L1Low,
    L1High,
    L2Low,
    L2High,
    L3Low,
    L3High,
}

impl Leg {
    /// All legs in table bit order.
    pub const ALL: [Leg; 6] = [
        Leg::L1Low,
        Leg::L1High,
        Leg::L2Low,
        Leg::L2High,
        Leg::L3Low,
        Leg::L3High,
    ];

    #[inline(always)]
    fn mask(self) -> u8 {
        1 << self as u8
    }
}

/// Energization command for a single leg.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LegDrive {
    pub energized: bool,
    /// Duty fraction in [0,1]; meaningful only while energized.
    pub duty: f32,
}

/// Full drive command for one commutation step, one entry per leg
/// in `Leg::ALL` order. Produced fresh on every step, never retained.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriveCommand {
    pub legs: [LegDrive; 6],
}

/// Hardware output boundary: six independent leg drivers, each accepting
/// an on/off state and a duty fraction while on. `DriveCommand::apply` is
/// the sole writer.
pub trait DriveLegs {
    fn set_leg(&mut self, leg: Leg, drive: LegDrive);
}

impl DriveCommand {
    /// Looks up the command for a drive state with the given duty-scale.
    /// States 6 and 7 yield the all-off pattern, a safe default.
    pub fn lookup(drive_state: u8, duty: f32) -> DriveCommand {
        let pattern = DRIVE_TABLE[(drive_state & 0x07) as usize];
        let duty = duty.clamp(0.0, 1.0);
        let mut legs = [LegDrive::default(); 6];
        for (slot, leg) in legs.iter_mut().zip(Leg::ALL) {
            if pattern & leg.mask() != 0 {
                *slot = LegDrive {
                    energized: true,
                    duty,
                };
            }
        }
        DriveCommand { legs }
    }

    /// The all-off pattern.
    pub fn released() -> DriveCommand {
        Self::lookup(6, 0.0)
    }

    /// Writes the command to hardware, de-energizing legs strictly before
    /// energizing the new ones.
    pub fn apply<D: DriveLegs>(&self, out: &mut D) {
        for (leg, drive) in Leg::ALL.iter().zip(self.legs.iter()) {
            if !drive.energized {
                out.set_leg(*leg, *drive);
            }
        }
        for (leg, drive) in Leg::ALL.iter().zip(self.legs.iter()) {
            if drive.energized {
                out.set_leg(*leg, *drive);
            }
        }
    }

    /// True if any leg has both its high and low side commanded on.
    /// The table guarantees this never happens; exposed for verification.
    pub fn has_shoot_through(&self) -> bool {
        for pair in self.legs.chunks(2) {
            if pair[0].energized && pair[1].energized {
                return true;
            }
        }
        false
    }
}
