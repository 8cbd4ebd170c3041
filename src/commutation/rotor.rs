// Implements rotor-state decoding from the three photointerrupter lines,
// mapping each raw 3-bit sample to one of six sequential rotor states.

// Key Features:
// - Fixed 8-entry lookup from raw sensor code to rotor state.
// - Raw codes 0 and 7 are physically impossible and decode to None.
// - Constant-time, side-effect free; safe to call at interrupt rate.

// Licensed under the Apache License, Version 2.0

/// Number of sequential rotor states per electrical revolution.
pub const SECTOR_COUNT: u8 = 6;

/// One of six valid rotor positions, decoded from the position sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RotorState(u8);

/// Mapping from interrupter inputs to sequential rotor states.
/// Codes 0b000 and 0b111 are not valid and mark a sensor fault.
const STATE_MAP: [i8; 8] = [-1, 5, 3, 4, 1, 0, 2, -1];

impl RotorState {
    /// Decodes a raw 3-bit sample (bit0 + 2*bit1 + 4*bit2) into a rotor state.
    #[inline(always)]
    pub fn decode(sample: u8) -> Option<RotorState> {
        match STATE_MAP[(sample & 0x07) as usize] {
            s @ 0..=5 => Some(RotorState(s as u8)),
            _ => None,
        }
    }

    /// Like `decode`, but reports the reserved codes as an explicit error
    /// for callers that want to surface the fault.
    #[inline(always)]
    pub fn try_decode(sample: u8) -> Result<RotorState, crate::Error> {
        Self::decode(sample).ok_or(crate::Error::InvalidSensorReading)
    }

    /// State with the given sequential index, wrapped into 0..6.
    pub(crate) const fn from_index(index: u8) -> RotorState {
        RotorState(index % SECTOR_COUNT)
    }

    /// Sequential index of this state, always in 0..6.
    #[inline(always)]
    pub fn index(self) -> u8 {
        self.0
    }

    /// True once the rotor has passed the midpoint of the six-step cycle.
    /// Used to arm the half-revolution latch.
    #[inline(always)]
    pub fn past_midpoint(self) -> bool {
        self.0 >= 3
    }

    /// True at the reference state that marks a completed revolution.
    #[inline(always)]
    pub fn at_reference(self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_codes_are_invalid() {
        assert_eq!(RotorState::decode(0b000), None);
        assert_eq!(RotorState::decode(0b111), None);
    }

    #[test]
    fn valid_codes_cover_all_six_states() {
        let mut seen = [false; 6];
        for sample in 1..7u8 {
            let state = RotorState::decode(sample).unwrap();
            assert!(state.index() < SECTOR_COUNT);
            seen[state.index() as usize] = true;
        }
        assert_eq!(seen, [true; 6]);
    }

    #[test]
    fn try_decode_reports_the_fault() {
        assert_eq!(
            RotorState::try_decode(0b111),
            Err(crate::Error::InvalidSensorReading)
        );
        assert_eq!(RotorState::try_decode(0b101).unwrap().index(), 0);
    }

    #[test]
    fn high_sample_bits_are_masked() {
        assert_eq!(RotorState::decode(0b0000_0101), RotorState::decode(0b1111_1101));
    }

    #[test]
    fn midpoint_and_reference_flags() {
        let state = |i: u8| RotorState(i);
        assert!(state(0).at_reference());
        assert!(!state(2).past_midpoint());
        assert!(state(3).past_midpoint());
        assert!(state(5).past_midpoint());
    }
}
