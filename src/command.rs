// Implements the line-oriented command boundary: parses `R<num>V<num>`
// style commands into a session target for the motor controller.

// Key Features:
// - Explicit DFA over the prefix letters; first-seen-wins per prefix.
// - Numeric tokens allow one leading minus and one non-leading decimal
//   point; malformed tokens are dropped and scanning continues.
// - Never panics on arbitrary input.

// Licensed under the Apache License, Version 2.0

/// Parsed target of one command line, handed to the core as a single
/// session start.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionCommand {
    /// Signed target rotation count; sign selects direction.
    pub rotations: Option<f32>,
    /// Signed target velocity in revolutions per second.
    pub velocity: Option<f32>,
}

/// DFA states: `R` is only accepted before `V`, each letter at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Start,
    RotationSeen,
    VelocitySeen,
}

/// Parses one command line. Returns `None` when no valid token was found.
pub fn parse_line(line: &str) -> Option<SessionCommand> {
    let bytes = line.as_bytes();
    let mut cmd = SessionCommand::default();
    let mut state = ParseState::Start;
    let mut i = 0;

    while i < bytes.len() && state != ParseState::VelocitySeen {
        match bytes[i] {
            b'R' | b'r' if state == ParseState::Start => {
                if let Some((value, consumed)) = parse_number(&bytes[i + 1..]) {
                    cmd.rotations = Some(value);
                    state = ParseState::RotationSeen;
                    i += consumed;
                }
            }
            b'V' | b'v' => {
                if let Some((value, consumed)) = parse_number(&bytes[i + 1..]) {
                    cmd.velocity = Some(value);
                    state = ParseState::VelocitySeen;
                    i += consumed;
                }
            }
            _ => {}
        }
        i += 1;
    }

    if cmd.rotations.is_none() && cmd.velocity.is_none() {
        None
    } else {
        Some(cmd)
    }
}

/// Scans a signed decimal token at the start of `bytes`. Returns the value
/// and the number of bytes consumed, or `None` for a malformed token
/// (misplaced `.` or `-`, or no digits at all).
fn parse_number(bytes: &[u8]) -> Option<(f32, usize)> {
    let mut found_decimal = false;
    let mut end = 0;

    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {}
            b'.' => {
                // A decimal point needs a digit before it and only one
                // may appear.
                if end == 0 || found_decimal {
                    return None;
                }
                found_decimal = true;
            }
            b'-' => {
                // A minus is only valid in the leading position.
                if end != 0 {
                    return None;
                }
            }
            _ => break,
        }
        end += 1;
    }

    // str::parse rejects the residual malformed shapes ("-", "-.").
    let token = core::str::from_utf8(&bytes[..end]).ok()?;
    match token.parse::<f32>() {
        Ok(value) if token.bytes().any(|b| b.is_ascii_digit()) => Some((value, end)),
        _ => None,
    }
}
