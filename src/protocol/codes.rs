//! Command and response codes understood by S21 units.
//!
//! Queries are answered with the first letter incremented: `F1` is answered
//! by `G1`, `RH` by `SH`. Commands (`D*`) are acknowledged without data.

use super::frame::Code;

/// Power, mode, setpoint and fan.
pub const F1: Code = Code::new(b'F', b'1');
/// Swing flags.
pub const F5: Code = Code::new(b'F', b'5');
/// Protocol version.
pub const F8: Code = Code::new(b'F', b'8');
/// Inside and outside temperature, whole degrees.
pub const F9: Code = Code::new(b'F', b'9');
/// Operational mode.
pub const RB: Code = Code::new(b'R', b'B');
pub const RC: Code = Code::new(b'R', b'C');
/// Swing mode as a hex string.
pub const RF: Code = Code::new(b'R', b'F');
pub const RG: Code = Code::new(b'R', b'G');
pub const RH: Code = Code::new(b'R', b'H');
pub const RI: Code = Code::new(b'R', b'I');
pub const RL: Code = Code::new(b'R', b'L');
pub const RN: Code = Code::new(b'R', b'N');
pub const RA_LOWER: Code = Code::new(b'R', b'a');
pub const RD_LOWER: Code = Code::new(b'R', b'd');

pub const G1: Code = Code::new(b'G', b'1');
pub const G5: Code = Code::new(b'G', b'5');
pub const G8: Code = Code::new(b'G', b'8');
pub const G9: Code = Code::new(b'G', b'9');
pub const SB: Code = Code::new(b'S', b'B');
pub const SC: Code = Code::new(b'S', b'C');
pub const SF: Code = Code::new(b'S', b'F');
/// Fan mode, including silent.
pub const SG: Code = Code::new(b'S', b'G');
/// Inside temperature, tenths of a degree.
pub const SH: Code = Code::new(b'S', b'H');
/// Coil temperature.
pub const SI: Code = Code::new(b'S', b'I');
/// Fan speed in tens of rpm.
pub const SL: Code = Code::new(b'S', b'L');
/// Vertical swing angle.
pub const SN: Code = Code::new(b'S', b'N');
/// Outside temperature, tenths of a degree.
pub const SA_LOWER: Code = Code::new(b'S', b'a');
/// Compressor frequency in hertz, 0 when idle.
pub const SD_LOWER: Code = Code::new(b'S', b'd');
/// Power meter reading.
pub const M: Code = Code::single(b'M');

/// Set power, mode, setpoint and fan.
pub const D1: Code = Code::new(b'D', b'1');
/// Set swing.
pub const D5: Code = Code::new(b'D', b'5');

/// Queries polled by default, in scan order.
pub const DEFAULT_QUERIES: [Code; 9] = [F1, F5, F9, RD_LOWER, RH, RI, RA_LOWER, RL, RG];
