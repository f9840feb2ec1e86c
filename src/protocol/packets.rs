use super::codes;
use super::encoding::OneByteEncodable;
use super::frame::{Code, Frame};
use super::types::{Fan, Mode, TenthDegreesC};
use super::PAYLOAD_SIZE;

/// A command with a fixed four byte payload.
pub trait CommandPacket {
    const CODE: Code;

    fn payload(&self) -> [u8; PAYLOAD_SIZE];

    fn frame(&self) -> Frame {
        Frame::command(Self::CODE, self.payload())
    }
}

/// `D1`: power, mode, setpoint and fan in one go.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClimateCommand {
    pub power_on: bool,
    pub mode: Mode,
    pub setpoint: TenthDegreesC,
    pub fan: Fan,
}

// 4 bytes:
//
//  0   1   2   3
// PW  MO  SP  FA
//
// PW: '1' on, '0' off
// MO: Mode
// SP: Setpoint, half degrees offset by 28
// FA: Fan
impl CommandPacket for ClimateCommand {
    const CODE: Code = codes::D1;

    fn payload(&self) -> [u8; PAYLOAD_SIZE] {
        [
            if self.power_on { b'1' } else { b'0' },
            self.mode.encoded_as_byte(),
            self.setpoint.encode_as_setpoint_byte(),
            self.fan.encoded_as_byte(),
        ]
    }
}

/// `D5`: swing axes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SwingCommand {
    pub vertical: bool,
    pub horizontal: bool,
}

// 4 bytes:
//
//  0   1   2   3
// SW  ON  xx  xx
//
// SW: '0' plus 4 when both axes swing, plus 2 horizontal, plus 1 vertical
// ON: '?' when either axis swings, '0' otherwise
impl CommandPacket for SwingCommand {
    const CODE: Code = codes::D5;

    fn payload(&self) -> [u8; PAYLOAD_SIZE] {
        let both = if self.horizontal && self.vertical { 4 } else { 0 };
        let horizontal = if self.horizontal { 2 } else { 0 };
        let vertical = if self.vertical { 1 } else { 0 };
        let enabled = if self.horizontal || self.vertical { b'?' } else { b'0' };
        [b'0' + both + horizontal + vertical, enabled, b'0', b'0']
    }
}
