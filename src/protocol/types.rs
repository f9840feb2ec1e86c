use core::fmt;

use super::encoding::OneByteEncodable;
use enum_repr::EnumRepr;

/// Operating mode, transmitted as a single ASCII digit.
#[EnumRepr(type = "u8")]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    Disabled = 0x30,
    Auto = 0x31,
    Dry = 0x32,
    Cool = 0x33,
    Heat = 0x34,
    Fan = 0x36,
}

impl OneByteEncodable for Mode {
    fn encoded_as_byte(&self) -> u8 {
        self.repr()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Mode::Disabled => "Disabled",
            Mode::Auto => "Auto",
            Mode::Dry => "Dry",
            Mode::Cool => "Cool",
            Mode::Heat => "Heat",
            Mode::Fan => "Fan",
        })
    }
}

/// Fan speed. `Silent` is only ever reported by the `RG` query.
#[EnumRepr(type = "u8")]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Fan {
    Auto = 0x41,
    Silent = 0x42,
    Speed1 = 0x33,
    Speed2 = 0x34,
    Speed3 = 0x35,
    Speed4 = 0x36,
    Speed5 = 0x37,
}

impl OneByteEncodable for Fan {
    fn encoded_as_byte(&self) -> u8 {
        self.repr()
    }
}

impl fmt::Display for Fan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Fan::Auto => "Auto",
            Fan::Silent => "Silent",
            Fan::Speed1 => "1",
            Fan::Speed2 => "2",
            Fan::Speed3 => "3",
            Fan::Speed4 => "4",
            Fan::Speed5 => "5",
        })
    }
}

/// Temperature in tenths of a degree Celsius.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TenthDegreesC(pub i16);

impl TenthDegreesC {
    /// Decodes the setpoint byte of a `G1` response (half degree steps from 28).
    pub fn from_setpoint_byte(byte: u8) -> Self {
        TenthDegreesC((i16::from(byte) - 28) * 5)
    }

    /// Decodes one byte of the `G9` combined temperature response.
    pub fn from_half_degree_byte(byte: u8) -> Self {
        TenthDegreesC((i16::from(byte) / 2 - 64) * 10)
    }

    /// Rounds to the nearest half degree, ties away from zero.
    /// Saturates at the ends of the `i16` range.
    pub fn round_to_half_degree(self) -> Self {
        TenthDegreesC(clamp_i16(half_degree_steps(self.0) * 5))
    }

    /// Setpoints outside what one byte can carry are clamped.
    pub fn encode_as_setpoint_byte(&self) -> u8 {
        let rounded = half_degree_steps(self.0) * 5;
        ((rounded + 3) / 5 + 28).clamp(0, 0xff) as u8
    }

    pub fn celsius(&self) -> f32 {
        f32::from(self.0) / 10.0
    }

    pub fn fahrenheit(&self) -> f32 {
        self.celsius() * 1.8 + 32.0
    }
}

fn half_degree_steps(tenths: i16) -> i32 {
    let tenths = i32::from(tenths);
    if tenths >= 0 {
        (tenths + 2) / 5
    } else {
        (tenths - 2) / 5
    }
}

fn clamp_i16(value: i32) -> i16 {
    value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

impl fmt::Display for TenthDegreesC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.1} C ({:.1} F)", self.celsius(), self.fahrenheit())
    }
}
