use core::fmt;

use crate::protocol::{Fan, Mode, TenthDegreesC};

/// User facing settings, either confirmed by the unit or waiting to be sent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClimateSettings {
    pub power_on: bool,
    pub mode: Mode,
    pub setpoint: TenthDegreesC,
    pub fan: Fan,
    pub swing_v: bool,
    pub swing_h: bool,
}

impl Default for ClimateSettings {
    fn default() -> Self {
        ClimateSettings {
            power_on: false,
            mode: Mode::Disabled,
            setpoint: TenthDegreesC(0),
            fan: Fan::Auto,
            swing_v: false,
            swing_h: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Sensors {
    pub temp_inside: TenthDegreesC,
    pub temp_outside: TenthDegreesC,
    pub temp_coil: TenthDegreesC,
    pub fan_rpm: i32,
    pub compressor_hz: i16,
    pub swing_vertical_angle: i16,
}

/// Higher resolution queries the unit has been seen to answer.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Capabilities {
    /// `RH`, inside temperature in tenths.
    pub support_rh: bool,
    /// `Ra`, outside temperature in tenths.
    pub support_ra: bool,
    /// `RG`, fan mode including silent.
    pub support_rg: bool,
}

/// Response families observed at least once.
#[derive(Clone, Copy, Default, Eq, PartialEq)]
pub struct Readiness(u8);

impl Readiness {
    pub const BASIC: u8 = 1 << 0;
    pub const SWING: u8 = 1 << 1;
    pub const COMPRESSOR: u8 = 1 << 2;
    const ALL: u8 = Self::BASIC | Self::SWING | Self::COMPRESSOR;

    pub fn set(&mut self, family: u8) {
        self.0 |= family;
    }

    pub fn contains(&self, family: u8) -> bool {
        self.0 & family == family
    }

    pub fn is_complete(&self) -> bool {
        self.contains(Self::ALL)
    }
}

impl fmt::Debug for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Readiness")
            .field("basic", &self.contains(Self::BASIC))
            .field("swing", &self.contains(Self::SWING))
            .field("compressor", &self.contains(Self::COMPRESSOR))
            .finish()
    }
}

/// Work the scheduler still owes the unit.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Activation {
    pub climate: bool,
    pub swing: bool,
    pub refresh: bool,
}

/// Everything the response decoders are allowed to touch.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DeviceState {
    /// Confirmed by the unit.
    pub active: ClimateSettings,
    /// Requested by the host, sent while the matching activation flag is set.
    pub pending: ClimateSettings,
    pub sensors: Sensors,
    pub capabilities: Capabilities,
    pub ready: Readiness,
    pub activation: Activation,
}

impl DeviceState {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            active: self.active,
            sensors: self.sensors,
            capabilities: self.capabilities,
            ready: self.ready,
        }
    }
}

/// Read-only view handed to the host.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Snapshot {
    pub active: ClimateSettings,
    pub sensors: Sensors,
    pub capabilities: Capabilities,
    pub ready: Readiness,
}

impl Snapshot {
    pub fn is_ready(&self) -> bool {
        self.ready.is_complete()
    }

    /// The compressor is not running.
    pub fn is_idle(&self) -> bool {
        self.sensors.compressor_hz == 0
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "ON"
    } else {
        "OFF"
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "YES"
    } else {
        "NO"
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "  Power: {}", on_off(self.active.power_on))?;
        writeln!(
            f,
            "   Mode: {} ({})",
            self.active.mode,
            if self.is_idle() { "idle" } else { "active" }
        )?;
        writeln!(f, " Target: {}", self.active.setpoint)?;
        writeln!(f, "    Fan: {} ({} rpm)", self.active.fan, self.sensors.fan_rpm)?;
        writeln!(f, "  Swing: H:{} V:{}", yes_no(self.active.swing_h), yes_no(self.active.swing_v))?;
        writeln!(f, " Inside: {}", self.sensors.temp_inside)?;
        writeln!(f, "Outside: {}", self.sensors.temp_outside)?;
        write!(f, "   Coil: {}", self.sensors.temp_coil)
    }
}
