use super::codes;
use super::encoding::{bytes_to_num, temp_bytes_to_c10};
use super::frame::Code;
use super::types::{Fan, Mode, TenthDegreesC};
use crate::state::{DeviceState, Readiness};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecodeError {
    Short { expected: usize, got: usize },
    UnknownMode(u8),
    UnknownFan(u8),
}

pub type Apply = fn(&mut DeviceState, &[u8]) -> Result<(), DecodeError>;

/// One row of the response table.
pub struct Decoder {
    pub code: Code,
    pub apply: Apply,
    /// Payload changes are worth reporting in diagnostic mode.
    pub traced: bool,
}

pub static DECODERS: &[Decoder] = &[
    Decoder { code: codes::G1, apply: basic_state, traced: false },
    Decoder { code: codes::G5, apply: swing_state, traced: true },
    Decoder { code: codes::G8, apply: ignore, traced: true },
    Decoder { code: codes::G9, apply: combined_temperature, traced: true },
    Decoder { code: codes::SB, apply: ignore, traced: false },
    Decoder { code: codes::SG, apply: fan_mode, traced: false },
    Decoder { code: codes::SH, apply: inside_temperature, traced: false },
    Decoder { code: codes::SI, apply: coil_temperature, traced: false },
    Decoder { code: codes::SA_LOWER, apply: outside_temperature, traced: false },
    Decoder { code: codes::SL, apply: fan_rpm, traced: false },
    Decoder { code: codes::SD_LOWER, apply: compressor_frequency, traced: false },
    Decoder { code: codes::SC, apply: setpoint, traced: false },
    Decoder { code: codes::SN, apply: swing_vertical_angle, traced: false },
    Decoder { code: codes::SF, apply: ignore, traced: true },
    Decoder { code: codes::M, apply: ignore, traced: true },
    Decoder { code: codes::D1, apply: climate_accepted, traced: false },
    Decoder { code: codes::D5, apply: swing_accepted, traced: false },
];

pub fn decoder_for(code: Code) -> Option<&'static Decoder> {
    DECODERS.iter().find(|decoder| decoder.code == code)
}

fn expect(payload: &[u8], expected: usize) -> Result<(), DecodeError> {
    if payload.len() < expected {
        Err(DecodeError::Short { expected, got: payload.len() })
    } else {
        Ok(())
    }
}

fn number(payload: &[u8]) -> Result<i16, DecodeError> {
    bytes_to_num(payload).ok_or(DecodeError::Short { expected: 3, got: payload.len() })
}

fn temperature(payload: &[u8]) -> Result<TenthDegreesC, DecodeError> {
    temp_bytes_to_c10(payload).ok_or(DecodeError::Short { expected: 4, got: payload.len() })
}

fn decode_fan(byte: u8) -> Result<Fan, DecodeError> {
    Fan::from_repr(byte).ok_or(DecodeError::UnknownFan(byte))
}

fn ignore(_: &mut DeviceState, _: &[u8]) -> Result<(), DecodeError> {
    Ok(())
}

fn basic_state(state: &mut DeviceState, payload: &[u8]) -> Result<(), DecodeError> {
    expect(payload, 4)?;
    let mode = Mode::from_repr(payload[1]).ok_or(DecodeError::UnknownMode(payload[1]))?;
    // RG also reports silent mode, prefer it once seen
    let fan = if state.capabilities.support_rg { None } else { Some(decode_fan(payload[3])?) };

    state.active.power_on = payload[0] == b'1';
    state.active.mode = mode;
    state.active.setpoint = TenthDegreesC::from_setpoint_byte(payload[2]);
    if let Some(fan) = fan {
        state.active.fan = fan;
    }
    state.ready.set(Readiness::BASIC);
    Ok(())
}

fn swing_state(state: &mut DeviceState, payload: &[u8]) -> Result<(), DecodeError> {
    expect(payload, 1)?;
    state.active.swing_v = payload[0] & 1 != 0;
    state.active.swing_h = payload[0] & 2 != 0;
    state.ready.set(Readiness::SWING);
    Ok(())
}

fn combined_temperature(state: &mut DeviceState, payload: &[u8]) -> Result<(), DecodeError> {
    expect(payload, 2)?;
    state.sensors.temp_inside = TenthDegreesC::from_half_degree_byte(payload[0]);
    state.sensors.temp_outside = TenthDegreesC::from_half_degree_byte(payload[1]);
    Ok(())
}

fn fan_mode(state: &mut DeviceState, payload: &[u8]) -> Result<(), DecodeError> {
    expect(payload, 1)?;
    state.active.fan = decode_fan(payload[0])?;
    state.capabilities.support_rg = true;
    Ok(())
}

fn inside_temperature(state: &mut DeviceState, payload: &[u8]) -> Result<(), DecodeError> {
    state.sensors.temp_inside = temperature(payload)?;
    state.capabilities.support_rh = true;
    Ok(())
}

fn coil_temperature(state: &mut DeviceState, payload: &[u8]) -> Result<(), DecodeError> {
    state.sensors.temp_coil = temperature(payload)?;
    Ok(())
}

fn outside_temperature(state: &mut DeviceState, payload: &[u8]) -> Result<(), DecodeError> {
    state.sensors.temp_outside = temperature(payload)?;
    state.capabilities.support_ra = true;
    Ok(())
}

fn fan_rpm(state: &mut DeviceState, payload: &[u8]) -> Result<(), DecodeError> {
    state.sensors.fan_rpm = i32::from(number(payload)?) * 10;
    Ok(())
}

fn compressor_frequency(state: &mut DeviceState, payload: &[u8]) -> Result<(), DecodeError> {
    state.sensors.compressor_hz = number(payload)?;
    state.ready.set(Readiness::COMPRESSOR);
    Ok(())
}

fn setpoint(state: &mut DeviceState, payload: &[u8]) -> Result<(), DecodeError> {
    state.active.setpoint = TenthDegreesC(number(payload)?);
    Ok(())
}

fn swing_vertical_angle(state: &mut DeviceState, payload: &[u8]) -> Result<(), DecodeError> {
    let angle = payload.get(..4).ok_or(DecodeError::Short { expected: 4, got: payload.len() })?;
    state.sensors.swing_vertical_angle = number(angle)?;
    Ok(())
}

// Commands are acknowledged without data, the scheduler feeds their code
// back in with an empty payload. The unit took the pending values, the next
// scan confirms them.

fn climate_accepted(state: &mut DeviceState, _: &[u8]) -> Result<(), DecodeError> {
    let pending = state.pending;
    state.active.power_on = pending.power_on;
    state.active.mode = pending.mode;
    state.active.setpoint = pending.setpoint.round_to_half_degree();
    state.active.fan = pending.fan;
    state.activation.climate = false;
    state.activation.refresh = true;
    Ok(())
}

fn swing_accepted(state: &mut DeviceState, _: &[u8]) -> Result<(), DecodeError> {
    state.active.swing_v = state.pending.swing_v;
    state.active.swing_h = state.pending.swing_h;
    state.activation.swing = false;
    state.activation.refresh = true;
    Ok(())
}
