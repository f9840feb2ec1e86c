use core::convert::TryFrom;

use embedded_hal::serial;
use log::{debug, info, trace, warn};

use crate::config::Config;
use crate::diagnostics::{DiffCache, Escaped, Hex, Payload};
use crate::interface::{CommState, FrameTransport, Outcome};
use crate::protocol::encoding::temp_bytes_to_c10;
use crate::protocol::{
    codes, decoder_for, ClimateCommand, Code, CommandPacket, Fan, Frame, Mode, SwingCommand, TenthDegreesC,
};
use crate::query_pool::{PoolError, QueryPool};
use crate::state::{Activation, ClimateSettings, DeviceState, Snapshot};

const DIFF_CACHE_SIZE: usize = 32;

/// Polls an S21 unit and applies setting changes.
///
/// Call [`tick`](Session::tick) from the host's main loop (every few
/// milliseconds) and [`request_refresh`](Session::request_refresh) at the
/// desired polling interval.
pub struct Session<S> {
    transport: FrameTransport<S>,
    queries: QueryPool,
    state: DeviceState,
    /// Code of the last frame handed to the transport.
    tx_command: Option<Code>,
    diff: DiffCache<DIFF_CACHE_SIZE>,
    debug_protocol: bool,
    ready_reported: bool,
}

impl<S> Session<S>
where
    S: serial::Read<u8> + serial::Write<u8>,
{
    /// A session polling the default query set.
    pub fn new(serial: S, config: Config) -> Self {
        Self::with_pool(serial, config, QueryPool::default())
    }

    pub fn with_queries(serial: S, config: Config, queries: &[Code]) -> Result<Self, PoolError> {
        Ok(Self::with_pool(serial, config, QueryPool::new(queries)?))
    }

    fn with_pool(serial: S, config: Config, queries: QueryPool) -> Self {
        let mut transport = FrameTransport::new(serial, config.timing);
        transport.set_debug(config.debug_protocol);
        Session {
            transport,
            queries,
            state: DeviceState::default(),
            tx_command: None,
            diff: DiffCache::new(),
            debug_protocol: config.debug_protocol,
            ready_reported: false,
        }
    }

    /// Runs one step: services the link, then decodes, recovers or transmits.
    pub fn tick(&mut self, now_ms: u32) -> Outcome {
        let result = self.transport.service(now_ms);
        match result {
            Outcome::Ack => {
                trace!("Rx: ACK from S21 for {:?}", self.tx_command);
                self.parse_ack();
            }

            Outcome::Idle => self.tx_next(now_ms),

            Outcome::Nak => self.handle_nak(),

            Outcome::Error => {
                self.queries.abort();
                self.state.activation.refresh = true;
                self.state.activation.climate = false;
                self.state.activation.swing = false;
            }

            Outcome::Timeout => warn!("Timeout waiting for response to {:?}", self.tx_command),

            Outcome::Busy => {}
        }
        result
    }

    /// Asks for a fresh query scan once the current one has finished.
    pub fn request_refresh(&mut self) {
        self.state.activation.refresh = true;

        if !self.ready_reported && self.is_ready() {
            info!("Daikin S21 Ready");
            self.ready_reported = true;
        }

        if self.debug_protocol {
            debug!("S21 state:\n{}", self.snapshot());
        }
    }

    /// Queues power, mode, setpoint and fan for the next idle tick. A second
    /// request before the first went out replaces it.
    pub fn request_climate_change(&mut self, power_on: bool, mode: Mode, setpoint: TenthDegreesC, fan: Fan) {
        let pending = &mut self.state.pending;
        pending.power_on = power_on;
        pending.mode = mode;
        pending.setpoint = setpoint;
        pending.fan = fan;
        self.state.activation.climate = true;
    }

    pub fn request_swing_change(&mut self, vertical: bool, horizontal: bool) {
        self.state.pending.swing_v = vertical;
        self.state.pending.swing_h = horizontal;
        self.state.activation.swing = true;
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    /// Basic, swing and compressor responses have all been seen.
    pub fn is_ready(&self) -> bool {
        self.state.ready.is_complete()
    }

    pub fn pending(&self) -> &ClimateSettings {
        &self.state.pending
    }

    pub fn activation(&self) -> Activation {
        self.state.activation
    }

    pub fn queries(&self) -> &QueryPool {
        &self.queries
    }

    pub fn link_state(&self) -> CommState {
        self.transport.state()
    }

    pub fn serial_mut(&mut self) -> &mut S {
        self.transport.serial_mut()
    }

    pub fn release(self) -> S {
        self.transport.release()
    }

    // exclude F9 once the unit answers the finer grained individual sensors
    fn refine_queries(&mut self) {
        let capabilities = self.state.capabilities;
        if capabilities.support_ra && capabilities.support_rh && self.queries.remove(codes::F9) {
            debug!("Removing F9 from query pool (better support in Ra and RH)");
        }
    }

    fn tx_next(&mut self, now_ms: u32) {
        if self.state.activation.climate {
            let pending = self.state.pending;
            let command = ClimateCommand {
                power_on: pending.power_on,
                mode: pending.mode,
                setpoint: pending.setpoint,
                fan: pending.fan,
            };
            self.send(command.frame(), now_ms);
            return;
        }

        if self.state.activation.swing {
            let command = SwingCommand {
                vertical: self.state.pending.swing_v,
                horizontal: self.state.pending.swing_h,
            };
            self.send(command.frame(), now_ms);
            return;
        }

        // query scan underway, continue
        if let Some(query) = self.queries.current() {
            self.send(Frame::query(query), now_ms);
            return;
        }

        // start a fresh scan only after the current one is complete
        if self.state.activation.refresh {
            self.state.activation.refresh = false;
            self.refine_queries();
            if let Some(query) = self.queries.restart() {
                self.send(Frame::query(query), now_ms);
            }
        }
    }

    fn send(&mut self, frame: Frame, now_ms: u32) {
        self.tx_command = Some(frame.code());
        let result = self.transport.send_frame(frame.code().as_bytes(), frame.payload(), now_ms);
        if result != Outcome::Ack {
            warn!("Tx: {} not sent: {:?}", frame.code(), result);
        }
    }

    fn parse_ack(&mut self) {
        let sent = match self.tx_command {
            Some(sent) => sent,
            None => return,
        };

        let response = self.transport.response();
        let (code, payload) = if response.is_empty() {
            // commands only get an ACK, decode them under their own code
            (sent, Payload::new())
        } else {
            // query answered, move on to the next one
            self.queries.advance();
            if response.len() < sent.len() {
                warn!("Rx: Response {} too short for {}", Hex(response), sent);
                return;
            }
            let (code, payload) = response.split_at(sent.len());
            match (Code::try_from(code), Payload::from_slice(payload)) {
                (Ok(code), Ok(payload)) => (code, payload),
                _ => {
                    warn!("Rx: Unable to split response {}", Hex(response));
                    return;
                }
            }
        };

        match decoder_for(code) {
            Some(decoder) => {
                if let Err(err) = (decoder.apply)(&mut self.state, &payload) {
                    warn!("Rx: Unable to decode {} {} {}: {:?}", code, Escaped(&payload), Hex(&payload), err);
                }
                if decoder.traced {
                    self.trace_change(code, &payload);
                }
            }

            None => {
                if self.debug_protocol {
                    if let Some(temp) = sensor_hint(code, &payload) {
                        debug!("Unknown sensor: {} -> {} -> {}", code, Hex(&payload), temp);
                    }
                    self.trace_change(code, &payload);
                }
            }
        }
    }

    fn trace_change(&mut self, code: Code, payload: &[u8]) {
        if !self.debug_protocol {
            return;
        }
        if let Some(change) = self.diff.observe(code, payload) {
            info!(
                "S21 {} changed: {} {} -> {} {}",
                code,
                Escaped(&change.previous),
                Hex(&change.previous),
                Escaped(&change.current),
                Hex(&change.current)
            );
        }
    }

    fn handle_nak(&mut self) {
        let sent = match self.tx_command {
            Some(sent) => sent,
            None => return,
        };
        warn!("Rx: NAK from S21 for {}", sent);

        // compared by value, a pool holding the same code twice would be ambiguous
        if self.queries.current() == Some(sent) {
            warn!("Removing {} from query pool (assuming unsupported)", sent);
            self.queries.remove_current();
        } else {
            // don't get stuck retrying an unsupported command
            warn!("Acknowledging {} command despite NAK", sent);
            self.parse_ack();
        }
    }
}

/// Reads an unknown `S` response as a temperature. `G` responses are
/// packed flags and only ever get their changes traced.
fn sensor_hint(code: Code, payload: &[u8]) -> Option<TenthDegreesC> {
    if code.as_bytes().first() == Some(&b'S') {
        temp_bytes_to_c10(payload)
    } else {
        None
    }
}
