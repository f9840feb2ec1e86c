use embedded_hal::serial;
use heapless::Vec;
use log::{debug, warn};
use nb::block;

use crate::config::Timing;
use crate::diagnostics::{Escaped, Hex};
use crate::protocol::{
    checksum, checksum_matches, Encodable, Frame, ACK, ETX, MAX_BODY_SIZE, MAX_FRAME_SIZE, NAK, PAYLOAD_SIZE, STX,
};

/// Stale bytes discarded before a transmission, at most.
const MAX_FLUSH_BYTES: usize = 64;

/// What the link has to report after a call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// An exchange is still running, call again later.
    Busy,
    /// The link is free for the next frame.
    Idle,
    /// The frame was accepted. From `send_frame` this only means it went out.
    Ack,
    /// The unit rejected the frame.
    Nak,
    /// Protocol violation: unexpected byte, bad checksum or oversized frame.
    Error,
    /// The unit stayed silent.
    Timeout,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommState {
    Idle,
    QueryAck,
    CommandAck,
    QueryStx,
    QueryEtx,
    Cooldown,
}

/// Half duplex S21 link over a serial port.
///
/// Only one frame is ever outstanding: `send_frame` is refused until the
/// previous exchange, including its cooldown, has run to completion. All
/// timing is measured against the `now_ms` values the caller passes in, the
/// transport never waits.
pub struct FrameTransport<S> {
    serial: S,
    state: CommState,
    response: Vec<u8, MAX_BODY_SIZE>,
    last_event_ms: u32,
    cooldown_ms: u32,
    timing: Timing,
    debug: bool,
}

impl<S> FrameTransport<S>
where
    S: serial::Read<u8> + serial::Write<u8>,
{
    pub fn new(serial: S, timing: Timing) -> Self {
        FrameTransport {
            serial,
            state: CommState::Idle,
            response: Vec::new(),
            last_event_ms: 0,
            cooldown_ms: 0,
            timing,
            debug: false,
        }
    }

    /// Logs every transmitted frame.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn state(&self) -> CommState {
        self.state
    }

    /// Code and payload of the last validated response frame. Empty when
    /// the last exchange was a bare acknowledgement.
    pub fn response(&self) -> &[u8] {
        &self.response
    }

    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    pub fn release(self) -> S {
        self.serial
    }

    /// Transmits a query (no payload) or a command.
    ///
    /// Returns `Busy` while another exchange is running and `Error` for a
    /// command that cannot be framed or written.
    pub fn send_frame(&mut self, command: &[u8], payload: Option<&[u8; PAYLOAD_SIZE]>, now_ms: u32) -> Outcome {
        if self.state != CommState::Idle {
            return Outcome::Busy;
        }

        let frame = match Frame::new(command, payload) {
            Ok(frame) => frame,
            Err(err) => {
                warn!("Tx: Command '{}' rejected: {:?}", Escaped(command), err);
                return Outcome::Error;
            }
        };

        if self.debug {
            match frame.payload() {
                None => debug!("Tx: {}", frame.code()),
                Some(payload) => debug!("Tx: {} {} {}", frame.code(), Escaped(payload), Hex(payload)),
            }
        }

        // prepare for the response
        self.response.clear();
        self.flush_input();

        let mut buf = [0u8; MAX_FRAME_SIZE];
        let encoded = match frame.encode(&mut buf) {
            Ok(encoded) => encoded,
            Err(_) => return Outcome::Error,
        };
        self.last_event_ms = now_ms;
        for &byte in encoded {
            if block!(self.serial.write(byte)).is_err() {
                warn!("Tx: Serial write failed for {}", frame.code());
                return self.fault();
            }
        }

        self.state = if frame.is_command() { CommState::CommandAck } else { CommState::QueryAck };
        Outcome::Ack
    }

    /// Advances the link without blocking, draining whatever input is buffered.
    pub fn service(&mut self, now_ms: u32) -> Outcome {
        match self.state {
            CommState::Idle => Outcome::Idle,

            CommState::Cooldown => {
                if self.elapsed(now_ms) > self.cooldown_ms {
                    self.state = CommState::Idle;
                    Outcome::Idle
                } else {
                    Outcome::Busy
                }
            }

            // all other states are waiting on the unit
            _ => {
                if self.elapsed(now_ms) > self.timing.response_timeout_ms {
                    self.state = CommState::Idle;
                    return Outcome::Timeout;
                }

                let mut result = Outcome::Busy;
                while result == Outcome::Busy {
                    match self.serial.read() {
                        Ok(byte) => {
                            self.last_event_ms = now_ms;
                            result = self.handle_rx(byte);
                        }
                        Err(nb::Error::WouldBlock) => break,
                        Err(nb::Error::Other(_)) => {
                            self.last_event_ms = now_ms;
                            warn!("Rx: Serial read error in {:?}", self.state);
                            result = self.fault();
                        }
                    }
                }
                result
            }
        }
    }

    fn handle_rx(&mut self, byte: u8) -> Outcome {
        match self.state {
            CommState::QueryAck | CommState::CommandAck => match byte {
                ACK if self.state == CommState::QueryAck => {
                    self.state = CommState::QueryStx;
                    Outcome::Busy
                }
                ACK => self.complete(Outcome::Ack),
                NAK => self.complete(Outcome::Nak),
                _ => {
                    warn!("Rx ACK: Unexpected 0x{:02X}", byte);
                    self.fault()
                }
            },

            CommState::QueryStx => match byte {
                STX => {
                    self.state = CommState::QueryEtx;
                    Outcome::Busy
                }
                ACK => {
                    // some units occasionally repeat the ACK
                    debug!("Rx STX: Unexpected extra ACK, ignoring");
                    Outcome::Busy
                }
                _ => {
                    warn!("Rx STX: Unexpected 0x{:02X}", byte);
                    self.fault()
                }
            },

            CommState::QueryEtx => {
                if byte != ETX {
                    if self.response.push(byte).is_err() {
                        warn!(
                            "Rx ETX: Overflow {} {} + 0x{:02X}",
                            Escaped(&self.response),
                            Hex(&self.response),
                            byte
                        );
                        return self.fault();
                    }
                    return Outcome::Busy;
                }
                self.validate()
            }

            CommState::Idle | CommState::Cooldown => Outcome::Busy,
        }
    }

    // The last byte before ETX is the checksum of everything before it.
    fn validate(&mut self) -> Outcome {
        let received = match self.response.pop() {
            Some(received) if !self.response.is_empty() => received,
            _ => {
                warn!("Rx ETX: Frame without body");
                return self.fault();
            }
        };

        if !checksum_matches(&self.response, received) {
            warn!(
                "Rx ETX: Checksum mismatch: 0x{:02X} != 0x{:02X} (calc from {})",
                received,
                checksum(&self.response),
                Hex(&self.response)
            );
            return self.fault();
        }

        if block!(self.serial.write(ACK)).is_err() {
            warn!("Tx: Serial write failed acknowledging {}", Escaped(&self.response));
        }
        self.complete(Outcome::Ack)
    }

    // some ports keep a line error latched until it is cleared explicitly
    fn flush_input(&mut self) {
        for _ in 0..MAX_FLUSH_BYTES {
            if self.serial.read().is_err() {
                break;
            }
        }
    }

    fn elapsed(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.last_event_ms)
    }

    fn complete(&mut self, result: Outcome) -> Outcome {
        self.state = CommState::Cooldown;
        self.cooldown_ms = self.timing.turnaround_ms;
        result
    }

    fn fault(&mut self) -> Outcome {
        self.state = CommState::Cooldown;
        self.cooldown_ms = self.timing.error_cooldown_ms;
        Outcome::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{reply, MockSerial};
    use crate::protocol::{Code, ENQ};

    fn transport() -> FrameTransport<MockSerial> {
        FrameTransport::new(MockSerial::new(), Timing::default())
    }

    fn receive(transport: &mut FrameTransport<MockSerial>, bytes: &[u8], now_ms: u32) -> Outcome {
        transport.serial_mut().feed(bytes);
        transport.service(now_ms)
    }

    #[test]
    fn query_exchange() {
        let mut link = transport();
        assert_eq!(Outcome::Idle, link.service(0));
        assert_eq!(Outcome::Ack, link.send_frame(b"F1", None, 0));
        assert_eq!(CommState::QueryAck, link.state());
        assert_eq!(vec![STX, b'F', b'1', 0x77, ETX], link.serial_mut().take_tx());

        let mut bytes = vec![ACK];
        bytes.extend(reply(b"G113NA"));
        assert_eq!(Outcome::Ack, receive(&mut link, &bytes, 10));
        assert_eq!(b"G113NA", link.response());
        assert_eq!(vec![ACK], link.serial_mut().take_tx());
        assert_eq!(CommState::Cooldown, link.state());

        assert_eq!(Outcome::Busy, link.service(55));
        assert_eq!(Outcome::Idle, link.service(56));
        assert_eq!(CommState::Idle, link.state());
    }

    #[test]
    fn command_exchange() {
        let mut link = transport();
        assert_eq!(Outcome::Ack, link.send_frame(b"D1", Some(b"13NA"), 0));
        assert_eq!(CommState::CommandAck, link.state());
        assert_eq!(
            vec![STX, b'D', b'1', b'1', b'3', b'N', b'A', 0x68, ETX],
            link.serial_mut().take_tx()
        );

        assert_eq!(Outcome::Ack, receive(&mut link, &[ACK], 5));
        assert!(link.response().is_empty());
        assert!(link.serial_mut().take_tx().is_empty());
        assert_eq!(CommState::Cooldown, link.state());
    }

    #[test]
    fn nak_then_turnaround() {
        let mut link = transport();
        link.send_frame(b"RX", None, 0);
        assert_eq!(Outcome::Nak, receive(&mut link, &[NAK], 5));
        assert_eq!(Outcome::Busy, link.service(50));
        assert_eq!(Outcome::Idle, link.service(51));
    }

    #[test]
    fn unexpected_byte_waits_error_cooldown() {
        let mut link = transport();
        link.send_frame(b"F1", None, 0);
        assert_eq!(Outcome::Error, receive(&mut link, &[0x42], 10));
        assert_eq!(Outcome::Busy, link.service(3010));
        assert_eq!(Outcome::Idle, link.service(3011));
    }

    #[test]
    fn rejects_send_while_busy() {
        let mut link = transport();
        assert_eq!(Outcome::Ack, link.send_frame(b"F1", None, 0));
        link.serial_mut().take_tx();
        assert_eq!(Outcome::Busy, link.send_frame(b"F5", None, 1));
        assert!(link.serial_mut().take_tx().is_empty());
    }

    #[test]
    fn rejects_invalid_commands() {
        let mut link = transport();
        assert_eq!(Outcome::Error, link.send_frame(b"FU0F", None, 0));
        assert_eq!(Outcome::Error, link.send_frame(b"", None, 0));
        assert_eq!(CommState::Idle, link.state());
        assert!(link.serial_mut().take_tx().is_empty());
    }

    #[test]
    fn write_failure_is_an_error() {
        let mut link = transport();
        link.serial_mut().fail_writes = true;
        assert_eq!(Outcome::Error, link.send_frame(b"F1", None, 0));
        assert_eq!(CommState::Cooldown, link.state());
        assert_eq!(Outcome::Idle, link.service(3001));
    }

    #[test]
    fn timeout_after_silence() {
        let mut link = transport();
        link.send_frame(b"F1", None, 100);
        assert_eq!(Outcome::Busy, link.service(350));
        assert_eq!(Outcome::Timeout, link.service(351));
        assert_eq!(CommState::Idle, link.state());
    }

    #[test]
    fn timeout_measured_from_last_byte() {
        let mut link = transport();
        link.send_frame(b"F1", None, 0);
        assert_eq!(Outcome::Busy, receive(&mut link, &[ACK, STX, b'G'], 200));
        assert_eq!(Outcome::Busy, link.service(450));
        assert_eq!(Outcome::Timeout, link.service(451));
    }

    #[test]
    fn clock_wraps() {
        let mut link = transport();
        link.send_frame(b"F1", None, u32::MAX - 10);
        assert_eq!(Outcome::Busy, link.service(5));
        assert_eq!(Outcome::Timeout, link.service(240));
    }

    #[test]
    fn partial_reads() {
        let mut link = transport();
        link.send_frame(b"RH", None, 0);
        let mut bytes = vec![ACK];
        bytes.extend(reply(b"SH512+"));

        let (last, head) = bytes.split_last().unwrap();
        for (i, &byte) in head.iter().enumerate() {
            assert_eq!(Outcome::Busy, receive(&mut link, &[byte], i as u32));
        }
        assert_eq!(Outcome::Busy, link.service(20));
        assert_eq!(Outcome::Ack, receive(&mut link, &[*last], 21));
        assert_eq!(b"SH512+", link.response());
    }

    #[test]
    fn tolerates_extra_ack() {
        let mut link = transport();
        link.send_frame(b"F5", None, 0);
        let mut bytes = vec![ACK, ACK];
        bytes.extend(reply(b"G51?00"));
        assert_eq!(Outcome::Ack, receive(&mut link, &bytes, 1));
        assert_eq!(b"G51?00", link.response());
    }

    #[test]
    fn garbage_before_stx() {
        let mut link = transport();
        link.send_frame(b"F5", None, 0);
        assert_eq!(Outcome::Error, receive(&mut link, &[ACK, b'G'], 1));
    }

    #[test]
    fn checksum_mismatch() {
        let mut link = transport();
        link.send_frame(b"F1", None, 0);
        link.serial_mut().take_tx();
        assert_eq!(Outcome::Error, receive(&mut link, &[ACK, STX, b'G', b'1', 0x00, ETX], 1));
        assert!(link.serial_mut().take_tx().is_empty());
        assert_eq!(Outcome::Busy, link.service(100));
    }

    #[test]
    fn escaped_checksum() {
        let mut link = transport();
        link.send_frame(b"F1", None, 0);
        // 'G' + '1' + '0' + '0' + '*' wraps around to STX
        let bytes = [ACK, STX, b'G', b'1', b'0', b'0', b'*', ENQ, ETX];
        assert_eq!(Outcome::Ack, receive(&mut link, &bytes, 1));
        assert_eq!(b"G100*", link.response());
    }

    #[test]
    fn overflow() {
        let mut link = transport();
        link.send_frame(b"F1", None, 0);
        let bytes = [ACK, STX, b'G', b'1', b'0', b'0', b'0', b'0', b'0', b'0'];
        assert_eq!(Outcome::Error, receive(&mut link, &bytes, 1));
    }

    #[test]
    fn empty_frame() {
        let mut link = transport();
        link.send_frame(b"F1", None, 0);
        assert_eq!(Outcome::Error, receive(&mut link, &[ACK, STX, ETX], 1));
    }

    #[test]
    fn read_fault() {
        let mut link = transport();
        link.send_frame(b"F1", None, 0);
        link.serial_mut().feed(&[ACK]);
        link.serial_mut().feed_fault();
        assert_eq!(Outcome::Error, link.service(1));
        assert_eq!(CommState::Cooldown, link.state());
    }

    #[test]
    fn stale_input_is_discarded() {
        let mut link = transport();
        link.serial_mut().feed(&[NAK, 0x42]);
        link.send_frame(b"D1", Some(b"13NA"), 0);
        assert_eq!(0, link.serial_mut().pending_rx());
        assert_eq!(Outcome::Busy, link.service(1));
        assert_eq!(Outcome::Ack, receive(&mut link, &[ACK], 2));
    }

    #[test]
    fn flush_stops_at_line_error() {
        let mut link = transport();
        link.serial_mut().feed(&[0x42]);
        link.serial_mut().feed_fault();
        link.serial_mut().feed(&[0x43]);
        assert_eq!(Outcome::Ack, link.send_frame(b"F1", None, 0));
        assert_eq!(1, link.serial_mut().pending_rx());
    }

    #[test]
    fn flush_survives_latched_error() {
        let mut link = transport();
        link.serial_mut().latched_fault = true;
        assert_eq!(Outcome::Ack, link.send_frame(b"F1", None, 0));
        assert_eq!(vec![STX, b'F', b'1', 0x77, ETX], link.serial_mut().take_tx());
        assert_eq!(Outcome::Error, link.service(1));
    }

    #[test]
    fn flush_is_bounded() {
        let mut link = transport();
        link.serial_mut().feed(&[0x42; MAX_FLUSH_BYTES + 3]);
        assert_eq!(Outcome::Ack, link.send_frame(b"F1", None, 0));
        assert_eq!(3, link.serial_mut().pending_rx());
    }

    #[test]
    fn stops_reading_after_a_result() {
        let mut link = transport();
        link.send_frame(b"D5", Some(b"1?00"), 0);
        assert_eq!(Outcome::Ack, receive(&mut link, &[ACK, 0x99], 1));
        assert_eq!(1, link.serial_mut().pending_rx());
    }

    #[test]
    fn frames_survive_the_receive_path() {
        let frames = [
            Frame::command(Code::new(b'S', b'H'), *b"512+"),
            Frame::command(Code::single(b'M'), *b"0123"),
            Frame::command(Code::new(b'G', b'1'), *b"00*0"),
            Frame::query(Code::new(b'G', b'8')),
        ];
        for frame in frames.iter() {
            let mut link = transport();
            link.send_frame(b"F1", None, 0);

            let mut buf = [0u8; MAX_FRAME_SIZE];
            let mut bytes = vec![ACK];
            bytes.extend_from_slice(frame.encode(&mut buf).unwrap());
            assert_eq!(Outcome::Ack, receive(&mut link, &bytes, 1));

            let (code, payload) = link.response().split_at(frame.code().len());
            assert_eq!(frame.code().as_bytes(), code);
            assert_eq!(frame.payload().map_or(&[][..], |p| &p[..]), payload);
        }
    }
}
