//! In-memory serial port for exercising the link without hardware.

use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal::serial;

use crate::protocol::{checksum, ETX, STX};

#[derive(Debug, Eq, PartialEq)]
pub enum MockError {
    Line,
}

enum Rx {
    Byte(u8),
    Fault,
}

/// Bytes queued with [`feed`](MockSerial::feed) are handed out one `read`
/// at a time; everything written is collected in `tx`.
#[derive(Default)]
pub struct MockSerial {
    rx: VecDeque<Rx>,
    pub tx: Vec<u8>,
    pub fail_writes: bool,
    /// Every read fails, as on a port whose error flag is never cleared.
    pub latched_fault: bool,
}

impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().map(|&byte| Rx::Byte(byte)));
    }

    /// Queues a framing/parity error.
    pub fn feed_fault(&mut self) {
        self.rx.push_back(Rx::Fault);
    }

    pub fn pending_rx(&self) -> usize {
        self.rx.len()
    }

    pub fn take_tx(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx)
    }
}

impl serial::Read<u8> for MockSerial {
    type Error = MockError;

    fn read(&mut self) -> nb::Result<u8, MockError> {
        if self.latched_fault {
            return Err(nb::Error::Other(MockError::Line));
        }
        match self.rx.pop_front() {
            Some(Rx::Byte(byte)) => Ok(byte),
            Some(Rx::Fault) => Err(nb::Error::Other(MockError::Line)),
            None => Err(nb::Error::WouldBlock),
        }
    }
}

impl serial::Write<u8> for MockSerial {
    type Error = MockError;

    fn write(&mut self, byte: u8) -> nb::Result<(), MockError> {
        if self.fail_writes {
            return Err(nb::Error::Other(MockError::Line));
        }
        self.tx.push(byte);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), MockError> {
        Ok(())
    }
}

/// A complete `STX body checksum ETX` frame as the unit would send it.
pub fn reply(body: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(body.len() + 3);
    frame.push(STX);
    frame.extend_from_slice(body);
    frame.push(checksum(body));
    frame.push(ETX);
    frame
}
