//! Timing and diagnostics settings.
//!
//! The serial peripheral itself is configured by the host. S21 runs at 2400
//! baud, 8 data bits, even parity and 2 stop bits (2400 8E2).

pub const LINK_BAUD_RATE: u32 = 2400;
pub const LINK_DATA_BITS: u8 = 8;
pub const LINK_STOP_BITS: u8 = 2;
pub const LINK_PARITY: Parity = Parity::Even;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Link timing, in milliseconds of the host's monotonic clock.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Timing {
    /// Silence after which an outstanding request is abandoned.
    pub response_timeout_ms: u32,
    /// Pause between the end of one exchange and the next request.
    pub turnaround_ms: u32,
    /// Pause after a protocol fault, long enough for the line to settle.
    pub error_cooldown_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            response_timeout_ms: 250,
            turnaround_ms: 45,
            error_cooldown_ms: 3000,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Config {
    pub timing: Timing,
    /// Trace transmitted frames, unknown responses and payload changes.
    pub debug_protocol: bool,
}

impl Config {
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_debug_protocol(mut self, debug_protocol: bool) -> Self {
        self.debug_protocol = debug_protocol;
        self
    }
}
