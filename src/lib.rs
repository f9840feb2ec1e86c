#![cfg_attr(not(test), no_std)]

//! daikin_s21
//!
//! Master side of the S21 serial protocol spoken by many Daikin air
//! conditioners on their service connector.
//!
//! It is intended for use on embedded hardware, and as such is `no_std`.
//!
//! The library talks to any serial peripheral implementing the
//! `embedded-hal` 0.2 non-blocking serial traits, but does not configure it.
//! The S21 line operates at 2400 baud, 8 bits per byte, even parity with 2
//! stop bits (2400 8E2). You should configure your serial peripheral as such.
//! Nothing here blocks or reads a clock: the host passes its monotonic
//! millisecond counter into every call.
//!
//! ## General Usage
//!
//! Drive a unit from the main loop:
//!
//! ```
//! use core::convert::Infallible;
//! use daikin_s21::{Config, Fan, Mode, Session, TenthDegreesC};
//! use embedded_hal::serial;
//!
//! struct Uart;
//!
//! impl serial::Read<u8> for Uart {
//!     type Error = Infallible;
//!     fn read(&mut self) -> nb::Result<u8, Infallible> {
//!         Err(nb::Error::WouldBlock)
//!     }
//! }
//!
//! impl serial::Write<u8> for Uart {
//!     type Error = Infallible;
//!     fn write(&mut self, _: u8) -> nb::Result<(), Infallible> {
//!         Ok(())
//!     }
//!     fn flush(&mut self) -> nb::Result<(), Infallible> {
//!         Ok(())
//!     }
//! }
//!
//! let mut s21 = Session::new(Uart, Config::default());
//!
//! // Ask for cooling at 24 degrees
//! s21.request_climate_change(true, Mode::Cool, TenthDegreesC(240), Fan::Auto);
//!
//! for now_ms in (0..1000).step_by(10) {
//!     s21.tick(now_ms);
//! }
//!
//! // Poll again every few seconds
//! s21.request_refresh();
//!
//! println!("{}", s21.snapshot());
//! ```
//!
//! Encode a frame for writing to the serial line:
//!
//! ```
//! use daikin_s21::protocol::{codes, ClimateCommand, CommandPacket, Encodable, Fan, Frame, Mode, TenthDegreesC};
//!
//! let mut buf = [0u8; daikin_s21::protocol::MAX_FRAME_SIZE];
//!
//! let query = Frame::query(codes::F1);
//! assert_eq!(&[0x02, b'F', b'1', 0x77, 0x03], query.encode(&mut buf).unwrap());
//!
//! let command = ClimateCommand {
//!     power_on: true,
//!     mode: Mode::Cool,
//!     setpoint: TenthDegreesC(250),
//!     fan: Fan::Auto,
//! };
//!
//! assert_eq!(
//!     // STX  --- D1 ---  power mode  setpoint fan   checksum ETX
//!     &[0x02, b'D', b'1', b'1', b'3', b'N', b'A', 0x68, 0x03],
//!     command.frame().encode(&mut buf).unwrap()
//! );
//! ```

pub mod config;
pub mod diagnostics;
pub mod interface;
pub mod protocol;
pub mod query_pool;
pub mod session;
pub mod state;

#[cfg(test)]
mod mock;

pub use config::{Config, Timing};
pub use interface::{CommState, FrameTransport, Outcome};
pub use query_pool::{PoolError, QueryPool};
pub use session::Session;
pub use state::{ClimateSettings, Snapshot};

#[doc(inline)]
pub use protocol::*;
