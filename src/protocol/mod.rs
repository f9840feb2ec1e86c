mod frame;
mod frame_data;

pub mod codes;
pub mod encoding;
pub mod packets;
pub mod types;

pub use encoding::{Encodable, EncodingError};
pub use frame::{checksum, checksum_matches, Code, Frame, FrameError, FrameParsingError, RawFrame};
pub use frame_data::{decoder_for, DecodeError, Decoder, DECODERS};
pub use packets::{ClimateCommand, CommandPacket, SwingCommand};
pub use types::{Fan, Mode, TenthDegreesC};

pub const STX: u8 = 0x02;
pub const ETX: u8 = 0x03;
pub const ENQ: u8 = 0x05;
pub const ACK: u8 = 0x06;
pub const NAK: u8 = 0x15;

/// Longest command (or response code) the unit understands.
pub const MAX_COMMAND_SIZE: usize = 2;

/// Every command frame carries exactly this many payload bytes.
pub const PAYLOAD_SIZE: usize = 4;

/// Bytes between `STX` and `ETX`: code, payload and checksum.
pub const MAX_BODY_SIZE: usize = MAX_COMMAND_SIZE + PAYLOAD_SIZE + 1;

/// A complete frame including `STX` and `ETX`.
pub const MAX_FRAME_SIZE: usize = MAX_BODY_SIZE + 2;
