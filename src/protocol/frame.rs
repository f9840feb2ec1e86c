use core::convert::TryFrom;
use core::fmt;

use nom::bytes::streaming::{tag, take_till};
use nom::IResult;

use super::encoding::{Encodable, EncodingError};
use super::{ENQ, ETX, MAX_COMMAND_SIZE, PAYLOAD_SIZE, STX};

const STX_TAG: &[u8] = &[STX];
const ETX_TAG: &[u8] = &[ETX];

/// A one or two byte command, or the response code answering one.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct Code {
    bytes: [u8; MAX_COMMAND_SIZE],
    len: u8,
}

impl Code {
    pub const fn new(first: u8, second: u8) -> Self {
        Code { bytes: [first, second], len: 2 }
    }

    pub const fn single(byte: u8) -> Self {
        Code { bytes: [byte, 0], len: 1 }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Always false, codes are built from one or two bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_printable(&self) -> bool {
        self.as_bytes().iter().all(u8::is_ascii_graphic)
    }
}

impl TryFrom<&[u8]> for Code {
    type Error = FrameError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        match *bytes {
            [] => Err(FrameError::Empty),
            [byte] => Ok(Code::single(byte)),
            [first, second] => Ok(Code::new(first, second)),
            _ => Err(FrameError::CommandTooLong(bytes.len())),
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &byte in self.as_bytes() {
            if byte.is_ascii_graphic() {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{:02X}", byte)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Code({})", self)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FrameError {
    Empty,
    CommandTooLong(usize),
    NotPrintable(u8),
}

#[derive(Debug, Eq, PartialEq)]
pub enum FrameParsingError {
    InvalidChecksum,
    IncompleteData(Option<usize>),
    Malformed,
}

fn sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

// The checksum may never read as STX, the unit sends ENQ in its place.
fn escape(sum: u8) -> u8 {
    if sum == STX {
        ENQ
    } else {
        sum
    }
}

/// Checksum byte transmitted after `body` (code followed by payload).
pub fn checksum(body: &[u8]) -> u8 {
    escape(sum(body))
}

/// Validates a received checksum byte against the body it trailed.
pub fn checksum_matches(body: &[u8], received: u8) -> bool {
    let calculated = sum(body);
    calculated == received || (calculated == STX && received == ENQ)
}

/// An outgoing frame: a query when it has no payload, a command otherwise.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Frame {
    code: Code,
    payload: Option<[u8; PAYLOAD_SIZE]>,
}

impl Frame {
    pub fn new(command: &[u8], payload: Option<&[u8; PAYLOAD_SIZE]>) -> Result<Self, FrameError> {
        let code = Code::try_from(command)?;
        if let Some(&byte) = command.iter().find(|b| !b.is_ascii_graphic()) {
            return Err(FrameError::NotPrintable(byte));
        }
        Ok(Frame { code, payload: payload.copied() })
    }

    pub fn query(code: Code) -> Self {
        Frame { code, payload: None }
    }

    pub fn command(code: Code, payload: [u8; PAYLOAD_SIZE]) -> Self {
        Frame { code, payload: Some(payload) }
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn payload(&self) -> Option<&[u8; PAYLOAD_SIZE]> {
        self.payload.as_ref()
    }

    pub fn is_command(&self) -> bool {
        self.payload.is_some()
    }

    pub fn checksum(&self) -> u8 {
        let payload_sum = self.payload.as_ref().map_or(0, |payload| sum(payload));
        escape(sum(self.code.as_bytes()).wrapping_add(payload_sum))
    }

    pub fn encoded_len(&self) -> usize {
        let payload_len = if self.is_command() { PAYLOAD_SIZE } else { 0 };
        1 + self.code.len() + payload_len + 2
    }
}

impl Encodable for Frame {
    fn encode<'a>(&self, into: &'a mut [u8]) -> Result<&'a [u8], EncodingError> {
        let len = self.encoded_len();
        if into.len() < len {
            return Err(EncodingError);
        }
        let (out, _) = into.split_at_mut(len);

        let code = self.code.as_bytes();
        out[0] = STX;
        out[1..=code.len()].copy_from_slice(code);
        let mut at = 1 + code.len();
        if let Some(payload) = &self.payload {
            out[at..at + PAYLOAD_SIZE].copy_from_slice(payload);
            at += PAYLOAD_SIZE;
        }
        out[at] = self.checksum();
        out[at + 1] = ETX;
        Ok(out)
    }
}

/// A checksum-validated frame found in a captured byte slice.
#[derive(Debug, Eq, PartialEq)]
pub struct RawFrame<'a> {
    /// Code and payload, checksum excluded.
    pub body: &'a [u8],
    pub checksum: u8,
}

impl<'a> RawFrame<'a> {
    pub fn parse(data: &'a [u8]) -> Result<(Self, &'a [u8]), FrameParsingError> {
        match delimited(data) {
            Ok((remaining, contents)) => {
                let (checksum, body) = match contents.split_last() {
                    Some((checksum, body)) if !body.is_empty() => (*checksum, body),
                    _ => return Err(FrameParsingError::Malformed),
                };
                if checksum_matches(body, checksum) {
                    Ok((RawFrame { body, checksum }, remaining))
                } else {
                    Err(FrameParsingError::InvalidChecksum)
                }
            }

            Err(nom::Err::Incomplete(needed)) => match needed {
                nom::Needed::Size(size) => Err(FrameParsingError::IncompleteData(Some(size.get()))),
                nom::Needed::Unknown => Err(FrameParsingError::IncompleteData(None)),
            },

            Err(_) => Err(FrameParsingError::Malformed),
        }
    }

    /// Splits the body into a response code of `code_len` bytes and its payload.
    pub fn split(&self, code_len: usize) -> Option<(&'a [u8], &'a [u8])> {
        if self.body.len() < code_len {
            None
        } else {
            Some(self.body.split_at(code_len))
        }
    }
}

fn delimited(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, _) = tag(STX_TAG)(input)?;
    let (input, contents) = take_till(|byte| byte == ETX)(input)?;
    let (input, _) = tag(ETX_TAG)(input)?;
    Ok((input, contents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ACK;

    const EMPTY: &[u8] = &[];

    #[test]
    fn checksum_test() {
        assert_eq!(0x77, checksum(b"F1"));
        assert_eq!(0x68, Frame::command(Code::new(b'D', b'1'), *b"13NA").checksum());
    }

    #[test]
    fn checksum_escapes_stx() {
        // 'F' + '0' * 3 + ',' wraps around to 0x02
        let frame = Frame::command(Code::single(b'F'), *b"000,");
        assert_eq!(ENQ, frame.checksum());
        assert_eq!(ENQ, checksum(b"F000,"));

        assert!(checksum_matches(b"F000,", ENQ));
        assert!(checksum_matches(b"F000,", STX));
        assert!(!checksum_matches(b"F1", ENQ));
    }

    #[test]
    fn code_test() {
        assert_eq!(Ok(Code::new(b'R', b'H')), Code::try_from(&b"RH"[..]));
        assert_eq!(Ok(Code::single(b'M')), Code::try_from(&b"M"[..]));
        assert_eq!(Err(FrameError::Empty), Code::try_from(EMPTY));
        assert_eq!(Err(FrameError::CommandTooLong(3)), Code::try_from(&b"FU0"[..]));
        assert_eq!(b"M", Code::single(b'M').as_bytes());
        assert_eq!(1, Code::single(b'M').len());
        assert!(!Code::single(b'M').is_empty());
        assert!(!Code::new(b'F', b'1').is_empty());
    }

    #[test]
    fn new_frame_validates_command() {
        assert_eq!(Err(FrameError::CommandTooLong(4)), Frame::new(b"FU0F", None));
        assert_eq!(Err(FrameError::NotPrintable(0x02)), Frame::new(&[b'F', 0x02], None));
        assert_eq!(Ok(Frame::query(Code::new(b'F', b'1'))), Frame::new(b"F1", None));
    }

    #[test]
    fn encode_query_test() {
        let mut buf = [0u8; 16];
        let frame = Frame::query(Code::new(b'F', b'1'));
        assert_eq!(Ok(&[STX, b'F', b'1', 0x77, ETX][..]), frame.encode(&mut buf));
    }

    #[test]
    fn encode_command_test() {
        let mut buf = [0u8; 9];
        let frame = Frame::command(Code::new(b'D', b'1'), *b"13NA");
        assert_eq!(
            Ok(&[STX, b'D', b'1', b'1', b'3', b'N', b'A', 0x68, ETX][..]),
            frame.encode(&mut buf)
        );
        assert_eq!(Err(EncodingError), frame.encode(&mut buf[..8]));
    }

    #[test]
    fn parse_test() {
        let data = [STX, b'G', b'1', b'1', b'3', b'N', b'A', 0x6b, ETX, 0xff];
        let (frame, remaining) = RawFrame::parse(&data).unwrap();
        assert_eq!(b"G113NA", frame.body);
        assert_eq!(&[0xff][..], remaining);
        assert_eq!(Some((&b"G1"[..], &b"13NA"[..])), frame.split(2));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            Err(FrameParsingError::InvalidChecksum),
            RawFrame::parse(&[STX, b'G', b'1', b'1', 0x00, ETX])
        );
        assert_eq!(
            Err(FrameParsingError::IncompleteData(Some(1))),
            RawFrame::parse(&[STX, b'G', b'1'])
        );
        assert_eq!(Err(FrameParsingError::Malformed), RawFrame::parse(&[ACK, STX]));
        assert_eq!(Err(FrameParsingError::Malformed), RawFrame::parse(&[STX, 0x47, ETX]));
    }

    #[test]
    fn encoded_frames_parse_back() {
        let frames = [
            Frame::query(Code::new(b'R', b'H')),
            Frame::query(Code::single(b'M')),
            Frame::command(Code::new(b'D', b'5'), *b"7?00"),
            Frame::command(Code::single(b'F'), *b"000,"),
        ];
        for frame in frames.iter() {
            let mut buf = [0u8; 16];
            let encoded = frame.encode(&mut buf).unwrap();
            let (raw, remaining) = RawFrame::parse(encoded).unwrap();
            assert_eq!(EMPTY, remaining);
            let (code, payload) = raw.split(frame.code().len()).unwrap();
            assert_eq!(frame.code().as_bytes(), code);
            assert_eq!(frame.payload().map_or(EMPTY, |p| &p[..]), payload);
        }
    }
}
