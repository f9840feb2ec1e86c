use super::types::TenthDegreesC;

#[derive(Debug, PartialEq, Eq)]
pub struct EncodingError;

pub trait Encodable {
    fn encode<'a>(&self, into: &'a mut [u8]) -> Result<&'a [u8], EncodingError>;
}

pub trait OneByteEncodable {
    fn encoded_as_byte(&self) -> u8;
}

/// Decodes the unit's three digit number format.
///
/// Digits arrive least significant first, `<ones><tens><hundreds>`, and an
/// optional fourth byte carries the sign (`'-'` negates, anything else is
/// positive). Returns `None` when fewer than three bytes are given.
pub fn bytes_to_num(bytes: &[u8]) -> Option<i16> {
    let digit = |byte: u8| i16::from(byte) - i16::from(b'0');
    match bytes {
        [ones, tens, hundreds, sign @ ..] => {
            let value = digit(*ones) + digit(*tens) * 10 + digit(*hundreds) * 100;
            if sign.first() == Some(&b'-') {
                Some(-value)
            } else {
                Some(value)
            }
        }
        _ => None,
    }
}

/// Encodes `value` in the format read by [`bytes_to_num`], sign included.
///
/// Magnitudes above 999 cannot be represented and are clamped.
pub fn num_to_bytes(value: i16) -> [u8; 4] {
    let magnitude = value.unsigned_abs().min(999);
    let digit = |place: u16| b'0' + (magnitude / place % 10) as u8;
    let sign = if value < 0 { b'-' } else { b'+' };
    [digit(1), digit(10), digit(100), sign]
}

/// Temperature sensors report tenths of a degree in the signed four byte form.
pub fn temp_bytes_to_c10(bytes: &[u8]) -> Option<TenthDegreesC> {
    bytes.get(..4).and_then(bytes_to_num).map(TenthDegreesC)
}
