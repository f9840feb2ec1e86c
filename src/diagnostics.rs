//! Helpers for reporting raw protocol traffic.
//!
//! Nothing here influences decoding, it only decides what is worth logging
//! and how bytes are rendered.

use core::fmt;

use heapless::{FnvIndexMap, Vec};

use crate::protocol::{Code, MAX_BODY_SIZE};

/// Payload bytes of a single response, as remembered by [`DiffCache`].
pub type Payload = Vec<u8, MAX_BODY_SIZE>;

/// Renders bytes as colon separated hex, `02:47:31`.
pub struct Hex<'a>(pub &'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// Renders bytes as text, escaping control and non-ASCII bytes C style.
pub struct Escaped<'a>(pub &'a [u8]);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &byte in self.0 {
            match byte {
                7 => f.write_str("\\a")?,
                8 => f.write_str("\\b")?,
                9 => f.write_str("\\t")?,
                10 => f.write_str("\\n")?,
                11 => f.write_str("\\v")?,
                12 => f.write_str("\\f")?,
                13 => f.write_str("\\r")?,
                27 => f.write_str("\\e")?,
                b'"' => f.write_str("\\\"")?,
                b'\'' => f.write_str("\\'")?,
                b'\\' => f.write_str("\\\\")?,
                32..=126 => write!(f, "{}", byte as char)?,
                _ => write!(f, "\\x{:02X}", byte)?,
            }
        }
        Ok(())
    }
}

/// A payload that differs from the one last seen under the same code.
#[derive(Debug, Eq, PartialEq)]
pub struct Change {
    pub previous: Payload,
    pub current: Payload,
}

/// Last seen payload per response code.
pub struct DiffCache<const N: usize> {
    values: FnvIndexMap<Code, Payload, N>,
}

impl<const N: usize> DiffCache<N> {
    pub fn new() -> Self {
        DiffCache { values: FnvIndexMap::new() }
    }

    /// Records `payload` for `code`, returning what changed since last time.
    ///
    /// A code that was never seen compares against an empty payload. Codes
    /// beyond the cache capacity are not tracked.
    pub fn observe(&mut self, code: Code, payload: &[u8]) -> Option<Change> {
        let current = Payload::from_slice(payload).ok()?;
        let previous = self.values.get(&code).cloned().unwrap_or_default();
        if previous == current {
            return None;
        }
        self.values.insert(code, current.clone()).ok()?;
        Some(Change { previous, current })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<const N: usize> Default for DiffCache<N> {
    fn default() -> Self {
        Self::new()
    }
}
