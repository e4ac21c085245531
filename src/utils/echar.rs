//! Small, allocation-free pieces of input text for error messages.

use std::fmt::{self, Debug, Display, Formatter};

/// A short run of input bytes, kept inline so error types can stay `Copy`.
///
/// Anything past the first `N` bytes is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EChar<const N: usize = 4> {
    buf: [u8; N],
    len: u8,
}
impl<const N: usize> EChar<N> {
    /// Copy up to `N` bytes from the start of `bytes`.
    pub fn from_slice(bytes: &[u8]) -> Self {
        let len = bytes.len().min(N);
        let mut buf = [0u8; N];
        buf[..len].copy_from_slice(&bytes[..len]);
        Self { buf, len: len as u8 }
    }
    /// A single byte.
    pub fn byte(b: u8) -> Self {
        Self::from_slice(&[b])
    }
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..(self.len as usize)]
    }
}
impl<const N: usize> Display for EChar<N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(bstr::BStr::new(self.as_slice()), f)
    }
}

/// A byte that prints quoted, with control and non-ASCII bytes escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextByte(pub u8);
impl Display for TextByte {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            c @ 32..=126 => write!(f, "'{}'", c as char),
            b'\n' => f.write_str("'\\n'"),
            b'\r' => f.write_str("'\\r'"),
            b'\t' => f.write_str("'\\t'"),
            b => write!(f, "'\\x{b:0>2x}'"),
        }
    }
}

/// Either "byte {n}" or, for `usize::MAX`, "unknown index".
pub struct IdxPrint(pub usize);
impl Display for IdxPrint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0 == usize::MAX {
            f.write_str("unknown index")
        } else {
            write!(f, "byte {}", self.0)
        }
    }
}

/// Prints "EOF" or the quoted byte.
pub struct MaybeByte(pub Option<u8>);
impl Display for MaybeByte {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(b) => Display::fmt(&TextByte(b), f),
            None => f.write_str("EOF"),
        }
    }
}
