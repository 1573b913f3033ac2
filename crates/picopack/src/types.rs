//! Core types shared by the encoder and decoder.

use std::fmt;

/// Picopack decoding errors.
///
/// The decoder stops at the first error; the read position is then
/// unspecified and decoding must not continue on the same buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Buffer ended inside a value's payload.
    UnexpectedEnd,
    /// Byte is not assigned to any value family, or is reserved until its
    /// payload layout is specified.
    UnknownTag(u8),
    /// Back-reference to a string id that has not been recorded yet.
    DanglingRef { id: u64, known: usize },
    /// Integer continuation magnitude does not fit a 64-bit signed integer.
    IntOutOfRange(u64),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnexpectedEnd => write!(f, "buffer ended inside a value"),
            Error::UnknownTag(b) => write!(f, "unknown or reserved tag byte: {:#04x}", b),
            Error::DanglingRef { id, known } => {
                write!(f, "back-reference to string {} but only {} recorded", id, known)
            }
            Error::IntOutOfRange(m) => {
                write!(f, "integer continuation {} does not fit an i64", m)
            }
        }
    }
}

impl std::error::Error for Error {}

/// Specialized `Result` for picopack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Feature bits selected when creating an [`Encoder`](crate::Encoder).
///
/// The bits only steer the encoder; the decoder understands every wire form
/// unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features(u8);

impl Features {
    pub const NONE: Features = Features(0);
    /// Repeated strings are written once and back-referenced afterwards.
    pub const STRING_DEDUPE: Features = Features(0x01);
    /// Finite doubles with short decimal expansions are stored as a scaled
    /// integer mantissa instead of eight raw bytes.
    pub const COMPRESS_FLOATS: Features = Features(0x02);
    pub const ALL: Features = Features(0x03);

    pub const fn contains(self, other: Features) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl std::ops::BitOr for Features {
    type Output = Features;

    fn bitor(self, rhs: Features) -> Features {
        Features(self.0 | rhs.0)
    }
}

/// How a decoded string relates to the decoder's string table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dedup {
    /// Literal that does not participate in deduplication (too short, too
    /// long, or the table was already full).
    Plain,
    /// Literal that was recorded in the table at this index; later
    /// back-references with the same id resolve to it.
    Recorded(u32),
    /// Back-reference to the string recorded at this index.
    Backref(u32),
}

/// A decoded string. The bytes borrow from the input buffer and are not
/// validated as UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Str<'a> {
    pub bytes: &'a [u8],
    pub dedup: Dedup,
}

impl<'a> Str<'a> {
    /// The bytes as a `&str`, when they happen to be valid UTF-8.
    pub fn as_utf8(&self) -> Option<&'a str> {
        std::str::from_utf8(self.bytes).ok()
    }
}

/// One decoded value.
///
/// Container variants carry only the declared length; the map's `2 * len`
/// entries or the array's `len` elements follow as further values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Int(i64),
    Double(f64),
    Str(Str<'a>),
    Blob(&'a [u8]),
    Map(usize),
    Array(usize),
    True,
    False,
    Null,
    Nan,
    Inf,
    NegInf,
    /// Seconds since the epoch plus a UTC offset in seconds.
    Datetime { unixtime: f64, offset: i32 },
    Ext,
    /// Boundary between top-level documents in a concatenated stream.
    Separator,
}
