//! # picopack
//!
//! A compact, self-describing binary codec for dynamically typed values.
//!
//! [`Encoder`] packs a stream of values (ints, doubles, strings, blobs,
//! maps, arrays, datetimes and friends) into an owned byte buffer;
//! [`Decoder`] walks such a buffer and yields [`Value`] tokens that borrow
//! from it. Optional per-encoder [`Features`] dedupe repeated strings into
//! small back-references and compress doubles with short decimal expansions
//! into varint mantissas.
//!
//! A stream is just a concatenation of top-level values with no header,
//! framing or checksum; a [`Value::Separator`] may mark document boundaries.
//!
//! ```
//! use picopack::Decoder;
//! use picopack::Encoder;
//! use picopack::Features;
//! use picopack::Value;
//!
//! let mut enc = Encoder::new(Features::ALL);
//! enc.map(1);
//! enc.str("pi");
//! enc.double(3.14);
//!
//! let mut dec = Decoder::new(enc.as_bytes());
//! assert_eq!(dec.value().unwrap(), Some(Value::Map(1)));
//! match dec.value().unwrap() {
//!     Some(Value::Str(s)) => assert_eq!(s.bytes, b"pi"),
//!     other => panic!("expected a string, got {:?}", other),
//! }
//! assert_eq!(dec.value().unwrap(), Some(Value::Double(3.14)));
//! assert_eq!(dec.value().unwrap(), None);
//! ```

mod dedup;
mod scaled;
mod tag;
mod varint;

pub mod decoder;
pub mod encoder;
pub mod types;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use types::Dedup;
pub use types::Error;
pub use types::Features;
pub use types::Result;
pub use types::Str;
pub use types::Value;
