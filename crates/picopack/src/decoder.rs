//! The unpacking half of the codec: a forward-only reader over a borrowed
//! buffer.

use crate::dedup;
use crate::scaled;
use crate::tag;
use crate::types::Dedup;
use crate::types::Error;
use crate::types::Result;
use crate::types::Str;
use crate::types::Value;
use crate::varint;

/// Where a previously decoded literal string lives in the input buffer.
/// Resolved to a borrowed slice only when a back-reference names it.
#[derive(Clone, Copy)]
struct StrRecord {
    offset: usize,
    len: usize,
}

/// Decodes a buffer produced by [`Encoder`](crate::Encoder), one value per
/// call. `Str` and `Blob` payloads borrow from the buffer; they stay valid
/// for as long as the buffer does and no longer.
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
    strings: Vec<StrRecord>,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Decoder {
            buf,
            pos: 0,
            strings: Vec::with_capacity(8),
        }
    }

    /// Points the decoder at a new buffer, clearing all per-buffer state.
    /// The string table's allocation is kept for reuse.
    pub fn set_buffer(&mut self, buf: &'a [u8]) {
        self.buf = buf;
        self.pos = 0;
        self.strings.clear();
    }

    /// Rewinds to the start of the current buffer.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.strings.clear();
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Decodes the next value; `Ok(None)` at end of buffer.
    ///
    /// Container values report their declared length only; the contents
    /// follow as further calls. After an `Err` the read position is
    /// unspecified and decoding must not continue.
    pub fn value(&mut self) -> Result<Option<Value<'a>>> {
        if self.pos >= self.buf.len() {
            return Ok(None);
        }
        let tag = self.buf[self.pos];
        self.pos += 1;

        let value = match tag {
            _ if tag & tag::INT != 0 => self.int(tag)?,
            _ if tag & tag::STR != 0 => self.str(tag)?,
            tag::NULL => Value::Null,
            tag::NAN => Value::Nan,
            tag::INF => Value::Inf,
            tag::NEG_INF => Value::NegInf,
            _ if tag & tag::DOUBLE != 0 => self.double(tag)?,
            _ if tag & tag::MAP != 0 => Value::Map(self.header_len(tag, tag::MAP_EMBED_MAX)?),
            _ if tag & tag::ARRAY != 0 => Value::Array(self.header_len(tag, tag::ARRAY_EMBED_MAX)?),
            tag::BLOB => self.blob()?,
            tag::DATETIME => self.datetime()?,
            tag::SEPARATOR => Value::Separator,
            tag::EXT => Value::Ext,
            tag::TRUE => Value::True,
            tag::FALSE => Value::False,
            _ => return Err(Error::UnknownTag(tag)),
        };
        Ok(Some(value))
    }

    /// Consumes one logical value including any container body. Returns
    /// `Ok(false)` at end of buffer. The string table advances exactly as a
    /// [`value`](Decoder::value) walk would, so back-references after the
    /// skipped region still resolve.
    pub fn skip_value(&mut self) -> Result<bool> {
        let children = match self.value()? {
            None => return Ok(false),
            Some(Value::Map(len)) => len.checked_mul(2).ok_or(Error::UnexpectedEnd)?,
            Some(Value::Array(len)) => len,
            Some(_) => 0,
        };
        for _ in 0..children {
            if !self.skip_value()? {
                return Err(Error::UnexpectedEnd);
            }
        }
        Ok(true)
    }

    fn varint(&mut self) -> Result<u64> {
        let (value, used) = varint::decode(self.buf, self.pos)?;
        self.pos += used;
        Ok(value)
    }

    fn take(&mut self, len: u64) -> Result<&'a [u8]> {
        if len > (self.buf.len() - self.pos) as u64 {
            return Err(Error::UnexpectedEnd);
        }
        let end = self.pos + len as usize;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn int(&mut self, tag: u8) -> Result<Value<'a>> {
        let value = if tag < tag::INT_POS_CONT {
            (tag - tag::INT) as i64
        } else if tag == tag::INT_POS_CONT {
            let magnitude = self.varint()?;
            if magnitude > i64::MAX as u64 - 120 {
                return Err(Error::IntOutOfRange(magnitude));
            }
            magnitude as i64 + 120
        } else if tag < tag::INT_NEG_CONT {
            -((tag - tag::INT_POS_CONT) as i64)
        } else {
            let magnitude = self.varint()?.checked_add(7).ok_or(Error::IntOutOfRange(u64::MAX))?;
            if magnitude > 1u64 << 63 {
                return Err(Error::IntOutOfRange(magnitude));
            }
            (magnitude as i64).wrapping_neg()
        };
        Ok(Value::Int(value))
    }

    fn str(&mut self, tag: u8) -> Result<Value<'a>> {
        if tag < tag::REF {
            let len = if tag == tag::STR_LONG {
                self.varint()?
                    .checked_add(tag::STR_EMBED_MAX as u64)
                    .ok_or(Error::UnexpectedEnd)?
            } else {
                (tag & tag::STR_EMBED_MAX) as u64
            };
            let bytes = self.take(len)?;
            let len = bytes.len();

            // Mirror the encoder's registration rules so ids line up.
            let dedup = if dedup::dedupable(len) && self.strings.len() < dedup::CAPACITY {
                self.strings.push(StrRecord { offset: self.pos - len, len });
                Dedup::Recorded(self.strings.len() as u32 - 1)
            } else {
                Dedup::Plain
            };
            Ok(Value::Str(Str { bytes, dedup }))
        } else {
            let id = if tag == tag::REF_LONG {
                self.varint()?
                    .checked_add(tag::REF_EMBED_MAX as u64)
                    .ok_or(Error::DanglingRef { id: u64::MAX, known: self.strings.len() })?
            } else {
                (tag & tag::REF_EMBED_MAX) as u64
            };
            if id >= self.strings.len() as u64 {
                return Err(Error::DanglingRef { id, known: self.strings.len() });
            }
            let record = self.strings[id as usize];
            Ok(Value::Str(Str {
                bytes: &self.buf[record.offset..record.offset + record.len],
                dedup: Dedup::Backref(id as u32),
            }))
        }
    }

    fn double(&mut self, tag: u8) -> Result<Value<'a>> {
        if tag == tag::F64 {
            let bytes = self.take(8)?;
            let bits = u64::from_be_bytes(bytes.try_into().unwrap());
            return Ok(Value::Double(f64::from_bits(bits)));
        }
        if tag == tag::F32 || tag == tag::F16 {
            // Defined but without a payload layout yet.
            return Err(Error::UnknownTag(tag));
        }
        let places = (tag & 0x0F) as usize;
        let mantissa = self.varint()?;
        let negative = tag & tag::SCALED_SIGN != 0;
        Ok(Value::Double(scaled::from_parts(places, mantissa, negative)))
    }

    fn header_len(&mut self, tag: u8, embed_max: u8) -> Result<usize> {
        if tag & embed_max == embed_max {
            let len = self
                .varint()?
                .checked_add(embed_max as u64)
                .ok_or(Error::UnexpectedEnd)?;
            usize::try_from(len).map_err(|_| Error::UnexpectedEnd)
        } else {
            Ok((tag & embed_max) as usize)
        }
    }

    fn blob(&mut self) -> Result<Value<'a>> {
        let len = self.varint()?;
        Ok(Value::Blob(self.take(len)?))
    }

    fn datetime(&mut self) -> Result<Value<'a>> {
        let bytes = self.take(9)?;
        let offset = (bytes[0] as i8) as i32 * 900;
        let bits = u64::from_be_bytes(bytes[1..9].try_into().unwrap());
        Ok(Value::Datetime { unixtime: f64::from_bits(bits), offset })
    }
}
