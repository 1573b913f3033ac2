//! The packing half of the codec: an append-only writer over a growable
//! owned buffer.

use crate::dedup;
use crate::dedup::DedupTable;
use crate::scaled;
use crate::tag;
use crate::types::Features;
use crate::varint;

/// Serializes a stream of values into an owned byte buffer.
///
/// Every pack operation appends exactly one logical value and returns the
/// number of bytes it wrote. [`map`](Encoder::map) and
/// [`array`](Encoder::array) write only the header; the caller must pack
/// `2 * len` (map) or `len` (array) values afterwards, and nothing enforces
/// this.
pub struct Encoder {
    buf: Vec<u8>,
    features: Features,
    dedup: DedupTable,
}

impl Encoder {
    pub fn new(features: Features) -> Self {
        Self::with_capacity(1024, features)
    }

    pub fn with_capacity(cap: usize, features: Features) -> Self {
        Encoder {
            buf: Vec::with_capacity(cap),
            features,
            dedup: DedupTable::new(),
        }
    }

    /// Rewinds to an empty buffer for reuse. The allocation is kept; the
    /// dedup table is cleared so ids restart from 0.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.dedup.clear();
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    pub fn features(&self) -> Features {
        self.features
    }

    /// Makes room for `needed` more bytes ahead of a write, growing the
    /// capacity to at least double plus the request so writes stay amortized
    /// and the hot paths below can push without further checks.
    #[inline]
    fn ensure(&mut self, needed: usize) {
        let free = self.buf.capacity() - self.buf.len();
        if needed > free {
            self.buf.reserve(needed + self.buf.capacity());
        }
    }

    #[inline]
    fn put_tag(&mut self, tag: u8) -> usize {
        self.ensure(1);
        self.buf.push(tag);
        1
    }

    pub fn null(&mut self) -> usize {
        self.put_tag(tag::NULL)
    }

    pub fn bool(&mut self, v: bool) -> usize {
        self.put_tag(if v { tag::TRUE } else { tag::FALSE })
    }

    pub fn nan(&mut self) -> usize {
        self.put_tag(tag::NAN)
    }

    pub fn infinity(&mut self) -> usize {
        self.put_tag(tag::INF)
    }

    pub fn neg_infinity(&mut self) -> usize {
        self.put_tag(tag::NEG_INF)
    }

    /// Marks a boundary between top-level documents in a stream.
    pub fn separator(&mut self) -> usize {
        self.put_tag(tag::SEPARATOR)
    }

    /// Emits the bare user-extension tag. The payload format is up to the
    /// application profile.
    pub fn ext(&mut self) -> usize {
        self.put_tag(tag::EXT)
    }

    pub fn int(&mut self, value: i64) -> usize {
        self.ensure(1 + varint::MAX_LEN);
        if (0..120).contains(&value) {
            self.buf.push(tag::INT | value as u8);
            1
        } else if value >= 120 {
            self.buf.push(tag::INT_POS_CONT);
            1 + varint::encode(value as u64 - 120, &mut self.buf)
        } else if value > -7 {
            self.buf.push(tag::INT_POS_CONT + (-value) as u8);
            1
        } else {
            self.buf.push(tag::INT_NEG_CONT);
            1 + varint::encode((-(value + 7)) as u64, &mut self.buf)
        }
    }

    /// Packs a double, auto-selecting the representation: NaN and the
    /// infinities get their dedicated tags, finite values ride the scaled
    /// decimal form when the feature is on and the value qualifies, and
    /// everything else falls back to the raw 8-byte form.
    pub fn double(&mut self, value: f64) -> usize {
        if value.is_nan() {
            return self.nan();
        }
        if value.is_infinite() {
            return if value > 0.0 { self.infinity() } else { self.neg_infinity() };
        }
        if self.features.contains(Features::COMPRESS_FLOATS) {
            if let Some((places, scaled)) = scaled::decimal_places(value.abs()) {
                let mantissa = scaled as u64;
                if mantissa < scaled::MANTISSA_LIMIT {
                    self.ensure(1 + varint::MAX_LEN);
                    let base = if value >= 0.0 { tag::SCALED_POS } else { tag::SCALED_NEG };
                    self.buf.push(base | places);
                    return 1 + varint::encode(mantissa, &mut self.buf);
                }
            }
        }
        self.ensure(9);
        self.buf.push(tag::F64);
        self.buf.extend_from_slice(&value.to_bits().to_be_bytes());
        9
    }

    pub fn str(&mut self, s: &str) -> usize {
        self.str_bytes(s.as_bytes())
    }

    /// Packs string bytes without UTF-8 validation. With
    /// [`Features::STRING_DEDUPE`] on, a repeat of an earlier string in the
    /// deduplicatable length range comes out as a small back-reference
    /// instead of the literal bytes.
    pub fn str_bytes(&mut self, s: &[u8]) -> usize {
        let dedupe = self.features.contains(Features::STRING_DEDUPE) && dedup::dedupable(s.len());
        let mut hash = 0;
        if dedupe {
            hash = dedup::fingerprint(s);
            if let Some(id) = self.dedup.find(&self.buf, s, hash) {
                return self.backref(id);
            }
        }

        self.ensure(1 + varint::MAX_LEN + s.len());
        let mut written = 1;
        if s.len() < tag::STR_EMBED_MAX as usize {
            self.buf.push(tag::STR | s.len() as u8);
        } else {
            self.buf.push(tag::STR_LONG);
            written += varint::encode(s.len() as u64 - tag::STR_EMBED_MAX as u64, &mut self.buf);
        }
        let offset = self.buf.len();
        self.buf.extend_from_slice(s);
        written += s.len();

        if dedupe {
            self.dedup.insert(hash, s.len(), offset);
        }
        written
    }

    fn backref(&mut self, id: u32) -> usize {
        self.ensure(1 + varint::MAX_LEN);
        if id < tag::REF_EMBED_MAX as u32 {
            self.buf.push(tag::REF | id as u8);
            1
        } else {
            self.buf.push(tag::REF_LONG);
            1 + varint::encode(id as u64 - tag::REF_EMBED_MAX as u64, &mut self.buf)
        }
    }

    pub fn blob(&mut self, data: &[u8]) -> usize {
        self.ensure(1 + varint::MAX_LEN + data.len());
        self.buf.push(tag::BLOB);
        let written = 1 + varint::encode(data.len() as u64, &mut self.buf);
        self.buf.extend_from_slice(data);
        written + data.len()
    }

    /// Writes a map header announcing `len` key-value pairs. The caller must
    /// pack `2 * len` values next.
    pub fn map(&mut self, len: usize) -> usize {
        self.header(tag::MAP, tag::MAP_EMBED_MAX, len)
    }

    /// Writes an array header announcing `len` elements. The caller must
    /// pack `len` values next.
    pub fn array(&mut self, len: usize) -> usize {
        self.header(tag::ARRAY, tag::ARRAY_EMBED_MAX, len)
    }

    fn header(&mut self, base: u8, embed_max: u8, len: usize) -> usize {
        self.ensure(1 + varint::MAX_LEN);
        if len < embed_max as usize {
            self.buf.push(base | len as u8);
            1
        } else {
            self.buf.push(base | embed_max);
            1 + varint::encode(len as u64 - embed_max as u64, &mut self.buf)
        }
    }

    /// Packs a unix timestamp with a UTC offset. The offset is stored in
    /// 15-minute steps in one signed byte, so it is clamped to a day via
    /// truncation; sub-quarter-hour precision is dropped.
    pub fn datetime(&mut self, unixtime: f64, offset_seconds: i32) -> usize {
        self.ensure(10);
        self.buf.push(tag::DATETIME);
        self.buf.push(((offset_seconds % 86_400) / 900) as i8 as u8);
        self.buf.extend_from_slice(&unixtime.to_bits().to_be_bytes());
        10
    }
}
