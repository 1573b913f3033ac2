//! Bounded dedup table used by the encoder.
//!
//! An arena of at most 256 entries doubles as the id space: an entry's arena
//! position is the id written to the wire, so any reader that records
//! literals in the same order reconstructs the same ids. 128 single-byte bin
//! heads index into the arena (0 means empty, `n` means arena slot `n - 1`)
//! and entries chain through `next` with the same 1-based convention.
//! Entries do not own string bytes; they point at offsets in the encoder's
//! output buffer.

/// Strings shorter than this never dedupe.
pub(crate) const MIN_LEN: usize = 2;
/// Strings longer than this never dedupe.
pub(crate) const MAX_LEN: usize = 128;
/// Hard cap on recorded entries, shared with the decoder's string table.
pub(crate) const CAPACITY: usize = 256;

const BIN_COUNT: u32 = 128;

/// Whether a string of this length participates in deduplication at all.
#[inline]
pub(crate) fn dedupable(len: usize) -> bool {
    (MIN_LEN..=MAX_LEN).contains(&len)
}

/// 32-bit fingerprint: length plus the first two and the last byte. Cheap,
/// and collisions are settled by a full byte-compare on every probe hit.
#[inline]
pub(crate) fn fingerprint(s: &[u8]) -> u32 {
    debug_assert!(dedupable(s.len()));
    ((s.len() as u32) << 24)
        | ((s[0] as u32) << 16)
        | ((s[1] as u32) << 8)
        | s[s.len() - 1] as u32
}

#[derive(Clone, Copy)]
struct Entry {
    hash: u32,
    len: u32,
    offset: u32,
    /// 1-based arena index of the next entry in this bin's chain, 0 ends it.
    next: u32,
}

pub(crate) struct DedupTable {
    arena: Vec<Entry>,
    bins: [u8; BIN_COUNT as usize],
}

impl DedupTable {
    pub(crate) fn new() -> Self {
        DedupTable {
            arena: Vec::with_capacity(CAPACITY),
            bins: [0; BIN_COUNT as usize],
        }
    }

    pub(crate) fn clear(&mut self) {
        self.arena.clear();
        self.bins = [0; BIN_COUNT as usize];
    }

    pub(crate) fn is_full(&self) -> bool {
        self.arena.len() >= CAPACITY
    }

    /// Looks up a previously recorded copy of `s`, returning its id. `buf`
    /// is the encoder's output buffer, which recorded offsets point into; a
    /// fingerprint hit counts only after the stored bytes compare equal.
    pub(crate) fn find(&self, buf: &[u8], s: &[u8], hash: u32) -> Option<u32> {
        let mut head = self.bins[(hash % BIN_COUNT) as usize] as u32;
        while head > 0 {
            let entry = self.arena[head as usize - 1];
            if entry.hash == hash && entry.len as usize == s.len() {
                let start = entry.offset as usize;
                if &buf[start..start + s.len()] == s {
                    return Some(head - 1);
                }
            }
            head = entry.next;
        }
        None
    }

    /// Records a freshly written string at the next arena slot and makes it
    /// the head of its bin chain. The final slot cannot be named by a
    /// single-byte head, so it is stored unchained; it keeps the id space
    /// aligned with readers but never produces a back-reference.
    pub(crate) fn insert(&mut self, hash: u32, len: usize, offset: usize) {
        if self.is_full() {
            return;
        }
        let bin = (hash % BIN_COUNT) as usize;
        let slot = self.arena.len() + 1;
        self.arena.push(Entry {
            hash,
            len: len as u32,
            offset: offset as u32,
            next: self.bins[bin] as u32,
        });
        if slot <= u8::MAX as usize {
            self.bins[bin] = slot as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Registers `s` at its position in `buf`, the way the encoder does
    // right after writing the literal bytes.
    fn record(table: &mut DedupTable, buf: &mut Vec<u8>, s: &[u8]) {
        let offset = buf.len();
        buf.extend_from_slice(s);
        table.insert(fingerprint(s), s.len(), offset);
    }

    #[test]
    fn found_after_insert() {
        let mut table = DedupTable::new();
        let mut buf = Vec::new();
        record(&mut table, &mut buf, b"first_name");
        record(&mut table, &mut buf, b"last_name");

        assert_eq!(table.find(&buf, b"first_name", fingerprint(b"first_name")), Some(0));
        assert_eq!(table.find(&buf, b"last_name", fingerprint(b"last_name")), Some(1));
        assert_eq!(table.find(&buf, b"missing", fingerprint(b"missing")), None);
    }

    #[test]
    fn fingerprint_collision_is_rejected_by_compare() {
        // Same length, first two and last bytes; different middle.
        let a = b"abxa";
        let b = b"abya";
        assert_eq!(fingerprint(a), fingerprint(b));

        let mut table = DedupTable::new();
        let mut buf = Vec::new();
        record(&mut table, &mut buf, a);

        assert_eq!(table.find(&buf, b, fingerprint(b)), None);
        record(&mut table, &mut buf, b);
        assert_eq!(table.find(&buf, b, fingerprint(b)), Some(1));
        assert_eq!(table.find(&buf, a, fingerprint(a)), Some(0));
    }

    #[test]
    fn capacity_stops_recording() {
        let mut table = DedupTable::new();
        let mut buf = Vec::new();
        for i in 0..CAPACITY {
            record(&mut table, &mut buf, format!("key-{i:04}").as_bytes());
        }
        assert!(table.is_full());

        record(&mut table, &mut buf, b"straggler");
        assert_eq!(table.find(&buf, b"straggler", fingerprint(b"straggler")), None);

        // Earlier entries are still reachable.
        assert_eq!(table.find(&buf, b"key-0000", fingerprint(b"key-0000")), Some(0));
        assert_eq!(table.find(&buf, b"key-0254", fingerprint(b"key-0254")), Some(254));
    }

    #[test]
    fn clear_forgets_everything() {
        let mut table = DedupTable::new();
        let mut buf = Vec::new();
        record(&mut table, &mut buf, b"gone");
        table.clear();
        assert_eq!(table.find(&buf, b"gone", fingerprint(b"gone")), None);
        assert!(!table.is_full());
    }
}
