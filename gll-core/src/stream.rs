//! Canonical input cursors.
//!
//! A `Stream` is a position in an input buffer. Streams are interned:
//! for a given buffer, each offset maps to exactly one `StreamId`, so two
//! cursors at the same position compare equal by ID. The scheduler keys
//! its work items and memo tables on that identity.
//!
//! Buffers are interned by content, so feeding the same input to a later
//! `parse()` call reuses the streams (and therefore the memoized result
//! identities) from the earlier one.
//!
//! Tables are append-only. IDs are never invalidated.

use rustc_hash::FxHashMap;

/// Index into the buffer arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(u32);

impl BufferId {
    fn new(index: usize) -> Self {
        BufferId(index as u32)
    }

    /// Arena index of this buffer.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into the stream arena. The canonical identity of an input position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(u32);

impl StreamId {
    fn new(index: usize) -> Self {
        StreamId(index as u32)
    }

    /// Arena index of this stream.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Internal stream storage: a buffer and a byte offset into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StreamData {
    buffer: BufferId,
    offset: u32,
}

/// Interning table for buffers and streams.
///
/// `buffer` and `stream` are lookup-or-insert: repeated calls with equal
/// arguments return the same ID.
#[derive(Debug, Default)]
pub struct StreamTable {
    buffers: Vec<Box<str>>,
    buffer_ids: FxHashMap<Box<str>, BufferId>,
    streams: Vec<StreamData>,
    stream_ids: FxHashMap<(BufferId, u32), StreamId>,
}

impl StreamTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern an input buffer by content.
    pub fn buffer(&mut self, text: &str) -> BufferId {
        if let Some(&id) = self.buffer_ids.get(text) {
            return id;
        }
        let id = BufferId::new(self.buffers.len());
        let owned: Box<str> = text.into();
        self.buffers.push(owned.clone());
        self.buffer_ids.insert(owned, id);
        id
    }

    /// Canonical stream for `(buffer, offset)`. Offsets are byte offsets
    /// and must land on character boundaries of the buffer text.
    pub fn stream(&mut self, buffer: BufferId, offset: u32) -> StreamId {
        if let Some(&id) = self.stream_ids.get(&(buffer, offset)) {
            return id;
        }
        let id = StreamId::new(self.streams.len());
        self.streams.push(StreamData { buffer, offset });
        self.stream_ids.insert((buffer, offset), id);
        id
    }

    /// Full text of an interned buffer.
    #[inline]
    pub fn buffer_text(&self, buffer: BufferId) -> &str {
        &self.buffers[buffer.index()]
    }

    /// The buffer a stream points into.
    #[inline]
    pub fn buffer_of(&self, stream: StreamId) -> BufferId {
        self.streams[stream.index()].buffer
    }

    /// Byte offset of a stream within its buffer.
    #[inline]
    pub fn offset(&self, stream: StreamId) -> usize {
        self.streams[stream.index()].offset as usize
    }

    /// Everything from the stream's position to the end of the buffer.
    pub fn rest(&self, stream: StreamId) -> &str {
        let StreamData { buffer, offset } = self.streams[stream.index()];
        &self.buffers[buffer.index()][offset as usize..]
    }

    /// Prefix of at most `n` bytes starting at the stream's position,
    /// shorter if fewer remain. Rounded down to a character boundary.
    pub fn take(&self, stream: StreamId, n: usize) -> &str {
        let rest = self.rest(stream);
        if n >= rest.len() {
            return rest;
        }
        let mut end = n;
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        &rest[..end]
    }

    /// Canonical stream `n` bytes further into the buffer, clamped to the
    /// buffer's end.
    pub fn advance(&mut self, stream: StreamId, n: usize) -> StreamId {
        let StreamData { buffer, offset } = self.streams[stream.index()];
        let len = self.buffers[buffer.index()].len() as u32;
        self.stream(buffer, (offset + n as u32).min(len))
    }

    /// True if the stream is at the end of its buffer.
    #[inline]
    pub fn is_at_end(&self, stream: StreamId) -> bool {
        self.rest(stream).is_empty()
    }

    /// Number of interned streams.
    #[inline]
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// True if no streams have been interned.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_identity() {
        let mut table = StreamTable::new();
        let buf = table.buffer("birdistheword");

        let a = table.stream(buf, 4);
        let b = table.stream(buf, 4);
        assert_eq!(a, b);

        let c = table.stream(buf, 5);
        assert_ne!(a, c);
    }

    #[test]
    fn test_buffer_identity() {
        let mut table = StreamTable::new();
        let a = table.buffer("bird");
        let b = table.buffer("bird");
        let c = table.buffer("word");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_take_and_rest() {
        let mut table = StreamTable::new();
        let buf = table.buffer("birdistheword");
        let s = table.stream(buf, 0);

        assert_eq!(table.take(s, 4), "bird");
        assert_eq!(table.take(s, 100), "birdistheword");
        assert_eq!(table.rest(s), "birdistheword");

        let mid = table.stream(buf, 4);
        assert_eq!(table.take(mid, 9), "istheword");
        assert_eq!(table.rest(mid), "istheword");
    }

    #[test]
    fn test_advance_is_canonical() {
        let mut table = StreamTable::new();
        let buf = table.buffer("birdistheword");
        let s = table.stream(buf, 0);

        let advanced = table.advance(s, 4);
        let direct = table.stream(buf, 4);
        assert_eq!(advanced, direct);

        // Advancing past the end clamps.
        let end = table.advance(s, 100);
        assert!(table.is_at_end(end));
        assert_eq!(end, table.advance(s, 13));
    }

    #[test]
    fn test_take_respects_char_boundaries() {
        let mut table = StreamTable::new();
        let buf = table.buffer("é-tail");
        let s = table.stream(buf, 0);

        // "é" is two bytes; a one-byte take rounds down to empty.
        assert_eq!(table.take(s, 1), "");
        assert_eq!(table.take(s, 2), "é");
    }

    #[test]
    fn test_streams_shared_across_buffers_reused() {
        let mut table = StreamTable::new();
        let buf1 = table.buffer("same input");
        let s1 = table.stream(buf1, 5);
        let buf2 = table.buffer("same input");
        let s2 = table.stream(buf2, 5);
        assert_eq!(s1, s2);
    }
}
