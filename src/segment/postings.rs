//! Delta + varint posting codec and the serialized posting-list format
//!
//! A posting list persists as one contiguous, 4-byte-aligned record:
//!
//! ```text
//! [ total_bytes | posting_data_bytes | skip_count | post_count
//!   | SkipEntry[skip_count] | varint-delta encoded posts... | padding ]
//! ```
//!
//! Locations are strictly increasing, so every post stores the delta from
//! its predecessor as an unsigned varint (low 7 bits per byte, high bit set
//! on continuation, low-order group first). A `SkipEntry` pairs a byte
//! offset into the posting data with the running location *before* the post
//! at that offset, so decoding forward from a skip entry can never overshoot
//! a match.

use super::types::{DocumentPost, Location, WordFlags, WordPost};
use crate::error::{Result, ShardError};

/// Serialized header: total_bytes, posting_data_bytes, skip_count, post_count
const LIST_HEADER_BYTES: usize = 16;
/// Serialized skip entry: offset + location
pub const SKIP_ENTRY_BYTES: usize = 8;

const POSTS_PER_SKIP: u32 = 32;
const MAX_SKIP_ENTRIES: u32 = 256;

/// Encode an unsigned 32-bit delta as a varint
pub fn encode_delta(out: &mut Vec<u8>, mut delta: u32) {
    while delta >= 0x80 {
        out.push((delta & 0x7F) as u8 | 0x80);
        delta >>= 7;
    }
    out.push(delta as u8);
}

/// Decode a varint delta, returning the value and bytes consumed.
///
/// Returns `None` on a truncated or overlong encoding.
pub fn decode_delta(buf: &[u8]) -> Option<(u32, usize)> {
    let mut value: u32 = 0;
    let mut shift = 0;
    let mut used = 0;
    loop {
        let byte = *buf.get(used)?;
        value |= ((byte & 0x7F) as u32) << shift;
        used += 1;
        if byte & 0x80 == 0 {
            return Some((value, used));
        }
        shift += 7;
        if shift > 28 {
            return None;
        }
    }
}

/// Encode one word post as `varint(location - prev_location)` + flags byte
pub fn encode_word_post(out: &mut Vec<u8>, prev_location: Location, post: &WordPost) {
    encode_delta(out, post.location - prev_location);
    out.push(post.flags.0);
}

/// Decode one word post; the inverse of [`encode_word_post`]
pub fn decode_word_post(buf: &[u8], prev_location: Location) -> Option<(WordPost, usize)> {
    let (delta, used) = decode_delta(buf)?;
    let flags = *buf.get(used)?;
    Some((
        WordPost::new(prev_location + delta, WordFlags(flags)),
        used + 1,
    ))
}

/// Encode one document post as
/// `varint(start - prev_end)` + `varint(end - start)` + `varint(doc_id)`
pub fn encode_doc_post(out: &mut Vec<u8>, prev_end: Location, post: &DocumentPost) {
    encode_delta(out, post.start - prev_end);
    encode_delta(out, post.end - post.start);
    encode_delta(out, post.doc_id);
}

/// Decode one document post; the inverse of [`encode_doc_post`]
pub fn decode_doc_post(buf: &[u8], prev_end: Location) -> Option<(DocumentPost, usize)> {
    let (start_delta, a) = decode_delta(buf)?;
    let (length, b) = decode_delta(&buf[a..])?;
    let (doc_id, c) = decode_delta(&buf[a + b..])?;
    let start = prev_end + start_delta;
    Some((DocumentPost::new(start, start + length, doc_id), a + b + c))
}

/// Number of skip entries for a list of `post_count` posts
pub fn compute_skip_count(post_count: u32) -> u32 {
    (post_count / POSTS_PER_SKIP).max(1).min(MAX_SKIP_ENTRIES)
}

/// Bucket a location into `skip_count` equal slices of `[0, max_location]`
fn bucket_index(location: Location, max_location: Location, skip_count: u32) -> u32 {
    if max_location == 0 {
        return 0;
    }
    if location > max_location {
        return skip_count - 1;
    }
    ((location as u64 * skip_count as u64) / (max_location as u64 + 1)) as u32
}

fn round_up4(n: usize) -> usize {
    (n + 3) & !3
}

fn read_u32_ne(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset + 4)?;
    Some(u32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// Which post kind a list stores; decides how skip buckets are keyed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PostKind {
    Word,
    Doc,
}

/// Accumulates delta-encoded posts and serializes them with a skip table
#[derive(Clone, Debug, Default)]
pub struct PostingListBuilder {
    raw: Vec<u8>,
    post_count: u32,
    /// Last word location, or last document end
    prev_location: Location,
}

impl PostingListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post_count(&self) -> u32 {
        self.post_count
    }

    pub fn is_empty(&self) -> bool {
        self.post_count == 0
    }

    /// Append a word post; locations must be strictly increasing
    pub fn push_word(&mut self, post: &WordPost) {
        debug_assert!(post.location > self.prev_location || self.post_count == 0);
        encode_word_post(&mut self.raw, self.prev_location, post);
        self.prev_location = post.location;
        self.post_count += 1;
    }

    /// Append a document post; starts must be strictly increasing
    pub fn push_doc(&mut self, post: &DocumentPost) {
        debug_assert!(post.start > self.prev_location || self.post_count == 0);
        encode_doc_post(&mut self.raw, self.prev_location, post);
        self.prev_location = post.end;
        self.post_count += 1;
    }

    /// Serialize a word posting list (skip table keyed by post location)
    pub fn serialize_words(&self, out: &mut Vec<u8>) {
        self.serialize(out, PostKind::Word)
    }

    /// Serialize the document posting list (skip table keyed by doc end)
    pub fn serialize_docs(&self, out: &mut Vec<u8>) {
        self.serialize(out, PostKind::Doc)
    }

    fn serialize(&self, out: &mut Vec<u8>, kind: PostKind) {
        let skip_count = compute_skip_count(self.post_count);
        let entries = self.build_skip_table(skip_count, kind);

        let unpadded = LIST_HEADER_BYTES + entries.len() * SKIP_ENTRY_BYTES + self.raw.len();
        let total = round_up4(unpadded);

        out.extend_from_slice(&(total as u32).to_ne_bytes());
        out.extend_from_slice(&(self.raw.len() as u32).to_ne_bytes());
        out.extend_from_slice(&skip_count.to_ne_bytes());
        out.extend_from_slice(&self.post_count.to_ne_bytes());
        for entry in &entries {
            out.extend_from_slice(&entry.offset.to_ne_bytes());
            out.extend_from_slice(&entry.location.to_ne_bytes());
        }
        out.extend_from_slice(&self.raw);
        out.resize(out.len() + (total - unpadded), 0);
    }

    /// One-pass skip-table build.
    ///
    /// Entry `b` records the byte offset and running location just before
    /// the first post whose bucket is `>= b`; entries past the final post
    /// hold the final offset and location.
    fn build_skip_table(&self, skip_count: u32, kind: PostKind) -> Vec<SkipEntry> {
        let max_location = self.prev_location;
        let mut entries = vec![SkipEntry::default(); skip_count as usize];

        let mut offset = 0usize;
        let mut running: Location = 0;
        let mut last_bucket = 0u32;
        while offset < self.raw.len() {
            let pre_offset = offset as u32;
            let pre_location = running;
            let (bucket_key, next_running, used) = match kind {
                PostKind::Word => match decode_word_post(&self.raw[offset..], running) {
                    Some((post, used)) => (post.location, post.location, used),
                    None => break,
                },
                PostKind::Doc => match decode_doc_post(&self.raw[offset..], running) {
                    Some((post, used)) => (post.end, post.end, used),
                    None => break,
                },
            };
            let bucket = bucket_index(bucket_key, max_location, skip_count);
            if bucket > last_bucket {
                for b in last_bucket + 1..=bucket {
                    entries[b as usize] = SkipEntry {
                        offset: pre_offset,
                        location: pre_location,
                    };
                }
                last_bucket = bucket;
            }
            running = next_running;
            offset += used;
        }
        for b in last_bucket + 1..skip_count {
            entries[b as usize] = SkipEntry {
                offset: offset as u32,
                location: running,
            };
        }
        entries
    }
}

/// Skip table entry: byte offset into the posting data, and the running
/// location immediately before the post at that offset
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SkipEntry {
    pub offset: u32,
    pub location: Location,
}

/// Zero-copy view of one serialized posting list
#[derive(Clone, Copy, Debug)]
pub struct PostingListRef<'a> {
    bytes: &'a [u8],
}

impl<'a> PostingListRef<'a> {
    /// Parse and bounds-check a posting list at the start of `bytes`
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let total = read_u32_ne(bytes, 0)
            .ok_or_else(|| ShardError::CorruptSegment("posting list header truncated".into()))?
            as usize;
        if total < LIST_HEADER_BYTES || total > bytes.len() {
            return Err(ShardError::CorruptSegment(format!(
                "posting list claims {} bytes, {} available",
                total,
                bytes.len()
            )));
        }
        let list = Self {
            bytes: &bytes[..total],
        };
        let needed =
            LIST_HEADER_BYTES + list.skip_count() as usize * SKIP_ENTRY_BYTES + list.data_len();
        if needed > total {
            return Err(ShardError::CorruptSegment(
                "posting data longer than declared".into(),
            ));
        }
        Ok(list)
    }

    pub fn total_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn data_len(&self) -> usize {
        read_u32_ne(self.bytes, 4).unwrap_or(0) as usize
    }

    pub fn skip_count(&self) -> u32 {
        read_u32_ne(self.bytes, 8).unwrap_or(0)
    }

    pub fn post_count(&self) -> u32 {
        read_u32_ne(self.bytes, 12).unwrap_or(0)
    }

    fn skip_entry(&self, index: u32) -> SkipEntry {
        let base = LIST_HEADER_BYTES + index as usize * SKIP_ENTRY_BYTES;
        SkipEntry {
            offset: read_u32_ne(self.bytes, base).unwrap_or(0),
            location: read_u32_ne(self.bytes, base + 4).unwrap_or(0),
        }
    }

    fn posting_data(&self) -> &'a [u8] {
        let start = LIST_HEADER_BYTES + self.skip_count() as usize * SKIP_ENTRY_BYTES;
        &self.bytes[start..start + self.data_len()]
    }

    /// Best pre-`target` skip entry, or `None` when a linear scan from the
    /// cursor's position is already at least as good
    fn best_skip_entry(&self, target: Location, current: Location) -> Option<SkipEntry> {
        let skip_count = self.skip_count();
        if skip_count == 0 || target <= current {
            return None;
        }
        let max_location = self.skip_entry(skip_count - 1).location;
        let bucket = bucket_index(target, max_location, skip_count);
        let entry = self.skip_entry(bucket);
        if entry.location > current && entry.location < target {
            Some(entry)
        } else {
            None
        }
    }

    pub fn word_cursor(self) -> WordCursor<'a> {
        WordCursor {
            list: self,
            offset: 0,
            prev_location: 0,
            current: None,
        }
    }

    pub fn doc_cursor(self) -> DocCursor<'a> {
        DocCursor {
            list: self,
            offset: 0,
            prev_end: 0,
            current: None,
        }
    }
}

/// Sequential decoder over a word posting list with skip-accelerated seek
#[derive(Clone, Debug)]
pub struct WordCursor<'a> {
    list: PostingListRef<'a>,
    offset: usize,
    prev_location: Location,
    current: Option<WordPost>,
}

impl<'a> WordCursor<'a> {
    pub fn current(&self) -> Option<WordPost> {
        self.current
    }

    pub fn post_count(&self) -> u32 {
        self.list.post_count()
    }

    /// Decode and move to the next post
    pub fn next(&mut self) -> Option<WordPost> {
        let data = self.list.posting_data();
        if self.offset >= data.len() {
            self.current = None;
            return None;
        }
        match decode_word_post(&data[self.offset..], self.prev_location) {
            Some((post, used)) => {
                self.offset += used;
                self.prev_location = post.location;
                self.current = Some(post);
                Some(post)
            }
            None => {
                self.current = None;
                None
            }
        }
    }

    /// First post with `location >= target`; idempotent when already there
    pub fn seek(&mut self, target: Location) -> Option<WordPost> {
        if let Some(cur) = self.current {
            if cur.location >= target {
                return self.current;
            }
        }
        if self.prev_location >= target {
            self.offset = 0;
            self.prev_location = 0;
            self.current = None;
        }
        if let Some(entry) = self.list.best_skip_entry(target, self.prev_location) {
            self.offset = entry.offset as usize;
            self.prev_location = entry.location;
        }
        while let Some(post) = self.next() {
            if post.location >= target {
                return Some(post);
            }
        }
        None
    }
}

/// Sequential decoder over the document posting list
#[derive(Clone, Debug)]
pub struct DocCursor<'a> {
    list: PostingListRef<'a>,
    offset: usize,
    prev_end: Location,
    current: Option<DocumentPost>,
}

impl<'a> DocCursor<'a> {
    pub fn current(&self) -> Option<DocumentPost> {
        self.current
    }

    pub fn post_count(&self) -> u32 {
        self.list.post_count()
    }

    pub fn next(&mut self) -> Option<DocumentPost> {
        let data = self.list.posting_data();
        if self.offset >= data.len() {
            self.current = None;
            return None;
        }
        match decode_doc_post(&data[self.offset..], self.prev_end) {
            Some((post, used)) => {
                self.offset += used;
                self.prev_end = post.end;
                self.current = Some(post);
                Some(post)
            }
            None => {
                self.current = None;
                None
            }
        }
    }

    /// First document whose `end >= target`; idempotent when already there
    pub fn seek(&mut self, target: Location) -> Option<DocumentPost> {
        if let Some(cur) = self.current {
            if cur.end >= target {
                return self.current;
            }
        }
        if self.prev_end >= target {
            self.offset = 0;
            self.prev_end = 0;
            self.current = None;
        }
        if let Some(entry) = self.list.best_skip_entry(target, self.prev_end) {
            self.offset = entry.offset as usize;
            self.prev_end = entry.location;
        }
        while let Some(post) = self.next() {
            if post.end >= target {
                return Some(post);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_list(locations: &[(Location, u8)]) -> Vec<u8> {
        let mut builder = PostingListBuilder::new();
        for &(loc, flags) in locations {
            builder.push_word(&WordPost::new(loc, WordFlags(flags)));
        }
        let mut out = Vec::new();
        builder.serialize_words(&mut out);
        out
    }

    #[test]
    fn test_varint_round_trip() {
        for value in [0u32, 1, 127, 128, 16_383, 16_384, 1_000_000, u32::MAX] {
            let mut buf = Vec::new();
            encode_delta(&mut buf, value);
            let (decoded, used) = decode_delta(&buf).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(used, buf.len());
        }
    }

    #[test]
    fn test_varint_truncated() {
        let mut buf = Vec::new();
        encode_delta(&mut buf, 1_000_000);
        assert!(decode_delta(&buf[..buf.len() - 1]).is_none());
        assert!(decode_delta(&[]).is_none());
    }

    #[test]
    fn test_varint_overlong() {
        // Six continuation bytes exceed a 32-bit value
        assert!(decode_delta(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01]).is_none());
    }

    #[test]
    fn test_word_post_round_trip() {
        let posts = [(3u32, 0x01u8), (4, 0x00), (100, 0x07), (100_000, 0x02)];
        let mut raw = Vec::new();
        let mut prev = 0;
        for &(loc, flags) in &posts {
            encode_word_post(&mut raw, prev, &WordPost::new(loc, WordFlags(flags)));
            prev = loc;
        }
        let mut offset = 0;
        let mut prev = 0;
        for &(loc, flags) in &posts {
            let (post, used) = decode_word_post(&raw[offset..], prev).unwrap();
            assert_eq!(post.location, loc);
            assert_eq!(post.flags.0, flags);
            offset += used;
            prev = post.location;
        }
        assert_eq!(offset, raw.len());
    }

    #[test]
    fn test_doc_post_round_trip() {
        let posts = [
            DocumentPost::new(1, 10, 0),
            DocumentPost::new(11, 20, 1),
            DocumentPost::new(25, 31, 2),
        ];
        let mut raw = Vec::new();
        let mut prev = 0;
        for post in &posts {
            encode_doc_post(&mut raw, prev, post);
            prev = post.end;
        }
        let mut offset = 0;
        let mut prev = 0;
        for expected in &posts {
            let (post, used) = decode_doc_post(&raw[offset..], prev).unwrap();
            assert_eq!(&post, expected);
            offset += used;
            prev = post.end;
        }
    }

    #[test]
    fn test_serialized_list_cursor() {
        let bytes = word_list(&[(5, 0), (9, 1), (12, 0), (400, 2)]);
        let list = PostingListRef::parse(&bytes).unwrap();
        assert_eq!(list.post_count(), 4);
        assert_eq!(list.skip_count(), 1);

        let mut cursor = list.word_cursor();
        let locations: Vec<Location> = std::iter::from_fn(|| cursor.next().map(|p| p.location))
            .collect();
        assert_eq!(locations, vec![5, 9, 12, 400]);
        assert!(cursor.next().is_none());
    }

    #[test]
    fn test_cursor_seek_and_idempotence() {
        let bytes = word_list(&[(5, 0), (9, 0), (12, 0), (400, 0)]);
        let list = PostingListRef::parse(&bytes).unwrap();
        let mut cursor = list.word_cursor();

        assert_eq!(cursor.seek(10).unwrap().location, 12);
        // Seeking to a target at or before the current post is a no-op
        assert_eq!(cursor.seek(10).unwrap().location, 12);
        assert_eq!(cursor.seek(3).unwrap().location, 12);
        assert_eq!(cursor.seek(13).unwrap().location, 400);
        assert!(cursor.seek(401).is_none());
    }

    #[test]
    fn test_seek_never_skips_a_match() {
        // Enough posts to force a multi-entry skip table
        let posts: Vec<(Location, u8)> = (0..500).map(|i| (i * 7 + 3, 0u8)).collect();
        let bytes = word_list(&posts);
        let list = PostingListRef::parse(&bytes).unwrap();
        assert!(list.skip_count() > 1);

        for target in (0..3600).step_by(11) {
            let mut cursor = list.word_cursor();
            let found = cursor.seek(target);
            let expected = posts.iter().map(|&(l, _)| l).find(|&l| l >= target);
            assert_eq!(found.map(|p| p.location), expected, "target {}", target);
        }
    }

    #[test]
    fn test_seek_monotone_targets_share_cursor() {
        let posts: Vec<(Location, u8)> = (1..200).map(|i| (i * 3, 0u8)).collect();
        let bytes = word_list(&posts);
        let list = PostingListRef::parse(&bytes).unwrap();

        let mut cursor = list.word_cursor();
        let mut last = 0;
        for target in [1, 2, 50, 51, 300, 400, 597] {
            if let Some(post) = cursor.seek(target) {
                assert!(post.location >= last);
                assert!(post.location >= target);
                last = post.location;
            }
        }
    }

    #[test]
    fn test_doc_cursor_seek_by_end() {
        let mut builder = PostingListBuilder::new();
        builder.push_doc(&DocumentPost::new(1, 10, 0));
        builder.push_doc(&DocumentPost::new(11, 20, 1));
        builder.push_doc(&DocumentPost::new(21, 30, 2));
        let mut bytes = Vec::new();
        builder.serialize_docs(&mut bytes);

        let list = PostingListRef::parse(&bytes).unwrap();
        let mut cursor = list.doc_cursor();
        assert_eq!(cursor.seek(0).unwrap().doc_id, 0);
        assert_eq!(cursor.seek(10).unwrap().doc_id, 0);
        assert_eq!(cursor.seek(11).unwrap().doc_id, 1);
        assert_eq!(cursor.seek(25).unwrap().doc_id, 2);
        assert!(cursor.seek(31).is_none());
    }

    #[test]
    fn test_parse_rejects_truncation() {
        let bytes = word_list(&[(5, 0), (9, 0)]);
        assert!(PostingListRef::parse(&bytes[..8]).is_err());

        // A header that claims more data than the buffer holds
        let mut forged = bytes.clone();
        let huge = (bytes.len() as u32 + 64).to_ne_bytes();
        forged[..4].copy_from_slice(&huge);
        assert!(PostingListRef::parse(&forged).is_err());
    }

    #[test]
    fn test_skip_count_bounds() {
        assert_eq!(compute_skip_count(0), 1);
        assert_eq!(compute_skip_count(31), 1);
        assert_eq!(compute_skip_count(32), 1);
        assert_eq!(compute_skip_count(64), 2);
        assert_eq!(compute_skip_count(1 << 20), 256);
    }
}
