//! On-disk term dictionary (the hash blob)
//!
//! Maps stem strings to posting lists embedded directly in the blob. Title
//! stems carry a `@` prefix so title and body occurrences stay in distinct
//! lists while sharing the segment's Location space.
//!
//! Serialized layout (all integers native-endian):
//!
//! ```text
//! [ magic | version | blob_size | bucket_count | bucket_offset[bucket_count] ]
//! per non-empty bucket, a chain of records:
//!   length | value | hash | key bytes NUL | pad to 4 | posting list
//! terminated by a sentinel record with length == 0
//! ```
//!
//! `value` is the offset from the record start to its posting list, `hash`
//! the full FNV-1a hash of the key.

use super::postings::PostingListRef;
use crate::error::{Result, ShardError};

pub const HASH_BLOB_MAGIC: u32 = 0xDEAD_BEEF;
pub const HASH_BLOB_VERSION: u32 = 1;

const HEADER_FIELDS: usize = 4;
const RECORD_FIXED_BYTES: usize = 12;
const SENTINEL_BYTES: usize = 12;

/// FNV-1a over the key bytes
pub fn fnv1a(key: &str) -> u32 {
    let mut hash: u32 = 2_166_136_261;
    for &byte in key.as_bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(16_777_619);
    }
    hash
}

fn round_up4(n: usize) -> usize {
    (n + 3) & !3
}

fn read_u32_ne(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset + 4)?;
    Some(u32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// Builder for the hash blob
///
/// Entries carry pre-serialized posting-list bytes; the builder only lays
/// out buckets and chains.
#[derive(Clone, Debug, Default)]
pub struct TermDictBuilder {
    entries: Vec<(String, Vec<u8>)>,
}

impl TermDictBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a term with its serialized posting list
    pub fn insert(&mut self, key: String, posting_list: Vec<u8>) {
        debug_assert_eq!(posting_list.len() % 4, 0);
        self.entries.push((key, posting_list));
    }

    /// Serialize the dictionary, appending to `out`
    pub fn serialize(&self, out: &mut Vec<u8>) {
        let bucket_count = (self.entries.len().max(1) * 2).next_power_of_two().max(16);
        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); bucket_count];
        for (i, (key, _)) in self.entries.iter().enumerate() {
            buckets[fnv1a(key) as usize % bucket_count].push(i);
        }

        let base = out.len();
        let header_bytes = (HEADER_FIELDS + bucket_count) * 4;
        out.resize(base + header_bytes, 0);

        let mut bucket_offsets = vec![0u32; bucket_count];
        for (bucket, members) in buckets.iter().enumerate() {
            if members.is_empty() {
                continue;
            }
            bucket_offsets[bucket] = (out.len() - base) as u32;
            for &i in members {
                let (key, posting) = &self.entries[i];
                let key_bytes = key.len() + 1;
                let value = round_up4(RECORD_FIXED_BYTES + key_bytes);
                let length = value + posting.len();

                out.extend_from_slice(&(length as u32).to_ne_bytes());
                out.extend_from_slice(&(value as u32).to_ne_bytes());
                out.extend_from_slice(&fnv1a(key).to_ne_bytes());
                out.extend_from_slice(key.as_bytes());
                out.push(0);
                let pad = value - RECORD_FIXED_BYTES - key_bytes;
                out.resize(out.len() + pad, 0);
                out.extend_from_slice(posting);
            }
            // Sentinel terminates the chain
            out.resize(out.len() + SENTINEL_BYTES, 0);
        }

        let total = round_up4(out.len() - base);
        out.resize(base + total, 0);

        out[base..base + 4].copy_from_slice(&HASH_BLOB_MAGIC.to_ne_bytes());
        out[base + 4..base + 8].copy_from_slice(&HASH_BLOB_VERSION.to_ne_bytes());
        out[base + 8..base + 12].copy_from_slice(&(total as u32).to_ne_bytes());
        out[base + 12..base + 16].copy_from_slice(&(bucket_count as u32).to_ne_bytes());
        for (i, offset) in bucket_offsets.iter().enumerate() {
            let at = base + (HEADER_FIELDS + i) * 4;
            out[at..at + 4].copy_from_slice(&offset.to_ne_bytes());
        }
    }
}

/// Zero-copy view of a serialized hash blob
#[derive(Clone, Copy, Debug)]
pub struct TermDictRef<'a> {
    bytes: &'a [u8],
}

impl<'a> TermDictRef<'a> {
    /// Parse and validate the blob at the start of `bytes`
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let magic = read_u32_ne(bytes, 0)
            .ok_or_else(|| ShardError::CorruptSegment("hash blob truncated".into()))?;
        if magic != HASH_BLOB_MAGIC {
            return Err(ShardError::CorruptSegment(format!(
                "hash blob magic {:#010x}",
                magic
            )));
        }
        let version = read_u32_ne(bytes, 4).unwrap_or(0);
        if version != HASH_BLOB_VERSION {
            return Err(ShardError::CorruptSegment(format!(
                "hash blob version {}",
                version
            )));
        }
        let size = read_u32_ne(bytes, 8).unwrap_or(0) as usize;
        let bucket_count = read_u32_ne(bytes, 12).unwrap_or(0) as usize;
        if bucket_count == 0 || size > bytes.len() || (HEADER_FIELDS + bucket_count) * 4 > size {
            return Err(ShardError::CorruptSegment(
                "hash blob size inconsistent".into(),
            ));
        }
        Ok(Self {
            bytes: &bytes[..size],
        })
    }

    pub fn bucket_count(&self) -> u32 {
        read_u32_ne(self.bytes, 12).unwrap_or(0)
    }

    /// Look up a stem; returns the embedded posting list when present.
    ///
    /// A missing term is not an error: callers treat it as an iterator that
    /// never matches.
    pub fn lookup(&self, key: &str) -> Option<PostingListRef<'a>> {
        let bucket_count = self.bucket_count();
        let hash = fnv1a(key);
        let bucket = (hash % bucket_count) as usize;
        let mut at = read_u32_ne(self.bytes, (HEADER_FIELDS + bucket) * 4)? as usize;
        if at == 0 {
            return None;
        }
        loop {
            let length = read_u32_ne(self.bytes, at)? as usize;
            if length == 0 {
                return None;
            }
            let value = read_u32_ne(self.bytes, at + 4)? as usize;
            let stored_hash = read_u32_ne(self.bytes, at + 8)?;
            if stored_hash == hash && self.key_matches(at + RECORD_FIXED_BYTES, key) {
                return PostingListRef::parse(self.bytes.get(at + value..)?).ok();
            }
            at += length;
        }
    }

    fn key_matches(&self, offset: usize, key: &str) -> bool {
        let key = key.as_bytes();
        match self.bytes.get(offset..offset + key.len() + 1) {
            Some(stored) => &stored[..key.len()] == key && stored[key.len()] == 0,
            None => false,
        }
    }
}
