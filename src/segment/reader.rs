//! Immutable segment reader backed by a memory-mapped file
//!
//! A segment is opened read-only at process start, mapped for the process
//! lifetime, and never modified in place. Every reference handed out by the
//! accessors stays valid for the lifetime of the [`Segment`] handle.

use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use memmap2::{Advice, Mmap};
use tracing::{debug, warn};

use super::postings::PostingListRef;
use super::term_dict::TermDictRef;
use super::types::{DocId, DocumentAttributes, Location};
use super::url_table::UrlTableRef;
use super::writer::SEGMENT_HEADER_BYTES;
use crate::error::{Result, ShardError};

/// Process-wide budget for bytes pinned with mlock.
///
/// Passed explicitly into [`Segment::open`]; locking is best-effort and a
/// refusal (budget exhausted or mlock failure) is never fatal.
#[derive(Debug)]
pub struct LockBudget {
    cap: u64,
    used: AtomicU64,
}

impl LockBudget {
    pub fn new(cap_bytes: u64) -> Self {
        Self {
            cap: cap_bytes,
            used: AtomicU64::new(0),
        }
    }

    /// Reserve `bytes` against the cap; false when it would overflow
    fn try_reserve(&self, bytes: u64) -> bool {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                used.checked_add(bytes).filter(|&total| total <= self.cap)
            })
            .is_ok()
    }

    pub fn locked_bytes(&self) -> u64 {
        self.used.load(Ordering::SeqCst)
    }
}

fn read_u32_ne(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset + 4)?;
    Some(u32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// One memory-mapped, immutable index segment
pub struct Segment {
    map: Mmap,
    path: PathBuf,
    urls: Range<usize>,
    hash: Range<usize>,
    doc_end: Range<usize>,
}

impl Segment {
    /// Map a segment file read-only and validate its layout.
    ///
    /// Applies `madvise(WILLNEED)` and a best-effort `mlock` bounded by
    /// `budget`; both degrade to a logged warning on failure.
    pub fn open(path: &Path, budget: &LockBudget) -> Result<Self> {
        let file = File::open(path)?;
        let map = unsafe { Mmap::map(&file)? };

        if let Err(e) = map.advise(Advice::WillNeed) {
            warn!(path = %path.display(), error = %e, "madvise failed");
        }
        if budget.try_reserve(map.len() as u64) {
            match map.lock() {
                Ok(()) => debug!(path = %path.display(), bytes = map.len(), "segment locked"),
                Err(e) => warn!(path = %path.display(), error = %e, "mlock failed"),
            }
        } else {
            debug!(path = %path.display(), "mlock skipped, budget exhausted");
        }

        let segment = Self::validate(map, path.to_path_buf())?;
        debug!(
            path = %path.display(),
            documents = segment.document_count(),
            words = segment.word_count(),
            "segment opened"
        );
        Ok(segment)
    }

    fn validate(map: Mmap, path: PathBuf) -> Result<Self> {
        let bytes: &[u8] = &map;
        if bytes.len() < SEGMENT_HEADER_BYTES {
            return Err(ShardError::CorruptSegment(format!(
                "{}: file shorter than segment header",
                path.display()
            )));
        }
        let size_of_urls = read_u32_ne(bytes, 16).unwrap_or(0) as usize;
        let size_of_hash = read_u32_ne(bytes, 20).unwrap_or(0) as usize;

        let urls_start = SEGMENT_HEADER_BYTES;
        let hash_start = urls_start + size_of_urls;
        let doc_end_start = hash_start + size_of_hash;
        if doc_end_start > bytes.len() {
            return Err(ShardError::CorruptSegment(format!(
                "{}: blob sizes exceed file length",
                path.display()
            )));
        }

        UrlTableRef::parse(&bytes[urls_start..hash_start])?;
        TermDictRef::parse(&bytes[hash_start..doc_end_start])?;
        let doc_end_list = PostingListRef::parse(&bytes[doc_end_start..])?;
        let doc_end = doc_end_start..doc_end_start + doc_end_list.total_bytes();

        Ok(Self {
            map,
            path,
            urls: urls_start..hash_start,
            hash: hash_start..doc_end_start,
            doc_end,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> usize {
        self.map.len()
    }

    pub fn word_count(&self) -> u32 {
        read_u32_ne(&self.map, 0).unwrap_or(0)
    }

    pub fn document_count(&self) -> u32 {
        read_u32_ne(&self.map, 4).unwrap_or(0)
    }

    pub fn location_count(&self) -> u32 {
        read_u32_ne(&self.map, 8).unwrap_or(0)
    }

    pub fn max_location(&self) -> Location {
        read_u32_ne(&self.map, 12).unwrap_or(0)
    }

    /// The URL / attribute table
    pub fn url_table(&self) -> UrlTableRef<'_> {
        // Validated at open
        UrlTableRef::parse(&self.map[self.urls.clone()]).expect("validated at open")
    }

    /// The term dictionary
    pub fn term_dict(&self) -> TermDictRef<'_> {
        TermDictRef::parse(&self.map[self.hash.clone()]).expect("validated at open")
    }

    /// The document-end posting list
    pub fn doc_end_list(&self) -> PostingListRef<'_> {
        PostingListRef::parse(&self.map[self.doc_end.clone()]).expect("validated at open")
    }

    /// Look up the posting list for a stem; `None` means the term never
    /// matches
    pub fn lookup_term(&self, stem: &str) -> Option<PostingListRef<'_>> {
        self.term_dict().lookup(stem)
    }

    pub fn url(&self, id: DocId) -> Option<&str> {
        self.url_table().url(id)
    }

    pub fn attributes(&self, id: DocId) -> Option<DocumentAttributes<'_>> {
        self.url_table().attributes(id)
    }
}
