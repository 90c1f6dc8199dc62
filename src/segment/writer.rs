//! Segment writer
//!
//! Builds an in-memory index and serializes it into the on-disk segment
//! layout: header, URL table, hash blob, document-end posting list. The
//! production indexing pipeline lives upstream; this writer exists for
//! tooling and tests that need to fabricate segments.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use super::postings::PostingListBuilder;
use super::term_dict::TermDictBuilder;
use super::types::{DocId, DocumentPost, Location, WordFlags, WordPost};
use super::url_table::UrlTableBuilder;

/// Titles at or beyond this many words are refused at build time
pub const MAX_TITLE_WORDS: usize = 40;

/// Segment header: words, documents, locations, max location, URL and hash
/// blob sizes
pub const SEGMENT_HEADER_BYTES: usize = 24;

/// Accumulates documents and emits one immutable segment blob
#[derive(Debug, Default)]
pub struct SegmentWriter {
    dictionary: HashMap<String, PostingListBuilder>,
    doc_end: PostingListBuilder,
    urls: UrlTableBuilder,
    words_in_index: u32,
    documents_in_index: u32,
    locations_in_index: u32,
    max_location: Location,
}

impl SegmentWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document_count(&self) -> u32 {
        self.documents_in_index
    }

    /// Insert one parsed document.
    ///
    /// `title` is whitespace-split into title stems (stored with the `@`
    /// prefix); `body` carries pre-stemmed body words with their display
    /// flags. Returns the assigned document id, or `None` when the document
    /// is refused (over-long title).
    pub fn add_document(
        &mut self,
        url: &str,
        title: &str,
        body: &[(&str, WordFlags)],
        english: bool,
    ) -> Option<DocId> {
        let title_words: Vec<&str> = title.split_whitespace().collect();
        if title_words.len() >= MAX_TITLE_WORDS {
            return None;
        }

        // Each document consumes its words plus two boundary locations
        let total = (title_words.len() + body.len() + 2) as Location;
        let start = self.max_location + 1;
        self.max_location += total;
        let end = start + total - 1;

        let id = self.urls.push(
            url,
            title,
            (title_words.len() + body.len()) as u32,
            title_words.len() as u32,
            start,
            end,
            english,
        );

        self.doc_end.push_doc(&DocumentPost::new(start, end, id));
        self.documents_in_index += 1;
        self.locations_in_index += 1;

        let mut next_location = start;
        for word in &title_words {
            self.add_post(format!("@{}", word), next_location, WordFlags(0));
            next_location += 1;
        }
        for (word, flags) in body {
            self.add_post((*word).to_string(), next_location, *flags);
            next_location += 1;
        }
        Some(id)
    }

    fn add_post(&mut self, key: String, location: Location, flags: WordFlags) {
        let words_in_index = &mut self.words_in_index;
        let list = self.dictionary.entry(key).or_insert_with(|| {
            *words_in_index += 1;
            PostingListBuilder::new()
        });
        list.push_word(&WordPost::new(location, flags));
        self.locations_in_index += 1;
    }

    /// Serialize the whole segment into one contiguous blob
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut urls = Vec::new();
        self.urls.serialize(&mut urls);

        let mut dict = TermDictBuilder::new();
        for (key, list) in &self.dictionary {
            let mut posting = Vec::new();
            list.serialize_words(&mut posting);
            dict.insert(key.clone(), posting);
        }
        let mut hash = Vec::new();
        dict.serialize(&mut hash);

        let mut out = Vec::with_capacity(SEGMENT_HEADER_BYTES + urls.len() + hash.len());
        out.extend_from_slice(&self.words_in_index.to_ne_bytes());
        out.extend_from_slice(&self.documents_in_index.to_ne_bytes());
        out.extend_from_slice(&self.locations_in_index.to_ne_bytes());
        out.extend_from_slice(&self.max_location.to_ne_bytes());
        out.extend_from_slice(&(urls.len() as u32).to_ne_bytes());
        out.extend_from_slice(&(hash.len() as u32).to_ne_bytes());
        out.extend_from_slice(&urls);
        out.extend_from_slice(&hash);
        self.doc_end.serialize_docs(&mut out);
        out
    }

    /// Write the segment blob to a file
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(&self.to_bytes())?;
        file.sync_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_accounting() {
        let mut writer = SegmentWriter::new();
        let b = WordFlags(0);
        let id0 = writer
            .add_document("https://a.com", "t", &[("x", b), ("y", b)], true)
            .unwrap();
        let id1 = writer
            .add_document("https://b.com", "", &[("z", b)], true)
            .unwrap();
        assert_eq!(id0, 0);
        assert_eq!(id1, 1);
        assert_eq!(writer.document_count(), 2);

        // doc0: 1 title + 2 body + 2 = 5 locations -> [1, 5]
        // doc1: 0 title + 1 body + 2 = 3 locations -> [6, 8]
        assert_eq!(writer.max_location, 8);
    }

    #[test]
    fn test_over_long_title_refused() {
        let mut writer = SegmentWriter::new();
        let long_title = vec!["w"; MAX_TITLE_WORDS].join(" ");
        assert!(writer
            .add_document("https://a.com", &long_title, &[], true)
            .is_none());
        assert_eq!(writer.document_count(), 0);
    }

    #[test]
    fn test_title_and_body_stems_distinct() {
        let mut writer = SegmentWriter::new();
        writer
            .add_document("https://a.com", "rust", &[("rust", WordFlags(0))], true)
            .unwrap();
        // "@rust" and "rust" are separate dictionary entries
        assert_eq!(writer.words_in_index, 2);
    }
}
