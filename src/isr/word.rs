//! Word-level iterator over one term's posting list
//!
//! Every word iterator carries its own cursor over the document-end list so
//! it can translate "next match" into "first occurrence past the current
//! document". A stem absent from the dictionary yields an iterator that
//! never matches.

use super::doc::DocIsr;
use crate::segment::{DocumentPost, Location, Segment, WordCursor, WordPost};

#[derive(Clone)]
pub struct WordIsr<'a> {
    key: String,
    cursor: Option<WordCursor<'a>>,
    doc: DocIsr<'a>,
    synonym: bool,
}

impl<'a> WordIsr<'a> {
    /// Open an iterator for a stem, binding it to one segment
    pub fn open(segment: &'a Segment, stem: &str) -> Self {
        Self {
            key: stem.to_string(),
            cursor: segment.lookup_term(stem).map(|list| list.word_cursor()),
            doc: DocIsr::new(segment),
            synonym: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether this term came from the synonym side of a SynOr
    pub fn is_synonym(&self) -> bool {
        self.synonym
    }

    pub fn set_synonym(&mut self, synonym: bool) {
        self.synonym = synonym;
    }

    /// Whether the stem names a title occurrence list
    pub fn is_title_term(&self) -> bool {
        self.key.starts_with('@')
    }

    /// The stem without the title prefix
    pub fn stem(&self) -> &str {
        self.key.strip_prefix('@').unwrap_or(&self.key)
    }

    pub fn post_count(&self) -> u32 {
        self.cursor.as_ref().map(|c| c.post_count()).unwrap_or(0)
    }

    pub fn current(&self) -> Option<WordPost> {
        self.cursor.as_ref()?.current()
    }

    pub fn start_location(&self) -> Location {
        self.current().map(|p| p.location).unwrap_or(0)
    }

    /// Advance one posting step
    pub fn next_internal(&mut self) -> Option<WordPost> {
        self.cursor.as_mut()?.next()
    }

    /// Advance past the current document and return the next occurrence
    pub fn next(&mut self) -> Option<WordPost> {
        let target = match self.current() {
            Some(current) => match self.doc.seek(current.location) {
                Some(doc) => doc.end + 1,
                None => 0,
            },
            None => 0,
        };
        self.seek(target)
    }

    /// First occurrence at or past `target`; idempotent when already there
    pub fn seek(&mut self, target: Location) -> Option<WordPost> {
        self.cursor.as_mut()?.seek(target)
    }

    /// The document containing the current occurrence
    pub fn current_doc(&mut self) -> Option<DocumentPost> {
        let current = self.current()?;
        self.doc.seek(current.location)
    }

    /// Occurrences of this term within `[start, end]`, without disturbing
    /// the live cursor
    pub fn occurrences_in(&self, start: Location, end: Location) -> u32 {
        if let Some(current) = self.current() {
            if current.location > end {
                return 0;
            }
        }
        let Some(cursor) = &self.cursor else {
            return 0;
        };
        let mut probe = cursor.clone();
        let mut count = 0;
        let mut post = probe.seek(start);
        while let Some(p) = post {
            if p.location > end {
                break;
            }
            count += 1;
            post = probe.next();
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::testutil::write_segment;
    use crate::segment::WordFlags;

    /// doc0 "a b a" -> [1,5], doc1 "b c" -> [6,9], doc2 "a" -> [10,12]
    fn open_corpus() -> (tempfile::TempDir, crate::segment::Segment) {
        let b = WordFlags(0);
        write_segment(|w| {
            w.add_document("https://one.com", "", &[("a", b), ("b", b), ("a", b)], true);
            w.add_document("https://two.com", "", &[("b", b), ("c", b)], true);
            w.add_document("https://three.com", "", &[("a", b)], true);
        })
    }

    #[test]
    fn test_next_internal_visits_every_occurrence() {
        let (_dir, segment) = open_corpus();
        let mut a = WordIsr::open(&segment, "a");
        assert_eq!(a.post_count(), 3);

        let mut locations = Vec::new();
        while let Some(post) = a.next_internal() {
            locations.push(post.location);
        }
        assert_eq!(locations, vec![1, 3, 10]);
    }

    #[test]
    fn test_next_is_document_granular() {
        let (_dir, segment) = open_corpus();
        let mut a = WordIsr::open(&segment, "a");

        let first = a.next().unwrap();
        assert_eq!(first.location, 1);
        // Skips the second occurrence inside doc0 and lands in doc2
        let second = a.next().unwrap();
        assert_eq!(second.location, 10);
        assert!(a.next().is_none());
    }

    #[test]
    fn test_current_doc() {
        let (_dir, segment) = open_corpus();
        let mut b = WordIsr::open(&segment, "b");
        b.next_internal();
        assert_eq!(b.current_doc().unwrap().doc_id, 0);
        b.next();
        assert_eq!(b.current_doc().unwrap().doc_id, 1);
    }

    #[test]
    fn test_missing_term_never_matches() {
        let (_dir, segment) = open_corpus();
        let mut missing = WordIsr::open(&segment, "zzz");
        assert_eq!(missing.post_count(), 0);
        assert!(missing.next().is_none());
        assert!(missing.seek(0).is_none());
        assert_eq!(missing.occurrences_in(0, 100), 0);
    }

    #[test]
    fn test_occurrences_in_preserves_cursor() {
        let (_dir, segment) = open_corpus();
        let mut a = WordIsr::open(&segment, "a");
        a.next_internal();
        let before = a.current();

        assert_eq!(a.occurrences_in(1, 5), 2);
        assert_eq!(a.occurrences_in(9, 11), 1);
        assert_eq!(a.current(), before);

        // Nested counting over the same iterator state stays exact
        assert_eq!(a.occurrences_in(1, 5), 2);
    }
}
