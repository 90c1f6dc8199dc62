//! Document-level iterator over the doc-end posting list

use crate::segment::{
    DocCursor, DocumentAttributes, DocumentPost, Location, Segment, UrlTableRef,
};

/// Cursor over the segment's document-end list, with attribute resolution
/// for the current document
#[derive(Clone)]
pub struct DocIsr<'a> {
    cursor: DocCursor<'a>,
    urls: UrlTableRef<'a>,
}

impl<'a> DocIsr<'a> {
    pub fn new(segment: &'a Segment) -> Self {
        Self {
            cursor: segment.doc_end_list().doc_cursor(),
            urls: segment.url_table(),
        }
    }

    pub fn post_count(&self) -> u32 {
        self.cursor.post_count()
    }

    pub fn current(&self) -> Option<DocumentPost> {
        self.cursor.current()
    }

    /// Advance to the next document
    pub fn next(&mut self) -> Option<DocumentPost> {
        self.cursor.next()
    }

    /// First document whose end location is `>= target`
    pub fn seek(&mut self, target: Location) -> Option<DocumentPost> {
        self.cursor.seek(target)
    }

    pub fn start_location(&self) -> Location {
        self.cursor.current().map(|d| d.start).unwrap_or(0)
    }

    pub fn end_location(&self) -> Location {
        self.cursor.current().map(|d| d.end).unwrap_or(0)
    }

    /// Attributes of the current document
    pub fn attributes(&self) -> Option<DocumentAttributes<'a>> {
        self.urls.attributes(self.cursor.current()?.doc_id)
    }

    pub fn url(&self) -> Option<&'a str> {
        self.urls.url(self.cursor.current()?.doc_id)
    }
}
