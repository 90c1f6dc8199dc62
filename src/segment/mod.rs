//! Immutable, memory-mapped index segments
//!
//! A segment covers a disjoint subset of documents and is the on-disk
//! contract every other component depends on: a self-describing header,
//! the URL/attribute table, the hash blob of posting lists, and the
//! document-end posting list.

pub mod postings;
pub mod reader;
pub mod term_dict;
pub mod types;
pub mod url_table;
pub mod writer;

pub use postings::{DocCursor, PostingListBuilder, PostingListRef, SkipEntry, WordCursor};
pub use reader::{LockBudget, Segment};
pub use term_dict::{TermDictBuilder, TermDictRef};
pub use types::{DocId, DocumentAttributes, DocumentPost, Location, Tld, WordFlags, WordPost};
pub use url_table::{UrlTableBuilder, UrlTableRef};
pub use writer::SegmentWriter;
