//! Core types for the segment-based index

use std::fmt;

/// Global position in the concatenation of all documents in a segment.
/// Location 0 is reserved as "before any content".
pub type Location = u32;

/// Dense document identifier within a segment (0..document_count)
pub type DocId = u32;

/// Word occurrence attribute bits stored with every word post
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WordFlags(pub u8);

impl WordFlags {
    pub const BOLD: u8 = 0x01;
    pub const HEADING: u8 = 0x02;
    pub const LARGE_FONT: u8 = 0x04;

    pub fn is_bold(self) -> bool {
        self.0 & Self::BOLD != 0
    }

    pub fn is_heading(self) -> bool {
        self.0 & Self::HEADING != 0
    }

    pub fn is_large_font(self) -> bool {
        self.0 & Self::LARGE_FONT != 0
    }
}

/// One entry in a word posting list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WordPost {
    pub location: Location,
    pub flags: WordFlags,
}

impl WordPost {
    pub fn new(location: Location, flags: WordFlags) -> Self {
        Self { location, flags }
    }
}

/// One entry in the document-end posting list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DocumentPost {
    pub start: Location,
    pub end: Location,
    pub doc_id: DocId,
}

impl DocumentPost {
    pub fn new(start: Location, end: Location, doc_id: DocId) -> Self {
        Self { start, end, doc_id }
    }

    /// Whether a location falls inside this document's range
    pub fn contains(&self, location: Location) -> bool {
        location >= self.start && location <= self.end
    }
}

/// Top-level-domain category, extracted from the URL at index build time
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum Tld {
    #[default]
    Unknown = 0,
    Gov = 1,
    Edu = 2,
    Org = 3,
    Com = 4,
    Net = 5,
    Io = 6,
    Info = 7,
    Biz = 8,
    Xyz = 9,
    Top = 10,
    Us = 11,
    Dev = 12,
}

impl Tld {
    /// Parse the TLD category from a URL's host suffix
    pub fn from_url(url: &str) -> Self {
        let rest = match url.find("://") {
            Some(idx) => &url[idx + 3..],
            None => return Tld::Unknown,
        };
        let host = rest.split('/').next().unwrap_or(rest);
        // Strip any port before looking at the suffix
        let host = host.split(':').next().unwrap_or(host);
        let suffix = match host.rfind('.') {
            Some(idx) => &host[idx..],
            None => return Tld::Unknown,
        };
        match suffix {
            ".gov" => Tld::Gov,
            ".edu" => Tld::Edu,
            ".org" => Tld::Org,
            ".com" => Tld::Com,
            ".net" => Tld::Net,
            ".io" => Tld::Io,
            ".info" => Tld::Info,
            ".biz" => Tld::Biz,
            ".xyz" => Tld::Xyz,
            ".top" => Tld::Top,
            ".us" => Tld::Us,
            ".dev" => Tld::Dev,
            _ => Tld::Unknown,
        }
    }

    pub fn from_tag(tag: u8) -> Self {
        match tag {
            1 => Tld::Gov,
            2 => Tld::Edu,
            3 => Tld::Org,
            4 => Tld::Com,
            5 => Tld::Net,
            6 => Tld::Io,
            7 => Tld::Info,
            8 => Tld::Biz,
            9 => Tld::Xyz,
            10 => Tld::Top,
            11 => Tld::Us,
            12 => Tld::Dev,
            _ => Tld::Unknown,
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Tld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Per-document attributes resolved through the URL table
///
/// Strings borrow from the segment's mapped bytes and stay valid for the
/// lifetime of the segment handle.
#[derive(Clone, Copy, Debug)]
pub struct DocumentAttributes<'a> {
    pub url: &'a str,
    pub title: &'a str,
    pub word_count: u32,
    pub url_length: u32,
    /// Title length in words
    pub title_length: u32,
    pub start: Location,
    pub end: Location,
    pub english: bool,
    pub tld: Tld,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_flags() {
        let flags = WordFlags(WordFlags::BOLD | WordFlags::HEADING);
        assert!(flags.is_bold());
        assert!(flags.is_heading());
        assert!(!flags.is_large_font());
        assert!(!WordFlags::default().is_bold());
    }

    #[test]
    fn test_document_post_contains() {
        let post = DocumentPost::new(10, 20, 3);
        assert!(post.contains(10));
        assert!(post.contains(20));
        assert!(!post.contains(9));
        assert!(!post.contains(21));
    }

    #[test]
    fn test_tld_from_url() {
        assert_eq!(Tld::from_url("https://www.nsf.gov/grants"), Tld::Gov);
        assert_eq!(Tld::from_url("http://umich.edu"), Tld::Edu);
        assert_eq!(Tld::from_url("https://example.com:8080/x"), Tld::Com);
        assert_eq!(Tld::from_url("https://crates.io"), Tld::Io);
        assert_eq!(Tld::from_url("not-a-url"), Tld::Unknown);
        assert_eq!(Tld::from_url("https://localhost"), Tld::Unknown);
    }

    #[test]
    fn test_tld_tag_round_trip() {
        for tag in 0..=12u8 {
            assert_eq!(Tld::from_tag(tag).tag(), tag);
        }
        assert_eq!(Tld::from_tag(99), Tld::Unknown);
    }
}
