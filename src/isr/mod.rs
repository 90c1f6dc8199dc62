//! The positional-iterator tree (ISR layer)
//!
//! A compiled query becomes a tree of index stream readers, each exposing
//! the same capability set: `next` (document-granular advance),
//! `next_internal` (single posting step), `seek` (first match at or past a
//! target Location), and current-post/current-document queries. Iterators
//! are plain values: cloning one clones its cursor state, which is how the
//! ranker gives every worker a private view of the leaf terms.

pub mod and;
pub mod doc;
pub mod not;
pub mod or;
pub mod phrase;
pub mod syn_or;
pub mod word;

pub use and::AndIsr;
pub use doc::DocIsr;
pub use not::NotIsr;
pub use or::OrIsr;
pub use phrase::PhraseIsr;
pub use syn_or::SynOrIsr;
pub use word::WordIsr;

use std::collections::HashSet;

use crate::segment::{DocumentPost, Location, Segment, WordPost};

/// One posting produced by an iterator, returned by value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Post {
    Word(WordPost),
    Doc(DocumentPost),
}

impl Post {
    pub fn start(&self) -> Location {
        match self {
            Post::Word(p) => p.location,
            Post::Doc(p) => p.start,
        }
    }

    pub fn end(&self) -> Location {
        match self {
            Post::Word(p) => p.location,
            Post::Doc(p) => p.end,
        }
    }
}

/// Which child of a binary iterator currently holds the nearer post
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    pub(crate) fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Sum type over every iterator variant
#[derive(Clone)]
pub enum Isr<'a> {
    Word(WordIsr<'a>),
    Doc(DocIsr<'a>),
    And(Box<AndIsr<'a>>),
    Or(Box<OrIsr<'a>>),
    SynOr(Box<SynOrIsr<'a>>),
    Not(Box<NotIsr<'a>>),
    Phrase(PhraseIsr<'a>),
}

impl<'a> Isr<'a> {
    /// Advance past the current document and return the next match
    pub fn next(&mut self) -> Option<Post> {
        match self {
            Isr::Word(isr) => isr.next().map(Post::Word),
            Isr::Doc(isr) => isr.next().map(Post::Doc),
            Isr::And(isr) => isr.next(),
            Isr::Or(isr) => isr.next(),
            Isr::SynOr(isr) => isr.next(),
            Isr::Not(isr) => isr.next(),
            Isr::Phrase(isr) => isr.next().map(Post::Word),
        }
    }

    /// Advance one underlying posting step
    pub fn next_internal(&mut self) -> Option<Post> {
        match self {
            Isr::Word(isr) => isr.next_internal().map(Post::Word),
            Isr::Doc(isr) => isr.next().map(Post::Doc),
            Isr::And(isr) => isr.next_internal(),
            Isr::Or(isr) => isr.next_internal(),
            Isr::SynOr(isr) => isr.next_internal(),
            Isr::Not(isr) => isr.next_internal(),
            Isr::Phrase(isr) => isr.next_internal().map(Post::Word),
        }
    }

    /// First match whose start Location is `>= target`
    pub fn seek(&mut self, target: Location) -> Option<Post> {
        match self {
            Isr::Word(isr) => isr.seek(target).map(Post::Word),
            Isr::Doc(isr) => isr.seek(target).map(Post::Doc),
            Isr::And(isr) => isr.seek(target),
            Isr::Or(isr) => isr.seek(target),
            Isr::SynOr(isr) => isr.seek(target),
            Isr::Not(isr) => isr.seek(target),
            Isr::Phrase(isr) => isr.seek(target).map(Post::Word),
        }
    }

    pub fn current_post(&self) -> Option<Post> {
        match self {
            Isr::Word(isr) => isr.current().map(Post::Word),
            Isr::Doc(isr) => isr.current().map(Post::Doc),
            Isr::And(isr) => isr.current_post(),
            Isr::Or(isr) => isr.current_post(),
            Isr::SynOr(isr) => isr.current_post(),
            Isr::Not(isr) => isr.current_post(),
            Isr::Phrase(isr) => isr.current().map(Post::Word),
        }
    }

    /// The document containing the current match
    pub fn current_doc(&mut self) -> Option<DocumentPost> {
        match self {
            Isr::Word(isr) => isr.current_doc(),
            Isr::Doc(isr) => isr.current(),
            Isr::And(isr) => isr.current_doc(),
            Isr::Or(isr) => isr.current_doc(),
            Isr::SynOr(isr) => isr.current_doc(),
            Isr::Not(isr) => isr.current_doc(),
            Isr::Phrase(isr) => isr.current_doc(),
        }
    }

    pub fn start_location(&self) -> Location {
        self.current_post().map(|p| p.start()).unwrap_or(0)
    }

    pub fn end_location(&self) -> Location {
        self.current_post().map(|p| p.end()).unwrap_or(0)
    }

    /// Estimated number of posts beneath this node
    pub fn post_count(&self) -> u32 {
        match self {
            Isr::Word(isr) => isr.post_count(),
            Isr::Doc(isr) => isr.post_count(),
            Isr::And(isr) => isr.post_count(),
            Isr::Or(isr) => isr.post_count(),
            Isr::SynOr(isr) => isr.post_count(),
            Isr::Not(isr) => isr.post_count(),
            Isr::Phrase(isr) => isr.post_count(),
        }
    }

    /// Flatten the leaf terms beneath this node, skipping duplicate stems.
    ///
    /// Fresh word iterators are opened against `segment` so the collected
    /// cursors are independent of this tree's state. Terms collected under
    /// the synonym side of a SynOr are marked as synonyms.
    pub fn collect_terms(
        &self,
        segment: &'a Segment,
        terms: &mut Vec<WordIsr<'a>>,
        seen: &mut HashSet<String>,
    ) {
        match self {
            Isr::Word(isr) => {
                if seen.insert(isr.key().to_string()) {
                    terms.push(WordIsr::open(segment, isr.key()));
                }
            }
            Isr::Doc(_) => {}
            Isr::And(isr) => isr.collect_terms(segment, terms, seen),
            Isr::Or(isr) => isr.collect_terms(segment, terms, seen),
            Isr::SynOr(isr) => isr.collect_terms(segment, terms, seen),
            Isr::Not(isr) => isr.collect_terms(segment, terms, seen),
            Isr::Phrase(isr) => isr.collect_terms(segment, terms, seen),
        }
    }
}

/// One query's iterator tree, bound to a single segment
pub struct IsrTree<'a> {
    segment: &'a Segment,
    root: Isr<'a>,
}

impl<'a> IsrTree<'a> {
    pub fn from_root(segment: &'a Segment, root: Isr<'a>) -> Self {
        Self { segment, root }
    }

    pub fn segment(&self) -> &'a Segment {
        self.segment
    }

    pub fn root_mut(&mut self) -> &mut Isr<'a> {
        &mut self.root
    }

    /// Flat list of leaf-term cursors for the ranker
    pub fn flattened_terms(&self) -> Vec<WordIsr<'a>> {
        let mut terms = Vec::new();
        let mut seen = HashSet::new();
        self.root.collect_terms(self.segment, &mut terms, &mut seen);
        terms
    }
}
