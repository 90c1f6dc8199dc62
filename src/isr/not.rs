//! Exclusion (container) iterator
//!
//! Emits matches of the included subtree whose document contains no match
//! of the excluded subtree.

use std::collections::HashSet;

use super::{Isr, Post, WordIsr};
use crate::segment::{DocumentPost, Location, Segment};

#[derive(Clone)]
pub struct NotIsr<'a> {
    included: Isr<'a>,
    excluded: Isr<'a>,
    current: Option<Post>,
}

impl<'a> NotIsr<'a> {
    pub fn new(included: Isr<'a>, excluded: Isr<'a>) -> Self {
        Self {
            included,
            excluded,
            current: None,
        }
    }

    pub fn current_post(&self) -> Option<Post> {
        self.current
    }

    pub fn post_count(&self) -> u32 {
        self.included.post_count()
    }

    pub fn next(&mut self) -> Option<Post> {
        if self.current.is_none() {
            self.included.next();
            self.excluded.next();
        } else {
            self.included.next();
        }
        self.advance_to_match()
    }

    pub fn next_internal(&mut self) -> Option<Post> {
        if self.current.is_none() {
            self.included.next_internal();
            self.excluded.next_internal();
        } else {
            self.included.next_internal();
        }
        self.advance_to_match()
    }

    pub fn seek(&mut self, target: Location) -> Option<Post> {
        if let Some(current) = self.current {
            if current.start() >= target {
                return self.current;
            }
        }
        self.included.seek(target);
        self.advance_to_match()
    }

    pub fn current_doc(&mut self) -> Option<DocumentPost> {
        self.included.current_doc()
    }

    /// Skip included matches whose document also holds an excluded match
    fn advance_to_match(&mut self) -> Option<Post> {
        loop {
            let Some(included) = self.included.current_post() else {
                self.current = None;
                return None;
            };
            let doc = self.included.current_doc()?;
            self.excluded.seek(doc.start);
            if let Some(excluded) = self.excluded.current_post() {
                if excluded.start() >= doc.start && excluded.start() < doc.end {
                    self.included.next();
                    continue;
                }
            }
            self.current = Some(included);
            return self.current;
        }
    }

    pub fn collect_terms(
        &self,
        segment: &'a Segment,
        terms: &mut Vec<WordIsr<'a>>,
        seen: &mut HashSet<String>,
    ) {
        // Only included terms participate in ranking
        self.included.collect_terms(segment, terms, seen);
    }
}
