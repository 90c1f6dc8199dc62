//! Intersection iterator
//!
//! Emits posts only when both children have a match inside the same
//! document; documents come out in ascending start order.

use std::collections::HashSet;

use super::{Isr, Post, Side, WordIsr};
use crate::segment::{DocumentPost, Location, Segment};

#[derive(Clone)]
pub struct AndIsr<'a> {
    left: Isr<'a>,
    right: Isr<'a>,
    current: Option<Post>,
    /// Child whose post was emitted last; drives `next_internal`
    nearest: Option<Side>,
}

impl<'a> AndIsr<'a> {
    pub fn new(left: Isr<'a>, right: Isr<'a>) -> Self {
        Self {
            left,
            right,
            current: None,
            nearest: None,
        }
    }

    pub fn current_post(&self) -> Option<Post> {
        self.current
    }

    pub fn post_count(&self) -> u32 {
        self.left.post_count()
    }

    pub fn next(&mut self) -> Option<Post> {
        self.left.next();
        self.right.next();
        self.advance_to_match()
    }

    pub fn next_internal(&mut self) -> Option<Post> {
        match self.nearest {
            None => {
                self.left.next_internal();
                self.right.next_internal();
            }
            Some(Side::Left) => {
                self.left.next_internal();
            }
            Some(Side::Right) => {
                self.right.next_internal();
            }
        }
        self.advance_to_match()
    }

    pub fn seek(&mut self, target: Location) -> Option<Post> {
        if let Some(current) = self.current {
            if current.start() >= target {
                return self.current;
            }
        }
        self.left.seek(target);
        self.right.seek(target);
        self.advance_to_match()
    }

    pub fn current_doc(&mut self) -> Option<DocumentPost> {
        if self.current.is_some() {
            self.left.current_doc()
        } else {
            None
        }
    }

    /// Advance the lagging child until both fall inside one document
    fn advance_to_match(&mut self) -> Option<Post> {
        loop {
            let (Some(l), Some(r)) = (self.left.current_post(), self.right.current_post()) else {
                self.current = None;
                self.nearest = None;
                return None;
            };

            if l.start() <= r.start() {
                let doc = self.right.current_doc()?;
                if l.start() >= doc.start && l.start() <= doc.end && r.start() <= doc.end {
                    self.nearest = Some(Side::Left);
                    self.current = Some(l);
                    return self.current;
                }
                self.left.seek(doc.start);
            } else {
                let doc = self.left.current_doc()?;
                if r.start() >= doc.start && r.start() <= doc.end && l.start() <= doc.end {
                    self.nearest = Some(Side::Right);
                    self.current = Some(r);
                    return self.current;
                }
                self.right.seek(doc.start);
            }
        }
    }

    pub fn collect_terms(
        &self,
        segment: &'a Segment,
        terms: &mut Vec<WordIsr<'a>>,
        seen: &mut HashSet<String>,
    ) {
        self.left.collect_terms(segment, terms, seen);
        self.right.collect_terms(segment, terms, seen);
    }
}
