//! Union iterator
//!
//! Tracks which child holds the nearer post and emits the document-level
//! union of both children. Ties break to the left child.

use std::collections::HashSet;

use super::{Isr, Post, Side, WordIsr};
use crate::segment::{DocumentPost, Location, Segment};

#[derive(Clone)]
pub struct OrIsr<'a> {
    left: Isr<'a>,
    right: Isr<'a>,
    nearest: Option<Side>,
    nearest_start: Location,
    nearest_end: Location,
}

impl<'a> OrIsr<'a> {
    pub fn new(left: Isr<'a>, right: Isr<'a>) -> Self {
        Self {
            left,
            right,
            nearest: None,
            nearest_start: 0,
            nearest_end: 0,
        }
    }

    pub fn post_count(&self) -> u32 {
        self.left.post_count().saturating_add(self.right.post_count())
    }

    pub fn start_location(&self) -> Location {
        self.nearest_start
    }

    pub fn end_location(&self) -> Location {
        self.nearest_end
    }

    pub fn current_post(&self) -> Option<Post> {
        match self.nearest? {
            Side::Left => self.left.current_post(),
            Side::Right => self.right.current_post(),
        }
    }

    pub fn current_doc(&mut self) -> Option<DocumentPost> {
        match self.nearest? {
            Side::Left => self.left.current_doc(),
            Side::Right => self.right.current_doc(),
        }
    }

    pub fn next(&mut self) -> Option<Post> {
        match self.nearest {
            None => {
                self.left.next();
                self.right.next();
                self.find_nearest()
            }
            Some(_) => {
                let doc = self.current_doc()?;
                self.seek(doc.end + 1)
            }
        }
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
        self.find_nearest()
    }

    pub fn seek(&mut self, target: Location) -> Option<Post> {
        if self.nearest.is_some() && self.nearest_start >= target {
            return self.current_post();
        }
        self.left.seek(target);
        self.right.seek(target);
        self.find_nearest()
    }

    fn find_nearest(&mut self) -> Option<Post> {
        let l = self.left.current_post();
        let r = self.right.current_post();
        let side = match (l, r) {
            (None, None) => {
                self.nearest = None;
                return None;
            }
            (Some(lp), Some(rp)) => {
                if lp.start() <= rp.start() {
                    Side::Left
                } else {
                    Side::Right
                }
            }
            (Some(_), None) => Side::Left,
            (None, Some(_)) => Side::Right,
        };
        let post = match side {
            Side::Left => l,
            Side::Right => r,
        };
        self.nearest = Some(side);
        if let Some(post) = post {
            self.nearest_start = post.start();
            self.nearest_end = post.end();
        }
        post
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
