//! Weighted synonym union
//!
//! Behaves like [`OrIsr`](super::OrIsr) but samples documents from its two
//! subtrees in a fixed ratio: `advance_left` consecutive documents from the
//! left (original term) side for every `advance_right` documents from the
//! right (synonym) side. At `advance = 1` on both sides this degenerates to
//! a plain alternating union. Terms collected from the right subtree are
//! marked as synonyms.

use std::collections::HashSet;

use super::{Isr, Post, Side, WordIsr};
use crate::segment::{DocumentPost, Location, Segment};

#[derive(Clone)]
pub struct SynOrIsr<'a> {
    left: Isr<'a>,
    right: Isr<'a>,
    advance_left: u32,
    advance_right: u32,
    initialized: bool,
    /// Side of the current emission
    current_side: Option<Side>,
    /// Side scheduled to emit, and emissions left in its phase
    phase: Side,
    quota: u32,
    nearest_start: Location,
    nearest_end: Location,
}

impl<'a> SynOrIsr<'a> {
    pub fn new(left: Isr<'a>, right: Isr<'a>, advance_right: u32, advance_left: u32) -> Self {
        let advance_left = advance_left.max(1);
        Self {
            left,
            right,
            advance_left,
            advance_right: advance_right.max(1),
            initialized: false,
            current_side: None,
            phase: Side::Left,
            quota: advance_left,
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

    fn child_mut(&mut self, side: Side) -> &mut Isr<'a> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    fn child_post(&self, side: Side) -> Option<Post> {
        match side {
            Side::Left => self.left.current_post(),
            Side::Right => self.right.current_post(),
        }
    }

    pub fn current_post(&self) -> Option<Post> {
        self.child_post(self.current_side?)
    }

    pub fn current_doc(&mut self) -> Option<DocumentPost> {
        match self.current_side? {
            Side::Left => self.left.current_doc(),
            Side::Right => self.right.current_doc(),
        }
    }

    /// Whether the current emission came from the synonym subtree
    pub fn is_synonym(&self) -> bool {
        self.current_side == Some(Side::Right)
    }

    /// Document-granular advance, honoring the sampling ratio
    pub fn next(&mut self) -> Option<Post> {
        if !self.initialized {
            self.initialized = true;
            self.left.next();
            self.right.next();
        } else if let Some(side) = self.current_side {
            self.child_mut(side).next();
        } else {
            return None;
        }
        self.schedule()
    }

    /// Emit the scheduled side's current post, switching phases as quotas
    /// drain or sides run dry
    fn schedule(&mut self) -> Option<Post> {
        if self.quota == 0 {
            self.switch_phase();
        }
        for _ in 0..2 {
            if let Some(post) = self.child_post(self.phase) {
                self.current_side = Some(self.phase);
                self.quota -= 1;
                self.nearest_start = post.start();
                self.nearest_end = post.end();
                return Some(post);
            }
            self.switch_phase();
        }
        self.current_side = None;
        None
    }

    fn switch_phase(&mut self) {
        self.phase = self.phase.other();
        self.quota = match self.phase {
            Side::Left => self.advance_left,
            Side::Right => self.advance_right,
        };
    }

    /// Posting-step advance: the emitting side moves by its step count
    pub fn next_internal(&mut self) -> Option<Post> {
        match self.current_side {
            None => {
                self.initialized = true;
                self.left.next_internal();
                self.right.next_internal();
            }
            Some(Side::Left) => {
                for _ in 0..self.advance_left {
                    self.left.next_internal();
                }
            }
            Some(Side::Right) => {
                for _ in 0..self.advance_right {
                    self.right.next_internal();
                }
            }
        }
        self.find_nearest()
    }

    pub fn seek(&mut self, target: Location) -> Option<Post> {
        if self.current_side.is_some() && self.nearest_start >= target {
            return self.current_post();
        }
        self.initialized = true;
        self.left.seek(target);
        self.right.seek(target);
        self.find_nearest()
    }

    /// Location-nearest selection; leaves the phase schedule untouched
    fn find_nearest(&mut self) -> Option<Post> {
        let l = self.left.current_post();
        let r = self.right.current_post();
        let side = match (l, r) {
            (None, None) => {
                self.current_side = None;
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
        self.current_side = Some(side);
        let post = self.child_post(side);
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
        let synonyms_from = terms.len();
        self.right.collect_terms(segment, terms, seen);
        for term in &mut terms[synonyms_from..] {
            term.set_synonym(true);
        }
    }
}
