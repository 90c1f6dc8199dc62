//! Exact-phrase iterator
//!
//! Aligns an ordered sequence of word iterators so a match at base location
//! `L` guarantees term `i` occurs at exactly `L + i`.

use std::collections::HashSet;

use super::WordIsr;
use crate::segment::{DocumentPost, Location, Segment, WordPost};

#[derive(Clone)]
pub struct PhraseIsr<'a> {
    terms: Vec<WordIsr<'a>>,
    current: Option<WordPost>,
}

impl<'a> PhraseIsr<'a> {
    pub fn new(segment: &'a Segment, stems: &[String]) -> Self {
        Self {
            terms: stems.iter().map(|s| WordIsr::open(segment, s)).collect(),
            current: None,
        }
    }

    pub fn current(&self) -> Option<WordPost> {
        self.current
    }

    pub fn post_count(&self) -> u32 {
        self.terms.first().map(|t| t.post_count()).unwrap_or(0)
    }

    pub fn next(&mut self) -> Option<WordPost> {
        if self.terms.is_empty() {
            return None;
        }
        if self.current.is_none() {
            for term in &mut self.terms {
                term.next();
            }
            return self.advance_to_match();
        }
        let doc = self.terms[0].current_doc()?;
        self.seek(doc.end + 1)
    }

    pub fn next_internal(&mut self) -> Option<WordPost> {
        if self.terms.is_empty() {
            return None;
        }
        match self.current {
            None => {
                for term in &mut self.terms {
                    term.next_internal();
                }
                self.advance_to_match()
            }
            Some(current) => self.seek(current.location + 1),
        }
    }

    pub fn seek(&mut self, target: Location) -> Option<WordPost> {
        if let Some(current) = self.current {
            if current.location >= target {
                return self.current;
            }
        }
        if self.terms.is_empty() {
            return None;
        }
        self.terms[0].seek(target);
        self.advance_to_match()
    }

    pub fn current_doc(&mut self) -> Option<DocumentPost> {
        self.current?;
        self.terms[0].current_doc()
    }

    /// Scanner protocol: anchor on the first term, demand each following
    /// term at the next consecutive Location, restart past the anchor on
    /// any mismatch
    fn advance_to_match(&mut self) -> Option<WordPost> {
        'outer: loop {
            let Some(first) = self.terms[0].current() else {
                self.current = None;
                return None;
            };
            let base = first.location;
            for i in 1..self.terms.len() {
                let expected = base + i as Location;
                let post = self.terms[i].seek(expected);
                if post.map(|p| p.location) != Some(expected) {
                    self.terms[0].seek(base + 1);
                    continue 'outer;
                }
            }
            self.current = self.terms[0].current();
            return self.current;
        }
    }

    pub fn collect_terms(
        &self,
        segment: &'a Segment,
        terms: &mut Vec<WordIsr<'a>>,
        seen: &mut HashSet<String>,
    ) {
        for term in &self.terms {
            if seen.insert(term.key().to_string()) {
                terms.push(WordIsr::open(segment, term.key()));
            }
        }
    }
}
