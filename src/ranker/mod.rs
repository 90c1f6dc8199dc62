//! Parallel document ranker
//!
//! A fixed pool of worker threads shares one iterator-tree root behind a
//! mutex. Each worker claims the next candidate document under the lock,
//! scores it lock-free against private clones of the flattened term
//! cursors, and merges into a bounded top-K buffer under a second lock.

pub mod features;
pub mod scoring;

use parking_lot::Mutex;
use std::thread;
use tracing::{debug, warn};

use crate::isr::{Isr, IsrTree, WordIsr};
use crate::segment::{DocumentAttributes, DocumentPost, Location, Segment};
use features::{extract_dynamic, extract_static, is_utility_query};
use scoring::{
    dynamic_score, static_score, BODY_WEIGHT, DYNAMIC_THRESHOLD, MAX_RANKED_TITLE_WORDS,
    ORIGINAL_WEIGHT, STATIC_THRESHOLD, SYNONYM_WEIGHT, TITLE_WEIGHT,
};

/// Candidate documents scored per segment before the ranker stops
pub const MAX_DOCS: u32 = 100;
/// Default worker pool size
pub const DEFAULT_WORKERS: usize = 14;
/// Default results kept per segment
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// One scored document
#[derive(Clone, Debug)]
pub struct RankingResult {
    pub url: String,
    pub title: String,
    pub score: f64,
}

struct RankState {
    results: Vec<RankingResult>,
    processed: u32,
}

/// Root iterator plus the start of the last claimed document, guarded by
/// one mutex so every worker observes a strictly increasing sequence
struct RootCursor<'t, 'a> {
    root: &'t mut Isr<'a>,
    last_doc_start: Location,
}

/// Ranks the candidates of one iterator tree over one segment
pub struct Ranker<'a> {
    segment: &'a Segment,
    max_results: usize,
    workers: usize,
}

impl<'a> Ranker<'a> {
    pub fn new(segment: &'a Segment) -> Self {
        Self {
            segment,
            max_results: DEFAULT_MAX_RESULTS,
            workers: DEFAULT_WORKERS,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Drive the tree to exhaustion (or the candidate cap) and return the
    /// top results, score-descending
    pub fn rank(&self, tree: &mut IsrTree<'a>) -> Vec<RankingResult> {
        let segment = self.segment;
        let proto_terms = tree.flattened_terms();
        if proto_terms.is_empty() {
            debug!("query has no leaf terms; nothing to rank");
        }
        let utility_query = is_utility_query(&proto_terms);

        let root = Mutex::new(RootCursor {
            root: tree.root_mut(),
            last_doc_start: 0,
        });
        let state = Mutex::new(RankState {
            results: Vec::new(),
            processed: 0,
        });

        thread::scope(|scope| {
            for _ in 0..self.workers {
                scope.spawn(|| {
                    worker(
                        segment,
                        &root,
                        &state,
                        &proto_terms,
                        utility_query,
                        self.max_results,
                    );
                });
            }
        });

        state.into_inner().results
    }
}

/// Claim the next candidate document under the root-cursor mutex.
///
/// Returns `None` when the tree is exhausted or when the root stops
/// producing strictly increasing document starts (the looping guard, which
/// also keeps an exhausted-and-rewound leaf from handing out a document a
/// second time).
fn claim_next<'a>(
    root: &Mutex<RootCursor<'_, 'a>>,
    segment: &'a Segment,
) -> Option<(DocumentPost, DocumentAttributes<'a>)> {
    let mut cursor = root.lock();
    let post = cursor.root.next()?;
    if post.start() <= cursor.last_doc_start {
        warn!(
            start = post.start(),
            last = cursor.last_doc_start,
            "root cursor stopped advancing; terminating worker"
        );
        return None;
    }
    cursor.last_doc_start = post.start();
    let doc = cursor.root.current_doc()?;
    let attrs = segment.attributes(doc.doc_id)?;
    Some((doc, attrs))
}

fn worker<'a>(
    segment: &'a Segment,
    root: &Mutex<RootCursor<'_, 'a>>,
    state: &Mutex<RankState>,
    proto_terms: &[WordIsr<'a>],
    utility_query: bool,
    max_results: usize,
) {
    // Private cursor clones, split by title/body and original/synonym
    let clone_where = |title: bool, synonym: bool| -> Vec<WordIsr<'a>> {
        proto_terms
            .iter()
            .filter(|t| t.is_title_term() == title && t.is_synonym() == synonym)
            .cloned()
            .collect()
    };
    let mut title_terms = clone_where(true, false);
    let mut body_terms = clone_where(false, false);
    let mut title_synonyms = clone_where(true, true);
    let mut body_synonyms = clone_where(false, true);

    loop {
        let Some((doc, attrs)) = claim_next(root, segment) else {
            break;
        };

        let static_features = extract_static(&attrs);
        // Hard cutoff regardless of other signals
        if static_features.title_length > MAX_RANKED_TITLE_WORDS {
            continue;
        }
        let static_part = static_score(&static_features, utility_query);
        if static_part < STATIC_THRESHOLD {
            continue;
        }

        for list in [
            &mut title_terms,
            &mut body_terms,
            &mut title_synonyms,
            &mut body_synonyms,
        ] {
            for term in list.iter_mut() {
                term.seek(doc.start);
            }
        }

        let body_length = attrs.word_count.saturating_sub(attrs.title_length);
        let title_features = extract_dynamic(doc.start, doc.end, &mut title_terms, Some(attrs.url));
        let body_features = extract_dynamic(doc.start, doc.end, &mut body_terms, None);
        let mut dynamic_part = TITLE_WEIGHT
            * dynamic_score(&title_features, true, attrs.title_length)
            + BODY_WEIGHT * dynamic_score(&body_features, false, body_length);

        if dynamic_part < DYNAMIC_THRESHOLD {
            // Second chance on the synonym-marked terms alone
            let title_features =
                extract_dynamic(doc.start, doc.end, &mut title_synonyms, Some(attrs.url));
            let body_features = extract_dynamic(doc.start, doc.end, &mut body_synonyms, None);
            let synonym_part = TITLE_WEIGHT
                * dynamic_score(&title_features, true, attrs.title_length)
                + BODY_WEIGHT * dynamic_score(&body_features, false, body_length);
            dynamic_part = SYNONYM_WEIGHT * synonym_part + ORIGINAL_WEIGHT * dynamic_part;
            if dynamic_part < DYNAMIC_THRESHOLD {
                continue;
            }
        }

        let score = 0.75 * dynamic_part + 0.25 * static_part;
        let title = if attrs.title.is_empty() {
            attrs.url
        } else {
            attrs.title
        };
        let result = RankingResult {
            url: attrs.url.to_string(),
            title: title.to_string(),
            score,
        };

        let mut state = state.lock();
        insert_result(&mut state.results, result, max_results);
        state.processed += 1;
        if state.processed >= MAX_DOCS {
            break;
        }
    }
}

/// Insertion-sorted, bounded top-K merge; equal scores keep insertion order
fn insert_result(results: &mut Vec<RankingResult>, new: RankingResult, max_results: usize) {
    if max_results == 0 {
        return;
    }
    if results.len() < max_results {
        results.push(new);
    } else {
        let weakest = results.last().map(|r| r.score).unwrap_or(f64::MIN);
        if new.score <= weakest {
            return;
        }
        *results.last_mut().expect("non-empty at capacity") = new;
    }
    let mut i = results.len() - 1;
    while i > 0 && results[i - 1].score < results[i].score {
        results.swap(i - 1, i);
        i -= 1;
    }
}
