//! Two-stage scoring: static document quality and dynamic span quality
//!
//! All weights are fixed. The static stage scores document-intrinsic
//! signals and applies the hard cutoffs; the dynamic stage scores how well
//! the query interacts with the document, run separately over title and
//! body terms.

use super::features::{DynamicFeatures, StaticFeatures};
use crate::segment::Tld;

pub const EXACT_PHRASE_WEIGHT: f64 = 0.55;
pub const ORDERED_SPAN_WEIGHT: f64 = 0.10;
pub const CLOSE_SPAN_WEIGHT: f64 = 0.23;
pub const DOUBLE_SPAN_WEIGHT: f64 = 0.08;
pub const TRIPLE_SPAN_WEIGHT: f64 = 0.04;
pub const TOP_POSITION_WEIGHT: f64 = 1.0;

pub const ALL_FREQUENT_WEIGHT: f64 = 0.57;
pub const MOST_FREQUENT_WEIGHT: f64 = 0.29;
pub const SOME_FREQUENT_WEIGHT: f64 = 0.14;
pub const MOST_WORDS_RATIO: f64 = 0.7;
pub const FREQUENT_THRESHOLD: f64 = 0.01;

pub const URL_LENGTH_WEIGHT: f64 = 0.35;
pub const TLD_WEIGHT: f64 = 0.35;
pub const DOC_LENGTH_WEIGHT: f64 = 0.15;
pub const TITLE_LENGTH_WEIGHT: f64 = 0.15;
pub const OPTIMAL_TITLE_LENGTH: f64 = 10.0;
pub const NON_ENGLISH_PENALTY: f64 = 0.14;
pub const UTILITY_PAGE_PENALTY: f64 = 0.15;
pub const URL_TERM_MATCH_BOOST: f64 = 1.2;

pub const TITLE_WEIGHT: f64 = 0.7;
pub const BODY_WEIGHT: f64 = 0.3;
pub const SYNONYM_WEIGHT: f64 = 0.4;
pub const ORIGINAL_WEIGHT: f64 = 0.6;

pub const STATIC_THRESHOLD: f64 = 0.25;
pub const DYNAMIC_THRESHOLD: f64 = 0.1;
/// Documents with titles longer than this many words are rejected outright
pub const MAX_RANKED_TITLE_WORDS: u32 = (OPTIMAL_TITLE_LENGTH * 4.0) as u32;

/// Quality prior per TLD category
pub fn tld_score(tld: Tld) -> f64 {
    match tld {
        Tld::Gov => 1.0,
        Tld::Edu => 0.95,
        Tld::Org => 0.9,
        Tld::Com => 0.75,
        Tld::Net | Tld::Us => 0.7,
        Tld::Io | Tld::Dev => 0.6,
        Tld::Info => 0.4,
        Tld::Biz => 0.3,
        Tld::Xyz => 0.2,
        Tld::Top => 0.1,
        Tld::Unknown => 0.05,
    }
}

/// Static document score in `[0, 1]`
pub fn static_score(features: &StaticFeatures, is_utility_query: bool) -> f64 {
    let url_score = (-0.02 * features.url_length as f64).exp();

    let length_diff = features.word_count as f64 - 600.0;
    let length_score = 1.0 / (1.0 + length_diff * length_diff / 250_000.0);

    let title_over = (features.title_length as f64 - OPTIMAL_TITLE_LENGTH).max(0.0);
    let title_score = (-0.08 * title_over).exp();

    let mut score = url_score * URL_LENGTH_WEIGHT
        + tld_score(features.tld) * TLD_WEIGHT
        + length_score * DOC_LENGTH_WEIGHT
        + title_score * TITLE_LENGTH_WEIGHT;

    if !features.english {
        score *= NON_ENGLISH_PENALTY;
    }
    if features.is_utility_page && !is_utility_query {
        score *= UTILITY_PAGE_PENALTY;
    }
    score
}

/// Dynamic score for one term list over one document
pub fn dynamic_score(features: &DynamicFeatures, is_title: bool, doc_length: u32) -> f64 {
    let total = features.exact_phrase_count
        + features.ordered_count
        + features.close_count
        + features.double_count
        + features.triple_count;

    let mut span_score = 0.0;
    if total > 0 {
        span_score = (features.exact_phrase_count as f64 * EXACT_PHRASE_WEIGHT
            + features.ordered_count as f64 * ORDERED_SPAN_WEIGHT
            + features.close_count as f64 * CLOSE_SPAN_WEIGHT
            + features.double_count as f64 * DOUBLE_SPAN_WEIGHT
            + features.triple_count as f64 * TRIPLE_SPAN_WEIGHT)
            / total as f64;
        if !is_title {
            // Sigmoid boosts that grow with span count and bold/heading hits
            let span_boost = 0.3 + 0.7 / (1.0 + (-1.2 * (total as f64 - 4.0)).exp());
            let bold_boost = 0.7
                + 0.3 / (1.0 + (-4.0 * (features.bold_heading_count as f64 - 1.0)).exp());
            span_score *= span_boost * bold_boost;
        }
    }

    let position_score = features.top_position_spans as f64 * TOP_POSITION_WEIGHT;

    let mut frequency_score = 0.0;
    if !features.term_frequencies.is_empty() {
        let doc_length = doc_length.max(1) as f64;
        let frequent = features
            .term_frequencies
            .iter()
            .filter(|&&freq| freq as f64 / doc_length >= FREQUENT_THRESHOLD)
            .count();
        let term_count = features.term_frequencies.len();
        frequency_score = if frequent == term_count {
            ALL_FREQUENT_WEIGHT
        } else if frequent as f64 >= term_count as f64 * MOST_WORDS_RATIO {
            MOST_FREQUENT_WEIGHT
        } else if frequent > 0 {
            SOME_FREQUENT_WEIGHT
        } else {
            0.0
        };
    }

    let mut score = 0.5 * span_score + 0.3 * position_score + 0.2 * frequency_score;
    if features.has_url_match && is_title {
        score *= URL_TERM_MATCH_BOOST;
    }
    score
}
