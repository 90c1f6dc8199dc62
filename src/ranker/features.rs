//! Feature extraction over candidate documents
//!
//! Static features come straight off the attribute table. Dynamic features
//! cluster query-term occurrences into spans around each occurrence of the
//! rarest term in the document and characterize their ordering, closeness,
//! and exactness.

use crate::isr::WordIsr;
use crate::segment::{DocumentAttributes, Location, Tld};

/// Terms within this many positions of their expected offset count as close
pub const CLOSE_THRESHOLD: u32 = 10;
/// Spans anchored at or before this Location count as top-position
pub const TOP_POSITION_THRESHOLD: Location = 100;

const UTILITY_URL_PATTERNS: [&str; 6] = ["privacy", "terms", "404", "error", "policy", "legal"];
const UTILITY_QUERY_TERMS: [&str; 7] = [
    "privacy", "terms", "policy", "legal", "contact", "about", "cookies",
];

/// Document-intrinsic ranking inputs
#[derive(Clone, Debug)]
pub struct StaticFeatures {
    pub word_count: u32,
    pub url_length: u32,
    pub title_length: u32,
    pub english: bool,
    pub tld: Tld,
    pub is_utility_page: bool,
}

/// One cluster of query-term occurrences around the rarest term
#[derive(Clone, Copy, Debug)]
pub struct Span {
    /// Matched other terms + 1 for the anchor
    pub term_count: usize,
    pub is_exact_phrase: bool,
    pub is_ordered: bool,
    pub is_close: bool,
    pub is_bold_heading: bool,
}

/// Query-interaction ranking inputs for one term list
#[derive(Clone, Debug, Default)]
pub struct DynamicFeatures {
    pub exact_phrase_count: usize,
    pub ordered_count: usize,
    pub close_count: usize,
    pub double_count: usize,
    pub triple_count: usize,
    pub bold_heading_count: usize,
    pub term_frequencies: Vec<u32>,
    pub top_position_spans: usize,
    pub first_span_position: Option<Location>,
    pub has_url_match: bool,
}

/// Whether a URL looks like site plumbing rather than content
pub fn is_utility_page(url: &str) -> bool {
    let url = url.to_ascii_lowercase();
    UTILITY_URL_PATTERNS
        .iter()
        .any(|pattern| url.contains(pattern))
}

/// A query is utility-focused when any non-leading term names site plumbing
pub fn is_utility_query(terms: &[WordIsr<'_>]) -> bool {
    terms
        .iter()
        .skip(1)
        .any(|term| UTILITY_QUERY_TERMS.contains(&term.stem()))
}

pub fn extract_static(attrs: &DocumentAttributes<'_>) -> StaticFeatures {
    StaticFeatures {
        word_count: attrs.word_count,
        url_length: attrs.url_length,
        title_length: attrs.title_length,
        english: attrs.english,
        tld: attrs.tld,
        is_utility_page: is_utility_page(attrs.url),
    }
}

/// Extract span features for one term list over the document `[start, end]`.
///
/// Seeks the supplied term cursors; callers hand in worker-private clones
/// positioned at the document start.
pub fn extract_dynamic(
    start: Location,
    end: Location,
    terms: &mut [WordIsr<'_>],
    url: Option<&str>,
) -> DynamicFeatures {
    let mut features = DynamicFeatures::default();
    if terms.is_empty() {
        return features;
    }

    features.term_frequencies = terms
        .iter()
        .map(|term| term.occurrences_in(start, end))
        .collect();

    if let Some(url) = url {
        let url = url.to_ascii_lowercase();
        features.has_url_match = terms.iter().any(|term| {
            let stem = term.stem().to_ascii_lowercase();
            !stem.is_empty() && url.contains(&stem)
        });
    }

    let rarest = features
        .term_frequencies
        .iter()
        .enumerate()
        .filter(|(_, &freq)| freq > 0)
        .min_by_key(|(_, &freq)| freq)
        .map(|(i, _)| i);
    let Some(rarest) = rarest else {
        return features;
    };

    // Expected offsets of the other terms relative to the rarest
    let others: Vec<(usize, i64)> = (0..terms.len())
        .filter(|&i| i != rarest)
        .map(|i| (i, i as i64 - rarest as i64))
        .collect();

    // Walk every occurrence of the rarest term without disturbing its
    // live cursor
    let mut anchor = terms[rarest].clone();
    let mut post = anchor.seek(start);
    while let Some(p) = post {
        if p.location > end {
            break;
        }
        let position = p.location;
        features.first_span_position.get_or_insert(position);

        let span = find_best_span(position, end, terms, rarest, &others);
        if span.is_bold_heading || p.flags.is_bold() || p.flags.is_heading() {
            features.bold_heading_count += 1;
        }

        if span.is_exact_phrase {
            features.exact_phrase_count += 1;
        } else if span.is_ordered {
            features.ordered_count += 1;
        } else if span.is_close {
            features.close_count += 1;
        }

        if span.term_count == 2 {
            features.double_count += 1;
        } else if span.term_count >= 3 || terms.len() == 1 {
            features.triple_count += 1;
        }

        if position <= TOP_POSITION_THRESHOLD {
            features.top_position_spans += 1;
        }

        post = anchor.next_internal();
    }

    features
}

/// Characterize the span anchored at one occurrence of the rarest term.
///
/// For each other term the window `expected ± CLOSE_THRESHOLD` (clipped to
/// the document) is scanned; the first occurrence in the window matches the
/// term for the span.
fn find_best_span(
    anchor: Location,
    doc_end: Location,
    terms: &mut [WordIsr<'_>],
    rarest: usize,
    others: &[(usize, i64)],
) -> Span {
    let mut span = Span {
        term_count: 1,
        is_exact_phrase: true,
        is_ordered: true,
        is_close: true,
        is_bold_heading: false,
    };

    let mut positions: Vec<(usize, Location)> = vec![(rarest, anchor)];
    for &(index, offset) in others {
        let expected = anchor as i64 + offset;
        let low = (expected - CLOSE_THRESHOLD as i64).max(0) as Location;
        let high = expected + CLOSE_THRESHOLD as i64;

        let mut matched: Option<Location> = None;
        let mut matched_exact = false;
        let mut post = terms[index].seek(low);
        while let Some(p) = post {
            if p.location as i64 > high || p.location > doc_end {
                break;
            }
            if p.flags.is_bold() || p.flags.is_heading() {
                span.is_bold_heading = true;
            }
            if p.location as i64 == expected {
                matched_exact = true;
            }
            if matched.is_none() {
                matched = Some(p.location);
            }
            post = terms[index].next_internal();
        }

        match matched {
            Some(position) => {
                span.term_count += 1;
                positions.push((index, position));
                if !matched_exact {
                    span.is_exact_phrase = false;
                }
            }
            None => {
                span.is_exact_phrase = false;
                span.is_ordered = false;
                span.is_close = false;
            }
        }
    }

    // Ordered means positions strictly increase in query-term order
    positions.sort_by_key(|&(index, _)| index);
    if positions
        .windows(2)
        .any(|pair| pair[1].1 <= pair[0].1)
    {
        span.is_ordered = false;
    }

    span
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::testutil::write_segment;
    use crate::segment::WordFlags;

    #[test]
    fn test_utility_page_detection() {
        assert!(is_utility_page("https://example.com/Privacy-policy"));
        assert!(is_utility_page("https://example.com/404"));
        assert!(!is_utility_page("https://example.com/articles/rust"));
    }

    #[test]
    fn test_single_term_spans_are_exact() {
        let b = WordFlags(0);
        let (_dir, segment) = write_segment(|w| {
            w.add_document("https://one.com", "", &[("x", b), ("y", b), ("x", b)], true);
        });

        let mut terms = vec![WordIsr::open(&segment, "x")];
        let features = extract_dynamic(1, 5, &mut terms, None);
        assert_eq!(features.term_frequencies, vec![2]);
        assert_eq!(features.exact_phrase_count, 2);
        assert_eq!(features.triple_count, 2);
        assert_eq!(features.first_span_position, Some(1));
        assert_eq!(features.top_position_spans, 2);
    }

    #[test]
    fn test_adjacent_terms_form_exact_phrase() {
        let b = WordFlags(0);
        let (_dir, segment) = write_segment(|w| {
            w.add_document("https://one.com", "", &[("quick", b), ("fox", b)], true);
        });

        let mut terms = vec![
            WordIsr::open(&segment, "quick"),
            WordIsr::open(&segment, "fox"),
        ];
        let features = extract_dynamic(1, 4, &mut terms, None);
        assert_eq!(features.exact_phrase_count, 1);
        assert_eq!(features.ordered_count, 0);
        assert_eq!(features.double_count, 1);
    }

    #[test]
    fn test_separated_terms_are_ordered_not_exact() {
        let b = WordFlags(0);
        let (_dir, segment) = write_segment(|w| {
            w.add_document(
                "https://one.com",
                "",
                &[("quick", b), ("red", b), ("fox", b)],
                true,
            );
        });

        let mut terms = vec![
            WordIsr::open(&segment, "quick"),
            WordIsr::open(&segment, "fox"),
        ];
        let features = extract_dynamic(1, 5, &mut terms, None);
        // fox sits one past its expected offset: ordered and close, not exact
        assert_eq!(features.exact_phrase_count, 0);
        assert_eq!(features.ordered_count, 1);
        assert_eq!(features.double_count, 1);
    }

    #[test]
    fn test_unmatched_other_term() {
        let b = WordFlags(0);
        let (_dir, segment) = write_segment(|w| {
            w.add_document("https://one.com", "", &[("quick", b)], true);
        });

        let mut terms = vec![
            WordIsr::open(&segment, "quick"),
            WordIsr::open(&segment, "fox"),
        ];
        let features = extract_dynamic(1, 3, &mut terms, None);
        assert_eq!(features.exact_phrase_count, 0);
        assert_eq!(features.ordered_count, 0);
        assert_eq!(features.close_count, 0);
        // Lone anchor with a two-term query is neither a double nor triple
        assert_eq!(features.double_count, 0);
        assert_eq!(features.triple_count, 0);
    }

    #[test]
    fn test_bold_heading_counted() {
        let bold = WordFlags(WordFlags::BOLD);
        let plain = WordFlags(0);
        let (_dir, segment) = write_segment(|w| {
            w.add_document("https://one.com", "", &[("x", bold), ("y", plain)], true);
        });

        let mut terms = vec![WordIsr::open(&segment, "x")];
        let features = extract_dynamic(1, 4, &mut terms, None);
        assert_eq!(features.bold_heading_count, 1);
    }

    #[test]
    fn test_url_match() {
        let b = WordFlags(0);
        let (_dir, segment) = write_segment(|w| {
            w.add_document("https://rust-lang.org", "", &[("rust", b)], true);
        });

        let mut terms = vec![WordIsr::open(&segment, "rust")];
        let features = extract_dynamic(1, 3, &mut terms, Some("https://rust-lang.org"));
        assert!(features.has_url_match);

        let mut other = vec![WordIsr::open(&segment, "rust")];
        let features = extract_dynamic(1, 3, &mut other, Some("https://python.org"));
        assert!(!features.has_url_match);
    }

    #[test]
    fn test_utility_query_ignores_leading_term() {
        let b = WordFlags(0);
        let (_dir, segment) = write_segment(|w| {
            w.add_document("https://one.com", "", &[("privacy", b), ("rust", b)], true);
        });

        let leading = vec![
            WordIsr::open(&segment, "privacy"),
            WordIsr::open(&segment, "rust"),
        ];
        assert!(!is_utility_query(&leading));

        let trailing = vec![
            WordIsr::open(&segment, "rust"),
            WordIsr::open(&segment, "privacy"),
        ];
        assert!(is_utility_query(&trailing));
    }
}
