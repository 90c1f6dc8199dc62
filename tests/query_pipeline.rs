//! End-to-end query scenarios over fabricated segments

use nautex::query::read_query;
use nautex::segment::{LockBudget, Segment, SegmentWriter, WordFlags};
use nautex::{ShardConfig, ShardMetrics, ShardServer};
use std::io::Cursor;
use tempfile::TempDir;

fn open_segment(fill: impl FnOnce(&mut SegmentWriter)) -> (TempDir, Segment) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("segment.bin");
    let mut writer = SegmentWriter::new();
    fill(&mut writer);
    writer.write_to(&path).unwrap();
    let budget = LockBudget::new(0);
    let segment = Segment::open(&path, &budget).unwrap();
    (dir, segment)
}

fn server(segments: Vec<Segment>) -> ShardServer {
    let config = ShardConfig::default().with_workers(2);
    ShardServer::new(segments, config, ShardMetrics::new().unwrap())
}

fn run(server: &ShardServer, query: &[u8]) -> Vec<nautex::RankingResult> {
    let expr = read_query(&mut Cursor::new(query)).unwrap();
    server.execute(&expr)
}

/// doc0 "a b c", doc1 "b c d"
fn two_doc_corpus() -> (TempDir, Segment) {
    let b = WordFlags(0);
    open_segment(|w| {
        w.add_document("https://one.com", "", &[("a", b), ("b", b), ("c", b)], true);
        w.add_document("https://two.com", "", &[("b", b), ("c", b), ("d", b)], true);
    })
}

#[test]
fn single_word_matches_both_documents() {
    let (_dir, segment) = two_doc_corpus();
    let server = server(vec![segment]);

    let results = run(&server, b"{b>#");
    assert_eq!(results.len(), 2);
    assert!(results[0].score > 0.0);
    let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
    assert!(urls.contains(&"https://one.com"));
    assert!(urls.contains(&"https://two.com"));
}

#[test]
fn phrase_requires_adjacency() {
    let b = WordFlags(0);
    let (_dir, segment) = open_segment(|w| {
        w.add_document("https://one.com", "", &[("a", b), ("b", b), ("c", b)], true);
        w.add_document("https://two.com", "", &[("b", b), ("c", b), ("d", b)], true);
        w.add_document("https://three.com", "", &[("z", b), ("a", b), ("b", b)], true);
        w.add_document("https://four.com", "", &[("a", b), ("z", b), ("b", b)], true);
    });
    let server = server(vec![segment]);

    let results = run(&server, b"<a b>#");
    let mut urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
    urls.sort();
    assert_eq!(urls, vec!["https://one.com", "https://three.com"]);
}

#[test]
fn boolean_and_intersects() {
    let (_dir, segment) = two_doc_corpus();
    let server = server(vec![segment]);

    let results = run(&server, b"&{a>{c>#");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url, "https://one.com");
}

#[test]
fn exclusion_drops_documents_with_excluded_term() {
    let (_dir, segment) = two_doc_corpus();
    let server = server(vec![segment]);

    let results = run(&server, b"-{b>{d>#");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url, "https://one.com");
}

#[test]
fn empty_and_unknown_terms_yield_empty_results() {
    let (_dir, segment) = two_doc_corpus();
    let server = server(vec![segment]);

    assert!(run(&server, b"{nosuchterm>#").is_empty());
    assert!(run(&server, b"&{a>{nosuchterm>#").is_empty());
}

#[test]
fn synonym_or_returns_original_term_documents() {
    let b = WordFlags(0);
    let (_dir, segment) = open_segment(|w| {
        w.add_document("https://cat0.com", "", &[("cat", b)], true);
        w.add_document("https://fel1.com", "", &[("feline", b)], true);
        w.add_document("https://cat2.com", "", &[("cat", b)], true);
    });
    let server = server(vec![segment]);

    let mut query = Vec::new();
    query.extend_from_slice(b"/{cat>{feline>");
    query.extend_from_slice(&1u32.to_be_bytes());
    query.push(b';');
    query.extend_from_slice(&2u32.to_be_bytes());
    query.push(b';');
    query.push(b'#');

    let results = run(&server, &query);
    let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
    assert!(urls.contains(&"https://cat0.com"));
    assert!(urls.contains(&"https://cat2.com"));
}

#[test]
fn synonym_fallback_rescues_title_matched_synonym() {
    let b = WordFlags(0);
    let (_dir, segment) = open_segment(|w| {
        // Matches only through the synonym subtree, but in the title
        w.add_document("https://feline.com", "feline care", &[("grooming", b)], true);
    });
    let server = server(vec![segment]);

    // Query: cat OR-SYN (feline OR @feline)
    let mut query = Vec::new();
    query.extend_from_slice(b"/{cat>|{feline>{@feline>");
    query.extend_from_slice(&1u32.to_be_bytes());
    query.push(b';');
    query.extend_from_slice(&2u32.to_be_bytes());
    query.push(b';');
    query.push(b'#');

    let results = run(&server, &query);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url, "https://feline.com");
}

#[test]
fn results_merge_across_segments() {
    let b = WordFlags(0);
    let (_dir1, seg1) = open_segment(|w| {
        w.add_document("https://one.com", "", &[("shared", b)], true);
    });
    let (_dir2, seg2) = open_segment(|w| {
        w.add_document("https://two.com", "", &[("shared", b)], true);
    });
    let server = server(vec![seg1, seg2]);

    let results = run(&server, b"{shared>#");
    assert_eq!(results.len(), 2);
    // Merged output stays score-descending
    assert!(results[0].score >= results[1].score);
}

#[test]
fn fixed_query_is_deterministic_across_runs() {
    let b = WordFlags(0);
    let (_dir, segment) = open_segment(|w| {
        for i in 0..20 {
            let url = format!("https://site{:02}.com/{}", i, "x".repeat(i));
            w.add_document(&url, "", &[("term", b), ("other", b)], true);
        }
    });
    let server = server(vec![segment]);

    let first = run(&server, b"{term>#");
    let second = run(&server, b"{term>#");
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.url, b.url);
        assert_eq!(a.score.to_bits(), b.score.to_bits());
    }
}
