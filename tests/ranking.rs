//! Ranking behavior: cutoffs, ordering, bounds

use nautex::query::read_query;
use nautex::segment::{
    LockBudget, PostingListBuilder, Segment, SegmentWriter, TermDictBuilder, UrlTableBuilder,
    WordFlags, WordPost,
};
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

/// Assemble a segment by hand so attribute records can claim values the
/// writer would refuse (here: a 50-word title)
fn handcrafted_long_title_segment(dir: &TempDir) -> Segment {
    let mut urls = UrlTableBuilder::new();
    urls.push("https://fifty.com", "endless title", 8, 50, 1, 60, true);
    urls.push("https://short.com", "short title", 8, 2, 61, 70, true);
    let mut url_blob = Vec::new();
    urls.serialize(&mut url_blob);

    let mut posts = PostingListBuilder::new();
    posts.push_word(&WordPost::new(55, WordFlags(0)));
    posts.push_word(&WordPost::new(65, WordFlags(0)));
    let mut posting = Vec::new();
    posts.serialize_words(&mut posting);

    let mut dict = TermDictBuilder::new();
    dict.insert("term".to_string(), posting);
    let mut hash_blob = Vec::new();
    dict.serialize(&mut hash_blob);

    let mut doc_end = PostingListBuilder::new();
    doc_end.push_doc(&nautex::segment::DocumentPost::new(1, 60, 0));
    doc_end.push_doc(&nautex::segment::DocumentPost::new(61, 70, 1));

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&1u32.to_ne_bytes()); // words
    bytes.extend_from_slice(&2u32.to_ne_bytes()); // documents
    bytes.extend_from_slice(&4u32.to_ne_bytes()); // locations
    bytes.extend_from_slice(&70u32.to_ne_bytes()); // max location
    bytes.extend_from_slice(&(url_blob.len() as u32).to_ne_bytes());
    bytes.extend_from_slice(&(hash_blob.len() as u32).to_ne_bytes());
    bytes.extend_from_slice(&url_blob);
    bytes.extend_from_slice(&hash_blob);
    doc_end.serialize_docs(&mut bytes);

    let path = dir.path().join("handmade.bin");
    std::fs::write(&path, &bytes).unwrap();
    Segment::open(&path, &LockBudget::new(0)).unwrap()
}

#[test]
fn over_long_titles_are_rejected_regardless_of_matches() {
    let dir = tempfile::tempdir().unwrap();
    let segment = handcrafted_long_title_segment(&dir);
    let server = server(vec![segment]);

    let results = run(&server, b"{term>#");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url, "https://short.com");
}

#[test]
fn title_matches_outrank_body_matches() {
    let b = WordFlags(0);
    let (_dir, segment) = open_segment(|w| {
        w.add_document("https://a-site.com", "", &[("rust", b)], true);
        w.add_document("https://b-site.com", "rust guide", &[("intro", b)], true);
    });
    let server = server(vec![segment]);

    // Body OR title occurrence of the same stem
    let results = run(&server, b"|{rust>{@rust>#");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].url, "https://b-site.com");
    assert!(results[0].score > results[1].score);
}

#[test]
fn non_english_documents_are_penalized() {
    let b = WordFlags(0);
    let (_dir, segment) = open_segment(|w| {
        w.add_document("https://en.com", "", &[("word", b)], true);
        w.add_document("https://de.com", "", &[("word", b)], false);
    });
    let server = server(vec![segment]);

    let results = run(&server, b"{word>#");
    // The non-English document falls below the static threshold entirely
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url, "https://en.com");
}

#[test]
fn utility_pages_are_buried_unless_requested() {
    let b = WordFlags(0);
    let (_dir, segment) = open_segment(|w| {
        w.add_document("https://shop.com/products", "", &[("widget", b)], true);
        w.add_document(
            "https://shop.com/privacy",
            "",
            &[("widget", b), ("privacy", b)],
            true,
        );
    });
    let server = server(vec![segment]);

    let results = run(&server, b"{widget>#");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url, "https://shop.com/products");

    // A utility query lifts the penalty
    let results = run(&server, b"&{widget>{privacy>#");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url, "https://shop.com/privacy");
}

#[test]
fn results_are_bounded_sorted_and_unique() {
    let b = WordFlags(0);
    let (_dir, segment) = open_segment(|w| {
        for i in 0..30 {
            let url = format!("https://site{:02}.com/{}", i, "p".repeat(i % 7));
            w.add_document(&url, "", &[("common", b), ("filler", b)], true);
        }
    });
    let server = server(vec![segment]);

    let results = run(&server, b"{common>#");
    assert!(!results.is_empty());
    assert!(results.len() <= 10);

    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    let mut urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
    urls.sort();
    urls.dedup();
    assert_eq!(urls.len(), results.len());
}

#[test]
fn tld_quality_orders_identical_documents() {
    let b = WordFlags(0);
    let (_dir, segment) = open_segment(|w| {
        w.add_document("https://one.xyz", "", &[("word", b)], true);
        w.add_document("https://one.gov", "", &[("word", b)], true);
        w.add_document("https://one.com", "", &[("word", b)], true);
    });
    let server = server(vec![segment]);

    let results = run(&server, b"{word>#");
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].url, "https://one.gov");
    assert_eq!(results[1].url, "https://one.com");
    assert_eq!(results[2].url, "https://one.xyz");
}
