//! Shard server loop
//!
//! One listening endpoint; each accepted connection carries exactly one
//! query. The query runs across every local segment sequentially, the
//! per-segment score-ordered lists are merged by repeated max-head
//! selection, and the bounded result list is framed back to the client.
//! Connection-scoped errors close that connection and nothing else.

use std::io::{BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Instant;

use byteorder::{BigEndian, WriteBytesExt};
use tracing::{debug, info, warn};

use crate::config::ShardConfig;
use crate::error::Result;
use crate::metrics::ShardMetrics;
use crate::query::{read_query, Expr};
use crate::ranker::{Ranker, RankingResult};
use crate::segment::Segment;

pub struct ShardServer {
    segments: Vec<Segment>,
    config: ShardConfig,
    metrics: ShardMetrics,
}

impl ShardServer {
    pub fn new(segments: Vec<Segment>, config: ShardConfig, metrics: ShardMetrics) -> Self {
        metrics.segments_loaded.set(segments.len() as f64);
        metrics
            .mapped_bytes
            .set(segments.iter().map(|s| s.size_bytes() as f64).sum());
        Self {
            segments,
            config,
            metrics,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Accept connections forever, one query per connection
    pub fn serve(&self) -> Result<()> {
        let listener = TcpListener::bind(("0.0.0.0", self.config.port))?;
        info!(port = self.config.port, segments = self.segments.len(), "shard listening");

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            };
            if let Err(e) = self.handle_client(stream) {
                // Malformed queries and truncated streams only cost the
                // offending client its connection
                self.metrics.query_errors.inc();
                warn!(error = %e, "query failed");
            }
        }
        Ok(())
    }

    /// Run one query end to end over an accepted connection
    pub fn handle_client(&self, stream: TcpStream) -> Result<()> {
        let started = Instant::now();
        let mut reader = BufReader::new(stream);
        let expr = read_query(&mut reader)?;
        let results = self.execute(&expr);

        let mut stream = reader.into_inner();
        write_results(&mut stream, &results)?;
        stream.flush()?;

        self.metrics.queries_total.inc();
        if results.is_empty() {
            self.metrics.empty_results.inc();
        }
        let elapsed = started.elapsed();
        self.metrics.query_latency.observe(elapsed.as_secs_f64());
        info!(results = results.len(), elapsed_ms = elapsed.as_millis() as u64, "query served");
        Ok(())
    }

    /// Execute a parsed query across all local segments and merge
    pub fn execute(&self, expr: &Expr) -> Vec<RankingResult> {
        let mut per_segment = Vec::new();
        let mut candidates = 0;
        for segment in &self.segments {
            let mut tree = expr.to_tree(segment);
            let ranker = Ranker::new(segment)
                .with_max_results(self.config.max_results)
                .with_workers(self.config.ranker_workers);
            let partial = ranker.rank(&mut tree);
            candidates += partial.len();
            debug!(
                segment = %segment.path().display(),
                results = partial.len(),
                "segment ranked"
            );
            per_segment.push(partial);
            if candidates > self.config.max_ranked_docs {
                break;
            }
        }
        merge_ranked(per_segment, self.config.max_results)
    }
}

/// K-way merge of score-descending lists by repeated max-head selection
pub fn merge_ranked(lists: Vec<Vec<RankingResult>>, limit: usize) -> Vec<RankingResult> {
    let mut heads = vec![0usize; lists.len()];
    let mut merged = Vec::with_capacity(limit);
    while merged.len() < limit {
        let mut best: Option<usize> = None;
        let mut best_score = f64::MIN;
        for (i, list) in lists.iter().enumerate() {
            if let Some(candidate) = list.get(heads[i]) {
                if candidate.score > best_score {
                    best_score = candidate.score;
                    best = Some(i);
                }
            }
        }
        let Some(i) = best else { break };
        merged.push(lists[i][heads[i]].clone());
        heads[i] += 1;
    }
    merged
}

/// Frame results on the wire: big-endian count, then per result the URL and
/// title lines and the IEEE-754 score bits
pub fn write_results<W: Write>(writer: &mut W, results: &[RankingResult]) -> std::io::Result<()> {
    writer.write_u32::<BigEndian>(results.len() as u32)?;
    for result in results {
        writer.write_all(result.url.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.write_all(result.title.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.write_u64::<BigEndian>(result.score.to_bits())?;
    }
    Ok(())
}
