use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use nautex::{LockBudget, Segment, ShardConfig, ShardMetrics, ShardServer};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "nautex")]
#[command(about = "Query-execution and ranking shard", long_about = None)]
struct Args {
    /// Directory whose *.bin files are opened as index segments
    index_dir: PathBuf,

    /// Listening port for the query endpoint
    #[arg(long, env = "NAUTEX_PORT", default_value = "8080")]
    port: u16,

    /// Ranker worker threads per query
    #[arg(long, env = "NAUTEX_WORKERS", default_value = "14")]
    workers: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    info!("starting nautex v{}", nautex::VERSION);

    let bin_paths = match list_bin_files(&args.index_dir) {
        Ok(paths) => paths,
        Err(e) => {
            error!(dir = %args.index_dir.display(), error = %e, "cannot enumerate index directory");
            return ExitCode::from(2);
        }
    };
    if bin_paths.is_empty() {
        error!(dir = %args.index_dir.display(), "no *.bin files found");
        return ExitCode::from(3);
    }

    let config = ShardConfig::new(args.index_dir, args.port).with_workers(args.workers);
    let budget = LockBudget::new(config.max_locked_bytes);

    let mut segments = Vec::with_capacity(bin_paths.len());
    for path in &bin_paths {
        match Segment::open(path, &budget) {
            Ok(segment) => {
                info!(
                    path = %path.display(),
                    documents = segment.document_count(),
                    bytes = segment.size_bytes(),
                    "segment loaded"
                );
                segments.push(segment);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "skipping segment"),
        }
    }
    if segments.is_empty() {
        error!("all segments failed to open");
        return ExitCode::from(4);
    }

    let metrics = match ShardMetrics::new() {
        Ok(metrics) => metrics,
        Err(e) => {
            error!(error = %e, "metric registration failed");
            return ExitCode::from(1);
        }
    };

    let server = ShardServer::new(segments, config, metrics);
    if let Err(e) = server.serve() {
        error!(error = %e, "server loop failed");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

/// Every regular file directly under `dir` with a `.bin` suffix
fn list_bin_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && path.extension().is_some_and(|ext| ext == "bin") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
