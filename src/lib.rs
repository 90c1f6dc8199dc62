pub mod config;
pub mod error;
pub mod isr;
pub mod metrics;
pub mod query;
pub mod ranker;
pub mod segment;
pub mod server;

pub use config::ShardConfig;
pub use error::{Result, ShardError};
pub use metrics::ShardMetrics;
pub use query::{read_query, Expr};
pub use ranker::{Ranker, RankingResult};
pub use segment::{LockBudget, Segment, SegmentWriter};
pub use server::ShardServer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
