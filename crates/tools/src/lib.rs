//! Developer tooling: frame timing, draw statistics and the stats CSV.
//!
//! # Invariants
//! - The moving average only covers frames actually recorded.
//! - The CSV header is fixed; readers reject files written with another.

mod csv;
mod perf;

use std::path::PathBuf;

pub use csv::{CSV_HEADER, PerfSample, StatsCsv, StatsSummary};
pub use perf::{FrameCounters, HISTORY, PerfTracker};

#[derive(Debug, thiserror::Error)]
pub enum ToolsError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("stats I/O: {0}")]
    Stream(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

pub fn crate_info() -> &'static str {
    concat!("glint-tools v", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
