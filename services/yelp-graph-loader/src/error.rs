use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error type returned by a [`GraphSink`](crate::neo4j_storage::GraphSink).
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("malformed record on line {line}: {source}")]
    MalformedRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{statement} batch {batch}/{batches} rejected: {source}")]
    Batch {
        statement: &'static str,
        batch: usize,
        batches: usize,
        #[source]
        source: SinkError,
    },

    #[error("schema statement {statement} failed: {source}")]
    Schema {
        statement: &'static str,
        #[source]
        source: SinkError,
    },
}
