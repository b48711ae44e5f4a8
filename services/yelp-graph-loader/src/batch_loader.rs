//! Batch Loader
//!
//! Parses a newline-delimited JSON file in full, then submits the records in
//! fixed-size chunks, one statement execution per chunk.

use crate::error::ImportError;
use crate::neo4j_storage::{GraphSink, Statement};
use crate::records::read_records;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

// ============================================================================
// Configuration
// ============================================================================

pub const DEFAULT_NODE_BATCH_SIZE: usize = 200;
pub const DEFAULT_FRIEND_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Chunk size for node inserts and review edges.
    pub node_batch_size: usize,
    pub friend_batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            node_batch_size: DEFAULT_NODE_BATCH_SIZE,
            friend_batch_size: DEFAULT_FRIEND_BATCH_SIZE,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Submit `records` to `sink` in chunks of `batch_size` and return how many
/// were submitted. The records are dropped when this returns.
///
/// The first rejected chunk aborts the load; no later chunk is sent.
pub async fn insert_batches<S, T>(
    sink: &S,
    records: Vec<T>,
    statement: &Statement,
    batch_size: usize,
) -> Result<usize, ImportError>
where
    S: GraphSink + ?Sized,
    T: Serialize,
{
    let batch_size = batch_size.max(1);
    let batches = records.len().div_ceil(batch_size);

    for (batch_idx, chunk) in records.chunks(batch_size).enumerate() {
        let rows = chunk
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;

        sink.run_batch(statement, rows)
            .await
            .map_err(|source| ImportError::Batch {
                statement: statement.name,
                batch: batch_idx + 1,
                batches,
                source,
            })?;

        debug!("   {}: batch {}/{}", statement.name, batch_idx + 1, batches);
    }

    Ok(records.len())
}

/// Read every record in the file at `path` and insert them in batches.
pub async fn load_file<S, T>(
    sink: &S,
    path: &Path,
    statement: &Statement,
    batch_size: usize,
) -> Result<usize, ImportError>
where
    S: GraphSink + ?Sized,
    T: DeserializeOwned + Serialize,
{
    let records: Vec<T> = read_file(path)?;
    insert_batches(sink, records, statement, batch_size).await
}

/// Decode the whole file; the handle is closed before this returns.
pub fn read_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ImportError> {
    let file = File::open(path).map_err(|source| ImportError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_records(BufReader::new(file))
}
