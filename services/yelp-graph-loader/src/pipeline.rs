//! Import Pipeline
//!
//! Runs the four load stages strictly in order against one sink. The first
//! failing stage halts the run; nothing is rolled back.

use crate::batch_loader::{insert_batches, load_file, read_file, BatchConfig};
use crate::error::ImportError;
use crate::neo4j_storage::{
    GraphSink, SchemaStatement, BUSINESS_ID_INDEX, CREATE_BUSINESSES, CREATE_PERSONS,
    CREATE_REVIEWS, MERGE_FRIENDS, PERSON_ID_INDEX,
};
use crate::records::{friend_pairs, BusinessRecord, ReviewRecord, UserRecord};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct DatasetPaths {
    pub users: PathBuf,
    pub businesses: PathBuf,
    pub reviews: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Users,
    Businesses,
    Reviews,
    Friends,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Users, Stage::Businesses, Stage::Reviews, Stage::Friends];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Users => "users",
            Stage::Businesses => "businesses",
            Stage::Reviews => "reviews",
            Stage::Friends => "friends",
        };
        f.write_str(name)
    }
}

/// Records submitted per stage. Review and friend counts are rows sent,
/// not edges created: unmatched ids are dropped by the database.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub persons: usize,
    pub businesses: usize,
    pub reviews: usize,
    pub friendships: usize,
}

impl ImportSummary {
    fn record(&mut self, stage: Stage, count: usize) {
        match stage {
            Stage::Users => self.persons = count,
            Stage::Businesses => self.businesses = count,
            Stage::Reviews => self.reviews = count,
            Stage::Friends => self.friendships = count,
        }
    }
}

/// Run every stage in [`Stage::ALL`] order.
pub async fn run<S>(
    sink: &S,
    paths: &DatasetPaths,
    batches: &BatchConfig,
) -> Result<ImportSummary, ImportError>
where
    S: GraphSink + ?Sized,
{
    let started = Instant::now();
    info!("🚀 Starting import (node_batch={}, friend_batch={})",
          batches.node_batch_size, batches.friend_batch_size);

    let mut summary = ImportSummary::default();
    for stage in Stage::ALL {
        match run_stage(sink, stage, paths, batches).await {
            Ok(count) => summary.record(stage, count),
            Err(e) => {
                error!("❌ Stage {} failed, halting import: {}", stage, e);
                return Err(e);
            }
        }
    }

    info!("✅ Import finished in {:.1?}", started.elapsed());
    Ok(summary)
}

/// Run a single stage and return the number of records it submitted.
pub async fn run_stage<S>(
    sink: &S,
    stage: Stage,
    paths: &DatasetPaths,
    batches: &BatchConfig,
) -> Result<usize, ImportError>
where
    S: GraphSink + ?Sized,
{
    let started = Instant::now();
    info!("📝 Stage {}", stage);

    let count = match stage {
        Stage::Users => {
            let n = load_file::<_, UserRecord>(sink, &paths.users, &CREATE_PERSONS, batches.node_batch_size).await?;
            create_index(sink, &PERSON_ID_INDEX).await?;
            info!("   Created {} Person nodes", n);
            n
        }
        Stage::Businesses => {
            let n = load_file::<_, BusinessRecord>(sink, &paths.businesses, &CREATE_BUSINESSES, batches.node_batch_size).await?;
            create_index(sink, &BUSINESS_ID_INDEX).await?;
            info!("   Created {} Business nodes", n);
            n
        }
        Stage::Reviews => {
            let n = load_file::<_, ReviewRecord>(sink, &paths.reviews, &CREATE_REVIEWS, batches.node_batch_size).await?;
            info!("   Submitted {} Person-Business reviews", n);
            n
        }
        Stage::Friends => {
            // Users are dropped as soon as their friend lists are flattened.
            let pairs = {
                let users: Vec<UserRecord> = read_file(&paths.users)?;
                friend_pairs(users)
            };
            let n = insert_batches(sink, pairs, &MERGE_FRIENDS, batches.friend_batch_size).await?;
            info!("   Merged {} friend pairs", n);
            n
        }
    };

    info!("   Stage {} done in {:.1?}", stage, started.elapsed());
    Ok(count)
}

async fn create_index<S>(sink: &S, statement: &SchemaStatement) -> Result<(), ImportError>
where
    S: GraphSink + ?Sized,
{
    sink.run_schema(statement)
        .await
        .map_err(|source| ImportError::Schema {
            statement: statement.name,
            source,
        })?;
    info!("   Created index {}", statement.name);
    Ok(())
}
