mod batch_loader;
mod error;
mod neo4j_storage;
mod pipeline;
mod records;

use anyhow::{bail, Context, Result};
use batch_loader::{BatchConfig, DEFAULT_FRIEND_BATCH_SIZE, DEFAULT_NODE_BATCH_SIZE};
use neo4j_storage::Neo4jSink;
use pipeline::DatasetPaths;
use std::env;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug)]
struct Config {
    neo4j_uri: String,
    neo4j_user: String,
    neo4j_password: String,
    paths: DatasetPaths,
    batches: BatchConfig,
}

impl Config {
    fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let batches = BatchConfig {
            node_batch_size: batch_size(lookup("NODE_BATCH_SIZE"), "NODE_BATCH_SIZE", DEFAULT_NODE_BATCH_SIZE)?,
            friend_batch_size: batch_size(lookup("FRIEND_BATCH_SIZE"), "FRIEND_BATCH_SIZE", DEFAULT_FRIEND_BATCH_SIZE)?,
        };

        Ok(Config {
            neo4j_uri: var("NEO4J_URI", "bolt://localhost:7687"),
            neo4j_user: var("NEO4J_USER", "neo4j"),
            neo4j_password: var("NEO4J_PASSWORD", "password"),
            paths: DatasetPaths {
                users: PathBuf::from(var("YELP_USER_FILE", "../dataset/user.json")),
                businesses: PathBuf::from(var("YELP_BUSINESS_FILE", "../dataset/business.json")),
                reviews: PathBuf::from(var("YELP_REVIEW_FILE", "../dataset/review_train.json")),
            },
            batches,
        })
    }
}

fn batch_size(raw: Option<String>, key: &str, default: usize) -> Result<usize> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let size: usize = raw
        .trim()
        .parse()
        .with_context(|| format!("{} must be a positive integer, got {:?}", key, raw))?;
    if size == 0 {
        bail!("{} must be greater than zero", key);
    }
    Ok(size)
}

async fn connect_neo4j(uri: &str, user: &str, password: &str) -> Result<neo4rs::Graph> {
    info!("🔄 Connecting to Neo4j at {}...", uri);
    let graph = neo4rs::Graph::new(uri, user, password)
        .await
        .with_context(|| format!("Failed to connect to Neo4j at {}", uri))?;
    info!("✅ Connected to Neo4j");
    Ok(graph)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("🚀 Yelp graph loader starting...");

    let config = Config::from_env()?;
    info!(
        "📂 Datasets: users={:?} businesses={:?} reviews={:?}",
        config.paths.users, config.paths.businesses, config.paths.reviews
    );

    let graph = connect_neo4j(&config.neo4j_uri, &config.neo4j_user, &config.neo4j_password).await?;
    let sink = Neo4jSink::new(graph);

    let summary = pipeline::run(&sink, &config.paths, &config.batches).await?;
    info!("📊 Import summary: {}", serde_json::to_string(&summary)?);

    Ok(())
}
