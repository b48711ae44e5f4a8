//! Neo4j Batch Storage
//!
//! The Cypher statements issued by the loader and the [`GraphSink`] seam
//! that executes them. [`Neo4jSink`] runs them over a bolt connection with
//! the batch bound as a single list parameter for `UNWIND`.

use crate::error::SinkError;
use async_trait::async_trait;
use neo4rs::{query, BoltBoolean, BoltFloat, BoltInteger, BoltMap, BoltNull, BoltString, BoltType};
use serde_json::Value;
use tracing::debug;

// ============================================================================
// Statements
// ============================================================================

/// A batch statement: Cypher that `UNWIND`s the list bound to `bind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement {
    pub name: &'static str,
    pub bind: &'static str,
    pub cypher: &'static str,
}

/// A schema statement run once, without parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaStatement {
    pub name: &'static str,
    pub cypher: &'static str,
}

pub const CREATE_PERSONS: Statement = Statement {
    name: "create_persons",
    bind: "users",
    cypher: "UNWIND $users AS u
             CREATE (:Person {id: u.user_id, name: u.name, fans: u.fans, elite: u.elite})",
};

pub const CREATE_BUSINESSES: Statement = Statement {
    name: "create_businesses",
    bind: "biz",
    cypher: "UNWIND $biz AS b
             CREATE (:Business {id: b.business_id, name: b.name, categories: b.categories})",
};

pub const CREATE_REVIEWS: Statement = Statement {
    name: "create_reviews",
    bind: "rvw",
    cypher: "UNWIND $rvw AS r
             MATCH (p:Person {id: r.user_id}), (b:Business {id: r.business_id})
             CREATE (p)-[:REVIEWED {stars: r.stars}]->(b)",
};

/// Undirected MERGE so reciprocal friend lists collapse into one edge.
pub const MERGE_FRIENDS: Statement = Statement {
    name: "merge_friends",
    bind: "friends",
    cypher: "UNWIND $friends AS f
             MATCH (p:Person {id: f[0]}), (q:Person {id: f[1]})
             MERGE (p)-[:FRIEND]-(q)",
};

pub const PERSON_ID_INDEX: SchemaStatement = SchemaStatement {
    name: "person_id_index",
    cypher: "CREATE INDEX person_id IF NOT EXISTS FOR (p:Person) ON (p.id)",
};

pub const BUSINESS_ID_INDEX: SchemaStatement = SchemaStatement {
    name: "business_id_index",
    cypher: "CREATE INDEX business_id IF NOT EXISTS FOR (b:Business) ON (b.id)",
};

// ============================================================================
// Sink
// ============================================================================

#[async_trait]
pub trait GraphSink: Send + Sync {
    /// Execute `statement` with `rows` bound to `statement.bind`.
    async fn run_batch(&self, statement: &Statement, rows: Vec<Value>) -> Result<(), SinkError>;

    async fn run_schema(&self, statement: &SchemaStatement) -> Result<(), SinkError>;
}

pub struct Neo4jSink {
    graph: neo4rs::Graph,
}

impl Neo4jSink {
    pub fn new(graph: neo4rs::Graph) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl GraphSink for Neo4jSink {
    async fn run_batch(&self, statement: &Statement, rows: Vec<Value>) -> Result<(), SinkError> {
        let rows: Vec<BoltType> = rows.into_iter().map(json_to_bolt).collect();
        debug!("   {} <- {} rows", statement.name, rows.len());

        let q = query(statement.cypher).param(statement.bind, rows);
        self.graph.run(q).await?;
        Ok(())
    }

    async fn run_schema(&self, statement: &SchemaStatement) -> Result<(), SinkError> {
        self.graph.run(query(statement.cypher)).await?;
        Ok(())
    }
}

// ============================================================================
// Helper: Convert JSON rows to BoltType
// ============================================================================

fn json_to_bolt(value: Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => BoltType::Boolean(BoltBoolean::new(b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => BoltType::Integer(BoltInteger::new(i)),
            None => BoltType::Float(BoltFloat::new(n.as_f64().unwrap_or(f64::NAN))),
        },
        Value::String(s) => BoltType::String(BoltString::from(s.as_str())),
        Value::Array(items) => {
            let items: Vec<BoltType> = items.into_iter().map(json_to_bolt).collect();
            BoltType::from(items)
        }
        Value::Object(fields) => BoltType::Map(BoltMap::from_iter(
            fields
                .into_iter()
                .map(|(k, v)| (BoltString::from(k.as_str()), json_to_bolt(v))),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_statements_bind_their_parameter() {
        for statement in [CREATE_PERSONS, CREATE_BUSINESSES, CREATE_REVIEWS, MERGE_FRIENDS] {
            let placeholder = format!("UNWIND ${} AS", statement.bind);
            assert!(
                statement.cypher.starts_with(&placeholder),
                "{} should unwind ${}",
                statement.name,
                statement.bind
            );
        }
    }

    #[test]
    fn test_friend_merge_is_undirected() {
        assert!(MERGE_FRIENDS.cypher.contains("MERGE (p)-[:FRIEND]-(q)"));
        assert!(CREATE_REVIEWS.cypher.contains("CREATE (p)-[:REVIEWED {stars: r.stars}]->(b)"));
    }

    #[test]
    fn test_scalars_to_bolt() {
        assert!(matches!(json_to_bolt(json!(null)), BoltType::Null(_)));
        assert!(matches!(json_to_bolt(json!(true)), BoltType::Boolean(_)));
        assert!(matches!(json_to_bolt(json!(42)), BoltType::Integer(_)));
        assert!(matches!(json_to_bolt(json!(4.5)), BoltType::Float(_)));
        assert!(matches!(json_to_bolt(json!("x")), BoltType::String(_)));
    }

    #[test]
    fn test_integral_float_stays_float() {
        // stars arrive as 5.0 after serializing an f64
        assert!(matches!(json_to_bolt(json!(5.0)), BoltType::Float(_)));
    }

    #[test]
    fn test_nested_row_to_bolt() {
        let row = json!({"user_id": "u1", "elite": [2012, 2013]});
        match json_to_bolt(row) {
            BoltType::Map(map) => {
                assert_eq!(map.value.len(), 2);
                let elite = map.value.get(&BoltString::from("elite"));
                assert!(matches!(elite, Some(BoltType::List(list)) if list.value.len() == 2));
            }
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_pair_row_to_bolt() {
        match json_to_bolt(json!(["a", "b"])) {
            BoltType::List(list) => assert_eq!(list.value.len(), 2),
            other => panic!("expected list, got {:?}", other),
        }
    }
}
