//! Neo4j connection management and shared graph client.

use std::sync::Arc;

use neo4rs::{ConfigBuilder, Graph, Query};
use tokio::sync::RwLock;

use memora_core::{MemoraError, Neo4jSettings};

/// Server status code raised when a write violates a schema constraint.
const CONSTRAINT_VALIDATION_FAILED: &str = "Neo.ClientError.Schema.ConstraintValidationFailed";

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(neo4rs::Error),

    #[error("Constraint violation ({code}): {message}")]
    ConstraintViolation { code: String, message: String },

    #[error("Node not found: {label} with key {key}")]
    NotFound { label: &'static str, key: String },

    #[error("Graph client is closed")]
    Closed,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<neo4rs::Error> for GraphError {
    fn from(err: neo4rs::Error) -> Self {
        if let neo4rs::Error::Neo4j(ref server) = err {
            if is_constraint_violation(server.code()) {
                return GraphError::ConstraintViolation {
                    code: server.code().to_string(),
                    message: server.message().to_string(),
                };
            }
        }
        GraphError::Query(err)
    }
}

impl From<MemoraError> for GraphError {
    fn from(err: MemoraError) -> Self {
        GraphError::Serialization(err.to_string())
    }
}

/// Whether a Neo4j status code reports a rejected schema constraint.
pub fn is_constraint_violation(code: &str) -> bool {
    code == CONSTRAINT_VALIDATION_FAILED
}

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    pub fetch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Neo4jSettings::default().into()
    }
}

impl From<Neo4jSettings> for GraphConfig {
    fn from(settings: Neo4jSettings) -> Self {
        Self {
            uri: settings.uri,
            user: settings.username,
            password: settings.password,
            database: settings.database,
            max_connections: settings.max_connections,
            fetch_size: settings.fetch_size,
        }
    }
}

/// Thread-safe Neo4j graph client with connection pooling.
///
/// Every entity operation is an inherent method on this type, grouped by
/// entity kind in the sibling modules. Clone is cheap and clones share the
/// pool, so `close` on any clone closes them all.
#[derive(Clone)]
pub struct GraphClient {
    graph: Arc<RwLock<Option<Graph>>>,
    database: Arc<str>,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db(config.database.as_str())
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, database = %config.database, "Connected to Neo4j");
        Ok(Self {
            graph: Arc::new(RwLock::new(Some(graph))),
            database: Arc::from(config.database.as_str()),
        })
    }

    /// Name of the database every query runs against.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Release the connection pool. Closing an already closed client is a no-op.
    pub async fn close(&self) {
        let mut guard = self.graph.write().await;
        match guard.take() {
            Some(_) => tracing::info!(database = %self.database, "Closed Neo4j connection"),
            None => tracing::debug!(database = %self.database, "Neo4j connection already closed"),
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.graph.read().await.is_none()
    }

    /// Get a handle to the underlying neo4rs Graph for direct operations.
    pub async fn inner(&self) -> Result<Graph, GraphError> {
        self.graph.read().await.clone().ok_or(GraphError::Closed)
    }

    /// Execute a write-only query (CREATE, MERGE, DELETE, SET).
    pub async fn run(&self, query: Query) -> Result<(), GraphError> {
        self.inner().await?.run(query).await?;
        Ok(())
    }

    /// Execute a query and collect all rows.
    pub async fn query_rows(&self, query: Query) -> Result<Vec<neo4rs::Row>, GraphError> {
        let mut stream = self.inner().await?.execute(query).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Execute a query and return the first row, if any.
    pub async fn query_one(&self, query: Query) -> Result<Option<neo4rs::Row>, GraphError> {
        let mut stream = self.inner().await?.execute(query).await?;
        Ok(stream.next().await?)
    }

    /// Begin a transaction.
    pub async fn start_txn(&self) -> Result<neo4rs::Txn, GraphError> {
        Ok(self.inner().await?.start_txn().await?)
    }

    /// Run queries in order inside one write transaction.
    ///
    /// The first failing statement rolls the transaction back and its error
    /// is returned; nothing is retried.
    pub async fn run_in_txn(&self, queries: Vec<Query>) -> Result<(), GraphError> {
        let mut txn = self.start_txn().await?;

        for (index, q) in queries.into_iter().enumerate() {
            if let Err(e) = txn.run(q).await {
                tracing::warn!(statement = index, error = %e, "Statement failed, rolling back");
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback failed");
                }
                return Err(e.into());
            }
        }

        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_violation_code() {
        assert!(is_constraint_violation(
            "Neo.ClientError.Schema.ConstraintValidationFailed"
        ));
        assert!(!is_constraint_violation(
            "Neo.ClientError.Security.Unauthorized"
        ));
        assert!(!is_constraint_violation(
            "Neo.ClientError.Schema.EquivalentSchemaRuleAlreadyExists"
        ));
    }

    #[test]
    fn test_config_from_settings() {
        let settings = Neo4jSettings {
            uri: "neo4j://db.internal:7687".to_string(),
            username: "memora".to_string(),
            database: "memories".to_string(),
            ..Default::default()
        };
        let config = GraphConfig::from(settings);
        assert_eq!(config.uri, "neo4j://db.internal:7687");
        assert_eq!(config.user, "memora");
        assert_eq!(config.database, "memories");
        assert_eq!(config.max_connections, 16);
    }

    #[test]
    fn test_error_messages() {
        let err = GraphError::NotFound {
            label: "User",
            key: "org_id=a, user_id=b".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Node not found: User with key org_id=a, user_id=b"
        );
        assert_eq!(GraphError::Closed.to_string(), "Graph client is closed");
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_uri() {
        let config = GraphConfig {
            uri: "not a uri".to_string(),
            ..Default::default()
        };
        let result = GraphClient::connect(&config).await;
        assert!(matches!(result, Err(GraphError::Connection(_))));
    }

    #[tokio::test]
    async fn test_close_twice_then_operations_fail() {
        // The pool is built lazily, so nothing needs to listen on this port.
        let config = GraphConfig {
            uri: "bolt://127.0.0.1:1".to_string(),
            ..Default::default()
        };
        let client = GraphClient::connect(&config).await.unwrap();
        let clone = client.clone();
        assert!(!client.is_closed().await);

        client.close().await;
        client.close().await;

        assert!(client.is_closed().await);
        assert!(clone.is_closed().await);
        assert!(matches!(client.setup().await, Err(GraphError::Closed)));
        assert!(matches!(clone.list_constraints().await, Err(GraphError::Closed)));
        assert!(matches!(client.inner().await, Err(GraphError::Closed)));
    }
}
