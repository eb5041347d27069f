//! Conversion from Neo4j nodes to domain entities.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use memora_core::types::{parse_timestamp, EntityKind};
use memora_core::MemoraError;

use crate::client::GraphError;

/// Build a domain entity from a node of the matching label.
pub trait FromNode: Sized {
    const KIND: EntityKind;

    fn from_node(node: &neo4rs::Node) -> Result<Self, GraphError>;

    /// Decode the node bound to `column` in a result row.
    fn from_row(row: &neo4rs::Row, column: &str) -> Result<Self, GraphError> {
        let node: neo4rs::Node = row.get(column).map_err(|e| {
            GraphError::Serialization(format!(
                "Failed to deserialize {} node: {e}",
                Self::KIND.label()
            ))
        })?;
        Self::from_node(&node)
    }

    /// Decode every row of a result set.
    fn from_rows(rows: &[neo4rs::Row], column: &str) -> Result<Vec<Self>, GraphError> {
        rows.iter().map(|row| Self::from_row(row, column)).collect()
    }
}

pub(crate) fn string(node: &neo4rs::Node, key: &str) -> Result<String, GraphError> {
    node.get::<String>(key)
        .map_err(|e| GraphError::Serialization(format!("Missing property {key}: {e}")))
}

pub(crate) fn id<T>(node: &neo4rs::Node, key: &str) -> Result<T, GraphError>
where
    T: FromStr<Err = MemoraError>,
{
    Ok(string(node, key)?.parse()?)
}

pub(crate) fn opt_id<T>(node: &neo4rs::Node, key: &str) -> Result<Option<T>, GraphError>
where
    T: FromStr<Err = MemoraError>,
{
    let present = node.keys().iter().any(|k| *k == key);
    decode_opt_id(present.then(|| string(node, key)))
}

/// An absent property is `None`; a present one must decode.
fn decode_opt_id<T>(raw: Option<Result<String, GraphError>>) -> Result<Option<T>, GraphError>
where
    T: FromStr<Err = MemoraError>,
{
    raw.map(|value| -> Result<T, GraphError> { Ok(value?.parse()?) })
        .transpose()
}

pub(crate) fn timestamp(node: &neo4rs::Node, key: &str) -> Result<DateTime<Utc>, GraphError> {
    Ok(parse_timestamp(&string(node, key)?)?)
}

/// Read the `cnt` column of a count query, treating no row as zero.
pub(crate) fn count(row: Option<neo4rs::Row>) -> Result<i64, GraphError> {
    decode_count(row.map(|r| r.get::<i64>("cnt")))
}

fn decode_count<E: std::fmt::Display>(raw: Option<Result<i64, E>>) -> Result<i64, GraphError> {
    match raw {
        None => Ok(0),
        Some(value) => value
            .map_err(|e| GraphError::Serialization(format!("Failed to read count: {e}"))),
    }
}

/// Subquery binding `n` to every node of `kinds` matching `props`.
///
/// One labelled branch per kind, so each branch can use the label's
/// node-key index instead of scanning all nodes.
pub(crate) fn labelled_nodes(kinds: &[EntityKind], props: &str) -> String {
    let branches: Vec<String> = kinds
        .iter()
        .map(|kind| format!("MATCH (n:{} {{{props}}}) RETURN n", kind.label()))
        .collect();
    format!("CALL {{ {} }}", branches.join(" UNION ALL "))
}

/// Render key properties for `GraphError::NotFound`.
pub(crate) fn key(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn not_found(kind: EntityKind, key: String) -> GraphError {
    GraphError::NotFound {
        label: kind.label(),
        key,
    }
}
