//! Schema initialization and verification.

use neo4rs::query;

use memora_core::schema::{NodeKeyConstraint, SCHEMA};

use crate::client::{GraphClient, GraphError};

/// `type` column reported by `SHOW CONSTRAINTS` for node keys.
const NODE_KEY: &str = "NODE_KEY";

/// A constraint as reported by `SHOW CONSTRAINTS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingConstraint {
    pub name: String,
    pub constraint_type: String,
    pub labels: Vec<String>,
    pub properties: Vec<String>,
}

impl ExistingConstraint {
    /// Whether this is the node key `expected` describes, on the same label
    /// and over the same properties in the same order.
    pub fn matches(&self, expected: &NodeKeyConstraint) -> bool {
        self.constraint_type == NODE_KEY
            && self.labels == [expected.label()]
            && self.properties == expected.properties()
    }

    fn from_row(row: &neo4rs::Row) -> Result<Self, GraphError> {
        Ok(Self {
            name: row.get("name").map_err(|e| column_error("name", e))?,
            constraint_type: row.get("type").map_err(|e| column_error("type", e))?,
            labels: row
                .get("labelsOrTypes")
                .map_err(|e| column_error("labelsOrTypes", e))?,
            properties: row
                .get("properties")
                .map_err(|e| column_error("properties", e))?,
        })
    }
}

fn column_error(column: &str, e: impl std::fmt::Display) -> GraphError {
    GraphError::Serialization(format!("Failed to read constraint {column}: {e}"))
}

/// Which of the expected node-key constraints exist in the database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaStatus {
    pub present: Vec<&'static str>,
    pub missing: Vec<&'static str>,
    /// Same name as an expected constraint but a different definition.
    /// `IF NOT EXISTS` never replaces these, so they need manual attention.
    pub mismatched: Vec<&'static str>,
}

impl SchemaStatus {
    fn from_existing(existing: &[ExistingConstraint]) -> Self {
        let mut status = Self::default();
        for expected in &SCHEMA {
            match existing.iter().find(|c| c.name == expected.name) {
                None => status.missing.push(expected.name),
                Some(found) if found.matches(expected) => status.present.push(expected.name),
                Some(_) => status.mismatched.push(expected.name),
            }
        }
        status
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.mismatched.is_empty()
    }
}

impl GraphClient {
    /// Ensure every node-key constraint exists.
    ///
    /// Statements run sequentially in one write transaction and use
    /// `IF NOT EXISTS`, so calling this on every startup is safe.
    pub async fn setup(&self) -> Result<(), GraphError> {
        let queries = SCHEMA.iter().map(|c| query(&c.cypher())).collect();
        self.run_in_txn(queries).await?;

        tracing::info!(
            database = %self.database(),
            constraints = SCHEMA.len(),
            "Graph schema ready"
        );
        Ok(())
    }

    /// All constraints defined in the database.
    pub async fn list_constraints(&self) -> Result<Vec<ExistingConstraint>, GraphError> {
        let rows = self
            .query_rows(query(
                "SHOW CONSTRAINTS YIELD name, type, labelsOrTypes, properties
                 RETURN name, type, labelsOrTypes, properties",
            ))
            .await?;
        rows.iter().map(ExistingConstraint::from_row).collect()
    }

    /// Compare the database's constraints against the expected schema.
    pub async fn verify_schema(&self) -> Result<SchemaStatus, GraphError> {
        let existing = self.list_constraints().await?;
        let status = SchemaStatus::from_existing(&existing);
        if !status.is_complete() {
            tracing::warn!(
                missing = ?status.missing,
                mismatched = ?status.mismatched,
                "Graph schema incomplete"
            );
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use memora_core::schema::constraint_for;
    use memora_core::EntityKind;

    use super::*;

    fn existing(expected: &NodeKeyConstraint) -> ExistingConstraint {
        ExistingConstraint {
            name: expected.name.to_string(),
            constraint_type: NODE_KEY.to_string(),
            labels: vec![expected.label().to_string()],
            properties: expected.properties().iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_status_splits_present_and_missing() {
        let mut legacy = existing(constraint_for(EntityKind::Organization));
        legacy.name = "legacy_index".to_string();
        let found = vec![
            existing(constraint_for(EntityKind::Date)),
            existing(constraint_for(EntityKind::Organization)),
            legacy,
        ];
        let status = SchemaStatus::from_existing(&found);
        assert_eq!(status.present, vec!["unique_org_id", "unique_user_date"]);
        assert_eq!(status.missing.len(), 4);
        assert!(status.mismatched.is_empty());
        assert!(!status.is_complete());
    }

    #[test]
    fn test_status_complete() {
        let found: Vec<_> = SCHEMA.iter().map(existing).collect();
        let status = SchemaStatus::from_existing(&found);
        assert!(status.is_complete());
        assert_eq!(status.present.len(), SCHEMA.len());
    }

    #[test]
    fn test_same_name_uniqueness_constraint_is_mismatched() {
        let mut found: Vec<_> = SCHEMA.iter().map(existing).collect();
        found[1].constraint_type = "UNIQUENESS".to_string();

        let status = SchemaStatus::from_existing(&found);
        assert_eq!(status.mismatched, vec!["unique_org_user"]);
        assert!(!status.present.contains(&"unique_org_user"));
        assert!(!status.is_complete());
    }

    #[test]
    fn test_matches_checks_label_and_property_order() {
        let expected = constraint_for(EntityKind::Memory);

        let mut wrong_label = existing(expected);
        wrong_label.labels = vec!["Interaction".to_string()];
        assert!(!wrong_label.matches(expected));

        let mut reordered = existing(expected);
        reordered.properties.reverse();
        assert!(!reordered.matches(expected));

        let mut partial = existing(expected);
        partial.properties.pop();
        assert!(!partial.matches(expected));

        assert!(existing(expected).matches(expected));
    }
}
