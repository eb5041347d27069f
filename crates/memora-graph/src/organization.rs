//! Organization nodes, the root of every key in the graph.

use chrono::Utc;
use neo4rs::query;

use memora_core::{EntityKind, OrgId, Organization};

use crate::client::{GraphClient, GraphError};
use crate::records::{self, FromNode};

impl FromNode for Organization {
    const KIND: EntityKind = EntityKind::Organization;

    fn from_node(node: &neo4rs::Node) -> Result<Self, GraphError> {
        Ok(Self {
            org_id: records::id(node, "org_id")?,
            org_name: records::string(node, "org_name")?,
            created_at: records::timestamp(node, "created_at")?,
        })
    }
}

impl GraphClient {
    /// Create a new organization with a generated id.
    pub async fn create_organization(&self, org_name: &str) -> Result<Organization, GraphError> {
        let org_id = OrgId::new();
        let q = query(
            "CREATE (o:Org {org_id: $org_id, org_name: $org_name, created_at: $now})
             RETURN o",
        )
        .param("org_id", org_id.to_string())
        .param("org_name", org_name.to_string())
        .param("now", Utc::now().to_rfc3339());

        let org = self
            .query_one(q)
            .await?
            .ok_or_else(|| GraphError::Serialization("CREATE returned no Org".to_string()))
            .and_then(|row| Organization::from_row(&row, "o"))?;

        tracing::info!(org_id = %org.org_id, "Created organization");
        Ok(org)
    }

    pub async fn get_organization(&self, org_id: &OrgId) -> Result<Organization, GraphError> {
        let q = query("MATCH (o:Org {org_id: $org_id}) RETURN o").param("org_id", org_id.to_string());

        match self.query_one(q).await? {
            Some(row) => Organization::from_row(&row, "o"),
            None => Err(org_not_found(org_id)),
        }
    }

    pub async fn update_organization_name(
        &self,
        org_id: &OrgId,
        org_name: &str,
    ) -> Result<Organization, GraphError> {
        let q = query(
            "MATCH (o:Org {org_id: $org_id})
             SET o.org_name = $org_name
             RETURN o",
        )
        .param("org_id", org_id.to_string())
        .param("org_name", org_name.to_string());

        match self.query_one(q).await? {
            Some(row) => Organization::from_row(&row, "o"),
            None => Err(org_not_found(org_id)),
        }
    }

    /// Delete an organization and every node belonging to it.
    /// Returns the number of deleted nodes.
    pub async fn delete_organization(&self, org_id: &OrgId) -> Result<i64, GraphError> {
        let cypher = format!(
            "{}
             DETACH DELETE n
             RETURN count(n) AS cnt",
            records::labelled_nodes(&EntityKind::ALL, "org_id: $org_id")
        );
        let q = query(&cypher).param("org_id", org_id.to_string());

        let deleted = records::count(self.query_one(q).await?)?;
        tracing::info!(org_id = %org_id, deleted, "Deleted organization");
        Ok(deleted)
    }
}

fn org_not_found(org_id: &OrgId) -> GraphError {
    records::not_found(
        EntityKind::Organization,
        records::key(&[("org_id", org_id.to_string())]),
    )
}
