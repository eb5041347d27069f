//! Agent nodes, keyed by (org_id, agent_id).
//!
//! An agent always belongs to an organization and may additionally be owned
//! by one of its users.

use chrono::Utc;
use neo4rs::query;

use memora_core::{Agent, AgentId, EntityKind, OrgId, UserId};

use crate::client::{GraphClient, GraphError};
use crate::records::{self, FromNode};
use crate::user::user_not_found;

impl FromNode for Agent {
    const KIND: EntityKind = EntityKind::Agent;

    fn from_node(node: &neo4rs::Node) -> Result<Self, GraphError> {
        Ok(Self {
            org_id: records::id(node, "org_id")?,
            agent_id: records::id(node, "agent_id")?,
            user_id: records::opt_id(node, "user_id")?,
            agent_label: records::string(node, "agent_label")?,
            created_at: records::timestamp(node, "created_at")?,
        })
    }
}

impl GraphClient {
    /// Create an agent for an organization, optionally owned by one user.
    pub async fn create_agent(
        &self,
        org_id: &OrgId,
        agent_label: &str,
        user_id: Option<&UserId>,
    ) -> Result<Agent, GraphError> {
        let agent_id = AgentId::new();

        let q = match user_id {
            None => query(
                "MATCH (o:Org {org_id: $org_id})
                 CREATE (a:Agent {org_id: $org_id, agent_id: $agent_id,
                                  agent_label: $agent_label, created_at: $now})
                 CREATE (o)-[:HAS_AGENT]->(a)
                 RETURN a",
            ),
            Some(user_id) => query(
                "MATCH (o:Org {org_id: $org_id})-[:HAS_USER]->(u:User {org_id: $org_id, user_id: $user_id})
                 CREATE (a:Agent {org_id: $org_id, agent_id: $agent_id, user_id: $user_id,
                                  agent_label: $agent_label, created_at: $now})
                 CREATE (o)-[:HAS_AGENT]->(a)
                 CREATE (u)-[:HAS_AGENT]->(a)
                 RETURN a",
            )
            .param("user_id", user_id.to_string()),
        }
        .param("org_id", org_id.to_string())
        .param("agent_id", agent_id.to_string())
        .param("agent_label", agent_label.to_string())
        .param("now", Utc::now().to_rfc3339());

        let row = self.query_one(q).await?.ok_or_else(|| match user_id {
            Some(user_id) => user_not_found(org_id, user_id),
            None => records::not_found(
                EntityKind::Organization,
                records::key(&[("org_id", org_id.to_string())]),
            ),
        })?;
        let agent = Agent::from_row(&row, "a")?;

        tracing::info!(
            org_id = %org_id,
            agent_id = %agent.agent_id,
            owner = ?agent.user_id.map(|u| u.to_string()),
            "Created agent"
        );
        Ok(agent)
    }

    pub async fn get_agent(&self, org_id: &OrgId, agent_id: &AgentId) -> Result<Agent, GraphError> {
        let q = query("MATCH (a:Agent {org_id: $org_id, agent_id: $agent_id}) RETURN a")
            .param("org_id", org_id.to_string())
            .param("agent_id", agent_id.to_string());

        match self.query_one(q).await? {
            Some(row) => Agent::from_row(&row, "a"),
            None => Err(agent_not_found(org_id, agent_id)),
        }
    }

    /// List an organization's agents, oldest first.
    pub async fn list_agents(
        &self,
        org_id: &OrgId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Agent>, GraphError> {
        let q = query(
            "MATCH (a:Agent {org_id: $org_id})
             RETURN a
             ORDER BY a.created_at ASC
             SKIP $offset LIMIT $limit",
        )
        .param("org_id", org_id.to_string())
        .param("limit", limit as i64)
        .param("offset", offset as i64);

        let rows = self.query_rows(q).await?;
        Agent::from_rows(&rows, "a")
    }

    /// Delete an agent. Its interactions and memories stay with their users.
    /// Returns the number of deleted nodes.
    pub async fn delete_agent(&self, org_id: &OrgId, agent_id: &AgentId) -> Result<i64, GraphError> {
        let q = query(
            "MATCH (a:Agent {org_id: $org_id, agent_id: $agent_id})
             DETACH DELETE a
             RETURN count(a) AS cnt",
        )
        .param("org_id", org_id.to_string())
        .param("agent_id", agent_id.to_string());

        let deleted = records::count(self.query_one(q).await?)?;
        tracing::info!(org_id = %org_id, agent_id = %agent_id, deleted, "Deleted agent");
        Ok(deleted)
    }
}

pub(crate) fn agent_not_found(org_id: &OrgId, agent_id: &AgentId) -> GraphError {
    records::not_found(
        EntityKind::Agent,
        records::key(&[
            ("org_id", org_id.to_string()),
            ("agent_id", agent_id.to_string()),
        ]),
    )
}
