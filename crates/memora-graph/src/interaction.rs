//! Interaction and Date nodes.
//!
//! Each interaction hangs off the user it was held with and points at the
//! per-user `Date` node for the day it happened. Date nodes are merged, so
//! all interactions of a user on one day share a single node.

use chrono::Utc;
use neo4rs::query;

use memora_core::types::{parse_date, DATE_FORMAT};
use memora_core::{
    AgentId, EntityKind, Interaction, InteractionDate, InteractionId, OrgId, UserId,
};

use crate::client::{GraphClient, GraphError};
use crate::records::{self, FromNode};

impl FromNode for Interaction {
    const KIND: EntityKind = EntityKind::Interaction;

    fn from_node(node: &neo4rs::Node) -> Result<Self, GraphError> {
        Ok(Self {
            org_id: records::id(node, "org_id")?,
            user_id: records::id(node, "user_id")?,
            agent_id: records::id(node, "agent_id")?,
            interaction_id: records::id(node, "interaction_id")?,
            created_at: records::timestamp(node, "created_at")?,
            updated_at: records::timestamp(node, "updated_at")?,
        })
    }
}

impl FromNode for InteractionDate {
    const KIND: EntityKind = EntityKind::Date;

    fn from_node(node: &neo4rs::Node) -> Result<Self, GraphError> {
        Ok(Self {
            org_id: records::id(node, "org_id")?,
            user_id: records::id(node, "user_id")?,
            date: parse_date(&records::string(node, "date")?)?,
        })
    }
}

impl GraphClient {
    /// Record a new interaction between a user and an agent of the same
    /// organization, attached to today's date node.
    pub async fn save_interaction(
        &self,
        org_id: &OrgId,
        user_id: &UserId,
        agent_id: &AgentId,
    ) -> Result<Interaction, GraphError> {
        let interaction_id = InteractionId::new();
        let now = Utc::now();

        let q = query(
            "MATCH (u:User {org_id: $org_id, user_id: $user_id})
             MATCH (a:Agent {org_id: $org_id, agent_id: $agent_id})
             CREATE (i:Interaction {org_id: $org_id, user_id: $user_id, agent_id: $agent_id,
                                    interaction_id: $interaction_id,
                                    created_at: $now, updated_at: $now})
             CREATE (u)-[:INTERACTIONS_IN]->(i)
             CREATE (a)-[:HAD_INTERACTION]->(i)
             MERGE (d:Date {org_id: $org_id, user_id: $user_id, date: $date})
             CREATE (i)-[:HAS_OCCURRENCE_ON]->(d)
             RETURN i",
        )
        .param("org_id", org_id.to_string())
        .param("user_id", user_id.to_string())
        .param("agent_id", agent_id.to_string())
        .param("interaction_id", interaction_id.to_string())
        .param("now", now.to_rfc3339())
        .param("date", now.format(DATE_FORMAT).to_string());

        let row = self.query_one(q).await?.ok_or_else(|| {
            records::not_found(
                EntityKind::User,
                records::key(&[
                    ("org_id", org_id.to_string()),
                    ("user_id", user_id.to_string()),
                    ("agent_id", agent_id.to_string()),
                ]),
            )
        })?;
        let interaction = Interaction::from_row(&row, "i")?;

        tracing::info!(
            org_id = %org_id,
            user_id = %user_id,
            interaction_id = %interaction.interaction_id,
            "Saved interaction"
        );
        Ok(interaction)
    }

    pub async fn get_interaction(
        &self,
        org_id: &OrgId,
        user_id: &UserId,
        interaction_id: &InteractionId,
    ) -> Result<Interaction, GraphError> {
        let q = query(
            "MATCH (i:Interaction {org_id: $org_id, user_id: $user_id,
                                   interaction_id: $interaction_id})
             RETURN i",
        )
        .param("org_id", org_id.to_string())
        .param("user_id", user_id.to_string())
        .param("interaction_id", interaction_id.to_string());

        match self.query_one(q).await? {
            Some(row) => Interaction::from_row(&row, "i"),
            None => Err(interaction_not_found(org_id, user_id, interaction_id)),
        }
    }

    /// Most recent interactions of a user, newest first.
    pub async fn list_interactions(
        &self,
        org_id: &OrgId,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Interaction>, GraphError> {
        let q = query(
            "MATCH (i:Interaction {org_id: $org_id, user_id: $user_id})
             RETURN i
             ORDER BY i.created_at DESC
             LIMIT $limit",
        )
        .param("org_id", org_id.to_string())
        .param("user_id", user_id.to_string())
        .param("limit", limit as i64);

        let rows = self.query_rows(q).await?;
        Interaction::from_rows(&rows, "i")
    }

    /// Days on which a user had interactions, oldest first.
    pub async fn list_interaction_dates(
        &self,
        org_id: &OrgId,
        user_id: &UserId,
    ) -> Result<Vec<InteractionDate>, GraphError> {
        let q = query(
            "MATCH (d:Date {org_id: $org_id, user_id: $user_id})
             RETURN d
             ORDER BY d.date ASC",
        )
        .param("org_id", org_id.to_string())
        .param("user_id", user_id.to_string());

        let rows = self.query_rows(q).await?;
        InteractionDate::from_rows(&rows, "d")
    }

    /// Delete an interaction and the memories sourced from it.
    /// Date nodes are kept. Returns the number of deleted nodes.
    pub async fn delete_interaction(
        &self,
        org_id: &OrgId,
        user_id: &UserId,
        interaction_id: &InteractionId,
    ) -> Result<i64, GraphError> {
        let q = query(
            "MATCH (i:Interaction {org_id: $org_id, user_id: $user_id,
                                   interaction_id: $interaction_id})
             OPTIONAL MATCH (m:Memory)-[:INTERACTION_SOURCE]->(i)
             WITH i, collect(m) AS memories
             FOREACH (m IN memories | DETACH DELETE m)
             DETACH DELETE i
             RETURN 1 + size(memories) AS cnt",
        )
        .param("org_id", org_id.to_string())
        .param("user_id", user_id.to_string())
        .param("interaction_id", interaction_id.to_string());

        let deleted = records::count(self.query_one(q).await?)?;
        tracing::info!(
            org_id = %org_id,
            user_id = %user_id,
            interaction_id = %interaction_id,
            deleted,
            "Deleted interaction"
        );
        Ok(deleted)
    }
}

pub(crate) fn interaction_not_found(
    org_id: &OrgId,
    user_id: &UserId,
    interaction_id: &InteractionId,
) -> GraphError {
    records::not_found(
        EntityKind::Interaction,
        records::key(&[
            ("org_id", org_id.to_string()),
            ("user_id", user_id.to_string()),
            ("interaction_id", interaction_id.to_string()),
        ]),
    )
}
