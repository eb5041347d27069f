//! Memory nodes, keyed by (org_id, user_id, memory_id).

use chrono::Utc;
use neo4rs::query;

use memora_core::types::DATE_FORMAT;
use memora_core::{EntityKind, InteractionId, Memory, MemoryId, OrgId, UserId};

use crate::client::{GraphClient, GraphError};
use crate::interaction::interaction_not_found;
use crate::records::{self, FromNode};

impl FromNode for Memory {
    const KIND: EntityKind = EntityKind::Memory;

    fn from_node(node: &neo4rs::Node) -> Result<Self, GraphError> {
        Ok(Self {
            org_id: records::id(node, "org_id")?,
            user_id: records::id(node, "user_id")?,
            agent_id: records::id(node, "agent_id")?,
            memory_id: records::id(node, "memory_id")?,
            interaction_id: records::id(node, "interaction_id")?,
            memory: records::string(node, "memory")?,
            obtained_at: records::timestamp(node, "obtained_at")?,
        })
    }
}

impl GraphClient {
    /// Store a memory extracted from one of the user's interactions.
    ///
    /// The memory inherits the interaction's agent, is linked to the date it
    /// was obtained, and bumps the interaction's `updated_at`.
    pub async fn add_memory(
        &self,
        org_id: &OrgId,
        user_id: &UserId,
        interaction_id: &InteractionId,
        memory: &str,
    ) -> Result<Memory, GraphError> {
        let memory_id = MemoryId::new();
        let now = Utc::now();

        let q = query(
            "MATCH (u:User {org_id: $org_id, user_id: $user_id})-[:INTERACTIONS_IN]->
                   (i:Interaction {org_id: $org_id, user_id: $user_id,
                                   interaction_id: $interaction_id})
             CREATE (m:Memory {org_id: $org_id, user_id: $user_id, agent_id: i.agent_id,
                               memory_id: $memory_id, interaction_id: $interaction_id,
                               memory: $memory, obtained_at: $now})
             CREATE (u)-[:HAS_MEMORY]->(m)
             CREATE (m)-[:INTERACTION_SOURCE]->(i)
             MERGE (d:Date {org_id: $org_id, user_id: $user_id, date: $date})
             CREATE (m)-[:DATE_OBTAINED]->(d)
             SET i.updated_at = $now
             RETURN m",
        )
        .param("org_id", org_id.to_string())
        .param("user_id", user_id.to_string())
        .param("interaction_id", interaction_id.to_string())
        .param("memory_id", memory_id.to_string())
        .param("memory", memory.to_string())
        .param("now", now.to_rfc3339())
        .param("date", now.format(DATE_FORMAT).to_string());

        let row = self
            .query_one(q)
            .await?
            .ok_or_else(|| interaction_not_found(org_id, user_id, interaction_id))?;
        let stored = Memory::from_row(&row, "m")?;

        tracing::debug!(
            org_id = %org_id,
            user_id = %user_id,
            memory_id = %stored.memory_id,
            "Added memory"
        );
        Ok(stored)
    }

    pub async fn get_memory(
        &self,
        org_id: &OrgId,
        user_id: &UserId,
        memory_id: &MemoryId,
    ) -> Result<Memory, GraphError> {
        let q = query(
            "MATCH (m:Memory {org_id: $org_id, user_id: $user_id, memory_id: $memory_id})
             RETURN m",
        )
        .param("org_id", org_id.to_string())
        .param("user_id", user_id.to_string())
        .param("memory_id", memory_id.to_string());

        match self.query_one(q).await? {
            Some(row) => Memory::from_row(&row, "m"),
            None => Err(memory_not_found(org_id, user_id, memory_id)),
        }
    }

    /// Replace the text of a memory.
    pub async fn update_memory(
        &self,
        org_id: &OrgId,
        user_id: &UserId,
        memory_id: &MemoryId,
        memory: &str,
    ) -> Result<Memory, GraphError> {
        let q = query(
            "MATCH (m:Memory {org_id: $org_id, user_id: $user_id, memory_id: $memory_id})
             SET m.memory = $memory
             RETURN m",
        )
        .param("org_id", org_id.to_string())
        .param("user_id", user_id.to_string())
        .param("memory_id", memory_id.to_string())
        .param("memory", memory.to_string());

        match self.query_one(q).await? {
            Some(row) => Memory::from_row(&row, "m"),
            None => Err(memory_not_found(org_id, user_id, memory_id)),
        }
    }

    /// Most recently obtained memories of a user, newest first.
    pub async fn list_memories(
        &self,
        org_id: &OrgId,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Memory>, GraphError> {
        let q = query(
            "MATCH (m:Memory {org_id: $org_id, user_id: $user_id})
             RETURN m
             ORDER BY m.obtained_at DESC
             LIMIT $limit",
        )
        .param("org_id", org_id.to_string())
        .param("user_id", user_id.to_string())
        .param("limit", limit as i64);

        let rows = self.query_rows(q).await?;
        Memory::from_rows(&rows, "m")
    }

    /// Returns the number of deleted nodes (0 or 1).
    pub async fn delete_memory(
        &self,
        org_id: &OrgId,
        user_id: &UserId,
        memory_id: &MemoryId,
    ) -> Result<i64, GraphError> {
        let q = query(
            "MATCH (m:Memory {org_id: $org_id, user_id: $user_id, memory_id: $memory_id})
             DETACH DELETE m
             RETURN count(m) AS cnt",
        )
        .param("org_id", org_id.to_string())
        .param("user_id", user_id.to_string())
        .param("memory_id", memory_id.to_string());

        records::count(self.query_one(q).await?)
    }

    /// Delete every memory of a user. Returns the number of deleted nodes.
    pub async fn delete_all_memories(
        &self,
        org_id: &OrgId,
        user_id: &UserId,
    ) -> Result<i64, GraphError> {
        let q = query(
            "MATCH (m:Memory {org_id: $org_id, user_id: $user_id})
             DETACH DELETE m
             RETURN count(m) AS cnt",
        )
        .param("org_id", org_id.to_string())
        .param("user_id", user_id.to_string());

        let deleted = records::count(self.query_one(q).await?)?;
        tracing::info!(org_id = %org_id, user_id = %user_id, deleted, "Deleted all memories");
        Ok(deleted)
    }
}

fn memory_not_found(org_id: &OrgId, user_id: &UserId, memory_id: &MemoryId) -> GraphError {
    records::not_found(
        EntityKind::Memory,
        records::key(&[
            ("org_id", org_id.to_string()),
            ("user_id", user_id.to_string()),
            ("memory_id", memory_id.to_string()),
        ]),
    )
}
