//! User nodes, keyed by (org_id, user_id).

use chrono::Utc;
use neo4rs::query;

use memora_core::{EntityKind, OrgId, User, UserId};

use crate::client::{GraphClient, GraphError};
use crate::records::{self, FromNode};

/// Labels removed with a user. Org-wide agents carry no `user_id` and are
/// left alone; agents owned by the user are matched.
const USER_CASCADE: [EntityKind; 5] = [
    EntityKind::User,
    EntityKind::Agent,
    EntityKind::Memory,
    EntityKind::Interaction,
    EntityKind::Date,
];

impl FromNode for User {
    const KIND: EntityKind = EntityKind::User;

    fn from_node(node: &neo4rs::Node) -> Result<Self, GraphError> {
        Ok(Self {
            org_id: records::id(node, "org_id")?,
            user_id: records::id(node, "user_id")?,
            user_name: records::string(node, "user_name")?,
            created_at: records::timestamp(node, "created_at")?,
        })
    }
}

impl GraphClient {
    /// Create a user under an existing organization.
    pub async fn create_user(&self, org_id: &OrgId, user_name: &str) -> Result<User, GraphError> {
        let user_id = UserId::new();
        let q = query(
            "MATCH (o:Org {org_id: $org_id})
             CREATE (u:User {org_id: $org_id, user_id: $user_id,
                             user_name: $user_name, created_at: $now})
             CREATE (o)-[:HAS_USER]->(u)
             RETURN u",
        )
        .param("org_id", org_id.to_string())
        .param("user_id", user_id.to_string())
        .param("user_name", user_name.to_string())
        .param("now", Utc::now().to_rfc3339());

        let row = self.query_one(q).await?.ok_or_else(|| {
            records::not_found(
                EntityKind::Organization,
                records::key(&[("org_id", org_id.to_string())]),
            )
        })?;
        let user = User::from_row(&row, "u")?;

        tracing::info!(org_id = %org_id, user_id = %user.user_id, "Created user");
        Ok(user)
    }

    pub async fn get_user(&self, org_id: &OrgId, user_id: &UserId) -> Result<User, GraphError> {
        let q = query("MATCH (u:User {org_id: $org_id, user_id: $user_id}) RETURN u")
            .param("org_id", org_id.to_string())
            .param("user_id", user_id.to_string());

        match self.query_one(q).await? {
            Some(row) => User::from_row(&row, "u"),
            None => Err(user_not_found(org_id, user_id)),
        }
    }

    pub async fn update_user_name(
        &self,
        org_id: &OrgId,
        user_id: &UserId,
        user_name: &str,
    ) -> Result<User, GraphError> {
        let q = query(
            "MATCH (u:User {org_id: $org_id, user_id: $user_id})
             SET u.user_name = $user_name
             RETURN u",
        )
        .param("org_id", org_id.to_string())
        .param("user_id", user_id.to_string())
        .param("user_name", user_name.to_string());

        match self.query_one(q).await? {
            Some(row) => User::from_row(&row, "u"),
            None => Err(user_not_found(org_id, user_id)),
        }
    }

    /// List an organization's users, oldest first.
    pub async fn list_users(
        &self,
        org_id: &OrgId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<User>, GraphError> {
        let q = query(
            "MATCH (u:User {org_id: $org_id})
             RETURN u
             ORDER BY u.created_at ASC
             SKIP $offset LIMIT $limit",
        )
        .param("org_id", org_id.to_string())
        .param("limit", limit as i64)
        .param("offset", offset as i64);

        let rows = self.query_rows(q).await?;
        User::from_rows(&rows, "u")
    }

    /// Delete a user together with everything scoped to them: memories,
    /// interactions, dates, and agents they own.
    /// Returns the number of deleted nodes.
    pub async fn delete_user(&self, org_id: &OrgId, user_id: &UserId) -> Result<i64, GraphError> {
        let cypher = format!(
            "{}
             DETACH DELETE n
             RETURN count(n) AS cnt",
            records::labelled_nodes(&USER_CASCADE, "org_id: $org_id, user_id: $user_id")
        );
        let q = query(&cypher)
            .param("org_id", org_id.to_string())
            .param("user_id", user_id.to_string());

        let deleted = records::count(self.query_one(q).await?)?;
        tracing::info!(org_id = %org_id, user_id = %user_id, deleted, "Deleted user");
        Ok(deleted)
    }
}

pub(crate) fn user_not_found(org_id: &OrgId, user_id: &UserId) -> GraphError {
    records::not_found(
        EntityKind::User,
        records::key(&[
            ("org_id", org_id.to_string()),
            ("user_id", user_id.to_string()),
        ]),
    )
}
