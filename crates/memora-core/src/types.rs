//! Core domain types for the Memora memory graph.
//!
//! Every entity hangs off an organization, and memories, interactions and
//! dates additionally hang off a user. The identifiers below are the
//! properties that make up each label's node key.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MemoraError;

// ── Identifiers ───────────────────────────────────────────────────

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = MemoraError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| MemoraError::InvalidId {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

define_id!(
    /// Identifier of an organization, the root of every key.
    OrgId,
    "org_id"
);
define_id!(
    /// Identifier of a user, unique within its organization.
    UserId,
    "user_id"
);
define_id!(
    /// Identifier of an agent, unique within its organization.
    AgentId,
    "agent_id"
);
define_id!(
    /// Identifier of a memory, unique within its user.
    MemoryId,
    "memory_id"
);
define_id!(
    /// Identifier of an interaction, unique within its user.
    InteractionId,
    "interaction_id"
);

// ── Entity Kinds ──────────────────────────────────────────────────

/// The node labels stored in the graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Organization,
    User,
    Agent,
    Memory,
    Interaction,
    Date,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Organization,
        EntityKind::User,
        EntityKind::Agent,
        EntityKind::Memory,
        EntityKind::Interaction,
        EntityKind::Date,
    ];

    /// The Neo4j label for this kind.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Organization => "Org",
            Self::User => "User",
            Self::Agent => "Agent",
            Self::Memory => "Memory",
            Self::Interaction => "Interaction",
            Self::Date => "Date",
        }
    }

    /// Properties forming the node key, outermost scope first.
    pub fn key_properties(&self) -> &'static [&'static str] {
        match self {
            Self::Organization => &["org_id"],
            Self::User => &["org_id", "user_id"],
            Self::Agent => &["org_id", "agent_id"],
            Self::Memory => &["org_id", "user_id", "memory_id"],
            Self::Interaction => &["org_id", "user_id", "interaction_id"],
            Self::Date => &["org_id", "user_id", "date"],
        }
    }

    /// Whether nodes of this kind are scoped to a single user.
    pub fn is_user_scoped(&self) -> bool {
        self.key_properties().contains(&"user_id")
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Entities ──────────────────────────────────────────────────────

/// A tenant of the memory store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Organization {
    pub org_id: OrgId,
    pub org_name: String,
    pub created_at: DateTime<Utc>,
}

/// An end user whose interactions and memories are recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub org_id: OrgId,
    pub user_id: UserId,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

/// An AI agent, either org-wide or owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    pub org_id: OrgId,
    pub agent_id: AgentId,
    pub user_id: Option<UserId>,
    pub agent_label: String,
    pub created_at: DateTime<Utc>,
}

/// A conversation between a user and an agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    pub org_id: OrgId,
    pub user_id: UserId,
    pub agent_id: AgentId,
    pub interaction_id: InteractionId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Interaction {
    /// The calendar day the interaction happened on.
    pub fn date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// A fact about a user extracted from one of their interactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Memory {
    pub org_id: OrgId,
    pub user_id: UserId,
    pub agent_id: AgentId,
    pub memory_id: MemoryId,
    pub interaction_id: InteractionId,
    pub memory: String,
    pub obtained_at: DateTime<Utc>,
}

/// A per-user calendar day that interactions and memories attach to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InteractionDate {
    pub org_id: OrgId,
    pub user_id: UserId,
    pub date: NaiveDate,
}

/// Format used for the `date` property of `Date` nodes.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse the `date` property of a `Date` node.
pub fn parse_date(s: &str) -> Result<NaiveDate, MemoraError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| MemoraError::InvalidDate(s.to_string()))
}

/// Parse an RFC 3339 timestamp property.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, MemoraError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| MemoraError::InvalidTimestamp(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_roundtrips_through_from_str() {
        let id = MemoryId::new();
        let parsed: MemoryId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_invalid_id_names_the_key_property() {
        let err = "not-a-uuid".parse::<UserId>().unwrap_err();
        assert!(matches!(err, MemoraError::InvalidId { kind: "user_id", .. }));
    }

    #[test]
    fn test_every_key_starts_with_org_id() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.key_properties()[0], "org_id", "{kind}");
        }
    }

    #[test]
    fn test_user_scoped_kinds() {
        let scoped: Vec<_> = EntityKind::ALL
            .into_iter()
            .filter(EntityKind::is_user_scoped)
            .collect();
        assert_eq!(
            scoped,
            vec![
                EntityKind::User,
                EntityKind::Memory,
                EntityKind::Interaction,
                EntityKind::Date
            ]
        );
    }

    #[test]
    fn test_interaction_date_is_creation_day() {
        let created_at = parse_timestamp("2024-03-09T23:15:00Z").unwrap();
        let interaction = Interaction {
            org_id: OrgId::new(),
            user_id: UserId::new(),
            agent_id: AgentId::new(),
            interaction_id: InteractionId::new(),
            created_at,
            updated_at: created_at,
        };
        assert_eq!(interaction.date(), parse_date("2024-03-09").unwrap());
    }

    #[test]
    fn test_parse_date_rejects_other_formats() {
        assert!(parse_date("09/03/2024").is_err());
        assert!(parse_timestamp("yesterday").is_err());
    }
}
