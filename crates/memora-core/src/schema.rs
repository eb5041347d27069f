//! Node-key constraints that make up the graph schema.
//!
//! Uniqueness is enforced by Neo4j; this module only describes the
//! constraints and renders the idempotent Cypher that creates them.

use crate::types::EntityKind;

/// A named `IS NODE KEY` constraint over one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeKeyConstraint {
    pub name: &'static str,
    pub kind: EntityKind,
    /// Pattern variable used in the rendered statement.
    pub var: &'static str,
}

impl NodeKeyConstraint {
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    pub fn properties(&self) -> &'static [&'static str] {
        self.kind.key_properties()
    }

    /// Render the `CREATE CONSTRAINT ... IF NOT EXISTS` statement.
    pub fn cypher(&self) -> String {
        let props: Vec<String> = self
            .properties()
            .iter()
            .map(|p| format!("{}.{p}", self.var))
            .collect();
        let target = match props.as_slice() {
            [single] => single.clone(),
            many => format!("({})", many.join(", ")),
        };
        format!(
            "CREATE CONSTRAINT {name} IF NOT EXISTS FOR ({var}:{label}) REQUIRE {target} IS NODE KEY",
            name = self.name,
            var = self.var,
            label = self.label(),
        )
    }
}

/// Every constraint, in the order `setup` issues them.
pub const SCHEMA: [NodeKeyConstraint; 6] = [
    NodeKeyConstraint {
        name: "unique_org_id",
        kind: EntityKind::Organization,
        var: "o",
    },
    NodeKeyConstraint {
        name: "unique_org_user",
        kind: EntityKind::User,
        var: "u",
    },
    NodeKeyConstraint {
        name: "unique_org_agent",
        kind: EntityKind::Agent,
        var: "a",
    },
    NodeKeyConstraint {
        name: "unique_user_memory",
        kind: EntityKind::Memory,
        var: "m",
    },
    NodeKeyConstraint {
        name: "unique_user_interaction",
        kind: EntityKind::Interaction,
        var: "i",
    },
    NodeKeyConstraint {
        name: "unique_user_date",
        kind: EntityKind::Date,
        var: "d",
    },
];

/// Look up the constraint guarding a label.
pub fn constraint_for(kind: EntityKind) -> &'static NodeKeyConstraint {
    match kind {
        EntityKind::Organization => &SCHEMA[0],
        EntityKind::User => &SCHEMA[1],
        EntityKind::Agent => &SCHEMA[2],
        EntityKind::Memory => &SCHEMA[3],
        EntityKind::Interaction => &SCHEMA[4],
        EntityKind::Date => &SCHEMA[5],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_property_key() {
        assert_eq!(
            constraint_for(EntityKind::Organization).cypher(),
            "CREATE CONSTRAINT unique_org_id IF NOT EXISTS FOR (o:Org) REQUIRE o.org_id IS NODE KEY"
        );
    }

    #[test]
    fn test_composite_keys() {
        assert_eq!(
            constraint_for(EntityKind::User).cypher(),
            "CREATE CONSTRAINT unique_org_user IF NOT EXISTS FOR (u:User) \
             REQUIRE (u.org_id, u.user_id) IS NODE KEY"
        );
        assert_eq!(
            constraint_for(EntityKind::Date).cypher(),
            "CREATE CONSTRAINT unique_user_date IF NOT EXISTS FOR (d:Date) \
             REQUIRE (d.org_id, d.user_id, d.date) IS NODE KEY"
        );
    }

    #[test]
    fn test_schema_covers_every_kind_once() {
        for kind in EntityKind::ALL {
            assert_eq!(SCHEMA.iter().filter(|c| c.kind == kind).count(), 1);
            assert_eq!(constraint_for(kind).kind, kind);
        }
        let mut names: Vec<_> = SCHEMA.iter().map(|c| c.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SCHEMA.len());
    }

    #[test]
    fn test_every_statement_is_idempotent() {
        assert!(SCHEMA.iter().all(|c| c.cypher().contains("IF NOT EXISTS")));
    }
}
