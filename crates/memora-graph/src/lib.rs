//! Memora Graph: Neo4j client for the memory graph.
//!
//! This crate is the single access point for the Neo4j database. It owns
//! the node-key schema setup and groups the per-entity operations
//! (organizations, users, agents, interactions, memories) as methods on
//! [`GraphClient`]. Every key is scoped by `org_id`; uniqueness is enforced
//! by the database constraints created in [`GraphClient::setup`].

pub mod agent;
pub mod client;
pub mod interaction;
pub mod memory;
pub mod organization;
mod records;
pub mod schema;
pub mod user;

pub use client::{is_constraint_violation, GraphClient, GraphConfig, GraphError};
pub use schema::{ExistingConstraint, SchemaStatus};
