//! memora-core: Shared types, schema, configuration, and error handling for Memora.
//!
//! This crate provides the foundational pieces used across Memora components:
//! - Identifier and entity types (Organization, User, Agent, Memory, ...)
//! - The node-key constraints that make up the graph schema
//! - Configuration management
//! - Common error types

pub mod config;
pub mod error;
pub mod schema;
pub mod types;

pub use config::{LogSettings, MemoraConfig, Neo4jSettings};
pub use error::MemoraError;
pub use schema::{NodeKeyConstraint, SCHEMA};
pub use types::{
    Agent, AgentId, EntityKind, Interaction, InteractionDate, InteractionId, Memory, MemoryId,
    OrgId, Organization, User, UserId,
};
