//! memora-cli: schema setup and verification for the Memora graph.
//!
//! The binary connects with the configured Neo4j settings, creates the
//! node-key constraints, and reports which ones are present.

pub mod commands;
pub mod logging;
