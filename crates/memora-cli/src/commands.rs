//! Subcommand implementations.

use std::io::Write;

use memora_core::SCHEMA;
use memora_graph::{GraphClient, SchemaStatus};

/// Create the schema, then confirm every constraint is in place.
pub async fn setup(graph: &GraphClient) -> anyhow::Result<()> {
    graph.setup().await?;

    let status = graph.verify_schema().await?;
    if !status.missing.is_empty() {
        anyhow::bail!(
            "Schema setup finished but constraints are missing: {}",
            status.missing.join(", ")
        );
    }
    if !status.mismatched.is_empty() {
        anyhow::bail!(
            "Constraints exist under the expected name with a different definition \
             (drop them and rerun setup): {}",
            status.mismatched.join(", ")
        );
    }
    tracing::info!(constraints = status.present.len(), "Schema setup verified");
    Ok(())
}

/// Report the schema status. Returns whether every constraint exists with
/// the expected definition.
pub async fn verify(graph: &GraphClient, out: &mut impl Write) -> anyhow::Result<bool> {
    let status = graph.verify_schema().await?;
    tracing::info!(
        present = status.present.len(),
        missing = status.missing.len(),
        mismatched = status.mismatched.len(),
        "Schema verified"
    );
    write_status(&status, out)?;
    Ok(status.is_complete())
}

pub fn write_status(status: &SchemaStatus, out: &mut impl Write) -> std::io::Result<()> {
    for name in &status.present {
        writeln!(out, "ok       {name}")?;
    }
    for name in &status.missing {
        writeln!(out, "missing  {name}")?;
    }
    for name in &status.mismatched {
        writeln!(out, "mismatch {name}")?;
    }
    Ok(())
}

/// Print the statements `setup` would run, one per line.
pub fn write_constraints(out: &mut impl Write) -> std::io::Result<()> {
    for constraint in &SCHEMA {
        writeln!(out, "{};", constraint.cypher())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_constraints() {
        let mut out = Vec::new();
        write_constraints(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), SCHEMA.len());
        assert!(lines[0].starts_with("CREATE CONSTRAINT unique_org_id IF NOT EXISTS"));
        assert!(lines.iter().all(|l| l.ends_with("IS NODE KEY;")));
    }

    #[test]
    fn test_write_status() {
        let status = SchemaStatus {
            present: vec!["unique_org_id"],
            missing: vec!["unique_user_date"],
            mismatched: vec!["unique_org_user"],
        };
        let mut out = Vec::new();
        write_status(&status, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "ok       unique_org_id\nmissing  unique_user_date\nmismatch unique_org_user\n"
        );
    }
}
