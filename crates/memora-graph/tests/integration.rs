//! Integration tests for memora-graph against a live Neo4j instance.
//!
//! Run with: cargo test --package memora-graph --test integration -- --ignored
//! Connection settings come from NEO4J_URI / NEO4J_USERNAME / NEO4J_PASSWORD /
//! NEO4J_DATABASE. Skipped automatically if Neo4j is not available.

use memora_core::{MemoraConfig, OrgId, SCHEMA};
use memora_graph::{GraphClient, GraphConfig, GraphError};

async fn connect_or_skip() -> Option<GraphClient> {
    let settings = MemoraConfig::load("memora")
        .map(|c| c.neo4j)
        .unwrap_or_default();
    let config = GraphConfig::from(settings);
    let client = match GraphClient::connect(&config).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Skipping integration test (Neo4j not available): {e}");
            return None;
        }
    };
    // The pool connects lazily; query once so an unreachable server skips.
    if let Err(e) = client.list_constraints().await {
        eprintln!("Skipping integration test (Neo4j not available): {e}");
        return None;
    }
    Some(client)
}

async fn cleanup(client: &GraphClient, org_id: &OrgId) {
    let _ = client.delete_organization(org_id).await;
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_setup_is_idempotent() {
    let Some(client) = connect_or_skip().await else {
        return;
    };

    client.setup().await.unwrap();
    let before = client.list_constraints().await.unwrap();

    client.setup().await.unwrap();
    let after = client.list_constraints().await.unwrap();

    assert_eq!(before.len(), after.len());
    for constraint in SCHEMA {
        let occurrences = after.iter().filter(|c| c.name == constraint.name).count();
        assert_eq!(occurrences, 1, "{}", constraint.name);
    }
    assert!(client.verify_schema().await.unwrap().is_complete());
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_duplicate_date_key_rejected() {
    let Some(client) = connect_or_skip().await else {
        return;
    };
    client.setup().await.unwrap();

    let org = client.create_organization("dup-date").await.unwrap();
    let user = client.create_user(&org.org_id, "ada").await.unwrap();

    let create = || {
        neo4rs::query("CREATE (:Date {org_id: $org_id, user_id: $user_id, date: '2024-01-01'})")
            .param("org_id", org.org_id.to_string())
            .param("user_id", user.user_id.to_string())
    };
    client.run(create()).await.unwrap();
    let err = client.run(create()).await.unwrap_err();
    assert!(
        matches!(err, GraphError::ConstraintViolation { .. }),
        "unexpected error: {err}"
    );

    cleanup(&client, &org.org_id).await;
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_duplicate_user_key_rejected_within_org_only() {
    let Some(client) = connect_or_skip().await else {
        return;
    };
    client.setup().await.unwrap();

    let org_a = client.create_organization("org-a").await.unwrap();
    let org_b = client.create_organization("org-b").await.unwrap();
    let user = client.create_user(&org_a.org_id, "grace").await.unwrap();

    let create_user = |org_id: &OrgId| {
        neo4rs::query("CREATE (:User {org_id: $org_id, user_id: $user_id, user_name: 'copy'})")
            .param("org_id", org_id.to_string())
            .param("user_id", user.user_id.to_string())
    };

    let err = client.run(create_user(&org_a.org_id)).await.unwrap_err();
    assert!(matches!(err, GraphError::ConstraintViolation { .. }));

    // Same user_id under another organization is a different key.
    client.run(create_user(&org_b.org_id)).await.unwrap();

    cleanup(&client, &org_a.org_id).await;
    cleanup(&client, &org_b.org_id).await;
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_memory_lifecycle() {
    let Some(client) = connect_or_skip().await else {
        return;
    };
    client.setup().await.unwrap();

    let org = client.create_organization("lifecycle").await.unwrap();
    let user = client.create_user(&org.org_id, "linus").await.unwrap();
    let agent = client
        .create_agent(&org.org_id, "assistant", Some(&user.user_id))
        .await
        .unwrap();
    assert_eq!(agent.user_id, Some(user.user_id));

    let interaction = client
        .save_interaction(&org.org_id, &user.user_id, &agent.agent_id)
        .await
        .unwrap();
    let memory = client
        .add_memory(
            &org.org_id,
            &user.user_id,
            &interaction.interaction_id,
            "Prefers tea over coffee",
        )
        .await
        .unwrap();
    assert_eq!(memory.agent_id, agent.agent_id);

    let dates = client
        .list_interaction_dates(&org.org_id, &user.user_id)
        .await
        .unwrap();
    assert_eq!(dates.len(), 1);
    assert_eq!(dates[0].date, interaction.date());

    let updated = client
        .update_memory(&org.org_id, &user.user_id, &memory.memory_id, "Prefers green tea")
        .await
        .unwrap();
    assert_eq!(updated.memory, "Prefers green tea");

    let deleted = client
        .delete_interaction(&org.org_id, &user.user_id, &interaction.interaction_id)
        .await
        .unwrap();
    assert_eq!(deleted, 2);

    let err = client
        .get_memory(&org.org_id, &user.user_id, &memory.memory_id)
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::NotFound { label: "Memory", .. }));

    cleanup(&client, &org.org_id).await;
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_create_user_requires_org() {
    let Some(client) = connect_or_skip().await else {
        return;
    };

    let err = client.create_user(&OrgId::new(), "nobody").await.unwrap_err();
    assert!(matches!(err, GraphError::NotFound { label: "Org", .. }));
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_close_twice() {
    let Some(client) = connect_or_skip().await else {
        return;
    };
    let clone = client.clone();

    client.close().await;
    client.close().await;

    assert!(clone.is_closed().await);
    let err = clone.verify_schema().await.unwrap_err();
    assert!(matches!(err, GraphError::Closed));
}
