#![cfg(feature = "integration-tests")]

use palisade_domain::{
    CreateRelationInputWithId, DomainError, OutboxRepository, RelationFilter, RelationOp,
    RelationRepository, RelationTuple, SyncStatus,
};
use palisade_postgres::{
    PostgresClient, PostgresConfig, PostgresOutboxRepository, PostgresRelationRepository,
};
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::postgres::Postgres;
use uuid::Uuid;

async fn setup_test_db() -> (ContainerAsync<Postgres>, PostgresClient) {
    let postgres = Postgres::default().start().await.unwrap();
    let host = postgres.get_host().await.unwrap();
    let port = postgres.get_host_port_ipv4(5432).await.unwrap();

    let config = PostgresConfig {
        host: host.to_string(),
        port,
        database: "postgres".to_string(),
        username: "postgres".to_string(),
        password: "postgres".to_string(),
        max_pool_size: 5,
    };
    let client = PostgresClient::new(&config).expect("Failed to create client");
    client.ping().await.expect("Database unreachable");
    client.run_migrations().await.expect("Migrations failed");

    (postgres, client)
}

fn tuple(subject: &str) -> RelationTuple {
    RelationTuple::new(
        "user",
        subject,
        "organization",
        "org-1",
        "organization:owner",
    )
}

fn create_input(tuple: RelationTuple) -> CreateRelationInputWithId {
    CreateRelationInputWithId {
        id: Uuid::new_v4(),
        tuple,
    }
}

#[tokio::test]
async fn test_create_delete_recreate_with_outbox_ordering() {
    let (_container, client) = setup_test_db().await;
    let relations = PostgresRelationRepository::new(client.clone());
    let outbox = PostgresOutboxRepository::new(client);

    let first = relations
        .create_relation(create_input(tuple("user-1")))
        .await
        .unwrap();
    assert_eq!(first.sync_status, SyncStatus::Pending);

    // Active tuple uniqueness
    let duplicate = relations.create_relation(create_input(tuple("user-1"))).await;
    assert!(matches!(
        duplicate,
        Err(DomainError::RelationAlreadyExists(_))
    ));

    relations.delete_relation(&tuple("user-1")).await.unwrap();
    let second = relations
        .create_relation(create_input(tuple("user-1")))
        .await
        .unwrap();
    assert_ne!(first.id, second.id);

    // Soft-deleted row remains fetchable by ID
    let deleted = relations.get_relation(first.id).await.unwrap().unwrap();
    assert!(deleted.deleted_at.is_some());

    let events = outbox.poll_pending(10).await.unwrap();
    let ops: Vec<_> = events.iter().map(|e| e.op).collect();
    assert_eq!(
        ops,
        vec![RelationOp::Created, RelationOp::Deleted, RelationOp::Created]
    );
    let seqs: Vec<_> = events.iter().map(|e| e.seq).collect();
    let mut sorted = seqs.clone();
    sorted.sort_unstable();
    assert_eq!(seqs, sorted);
}

#[tokio::test]
async fn test_ack_and_mark_synced() {
    let (_container, client) = setup_test_db().await;
    let relations = PostgresRelationRepository::new(client.clone());
    let outbox = PostgresOutboxRepository::new(client);

    let relation = relations
        .create_relation(create_input(tuple("user-2")))
        .await
        .unwrap();
    let events = outbox.poll_pending(10).await.unwrap();
    assert_eq!(events.len(), 1);

    outbox.ack(events[0].seq).await.unwrap();
    relations.mark_synced(relation.id).await.unwrap();

    assert_eq!(outbox.pending_count().await.unwrap(), 0);
    let synced = relations.get_relation(relation.id).await.unwrap().unwrap();
    assert_eq!(synced.sync_status, SyncStatus::Synced);
}

#[tokio::test]
async fn test_list_relations_active_filter() {
    let (_container, client) = setup_test_db().await;
    let relations = PostgresRelationRepository::new(client);

    relations
        .create_relation(create_input(tuple("user-3")))
        .await
        .unwrap();
    relations
        .create_relation(create_input(tuple("user-4")))
        .await
        .unwrap();
    relations.delete_relation(&tuple("user-3")).await.unwrap();

    let active = relations
        .list_relations(RelationFilter::active())
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].tuple.subject_id, "user-4");

    let all = relations
        .list_relations(RelationFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    // Field predicates combine with the active filter
    let by_subject = relations
        .list_relations(RelationFilter {
            subject_id: Some("user-3".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_subject.len(), 1);
    assert!(by_subject[0].deleted_at.is_some());

    let active_by_subject = relations
        .list_relations(RelationFilter {
            subject_id: Some("user-3".to_string()),
            active_only: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(active_by_subject.is_empty());

    let by_role = relations
        .list_relations(RelationFilter {
            object_namespace_id: Some("organization".to_string()),
            role_id: Some("organization:owner".to_string()),
            active_only: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_role.len(), 1);
    assert_eq!(by_role[0].tuple.subject_id, "user-4");
}
