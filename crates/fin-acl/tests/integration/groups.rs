//! Integration tests for group expansion and membership edits.

use std::sync::Arc;

use fin_acl::{AclService, AddAuthorization, CreateGroup, Grantee, ModifyGroupMembers, Mode};
use fin_client::{MemoryStore, Method, Store};
use fin_core::ResourcePath;

use crate::common::{acl_for, p, resources, service};

async fn group_with_read_on_target(service: &AclService<MemoryStore>) -> ResourcePath {
    resources(service.store(), &["/t"]);
    acl_for(service, "/t").await;
    let group = service
        .create_group(CreateGroup::new(p("/groups"), "readers", Vec::new()))
        .await
        .unwrap();
    service
        .add_authorization(AddAuthorization::new(
            p("/t"),
            Grantee::Group(group.clone()),
            [Mode::Read],
        ))
        .await
        .unwrap();
    group
}

fn member_triples(store: &MemoryStore, group: &ResourcePath) -> usize {
    store
        .graph(group)
        .unwrap()
        .node(&store.iri_for(group))
        .members()
        .len()
}

#[tokio::test]
async fn test_adding_member_grants_and_removing_revokes() {
    let service = service();
    let group = group_with_read_on_target(&service).await;
    assert!(!service.authorizations(&p("/t")).await.unwrap().allows(Some("a"), Mode::Read));

    service
        .modify_group_members(ModifyGroupMembers::add(group.clone(), vec!["a".into()]))
        .await
        .unwrap();
    let result = service.authorizations(&p("/t")).await.unwrap();
    assert!(result.authorization["a"][&Mode::Read]);

    service
        .modify_group_members(ModifyGroupMembers::remove(group, vec!["a".into()]))
        .await
        .unwrap();
    let result = service.authorizations(&p("/t")).await.unwrap();
    assert!(!result.authorization.contains_key("a"));
    // the record still counts as provenance
    assert_eq!(result.authorizations.len(), 1);
}

#[tokio::test]
async fn test_repeated_add_is_idempotent() {
    let service = service();
    let group = group_with_read_on_target(&service).await;

    for _ in 0..2 {
        service
            .modify_group_members(ModifyGroupMembers::add(group.clone(), vec!["a".into()]))
            .await
            .unwrap();
    }
    assert_eq!(member_triples(service.store(), &group), 1);
    assert_eq!(service.get_group(&group).await.unwrap().members, vec!["a"]);
}

#[tokio::test]
async fn test_membership_patch_is_partial() {
    let service = service();
    let group = service
        .create_group(
            CreateGroup::new(p("/groups"), "g", vec!["a".into(), "b".into()]).with_label("G"),
        )
        .await
        .unwrap();

    service
        .modify_group_members(ModifyGroupMembers {
            group: group.clone(),
            add: vec!["c".into()],
            remove: vec!["a".into()],
        })
        .await
        .unwrap();

    let read = service.get_group(&group).await.unwrap();
    assert_eq!(read.label.as_deref(), Some("G"));
    assert_eq!(read.members, vec!["b", "c"]);
    assert_eq!(service.store().request_count(Method::Put), 0);
}

#[tokio::test]
async fn test_concurrent_edits_are_not_lost() {
    let service = Arc::new(service());
    let group = service
        .create_group(CreateGroup::new(p("/groups"), "g", Vec::new()))
        .await
        .unwrap();

    let edits = (0..8).map(|i| {
        let service = Arc::clone(&service);
        let group = group.clone();
        tokio::spawn(async move {
            service
                .modify_group_members(ModifyGroupMembers::add(group, vec![format!("user{i}")]))
                .await
                .unwrap()
        })
    });
    for edit in futures::future::join_all(edits).await {
        assert_eq!(edit.unwrap().added.len(), 1);
    }

    assert_eq!(service.get_group(&group).await.unwrap().members.len(), 8);
}

#[tokio::test]
async fn test_missing_group_counts_as_empty() {
    let service = service();
    resources(service.store(), &["/t"]);
    acl_for(&service, "/t").await;
    service
        .add_authorization(AddAuthorization::new(
            p("/t"),
            Grantee::Group(p("/groups/ghost")),
            [Mode::Write],
        ))
        .await
        .unwrap();

    let result = service.authorizations(&p("/t")).await.unwrap();
    assert!(result.authorization.is_empty());
    assert_eq!(result.authorizations.len(), 1);
}

#[tokio::test]
async fn test_agent_roles_through_group() {
    let service = service();
    let group = group_with_read_on_target(&service).await;
    service
        .modify_group_members(ModifyGroupMembers::add(group.clone(), vec!["a".into()]))
        .await
        .unwrap();

    let roles = service.agent_roles(&p("/t/.acl"), "a").await.unwrap();
    assert_eq!(roles.groups, vec![group]);
    assert_eq!(roles.authorizations.len(), 1);
    assert!(roles.authorizations[0].modes.contains(&Mode::Read));
}
