//! Integration tests running the engine over the response cache.

use fin_acl::{AclService, Mode, ModifyGroupMembers, CreateGroup, AddAuthorization, Grantee};
use fin_client::{CachingStore, MemoryStore, Method};

use crate::common::{acl_for, grant, p, resources};

fn cached_service() -> AclService<CachingStore<MemoryStore>> {
    AclService::new(CachingStore::new(MemoryStore::new()))
}

#[tokio::test]
async fn test_repeated_resolution_hits_cache() {
    let service = cached_service();
    resources(service.store().inner(), &["/lib", "/lib/book1"]);
    acl_for(&service, "/lib").await;
    grant(&service, "/lib/book1", "alice", &[Mode::Read], None).await;

    let first = service.authorizations(&p("/lib/book1")).await.unwrap();
    let reads = service.store().inner().request_count(Method::Get);
    let second = service.authorizations(&p("/lib/book1")).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(service.store().inner().request_count(Method::Get), reads);
    assert!(service.store().stats().hits > 0);
}

#[tokio::test]
async fn test_mutations_through_cache_are_visible() {
    let service = cached_service();
    resources(service.store().inner(), &["/t"]);
    acl_for(&service, "/t").await;
    let group = service
        .create_group(CreateGroup::new(p("/groups"), "g", Vec::new()))
        .await
        .unwrap();
    service
        .add_authorization(AddAuthorization::new(
            p("/t"),
            Grantee::Group(group.clone()),
            [Mode::Write],
        ))
        .await
        .unwrap();
    assert!(!service.authorizations(&p("/t")).await.unwrap().allows(Some("a"), Mode::Write));

    service
        .modify_group_members(ModifyGroupMembers::add(group, vec!["a".into()]))
        .await
        .unwrap();
    assert!(service.authorizations(&p("/t")).await.unwrap().allows(Some("a"), Mode::Write));

    grant(&service, "/t", "b", &[Mode::Read], None).await;
    assert!(service.authorizations(&p("/t")).await.unwrap().allows(Some("b"), Mode::Read));
}
