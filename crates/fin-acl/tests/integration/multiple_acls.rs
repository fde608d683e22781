//! Integration tests for resources governed by several ACL containers.

use fin_acl::{CreateAcl, Mode};
use fin_core::ResourcePath;

use crate::common::{grant, p, resources, service};

async fn two_acl_service(order: [&str; 2]) -> fin_acl::AclService<fin_client::MemoryStore> {
    let service = service();
    resources(service.store(), &["/x"]);
    for name in order {
        service
            .create_acl(CreateAcl::new(p("/x")).with_container_name(name))
            .await
            .unwrap();
    }
    grant(&service, "/x", "bob", &[Mode::Read], Some(&p("/x/.acl"))).await;
    grant(&service, "/x", "bob", &[Mode::Write], Some(&p("/x/.acl2"))).await;
    service
}

#[tokio::test]
async fn test_two_acls_union() {
    let service = two_acl_service([".acl", ".acl2"]).await;

    let result = service.authorizations(&p("/x")).await.unwrap();
    assert_eq!(result.modes_for("bob"), [Mode::Read, Mode::Write].into_iter().collect());
    assert_eq!(result.defined_at.len(), 2);
    assert!(result.defined_at.contains(&p("/x/.acl")));
    assert!(result.defined_at.contains(&p("/x/.acl2")));
    assert_eq!(result.authorizations.len(), 2);
}

#[tokio::test]
async fn test_link_order_does_not_matter() {
    let forward = two_acl_service([".acl", ".acl2"]).await;
    let backward = two_acl_service([".acl2", ".acl"]).await;

    let a = forward.authorizations(&p("/x")).await.unwrap();
    let b = backward.authorizations(&p("/x")).await.unwrap();
    assert_eq!(a.authorization, b.authorization);
    assert_eq!(a.authorizations, b.authorizations);
}

#[tokio::test]
async fn test_second_acl_only_adds() {
    let service = service();
    resources(service.store(), &["/x"]);
    service.create_acl(CreateAcl::new(p("/x"))).await.unwrap();
    grant(&service, "/x", "bob", &[Mode::Read], None).await;
    let before = service.authorizations(&p("/x")).await.unwrap();

    service
        .create_acl(CreateAcl::new(p("/x")).with_container_name(".acl2"))
        .await
        .unwrap();
    let after = service.authorizations(&p("/x")).await.unwrap();

    for (agent, modes) in &before.authorization {
        for mode in modes.keys() {
            assert!(after.authorization[agent][mode]);
        }
    }
    assert_eq!(after.defined_at.len(), 2);
}

#[tokio::test]
async fn test_default_acl_is_first_linked() {
    let service = two_acl_service([".acl", ".acl2"]).await;
    let linked = service.locate_acl(&p("/x")).await.unwrap();

    let record = grant(&service, "/x", "carol", &[Mode::Read], None).await;
    assert!(record.is_within(&linked[0]));

    let result = service.authorizations(&p("/x")).await.unwrap();
    assert!(result.allows(Some("carol"), Mode::Read));
}

#[tokio::test]
async fn test_authorizations_for_many_paths() {
    let service = two_acl_service([".acl", ".acl2"]).await;
    resources(service.store(), &["/other"]);

    let results = service
        .authorizations_for(&[p("/x"), p("/other")])
        .await
        .unwrap();
    assert!(results[&p("/x")].allows(Some("bob"), Mode::Write));
    assert!(results[&p("/other")].is_empty());
    assert!(!results.contains_key(&ResourcePath::root()));
}
