//! Integration tests for root propagation.

use fin_acl::Mode;
use fin_client::Method;

use crate::common::{acl_for, grant, p, resources, service};

#[tokio::test]
async fn test_root_grant_reaches_descendants() {
    let service = service();
    resources(service.store(), &["/p", "/p/x", "/p/x/y", "/q"]);
    acl_for(&service, "/p").await;
    grant(&service, "/p", "a", &[Mode::Write], None).await;

    let deep = service.authorizations(&p("/p/x/y")).await.unwrap();
    assert!(deep.authorization["a"][&Mode::Write]);
    assert_eq!(deep.defined_at, vec![p("/p/.acl")]);

    let unrelated = service.authorizations(&p("/q")).await.unwrap();
    assert!(unrelated.is_empty());
}

#[tokio::test]
async fn test_other_subtree_with_own_acl_gains_nothing() {
    let service = service();
    resources(service.store(), &["/p", "/p/x", "/q", "/q/x"]);
    acl_for(&service, "/p").await;
    acl_for(&service, "/q").await;
    grant(&service, "/p", "a", &[Mode::Write], None).await;

    let other = service.authorizations(&p("/q/x")).await.unwrap();
    assert!(other.authorization.is_empty());
    assert_eq!(other.defined_at, vec![p("/q/.acl")]);
}

#[tokio::test]
async fn test_descendant_record_does_not_leak_upward_or_sideways() {
    let service = service();
    resources(service.store(), &["/p", "/p/x", "/p/z"]);
    acl_for(&service, "/p").await;
    grant(&service, "/p/x", "a", &[Mode::Read], None).await;

    assert!(service.authorizations(&p("/p/x")).await.unwrap().allows(Some("a"), Mode::Read));
    assert!(!service.authorizations(&p("/p/z")).await.unwrap().allows(Some("a"), Mode::Read));
    assert!(!service.authorizations(&p("/p")).await.unwrap().allows(Some("a"), Mode::Read));
}

#[tokio::test]
async fn test_root_and_direct_grants_combine() {
    let service = service();
    resources(service.store(), &["/p", "/p/x"]);
    acl_for(&service, "/p").await;
    grant(&service, "/p", "a", &[Mode::Read], None).await;
    grant(&service, "/p/x", "a", &[Mode::Write], None).await;

    let result = service.authorizations(&p("/p/x")).await.unwrap();
    assert_eq!(result.modes_for("a"), [Mode::Read, Mode::Write].into_iter().collect());
    assert_eq!(result.authorizations.len(), 2);
}

#[tokio::test]
async fn test_root_lookup_walks_ancestors_of_container() {
    let service = service();
    resources(service.store(), &["/p", "/p/x", "/p/x/y"]);
    let acl = acl_for(&service, "/p").await;
    service.store().clear_requests();

    let root = service.find_root(&acl, &p("/p/x/y")).await.unwrap();
    assert_eq!(root, Some(p("/p")));
    assert_eq!(service.store().request_count(Method::Head), 1);
}
