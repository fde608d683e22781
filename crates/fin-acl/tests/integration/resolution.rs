//! Integration tests for single-ACL resolution.

use fin_acl::{AddAuthorization, CreateGroup, Grantee, Mode, PUBLIC_AGENT};
use fin_client::Store;
use fin_graph::{Graph, Term, vocab};
use serde_json::json;

use crate::common::{acl_for, grant, p, resources, service};

#[tokio::test]
async fn test_no_acl_means_empty_result() {
    let service = service();
    resources(service.store(), &["/plain"]);

    for path in ["/plain", "/missing", "/"] {
        let result = service.authorizations(&p(path)).await.unwrap();
        assert!(result.authorization.is_empty(), "{path}");
        assert!(result.authorizations.is_empty(), "{path}");
        assert!(result.defined_at.is_empty(), "{path}");
    }
}

#[tokio::test]
async fn test_direct_grant() {
    let service = service();
    resources(service.store(), &["/r"]);
    acl_for(&service, "/r").await;
    grant(&service, "/r", "a", &[Mode::Read], None).await;

    let result = service.authorizations(&p("/r")).await.unwrap();
    assert!(result.authorization["a"][&Mode::Read]);
    assert!(!result.authorization["a"].contains_key(&Mode::Write));
}

#[tokio::test]
async fn test_library_scenario() {
    let service = service();
    resources(service.store(), &["/lib", "/lib/book1"]);

    let acl = acl_for(&service, "/lib").await;
    assert_eq!(acl, p("/lib/.acl"));
    let record = grant(&service, "/lib/book1", "alice", &[Mode::Read], None).await;

    let result = service.authorizations(&p("/lib/book1")).await.unwrap();
    let expected = json!({
        "authorization": { "alice": { "Read": true } },
        "authorizations": { record.as_str(): { "alice": { "Read": true } } },
        "definedAt": ["/lib/.acl"],
    });
    assert_eq!(serde_json::to_value(&result).unwrap(), expected);
}

#[tokio::test]
async fn test_grant_on_one_child_does_not_reach_sibling() {
    let service = service();
    resources(service.store(), &["/lib", "/lib/book1", "/lib/book2"]);
    acl_for(&service, "/lib").await;
    grant(&service, "/lib/book1", "alice", &[Mode::Read], None).await;

    let sibling = service.authorizations(&p("/lib/book2")).await.unwrap();
    assert!(sibling.authorization.is_empty());
    assert_eq!(sibling.defined_at, vec![p("/lib/.acl")]);
}

#[tokio::test]
async fn test_public_grant_allows_anonymous() {
    let service = service();
    resources(service.store(), &["/open"]);
    acl_for(&service, "/open").await;
    service
        .add_authorization(AddAuthorization::new(p("/open"), Grantee::Public, [Mode::Read]))
        .await
        .unwrap();

    let result = service.authorizations(&p("/open")).await.unwrap();
    assert!(result.authorization[PUBLIC_AGENT][&Mode::Read]);
    assert!(result.allows(None, Mode::Read));
    assert!(result.allows(Some("anyone"), Mode::Read));
    assert!(!result.allows(None, Mode::Write));
}

#[tokio::test]
async fn test_removed_authorization_stops_applying() {
    let service = service();
    resources(service.store(), &["/r"]);
    acl_for(&service, "/r").await;
    let record = grant(&service, "/r", "a", &[Mode::Read, Mode::Write], None).await;
    assert_eq!(record, p("/r/.acl/u/a/r/rw"));

    service.remove_authorization(&record).await.unwrap();
    let result = service.authorizations(&p("/r")).await.unwrap();
    assert!(result.authorization.is_empty());
    assert_eq!(result.defined_at, vec![p("/r/.acl")]);
}

#[tokio::test]
async fn test_index_lists_every_target() {
    let service = service();
    resources(service.store(), &["/it", "/it/child1", "/it/child2"]);
    let acl = acl_for(&service, "/it").await;
    grant(&service, "/it", "alice", &[Mode::Read], None).await;
    grant(&service, "/it/child2", "alice", &[Mode::Write], None).await;

    let index = service.build_index(&acl).await.unwrap();
    assert_eq!(index.entries.len(), 2);
    assert!(index.get(&p("/it/child1")).is_none());
    assert!(
        index
            .get(&p("/it/child2"))
            .unwrap()
            .authorizations
            .contains_key(&p("/it/.acl/u/alice/it/child2/w"))
    );
}

fn read_record(access_to: &str, grantee: (&str, &str)) -> Graph {
    let mut graph = Graph::new();
    graph.insert(Term::iri(""), vocab::rdf::TYPE, Term::iri(vocab::acl::AUTHORIZATION));
    graph.insert(Term::iri(""), vocab::acl::ACCESS_TO, Term::iri(access_to));
    graph.insert(Term::iri(""), grantee.0, Term::iri(grantee.1));
    graph.insert(Term::iri(""), vocab::acl::MODE, Term::iri(vocab::acl::READ));
    graph
}

#[tokio::test]
async fn test_lookalike_hosts_are_not_local() {
    let service = service();
    let store = service.store();
    resources(store, &["/lib", "/lib/book1"]);
    let acl = acl_for(&service, "/lib").await;
    grant(&service, "/lib/book1", "alice", &[Mode::Read], None).await;
    service
        .create_group(CreateGroup::new(p("/groups"), "g", vec!["mallory".to_string()]))
        .await
        .unwrap();

    let book1 = store.iri_for(&p("/lib/book1"));
    store.insert(
        &acl.join("lookalike-group").unwrap(),
        read_record(
            &book1,
            (vocab::acl::AGENT_CLASS, "http://localhost:3000.evil.example/fcrepo/rest/groups/g"),
        ),
    );
    store.insert(
        &acl.join("other-port-target").unwrap(),
        read_record(
            "http://localhost:30001/fcrepo/rest/lib/book1",
            (vocab::acl::AGENT, "eve"),
        ),
    );
    store.insert(
        &acl.join("same-origin-upper-case").unwrap(),
        read_record(
            "HTTP://LOCALHOST:3000/fcrepo/rest/lib/book1",
            (vocab::acl::AGENT, "carol"),
        ),
    );

    let result = service.authorizations(&p("/lib/book1")).await.unwrap();
    assert!(result.allows(Some("alice"), Mode::Read));
    assert!(result.allows(Some("carol"), Mode::Read));
    assert!(!result.allows(Some("mallory"), Mode::Read));
    assert!(!result.allows(Some("eve"), Mode::Read));
    assert!(!result.authorization.contains_key("mallory"));

    let mut foreign_link = Graph::new();
    foreign_link.insert(
        Term::iri(""),
        vocab::acl::ACCESS_CONTROL,
        Term::iri("http://localhost:3000.evil.example/fcrepo/rest/lib/.acl"),
    );
    store.insert(&p("/lib/book2"), foreign_link);

    assert!(service.locate_acl(&p("/lib/book2")).await.unwrap().is_empty());
    let result = service.authorizations(&p("/lib/book2")).await.unwrap();
    assert!(result.defined_at.is_empty());
    assert!(result.authorization.is_empty());
}
