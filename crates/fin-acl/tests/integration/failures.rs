//! Integration tests for error reporting and resumable mutations.

use fin_acl::{CreateAcl, Error, Mode, Step};
use fin_client::Method;

use crate::common::{acl_for, grant, p, resources, service};

#[tokio::test]
async fn test_create_acl_link_failure_is_resumable() {
    let service = service();
    resources(service.store(), &["/lib", "/lib/book1"]);
    service.store().fail_next(Method::Patch, &p("/lib"), 503);

    let err = service.create_acl(CreateAcl::new(p("/lib"))).await.unwrap_err();
    let Error::Partial {
        operation,
        completed,
        source,
    } = &err
    else {
        unreachable!("expected partial failure, got {err}");
    };
    assert_eq!(*operation, "create acl");
    assert_eq!(
        completed,
        &vec![Step::Created {
            path: p("/lib/.acl")
        }]
    );
    assert!(matches!(**source, Error::Upstream { status: 503, .. }));
    assert!(err.is_retryable());

    // the orphan exists but nothing advertises it yet
    assert!(service.store().exists(&p("/lib/.acl")));
    assert!(service.locate_acl(&p("/lib")).await.unwrap().is_empty());

    // finishing the missing step converges
    assert!(service.link_acl(&p("/lib"), &p("/lib/.acl")).await.unwrap());
    grant(&service, "/lib/book1", "alice", &[Mode::Read], None).await;
    let result = service.authorizations(&p("/lib/book1")).await.unwrap();
    assert!(result.allows(Some("alice"), Mode::Read));
}

#[tokio::test]
async fn test_create_acl_twice_conflicts() {
    let service = service();
    resources(service.store(), &["/lib"]);
    acl_for(&service, "/lib").await;

    let err = service.create_acl(CreateAcl::new(p("/lib"))).await.unwrap_err();
    assert!(matches!(err, Error::Conflict { ref path } if *path == p("/lib/.acl")));
}

#[tokio::test]
async fn test_failed_container_creation_has_no_completed_steps() {
    let service = service();
    resources(service.store(), &["/lib"]);
    service
        .store()
        .fail_next(Method::Post, &fin_core::ResourcePath::root(), 500);

    let err = service.create_acl(CreateAcl::new(p("/lib"))).await.unwrap_err();
    assert!(matches!(err, Error::Upstream { step: "create acl container", .. }));
    assert!(err.completed_steps().is_empty());
}

#[tokio::test]
async fn test_duplicate_authorization_conflicts() {
    let service = service();
    resources(service.store(), &["/r"]);
    acl_for(&service, "/r").await;
    grant(&service, "/r", "a", &[Mode::Read], None).await;

    let err = service
        .add_authorization(fin_acl::AddAuthorization::new(
            p("/r"),
            fin_acl::Grantee::User("a".into()),
            [Mode::Read],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict { .. }));
}

#[tokio::test]
async fn test_authorization_target_must_exist() {
    let service = service();
    let err = service
        .add_authorization(fin_acl::AddAuthorization::new(
            p("/ghost"),
            fin_acl::Grantee::Public,
            [Mode::Read],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn test_upstream_failure_while_resolving() {
    let service = service();
    resources(service.store(), &["/lib"]);
    acl_for(&service, "/lib").await;
    service.store().fail_next(Method::Get, &p("/lib/.acl"), 500);

    let err = service.authorizations(&p("/lib")).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Upstream {
            step: "read acl container",
            method: Method::Get,
            status: 500,
            ..
        }
    ));

    // no internal retry; the next call succeeds
    assert!(service.authorizations(&p("/lib")).await.is_ok());
}
