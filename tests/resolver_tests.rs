mod common;

use common::{bucket, endpoint, FakeClient, FakeFactory};
use s3_retention::{
    domain::errors::{RetentionError, StorageError},
    services::ClientResolver,
};
use std::sync::Arc;

fn denied(name: &str) -> StorageError {
    StorageError::AccessDenied {
        bucket: bucket(name),
        operation: "head_bucket".to_string(),
    }
}

#[tokio::test]
async fn test_first_reachable_candidate_wins() {
    let a = Arc::new(FakeClient::new("backups", "https://a.example").unreachable(denied("backups")));
    let b = Arc::new(FakeClient::new("backups", "https://b.example"));
    let c = Arc::new(FakeClient::new("backups", "https://c.example"));
    let factory = Arc::new(
        FakeFactory::new()
            .with_client(a.clone())
            .with_client(b.clone())
            .with_client(c.clone()),
    );
    let resolver = ClientResolver::new(
        vec![
            endpoint("https://a.example"),
            endpoint("https://b.example"),
            endpoint("https://c.example"),
        ],
        factory.clone(),
    );

    let client = resolver.resolve(&bucket("backups")).await.unwrap();

    assert_eq!(client.endpoint_label(), "https://b.example");
    assert_eq!(a.heads(), 1);
    assert_eq!(b.heads(), 1);
    // Probing stops at the first success.
    assert_eq!(c.heads(), 0);
    assert_eq!(factory.connects(), vec!["https://a.example", "https://b.example"]);
}

#[tokio::test]
async fn test_all_candidates_fail_with_last_error() {
    let a = Arc::new(FakeClient::new("backups", "https://a.example").unreachable(denied("backups")));
    let b = Arc::new(FakeClient::new("backups", "https://b.example").unreachable(
        StorageError::BucketNotFound {
            bucket: bucket("backups"),
        },
    ));
    let factory = Arc::new(FakeFactory::new().with_client(a).with_client(b));
    let resolver = ClientResolver::new(
        vec![endpoint("https://a.example"), endpoint("https://b.example")],
        factory,
    );

    let err = resolver.resolve(&bucket("backups")).await.err().unwrap();
    match err {
        RetentionError::NoUsableClient {
            bucket: b,
            attempts,
            last_error,
        } => {
            assert_eq!(b.as_str(), "backups");
            assert_eq!(attempts, 2);
            assert_eq!(last_error.unwrap().code(), "NoSuchBucket");
        }
        other => panic!("Expected NoUsableClient, got {:?}", other),
    }
}

#[tokio::test]
async fn test_construction_failure_counts_as_failed_candidate() {
    let good = Arc::new(FakeClient::new("backups", "https://good.example"));
    let factory = Arc::new(
        FakeFactory::new()
            .with_broken("https://broken.example")
            .with_client(good.clone()),
    );
    let resolver = ClientResolver::new(
        vec![
            endpoint("https://broken.example"),
            endpoint("https://good.example"),
        ],
        factory.clone(),
    );

    let client = resolver.resolve(&bucket("backups")).await.unwrap();
    assert_eq!(client.endpoint_label(), "https://good.example");
    assert_eq!(good.heads(), 1);
}

#[tokio::test]
async fn test_only_broken_candidates_report_construction_error() {
    let factory = Arc::new(FakeFactory::new().with_broken("https://broken.example"));
    let resolver = ClientResolver::new(vec![endpoint("https://broken.example")], factory);

    let err = resolver.resolve(&bucket("backups")).await.err().unwrap();
    assert!(matches!(
        err,
        RetentionError::NoUsableClient {
            attempts: 1,
            last_error: Some(StorageError::Configuration { .. }),
            ..
        }
    ));
}

#[tokio::test]
async fn test_resolution_is_not_cached() {
    let client = Arc::new(FakeClient::new("backups", "https://a.example"));
    let factory = Arc::new(FakeFactory::new().with_client(client.clone()));
    let resolver = ClientResolver::new(vec![endpoint("https://a.example")], factory);

    resolver.resolve(&bucket("backups")).await.unwrap();
    resolver.resolve(&bucket("backups")).await.unwrap();

    assert_eq!(client.heads(), 2);
}

#[tokio::test]
async fn test_no_candidates() {
    let resolver = ClientResolver::new(Vec::new(), Arc::new(FakeFactory::new()));

    let err = resolver.resolve(&bucket("backups")).await.err().unwrap();
    assert!(matches!(
        err,
        RetentionError::NoUsableClient {
            attempts: 0,
            last_error: None,
            ..
        }
    ));
}
