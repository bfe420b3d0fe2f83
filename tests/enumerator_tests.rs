mod common;

use common::{utc, FakeClient};
use futures::{StreamExt, TryStreamExt};
use s3_retention::{
    domain::{
        models::{Entry, ListMode},
        value_objects::Prefix,
    },
    ports::storage::StorageClient,
    services::{enumerate, Enumeration},
};
use std::sync::Arc;

fn prefix(value: &str) -> Prefix {
    Prefix::new(value).unwrap()
}

fn object_keys(entries: &[Entry]) -> Vec<&str> {
    entries
        .iter()
        .filter_map(|e| match e {
            Entry::Object(o) => Some(o.key.as_str()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_recursive_enumeration_follows_continuation_tokens() {
    let keys: Vec<String> = (0..5).map(|i| format!("logs/app-{}.log", i)).collect();
    let client = Arc::new(
        FakeClient::new("backups", "fake")
            .with_page_size(2)
            .with_objects(&keys, utc(2024, 1, 1, 0))
            .with_objects(["other/file.txt"], utc(2024, 1, 1, 0)),
    );

    let entries: Vec<Entry> = enumerate(client.clone(), prefix("logs"), ListMode::Recursive)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(object_keys(&entries), keys.iter().map(String::as_str).collect::<Vec<_>>());

    let calls = client.list_calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|c| c.prefix == "logs/" && !c.delimited));
    assert_eq!(calls[0].continuation_token, None);
    assert_eq!(calls[1].continuation_token.as_deref(), Some("logs/app-1.log"));
    assert_eq!(calls[2].continuation_token.as_deref(), Some("logs/app-3.log"));
}

#[tokio::test]
async fn test_delimited_enumeration_yields_folders_and_objects() {
    let client = Arc::new(
        FakeClient::new("backups", "fake")
            .with_page_size(2)
            .with_objects(
                [
                    "runs/",
                    "runs/README",
                    "runs/run_20240101_010000/a.bin",
                    "runs/run_20240101_010000/b.bin",
                    "runs/run_abcxyz/a.bin",
                ],
                utc(2024, 1, 1, 0),
            ),
    );

    let entries: Vec<Entry> = enumerate(client, prefix("runs/"), ListMode::Delimited)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(object_keys(&entries), vec!["runs/README"]);
    let folders: Vec<_> = entries
        .iter()
        .filter_map(|e| match e {
            Entry::Folder(f) => Some(f),
            _ => None,
        })
        .collect();
    assert_eq!(folders.len(), 2);
    assert_eq!(folders[0].prefix, "runs/run_20240101_010000/");
    assert_eq!(folders[1].prefix, "runs/run_abcxyz/");
    // Delimited listing leaves timestamps to the caller.
    assert!(folders.iter().all(|f| f.timestamp.is_none()));
}

#[tokio::test]
async fn test_placeholders_only_surface_on_request() {
    let client = Arc::new(FakeClient::new("backups", "fake").with_objects(
        ["data/", "data/nested/", "data/nested/file.txt"],
        utc(2024, 1, 1, 0),
    ));

    let plain: Vec<Entry> = enumerate(client.clone(), prefix("data/"), ListMode::Recursive)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(object_keys(&plain), vec!["data/nested/file.txt"]);
    assert!(!plain.iter().any(|e| matches!(e, Entry::Placeholder(_))));

    let with_markers: Vec<Entry> =
        Enumeration::new(client, prefix("data/"), ListMode::Recursive)
            .with_placeholders()
            .into_stream()
            .try_collect()
            .await
            .unwrap();
    let markers: Vec<_> = with_markers
        .iter()
        .filter_map(|e| match e {
            Entry::Placeholder(k) => Some(k.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(markers, vec!["data/", "data/nested/"]);
}

#[tokio::test]
async fn test_cursor_is_finite_and_enumeration_restarts() {
    let client = Arc::new(
        FakeClient::new("backups", "fake")
            .with_page_size(1)
            .with_objects(["a/1", "a/2"], utc(2024, 1, 1, 0)),
    );

    let mut cursor = Enumeration::new(client.clone(), prefix("a/"), ListMode::Recursive);
    let mut seen = 0;
    while let Some(entry) = cursor.next().await.unwrap() {
        assert!(matches!(entry, Entry::Object(_)));
        seen += 1;
    }
    assert_eq!(seen, 2);
    assert_eq!(cursor.pages(), 2);
    assert!(cursor.next().await.unwrap().is_none());

    let again: Vec<Entry> = enumerate(client.clone(), prefix("a/"), ListMode::Recursive)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(again.len(), 2);
}

#[tokio::test]
async fn test_list_failure_ends_stream_with_error() {
    let client = Arc::new(
        FakeClient::new("backups", "fake")
            .with_page_size(1)
            .failing_list_call(2)
            .with_objects(["a/1", "a/2", "a/3"], utc(2024, 1, 1, 0)),
    );

    let results: Vec<_> = enumerate(client.clone(), prefix("a/"), ListMode::Recursive)
        .collect()
        .await;

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    assert_eq!(client.list_calls().len(), 2);
    assert_eq!(client.bucket().as_str(), "backups");
}
