//! Properties of the upload engine and the scanner, run against the in-memory store
//!
//! - Rechunked parts are full except the last one, and concatenate back to the input
//! - Parts complete in ascending order whatever order the store acknowledges them in
//! - Concurrent uploads of one name end up under distinct keys
//! - Renaming gives up after a bounded number of attempts
//! - Resuming the unlinked listing hands out every object exactly once, for any page size
//! - Locks are released on every outcome

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing,
    clippy::panic
)]

mod common;

use bytes::Bytes;
use common::{chunked_body, pattern};
use futures::{StreamExt, future::join_all, stream};
use rand::{Rng, SeedableRng, rngs::StdRng};
use s3attach::{
    destination::Destination,
    lock::LockRegistry,
    naming::{DuplicateHandling, NamingMode, NamingPolicy, RenameStrategy},
    records::{AttachmentRecord, AttachmentRepository, SledRepository},
    scan::{Cursor, list_unlinked},
    store::{MemoryStore, StoreError, memory::Operation},
    stream::Rechunker,
    upload::{MAX_ATTEMPTS, UploadError, Uploader},
};
use std::{collections::HashSet, io, time::Duration};

fn random_cuts(rng: &mut StdRng, len: usize) -> Vec<usize> {
    let mut cuts: Vec<usize> = (0..rng.random_range(0..8))
        .map(|_| rng.random_range(0..=len))
        .collect();
    cuts.sort_unstable();
    cuts
}

fn policy(duplicate: DuplicateHandling) -> NamingPolicy {
    NamingPolicy::new(NamingMode::None, duplicate)
}

#[tokio::test]
async fn test_rechunk_parts_are_full_and_lossless() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..200 {
        let data = pattern(rng.random_range(1..300));
        let part_size = rng.random_range(1..64);
        let cuts = random_cuts(&mut rng, data.len());

        let parts: Vec<Bytes> = Rechunker::new(chunked_body(&data, &cuts), part_size)
            .map(|part| part.unwrap())
            .collect()
            .await;

        let (last, full) = parts.split_last().unwrap();
        assert!(full.iter().all(|part| part.len() == part_size));
        assert!(!last.is_empty() && last.len() <= part_size);
        assert_eq!(parts.len(), data.len().div_ceil(part_size));
        assert_eq!(parts.concat(), data);
    }
}

#[tokio::test]
async fn test_rechunk_empty_input() {
    let body = stream::iter(vec![Ok::<_, io::Error>(Bytes::new()), Ok(Bytes::new())]);
    let parts: Vec<_> = Rechunker::new(body, 4).collect().await;
    assert!(parts.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_parts_complete_in_order() {
    let mut rng = StdRng::seed_from_u64(11);

    for round in 0..20 {
        let store = MemoryStore::new("media");
        let locks = LockRegistry::new();
        let naming = policy(DuplicateHandling::RandomAlphanumeric);

        let data = pattern(rng.random_range(1..200));
        let part_size = rng.random_range(1..32);
        let cuts = random_cuts(&mut rng, data.len());
        let expected_parts = u16::try_from(data.len().div_ceil(part_size)).unwrap();
        for number in 1..=expected_parts {
            store.delay_part(number, Duration::from_millis(rng.random_range(0..50)));
        }

        let uploaded = Uploader::new(&store, &naming)
            .with_locks(&locks)
            .with_part_size(part_size)
            .with_max_requests(rng.random_range(1..6))
            .upload(&format!("file-{round}.bin"), chunked_body(&data, &cuts))
            .await
            .unwrap();

        assert_eq!(uploaded.parts, expected_parts);
        assert_eq!(store.object(&uploaded.key).unwrap(), data);

        let completed = store.completed_parts();
        let ascending: Vec<u16> = (1..=expected_parts).collect();
        assert_eq!(completed, vec![ascending]);

        let mut acknowledged = store.acknowledged_parts();
        acknowledged.sort_unstable();
        assert_eq!(acknowledged, (1..=expected_parts).collect::<Vec<_>>());
        assert!(locks.is_empty());
    }
}

#[tokio::test]
async fn test_concurrent_uploads_get_distinct_keys() {
    let store = MemoryStore::new("media");
    let locks = LockRegistry::new();
    let naming = policy(DuplicateHandling::RandomAlphanumeric);

    let uploads = (0..8).map(|i| {
        let uploader = Uploader::new(&store, &naming)
            .with_locks(&locks)
            .with_location("up")
            .with_part_size(4);
        async move {
            let body = stream::iter(vec![Ok::<_, io::Error>(Bytes::from(format!("body {i}")))]);
            uploader.upload("report.pdf", body).await
        }
    });

    let keys: Vec<String> = join_all(uploads)
        .await
        .into_iter()
        .map(|uploaded| uploaded.unwrap().key)
        .collect();

    let distinct: HashSet<&String> = keys.iter().collect();
    assert_eq!(distinct.len(), keys.len());
    assert!(keys.contains(&"up/report.pdf".to_string()));
    assert!(keys.iter().all(|key| key.starts_with("up/report") && key.ends_with(".pdf")));
    assert_eq!(store.keys().len(), keys.len());
    assert!(locks.is_empty());
}

// hands out a name that is always taken
struct Stubborn;

impl RenameStrategy for Stubborn {
    fn initial_name(&self, file_name: &str) -> String {
        file_name.to_string()
    }

    fn rename(&self, original: &str) -> Option<String> {
        Some(original.to_string())
    }
}

#[tokio::test]
async fn test_rename_terminates() {
    let store = MemoryStore::new("media");
    store.put_object("taken.txt", "x", "text/plain");
    let locks = LockRegistry::new();

    let err = Uploader::new(&store, &Stubborn)
        .with_locks(&locks)
        .upload("taken.txt", chunked_body(b"new", &[]))
        .await
        .unwrap_err();

    match err {
        UploadError::DuplicateName { attempts, .. } => assert_eq!(attempts, MAX_ATTEMPTS),
        other => panic!("unexpected error: {other}"),
    }
    let heads = store
        .calls()
        .iter()
        .filter(|op| **op == Operation::Head)
        .count();
    assert_eq!(heads, MAX_ATTEMPTS);
    assert!(!store.calls().contains(&Operation::Create));
    assert!(locks.is_empty());
}

#[tokio::test]
async fn test_exception_policy_fails_first_conflict() {
    let store = MemoryStore::new("media");
    store.put_object("taken.txt", "x", "text/plain");
    let locks = LockRegistry::new();
    let naming = policy(DuplicateHandling::Exception);

    let err = Uploader::new(&store, &naming)
        .with_locks(&locks)
        .upload("taken.txt", chunked_body(b"new", &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Conflict { .. }), "{err}");
    assert_eq!(store.object("taken.txt").unwrap(), Bytes::from_static(b"x"));
    assert!(locks.is_empty());
}

#[tokio::test]
async fn test_locks_released_on_every_failure() {
    let failures = [
        Operation::Create,
        Operation::UploadPart,
        Operation::Complete,
        Operation::Head,
    ];

    for operation in failures {
        let store = MemoryStore::new("media");
        let locks = LockRegistry::new();
        let naming = policy(DuplicateHandling::RandomAlphanumeric);
        store.fail(operation, StoreError::Auth("denied".to_string()));

        let result = Uploader::new(&store, &naming)
            .with_locks(&locks)
            .with_part_size(2)
            .with_max_requests(3)
            .upload("a.bin", chunked_body(&pattern(9), &[3]))
            .await;

        assert!(result.is_err(), "{operation:?}");
        assert!(locks.is_empty(), "{operation:?}");
    }

    // a body that breaks halfway
    let store = MemoryStore::new("media");
    let locks = LockRegistry::new();
    let naming = policy(DuplicateHandling::RandomAlphanumeric);
    let body = stream::iter(vec![
        Ok(Bytes::from_static(b"abcd")),
        Err(io::Error::other("connection reset")),
    ]);

    let err = Uploader::new(&store, &naming)
        .with_locks(&locks)
        .with_part_size(2)
        .upload("a.bin", body)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Stream { .. }), "{err}");
    assert!(locks.is_empty());
    assert!(store.object("a.bin").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_lock_released_when_cancelled() {
    let store = MemoryStore::new("media");
    let locks = LockRegistry::new();
    let naming = policy(DuplicateHandling::RandomAlphanumeric);
    store.delay_part(1, Duration::from_secs(60));

    let uploader = Uploader::new(&store, &naming)
        .with_locks(&locks)
        .with_part_size(2);
    let upload = uploader.upload("slow.bin", chunked_body(b"abcd", &[]));

    let cancelled = tokio::time::timeout(Duration::from_secs(1), upload).await;

    assert!(cancelled.is_err());
    assert!(locks.is_empty());
    assert!(store.object("slow.bin").is_none());
}

#[tokio::test]
async fn test_unlinked_scan_resumes_exactly_once() {
    let mut rng = StdRng::seed_from_u64(3);

    for _ in 0..10 {
        let store = MemoryStore::new("media");
        let records = SledRepository::temporary().unwrap();
        let destination = Destination::new("media", "media");

        let count = rng.random_range(0..40);
        let mut expected = Vec::new();
        for i in 0..count {
            let key = format!("obj-{i:03}");
            store.put_object(&key, "x", "text/plain");
            if rng.random_bool(0.4) {
                records
                    .create(&AttachmentRecord::new("media", &key, &key))
                    .unwrap();
            } else {
                expected.push(key);
            }
        }

        for page_size in 1..=7 {
            let mut seen = Vec::new();
            let mut cursor = Cursor::default();

            for _ in 0..=count {
                let page = list_unlinked(&store, &records, &destination, &cursor, page_size, None)
                    .await
                    .unwrap();
                assert!(page.objects.len() <= usize::try_from(page_size).unwrap());
                assert!(page.objects.iter().all(|o| !o.linked));
                seen.extend(page.objects.iter().map(|o| o.key.clone()));

                if !page.has_more {
                    break;
                }
                cursor = page.next_cursor();
            }

            assert_eq!(seen, expected, "page size {page_size}");
        }
    }
}

#[tokio::test]
async fn test_unlinked_scan_skips_linked_between_pages() {
    let store = MemoryStore::new("media");
    let records = SledRepository::temporary().unwrap();
    let destination = Destination::new("media", "media");
    for key in ["a", "b", "c", "d"] {
        store.put_object(key, "x", "text/plain");
    }

    let first = list_unlinked(&store, &records, &destination, &Cursor::default(), 2, None)
        .await
        .unwrap();
    assert_eq!(first.objects.len(), 2);

    // linked while the user looks at the first page
    records
        .create(&AttachmentRecord::new("media", "c", "c"))
        .unwrap();

    let second = list_unlinked(&store, &records, &destination, &first.next_cursor(), 2, None)
        .await
        .unwrap();
    let keys: Vec<&str> = second.objects.iter().map(|o| o.key.as_str()).collect();
    assert_eq!(keys, ["d"]);
}
