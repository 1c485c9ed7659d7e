//! Upload session: claim a free object key, stream the body as a multipart upload, verify
//!
//! <https://docs.aws.amazon.com/AmazonS3/latest/dev/UsingRESTAPImpUpload.html>
//! * Initiate Multipart Upload
//! * Upload Part
//! * Complete Multipart Upload

use crate::{
    destination::join_key,
    lock::{KeyGuard, LockRegistry},
    naming::RenameStrategy,
    s3::limits::{MAX_PARTS_PER_UPLOAD, MIN_PART_SIZE_BYTES},
    store::{ObjectStore, StoreError},
    stream::{Parts, Rechunker},
};
use bytes::Bytes;
use futures::stream::{FuturesUnordered, Stream, StreamExt};
use std::{fmt, io};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

/// Names tried per upload, the first one included
pub const MAX_ATTEMPTS: usize = 3;

/// Steps of an upload session that talk to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ExistenceCheck,
    CreateMultipart,
    UploadPart(u16),
    Complete,
    Verify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExistenceCheck => write!(f, "existence check"),
            Self::CreateMultipart => write!(f, "create multipart upload"),
            Self::UploadPart(number) => write!(f, "upload part {number}"),
            Self::Complete => write!(f, "complete multipart upload"),
            Self::Verify => write!(f, "verify object"),
        }
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    /// the name is taken and the naming policy refuses to rename
    #[error("duplicate file name {bucket}/{key}: {message}")]
    Conflict {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("no free name for {bucket}/{key} after {attempts} attempts: {message}")]
    DuplicateName {
        bucket: String,
        key: String,
        attempts: usize,
        message: String,
    },

    #[error("{stage} failed for {bucket}/{key}: {source}")]
    Store {
        bucket: String,
        key: String,
        stage: Stage,
        #[source]
        source: StoreError,
    },

    #[error("error reading the body of {bucket}/{key}: {source}")]
    Stream {
        bucket: String,
        key: String,
        #[source]
        source: io::Error,
    },

    #[error(
        "{bucket}/{key} needs more than {max} parts, use a bigger part size",
        max = MAX_PARTS_PER_UPLOAD
    )]
    TooManyParts { bucket: String, key: String },
}

impl UploadError {
    /// Object key the session was working on
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Conflict { key, .. }
            | Self::DuplicateName { key, .. }
            | Self::Store { key, .. }
            | Self::Stream { key, .. }
            | Self::TooManyParts { key, .. } => key,
        }
    }
}

/// A finished upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub key: String,
    /// name the object was stored under, differs from the uploaded one after a rename
    pub file_name: String,
    pub size: u64,
    pub content_type: String,
    pub etag: Option<String>,
    pub parts: u16,
}

// part number, ETag and length of an acknowledged part
type PartResult = Result<(u16, String, usize), UploadError>;

// a free key, held until the guard is dropped
struct Claim<'a> {
    guard: KeyGuard<'a>,
    file_name: String,
}

/// Streams files into one bucket, see `upload`
pub struct Uploader<'a, S> {
    store: &'a S,
    naming: &'a dyn RenameStrategy,
    locks: &'a LockRegistry,
    location: String,
    part_size: usize,
    max_requests: usize,
    progress: Option<UnboundedSender<usize>>,
}

impl<'a, S: ObjectStore> Uploader<'a, S> {
    #[must_use]
    pub fn new(store: &'a S, naming: &'a dyn RenameStrategy) -> Self {
        Self {
            store,
            naming,
            locks: LockRegistry::global(),
            location: String::new(),
            part_size: MIN_PART_SIZE_BYTES,
            max_requests: 1,
            progress: None,
        }
    }

    #[must_use]
    pub const fn with_locks(mut self, locks: &'a LockRegistry) -> Self {
        self.locks = locks;
        self
    }

    /// Expanded location the object keys are built under
    #[must_use]
    pub fn with_location(mut self, location: &str) -> Self {
        self.location = location.trim_matches('/').to_string();
        self
    }

    /// Bytes per part, callers talking to S3 should clamp with `limits::part_size`
    #[must_use]
    pub fn with_part_size(mut self, part_size: usize) -> Self {
        self.part_size = part_size.max(1);
        self
    }

    /// Parts in flight at the same time
    #[must_use]
    pub fn with_max_requests(mut self, max_requests: usize) -> Self {
        self.max_requests = max_requests.max(1);
        self
    }

    /// Receives the size of every acknowledged part
    #[must_use]
    pub fn with_progress(mut self, sender: UnboundedSender<usize>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Upload `body` as `file_name`, renamed per the naming policy until a free key is found.
    ///
    /// The key stays locked until the session returns, whatever the outcome, and is released
    /// as well when the returned future is dropped.
    ///
    /// # Errors
    ///
    /// Will return `Err` if no free name is found, the body can't be read or a store call fails
    pub async fn upload<B>(&self, file_name: &str, body: B) -> Result<UploadedObject, UploadError>
    where
        B: Stream<Item = io::Result<Bytes>> + Unpin,
    {
        let (uploaded, _guard) = self.upload_held(file_name, body).await?;
        Ok(uploaded)
    }

    /// Like `upload`, the key stays locked until the returned guard is dropped so the caller
    /// can record the object before anyone else links it
    ///
    /// # Errors
    ///
    /// Will return `Err` if no free name is found, the body can't be read or a store call fails
    pub async fn upload_held<B>(
        &self,
        file_name: &str,
        body: B,
    ) -> Result<(UploadedObject, KeyGuard<'a>), UploadError>
    where
        B: Stream<Item = io::Result<Bytes>> + Unpin,
    {
        let bucket = self.store.bucket();
        let claim = self.claim(file_name).await?;
        let key = claim.guard.key();

        let content_type = mime_guess::from_path(&claim.file_name)
            .first_or_octet_stream()
            .to_string();

        let upload_id = self
            .store
            .create_multipart(key, &content_type)
            .await
            .map_err(|e| self.store_error(key, Stage::CreateMultipart, e))?;

        log::debug!("upload_id: {upload_id}, key: {key}, content type: {content_type}");

        let parts = self.upload_parts(key, &upload_id, body).await?;

        let completed = parts.completed();
        log::debug!("completing {key} with {} parts", completed.len());

        self.store
            .complete_multipart(key, &upload_id, &completed)
            .await
            .map_err(|e| self.store_error(key, Stage::Complete, e))?;

        let meta = self
            .store
            .head(key)
            .await
            .map_err(|e| self.store_error(key, Stage::Verify, e))?;

        let uploaded = UploadedObject {
            key: key.to_string(),
            file_name: claim.file_name.clone(),
            size: meta.size,
            content_type: meta.content_type.unwrap_or(content_type),
            etag: meta.etag,
            parts: parts.counter(),
        };

        log::info!(
            "uploaded {bucket}/{}, {} in {} parts",
            uploaded.key,
            bytesize::ByteSize(uploaded.size),
            uploaded.parts
        );

        Ok((uploaded, claim.guard))
    }

    // Lock a candidate key and check the store, renaming from the first candidate on conflict
    async fn claim(&self, file_name: &str) -> Result<Claim<'a>, UploadError> {
        let bucket = self.store.bucket();
        let original = self.naming.initial_name(file_name);
        let mut name = original.clone();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let key = join_key(&self.location, &name);

            let conflict = match self.locks.try_lock(bucket, &key) {
                None => format!("{bucket}/{key} is being uploaded"),
                Some(guard) => match self.store.head(&key).await {
                    Err(e) if e.is_not_found() => {
                        log::debug!("claimed {bucket}/{key}, attempt {attempt}/{MAX_ATTEMPTS}");
                        return Ok(Claim {
                            guard,
                            file_name: name,
                        });
                    }
                    Ok(_) => format!("{bucket}/{key} already exists"),
                    Err(e) => return Err(self.store_error(&key, Stage::ExistenceCheck, e)),
                },
            };

            log::warn!("{conflict}, attempt {attempt}/{MAX_ATTEMPTS}");

            if attempt >= MAX_ATTEMPTS {
                return Err(UploadError::DuplicateName {
                    bucket: bucket.to_string(),
                    key,
                    attempts: attempt,
                    message: conflict,
                });
            }

            // renames start from the first candidate
            let Some(renamed) = self.naming.rename(&original) else {
                return Err(UploadError::Conflict {
                    bucket: bucket.to_string(),
                    key,
                    message: conflict,
                });
            };

            log::warn!("renaming {name} to {renamed}");
            name = renamed;
        }
    }

    // Part numbers follow the stream, acknowledgements come back in any order. Parts in flight
    // keep going while the body is read, at most `max_requests` of them.
    async fn upload_parts<B>(&self, key: &str, upload_id: &str, body: B) -> Result<Parts, UploadError>
    where
        B: Stream<Item = io::Result<Bytes>> + Unpin,
    {
        let mut chunks = Rechunker::new(body, self.part_size);
        let mut parts = Parts::new();
        let mut tasks = FuturesUnordered::new();
        let mut reading = true;

        log::info!("Max concurrent requests: {}", self.max_requests);

        loop {
            tokio::select! {
                // acknowledgements first, they free a slot
                biased;

                Some(result) = tasks.next(), if !tasks.is_empty() => {
                    let acknowledged: PartResult = result;
                    self.acknowledge(acknowledged?, &mut parts);
                    log::debug!("Running tasks: {}", tasks.len());
                }

                chunk = chunks.next(), if reading && tasks.len() < self.max_requests => {
                    let chunk = match chunk {
                        Some(Ok(chunk)) => chunk,
                        Some(Err(e)) => {
                            return Err(UploadError::Stream {
                                bucket: self.store.bucket().to_string(),
                                key: key.to_string(),
                                source: e,
                            });
                        }
                        // an empty body is still one (empty) part
                        None if parts.counter() == 0 => Bytes::new(),
                        None => {
                            reading = false;
                            continue;
                        }
                    };

                    let Some(number) = parts.next_number() else {
                        return Err(UploadError::TooManyParts {
                            bucket: self.store.bucket().to_string(),
                            key: key.to_string(),
                        });
                    };

                    log::debug!("Task push part: {number}, {} bytes", chunk.len());

                    tasks.push(self.upload_part(key, upload_id, number, chunk));
                }

                else => break,
            }
        }

        if !parts.is_complete() {
            return Err(self.store_error(
                key,
                Stage::Complete,
                StoreError::Invalid("could not upload all parts".to_string()),
            ));
        }

        Ok(parts)
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        number: u16,
        chunk: Bytes,
    ) -> PartResult {
        let length = chunk.len();
        let etag = self
            .store
            .upload_part(key, upload_id, number, chunk)
            .await
            .map_err(|e| {
                log::error!("Error uploading part: {number}: {e}");
                self.store_error(key, Stage::UploadPart(number), e)
            })?;

        log::info!("Uploaded part: {number}, etag: {etag}");

        Ok((number, etag, length))
    }

    fn acknowledge(&self, (number, etag, length): (u16, String, usize), parts: &mut Parts) {
        if !parts.record(number, etag) {
            log::warn!("part {number} acknowledged twice");
        }

        if let Some(progress) = &self.progress {
            // a closed receiver only means nobody is watching
            let _ = progress.send(length);
        }
    }

    fn store_error(&self, key: &str, stage: Stage, source: StoreError) -> UploadError {
        log::error!("{stage} failed for {}/{key}: {source}", self.store.bucket());
        UploadError::Store {
            bucket: self.store.bucket().to_string(),
            key: key.to_string(),
            stage,
            source,
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::{
        naming::{DuplicateHandling, NamingMode, NamingPolicy},
        store::{MemoryStore, memory::Operation},
    };
    use futures::stream;
    use regex::Regex;
    use std::time::Duration;

    fn body(buffers: &[&'static [u8]]) -> impl Stream<Item = io::Result<Bytes>> + Unpin {
        stream::iter(
            buffers
                .iter()
                .map(|b| Ok(Bytes::from_static(b)))
                .collect::<Vec<_>>(),
        )
    }

    fn policy(duplicate: DuplicateHandling) -> NamingPolicy {
        NamingPolicy::new(NamingMode::None, duplicate)
    }

    // renames to names that are always taken
    struct AlwaysTaken;

    impl RenameStrategy for AlwaysTaken {
        fn initial_name(&self, file_name: &str) -> String {
            file_name.to_string()
        }

        fn rename(&self, _original: &str) -> Option<String> {
            Some("taken.png".to_string())
        }
    }

    #[tokio::test]
    async fn test_upload() {
        let store = MemoryStore::new("media");
        let locks = LockRegistry::new();
        let naming = policy(DuplicateHandling::default());
        let uploader = Uploader::new(&store, &naming)
            .with_locks(&locks)
            .with_location("/uploads/")
            .with_part_size(3);

        let uploaded = uploader
            .upload("halo.txt", body(&[b"ha", b"lo"]))
            .await
            .unwrap();

        assert_eq!(uploaded.key, "uploads/halo.txt");
        assert_eq!(uploaded.file_name, "halo.txt");
        assert_eq!(uploaded.size, 4);
        assert_eq!(uploaded.content_type, "text/plain");
        assert_eq!(uploaded.parts, 2);
        assert_eq!(store.object("uploads/halo.txt").unwrap(), "halo");
        assert_eq!(store.completed_parts(), [vec![1, 2]]);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_upload_held_keeps_key_locked() {
        let store = MemoryStore::new("media");
        let locks = LockRegistry::new();
        let naming = policy(DuplicateHandling::default());
        let uploader = Uploader::new(&store, &naming)
            .with_locks(&locks)
            .with_part_size(3);

        let (uploaded, guard) = uploader
            .upload_held("halo.txt", body(&[b"halo"]))
            .await
            .unwrap();

        assert_eq!(guard.key(), uploaded.key);
        assert!(locks.is_held("media", "halo.txt"));
        // a second session can't take the key while the first one records it
        assert!(locks.try_lock("media", "halo.txt").is_none());

        drop(guard);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_parts_progress_while_body_stalls() {
        let store = MemoryStore::new("media");
        let locks = LockRegistry::new();
        let naming = policy(DuplicateHandling::default());
        let uploader = Uploader::new(&store, &naming)
            .with_locks(&locks)
            .with_part_size(3)
            .with_max_requests(4);

        // like stdin, the rest of the body only comes later
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<io::Result<Bytes>>();
        tx.send(Ok(Bytes::from_static(b"abc"))).unwrap();
        let body = tokio_stream::wrappers::UnboundedReceiverStream::new(rx);

        let feed = async {
            while !store.acknowledged_parts().contains(&1) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            tx.send(Ok(Bytes::from_static(b"de"))).unwrap();
            drop(tx);
        };

        let (uploaded, ()) = tokio::time::timeout(
            Duration::from_secs(5),
            futures::future::join(uploader.upload("slow.bin", body), feed),
        )
        .await
        .expect("part 1 was never sent while waiting for the body");

        let uploaded = uploaded.unwrap();
        assert_eq!(uploaded.parts, 2);
        assert_eq!(store.acknowledged_parts(), [1, 2]);
        assert_eq!(store.object("slow.bin").unwrap(), "abcde");
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_upload_empty_body() {
        let store = MemoryStore::new("media");
        let locks = LockRegistry::new();
        let naming = policy(DuplicateHandling::default());
        let uploader = Uploader::new(&store, &naming).with_locks(&locks);

        let uploaded = uploader.upload("empty.bin", body(&[])).await.unwrap();

        assert_eq!(uploaded.size, 0);
        assert_eq!(uploaded.parts, 1);
        assert_eq!(uploaded.content_type, "application/octet-stream");
        assert_eq!(store.object("empty.bin").unwrap(), "");
    }

    #[tokio::test]
    async fn test_rename_on_remote_conflict() {
        let store = MemoryStore::new("media");
        store.put_object("halo.run", "old", "text/plain");
        let locks = LockRegistry::new();
        let naming = policy(DuplicateHandling::RandomAlphanumeric);
        let uploader = Uploader::new(&store, &naming).with_locks(&locks);

        let uploaded = uploader.upload("halo.run", body(&[b"new"])).await.unwrap();

        let re = Regex::new(r"^halo-[a-z0-9]{4}\.run$").unwrap();
        assert!(re.is_match(&uploaded.key), "{}", uploaded.key);
        assert_eq!(store.object("halo.run").unwrap(), "old");
        assert_eq!(store.object(&uploaded.key).unwrap(), "new");
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_rename_on_local_conflict() {
        let store = MemoryStore::new("media");
        let locks = LockRegistry::new();
        assert!(locks.acquire("media", "a.png"));
        let naming = policy(DuplicateHandling::RandomAlphabetic);
        let uploader = Uploader::new(&store, &naming).with_locks(&locks);

        let uploaded = uploader.upload("a.png", body(&[b"png"])).await.unwrap();

        let re = Regex::new(r"^a-[a-z]{4}\.png$").unwrap();
        assert!(re.is_match(&uploaded.key), "{}", uploaded.key);
        // the foreign lock is untouched, ours is gone
        assert!(locks.is_held("media", "a.png"));
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_name_after_max_attempts() {
        let store = MemoryStore::new("media");
        store.put_object("a.png", "a", "image/png");
        store.put_object("taken.png", "b", "image/png");
        let locks = LockRegistry::new();
        let uploader = Uploader::new(&store, &AlwaysTaken).with_locks(&locks);

        let err = uploader.upload("a.png", body(&[b"c"])).await.unwrap_err();

        match &err {
            UploadError::DuplicateName {
                key,
                attempts,
                message,
                ..
            } => {
                assert_eq!(key, "taken.png");
                assert_eq!(*attempts, MAX_ATTEMPTS);
                assert!(message.contains("already exists"));
            }
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
    async fn test_exception_policy_fails_at_once() {
        let store = MemoryStore::new("media");
        store.put_object("a.png", "a", "image/png");
        let locks = LockRegistry::new();
        let naming = policy(DuplicateHandling::Exception);
        let uploader = Uploader::new(&store, &naming).with_locks(&locks);

        let err = uploader.upload("a.png", body(&[b"c"])).await.unwrap_err();

        assert!(matches!(err, UploadError::Conflict { .. }), "{err}");
        assert_eq!(err.key(), "a.png");
        assert_eq!(store.calls(), [Operation::Head]);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_parts_completed_in_order() {
        let store = MemoryStore::new("media");
        store.delay_part(1, Duration::from_millis(100));
        let locks = LockRegistry::new();
        let naming = policy(DuplicateHandling::default());
        let uploader = Uploader::new(&store, &naming)
            .with_locks(&locks)
            .with_part_size(2)
            .with_max_requests(4);

        let uploaded = uploader
            .upload("abc.bin", body(&[b"abcdef"]))
            .await
            .unwrap();

        assert_eq!(uploaded.parts, 3);
        assert_ne!(store.acknowledged_parts()[0], 1);
        assert_eq!(store.completed_parts(), [vec![1, 2, 3]]);
        assert_eq!(store.object("abc.bin").unwrap(), "abcdef");
    }

    #[tokio::test]
    async fn test_lock_released_on_every_failure() {
        let failures: Vec<(&str, Box<dyn Fn(&MemoryStore)>)> = vec![
            (
                "existence check",
                Box::new(|s: &MemoryStore| s.fail(Operation::Head, StoreError::Auth("denied".into()))),
            ),
            (
                "create",
                Box::new(|s: &MemoryStore| s.fail(Operation::Create, StoreError::Invalid("bad".into()))),
            ),
            (
                "part",
                Box::new(|s: &MemoryStore| s.fail_part(2, StoreError::from_status(500, "x".into(), "y".into()))),
            ),
            (
                "complete",
                Box::new(|s: &MemoryStore| s.fail(Operation::Complete, StoreError::Invalid("bad".into()))),
            ),
            (
                // existence check passes, the object is gone when verified
                "verify",
                Box::new(|s: &MemoryStore| s.fail(Operation::Head, StoreError::NotFound("a.bin".into()))),
            ),
        ];

        for (name, inject) in failures {
            let store = MemoryStore::new("media");
            inject(&store);
            let locks = LockRegistry::new();
            let naming = policy(DuplicateHandling::default());
            let uploader = Uploader::new(&store, &naming)
                .with_locks(&locks)
                .with_part_size(2);

            let err = uploader.upload("a.bin", body(&[b"abcdef"])).await;
            assert!(
                matches!(err, Err(UploadError::Store { .. })),
                "{name}: {err:?}"
            );
            assert!(locks.is_empty(), "{name}: lock still held");
        }
    }

    #[tokio::test]
    async fn test_stream_error() {
        let store = MemoryStore::new("media");
        let locks = LockRegistry::new();
        let naming = policy(DuplicateHandling::default());
        let uploader = Uploader::new(&store, &naming).with_locks(&locks);
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"ab")),
            Err(io::Error::other("broken pipe")),
        ]);

        let err = uploader.upload("a.bin", body).await.unwrap_err();

        assert!(matches!(err, UploadError::Stream { .. }), "{err}");
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_upload_releases_lock() {
        let store = MemoryStore::new("media");
        let locks = LockRegistry::new();
        let naming = policy(DuplicateHandling::default());
        let uploader = Uploader::new(&store, &naming)
            .with_locks(&locks)
            .with_part_size(2);
        // never ends
        let body = body(&[b"abcd"]).chain(stream::pending());

        let result = tokio::time::timeout(
            Duration::from_millis(50),
            uploader.upload("a.bin", body),
        )
        .await;

        assert!(result.is_err());
        assert!(locks.is_empty());
        assert!(store.object("a.bin").is_none());
    }

    #[tokio::test]
    async fn test_concurrent_uploads_same_name() {
        let store = MemoryStore::new("media");
        store.delay_part(1, Duration::from_millis(50));
        let locks = LockRegistry::new();
        let naming = policy(DuplicateHandling::default());
        let uploader = Uploader::new(&store, &naming).with_locks(&locks);

        let (a, b) = tokio::join!(
            uploader.upload("same.txt", body(&[b"one"])),
            uploader.upload("same.txt", body(&[b"two"])),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.key, b.key);
        assert!([&a.key, &b.key].contains(&&"same.txt".to_string()));
        assert_eq!(store.keys().len(), 2);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_progress() {
        let store = MemoryStore::new("media");
        let naming = policy(DuplicateHandling::default());
        let locks = LockRegistry::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let uploader = Uploader::new(&store, &naming)
            .with_locks(&locks)
            .with_part_size(4)
            .with_progress(tx);

        uploader.upload("a.bin", body(&[b"abcdefghij"])).await.unwrap();
        drop(uploader);

        let mut sizes = Vec::new();
        while let Some(size) = rx.recv().await {
            sizes.push(size);
        }
        sizes.sort_unstable();
        assert_eq!(sizes, [2, 4, 4]);
    }
}
