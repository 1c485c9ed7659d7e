use crate::store::{
    CompletedPart, ListPage, ListRequest, ListedObject, ObjectMeta, ObjectStore, StoreError,
};
use bytes::{Bytes, BytesMut};
use chrono::Utc;
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

/// Store calls that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    UploadPart,
    Complete,
    Head,
    List,
    Delete,
}

#[derive(Debug, Clone)]
struct StoredObject {
    body: Bytes,
    content_type: String,
    last_modified: String,
}

#[derive(Debug, Default)]
struct PendingUpload {
    key: String,
    content_type: String,
    parts: HashMap<u16, Bytes>,
}

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<String, StoredObject>,
    uploads: HashMap<String, PendingUpload>,
    next_upload_id: u64,
    // part numbers in the order the store acknowledged them
    acknowledged: Vec<u16>,
    // part numbers in the order they were handed to complete
    completed: Vec<Vec<u16>>,
    calls: Vec<Operation>,
    faults: HashMap<Operation, StoreError>,
    part_faults: HashMap<u16, StoreError>,
    part_delays: HashMap<u16, Duration>,
}

/// In-process object store with S3 semantics, used for dry runs and tests
#[derive(Debug)]
pub struct MemoryStore {
    bucket: String,
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed an object as if it had been uploaded by someone else
    pub fn put_object(&self, key: &str, body: impl Into<Bytes>, content_type: &str) {
        self.state().objects.insert(
            key.to_string(),
            StoredObject {
                body: body.into(),
                content_type: content_type.to_string(),
                last_modified: Utc::now().to_rfc2822(),
            },
        );
    }

    /// Every call of `operation` fails with `error` until cleared
    pub fn fail(&self, operation: Operation, error: StoreError) {
        self.state().faults.insert(operation, error);
    }

    /// Uploading part `number` fails with `error`
    pub fn fail_part(&self, number: u16, error: StoreError) {
        self.state().part_faults.insert(number, error);
    }

    pub fn clear_faults(&self) {
        let mut state = self.state();
        state.faults.clear();
        state.part_faults.clear();
    }

    /// Hold the acknowledgement of part `number` for `delay`
    pub fn delay_part(&self, number: u16, delay: Duration) {
        self.state().part_delays.insert(number, delay);
    }

    #[must_use]
    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.state().objects.get(key).map(|o| o.body.clone())
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.state().objects.keys().cloned().collect()
    }

    /// Part numbers in acknowledgement order
    #[must_use]
    pub fn acknowledged_parts(&self) -> Vec<u16> {
        self.state().acknowledged.clone()
    }

    /// Part numbers as submitted to each complete call
    #[must_use]
    pub fn completed_parts(&self) -> Vec<Vec<u16>> {
        self.state().completed.clone()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Operation> {
        self.state().calls.clone()
    }

    #[must_use]
    pub fn pending_uploads(&self) -> usize {
        self.state().uploads.len()
    }

    fn enter(&self, operation: Operation) -> Result<(), StoreError> {
        let mut state = self.state();
        state.calls.push(operation);
        state
            .faults
            .get(&operation)
            .map_or(Ok(()), |error| Err(error.clone()))
    }
}

impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn create_multipart(&self, key: &str, content_type: &str) -> Result<String, StoreError> {
        self.enter(Operation::Create)?;
        let mut state = self.state();
        state.next_upload_id += 1;
        let upload_id = format!("upload-{}", state.next_upload_id);
        state.uploads.insert(
            upload_id.clone(),
            PendingUpload {
                key: key.to_string(),
                content_type: content_type.to_string(),
                parts: HashMap::new(),
            },
        );
        Ok(upload_id)
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        number: u16,
        body: Bytes,
    ) -> Result<String, StoreError> {
        self.enter(Operation::UploadPart)?;

        let delay = self.state().part_delays.get(&number).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if let Some(error) = state.part_faults.get(&number) {
            return Err(error.clone());
        }

        let etag = format!("\"{}\"", crate::s3::tools::sha256_hex(&body));
        let upload = state
            .uploads
            .get_mut(upload_id)
            .filter(|upload| upload.key == key)
            .ok_or_else(|| StoreError::from_status(404, "NoSuchUpload".into(), upload_id.into()))?;
        upload.parts.insert(number, body);
        state.acknowledged.push(number);
        Ok(etag)
    }

    async fn complete_multipart(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<(), StoreError> {
        self.enter(Operation::Complete)?;
        let mut state = self.state();
        state
            .completed
            .push(parts.iter().map(|part| part.number).collect());

        if parts.windows(2).any(|w| matches!(w, [a, b] if a.number >= b.number)) {
            return Err(StoreError::from_status(
                400,
                "InvalidPartOrder".into(),
                "The list of parts was not in ascending order".into(),
            ));
        }

        let upload = state
            .uploads
            .remove(upload_id)
            .filter(|upload| upload.key == key)
            .ok_or_else(|| StoreError::from_status(404, "NoSuchUpload".into(), upload_id.into()))?;

        let mut body = BytesMut::new();
        for part in parts {
            let bytes = upload.parts.get(&part.number).ok_or_else(|| {
                StoreError::from_status(400, "InvalidPart".into(), part.number.to_string())
            })?;
            body.extend_from_slice(bytes);
        }

        state.objects.insert(
            key.to_string(),
            StoredObject {
                body: body.freeze(),
                content_type: upload.content_type,
                last_modified: Utc::now().to_rfc2822(),
            },
        );
        Ok(())
    }

    async fn head(&self, key: &str) -> Result<ObjectMeta, StoreError> {
        self.enter(Operation::Head)?;
        self.state()
            .objects
            .get(key)
            .map(|object| ObjectMeta {
                key: key.to_string(),
                size: object.body.len() as u64,
                content_type: Some(object.content_type.clone()),
                etag: None,
                last_modified: Some(object.last_modified.clone()),
            })
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    // the continuation token is the last key of the previous page
    async fn list(&self, request: &ListRequest) -> Result<ListPage, StoreError> {
        self.enter(Operation::List)?;
        let state = self.state();
        let prefix = request.prefix.as_deref().unwrap_or_default();
        let max_keys = usize::try_from(request.max_keys).unwrap_or(usize::MAX).max(1);

        let mut matching = state
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| {
                request.continuation_token.as_deref().is_none_or(|token| key.as_str() > token)
            })
            // keys below a deeper "directory" are rolled up by the delimiter
            .filter(|(key, _)| {
                request.delimiter.as_deref().is_none_or(|delimiter| {
                    !key.get(prefix.len()..).unwrap_or_default().contains(delimiter)
                })
            });

        let objects: Vec<ListedObject> = matching
            .by_ref()
            .take(max_keys)
            .map(|(key, object)| ListedObject {
                key: key.clone(),
                size: object.body.len() as u64,
                last_modified: Some(object.last_modified.clone()),
            })
            .collect();

        let is_truncated = matching.next().is_some();
        let next_token = if is_truncated {
            objects.last().map(|object| object.key.clone())
        } else {
            None
        };

        Ok(ListPage {
            objects,
            next_token,
            is_truncated,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.enter(Operation::Delete)?;
        self.state().objects.remove(key);
        Ok(())
    }
}
